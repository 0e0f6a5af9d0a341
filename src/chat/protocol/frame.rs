//! Wire framing.
//!
//! Every datagram we emit is `"CHAT:" || base64 envelope`. The prefix leaves
//! room for other message kinds on the same group; anything else arriving on
//! the group is ignored.

/// Prefix of chat frames.
pub const FRAME_PREFIX: &str = "CHAT:";

/// Wrap an envelope into a datagram payload.
pub fn encode_frame(envelope: &str) -> Vec<u8> {
    let mut frame = Vec::with_capacity(FRAME_PREFIX.len() + envelope.len());
    frame.extend_from_slice(FRAME_PREFIX.as_bytes());
    frame.extend_from_slice(envelope.as_bytes());
    frame
}

/// Extract the envelope text from a chat frame.
///
/// Returns `None` for datagrams that are not UTF-8 or lack the prefix.
pub fn decode_frame(datagram: &[u8]) -> Option<&str> {
    std::str::from_utf8(datagram)
        .ok()?
        .strip_prefix(FRAME_PREFIX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_frame() {
        assert_eq!(encode_frame("QUJD"), b"CHAT:QUJD".to_vec());
    }

    #[test]
    fn test_decode_chat_frame() {
        assert_eq!(decode_frame(b"CHAT:QUJD"), Some("QUJD"));
    }

    #[test]
    fn test_foreign_datagram_ignored() {
        assert_eq!(decode_frame(b"MDNS-ish payload"), None);
        assert_eq!(decode_frame(b"chat:lowercase"), None);
        assert_eq!(decode_frame(b""), None);
    }

    #[test]
    fn test_non_utf8_ignored() {
        assert_eq!(decode_frame(&[0x43, 0x48, 0xff, 0xfe]), None);
    }

    #[test]
    fn test_empty_envelope_is_still_a_frame() {
        assert_eq!(decode_frame(b"CHAT:"), Some(""));
    }
}
