//! Chat protocol types and operations.
//!
//! - **Records**: `sender:HH:MM:SS:body` plaintext framing
//! - **Frames**: `CHAT:` prefix around the base64 envelope

mod frame;
mod record;

pub use frame::{decode_frame, encode_frame, FRAME_PREFIX};
pub use record::{validate_username, ChatRecord, Timestamp, FIELD_SEPARATOR, TIMESTAMP_LEN};
