//! IPv4 UDP multicast transport.
//!
//! Two sockets per session: a sender connected to the group endpoint and a
//! listener bound to the group port that has joined the group. Both are
//! built with `socket2` so the listener can share the port with other
//! processes (mDNS responders commonly hold 5353), then handed to tokio.

use std::io;
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};

use async_trait::async_trait;
use socket2::{Domain, Protocol, Socket, Type};
use tokio::net::UdpSocket;
use tracing::{debug, trace};

use crate::chat::config::ChatConfig;
use crate::chat::error::ChatError;
use crate::chat::transport::{DatagramSink, DatagramSource};

/// Both halves of a joined multicast session.
pub struct MulticastEndpoint {
    sender: MulticastSender,
    listener: MulticastListener,
}

impl MulticastEndpoint {
    /// Create the sender and join the group with the listener.
    ///
    /// Must be called from within a tokio runtime.
    pub fn open(config: &ChatConfig) -> Result<Self, ChatError> {
        let group = config.group_addr();
        let sender = MulticastSender::open(group, config)?;
        let listener = MulticastListener::open(group, config)?;
        debug!(
            group = %group,
            interface = %config.interface,
            "joined multicast group"
        );
        Ok(Self { sender, listener })
    }

    /// Separate the halves so they can be owned by different tasks.
    pub fn into_split(self) -> (MulticastSender, MulticastListener) {
        (self.sender, self.listener)
    }
}

fn bind_error(addr: SocketAddrV4) -> impl FnOnce(io::Error) -> ChatError {
    move |source| ChatError::TransportBind {
        addr: SocketAddr::V4(addr),
        source,
    }
}

fn into_tokio(socket: Socket, addr: SocketAddrV4) -> Result<UdpSocket, ChatError> {
    socket.set_nonblocking(true).map_err(bind_error(addr))?;
    UdpSocket::from_std(socket.into()).map_err(bind_error(addr))
}

/// Outbound socket directed at the group.
pub struct MulticastSender {
    socket: UdpSocket,
    group: SocketAddrV4,
}

impl MulticastSender {
    fn open(group: SocketAddrV4, config: &ChatConfig) -> Result<Self, ChatError> {
        let socket = Socket::new(Domain::IPV4, Type::DGRAM, Some(Protocol::UDP))
            .map_err(bind_error(group))?;

        socket
            .set_multicast_ttl_v4(config.multicast_ttl)
            .map_err(bind_error(group))?;
        socket
            .set_multicast_loop_v4(config.multicast_loop)
            .map_err(bind_error(group))?;
        if !config.interface.is_unspecified() {
            socket
                .set_multicast_if_v4(&config.interface)
                .map_err(bind_error(group))?;
        }

        let any = SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, 0));
        socket.bind(&any.into()).map_err(bind_error(group))?;
        socket
            .connect(&SocketAddr::V4(group).into())
            .map_err(bind_error(group))?;

        Ok(Self {
            socket: into_tokio(socket, group)?,
            group,
        })
    }

    /// The group endpoint datagrams go to.
    pub fn group(&self) -> SocketAddrV4 {
        self.group
    }
}

#[async_trait]
impl DatagramSink for MulticastSender {
    async fn send(&self, payload: &[u8]) -> Result<usize, ChatError> {
        let written = self
            .socket
            .send(payload)
            .await
            .map_err(ChatError::TransportSend)?;
        trace!(bytes = written, group = %self.group, "datagram sent");
        Ok(written)
    }
}

/// Inbound socket joined to the group.
pub struct MulticastListener {
    socket: UdpSocket,
    buf: Vec<u8>,
}

impl MulticastListener {
    fn open(group: SocketAddrV4, config: &ChatConfig) -> Result<Self, ChatError> {
        let socket = Socket::new(Domain::IPV4, Type::DGRAM, Some(Protocol::UDP))
            .map_err(bind_error(group))?;

        socket.set_reuse_address(true).map_err(bind_error(group))?;
        #[cfg(all(unix, not(any(target_os = "solaris", target_os = "illumos"))))]
        socket.set_reuse_port(true).map_err(bind_error(group))?;

        socket
            .bind(&config.listen_addr().into())
            .map_err(bind_error(group))?;
        socket
            .join_multicast_v4(group.ip(), &config.interface)
            .map_err(bind_error(group))?;

        Ok(Self {
            socket: into_tokio(socket, group)?,
            buf: vec![0u8; config.recv_buffer_size],
        })
    }

    /// Local address of the listening socket.
    pub fn local_addr(&self) -> Result<SocketAddr, ChatError> {
        self.socket.local_addr().map_err(ChatError::Io)
    }
}

#[async_trait]
impl DatagramSource for MulticastListener {
    async fn recv(&mut self) -> Result<Vec<u8>, ChatError> {
        let (len, from) = self
            .socket
            .recv_from(&mut self.buf)
            .await
            .map_err(ChatError::TransportRead)?;
        trace!(bytes = len, from = %from, "datagram received");
        Ok(self.buf[..len].to_vec())
    }
}
