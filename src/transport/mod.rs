//! Message transports.
//!
//! Clients drive a [`Transport`] directly with alternating send/recv. The
//! relay instead splits a connection into owned halves so one task can
//! push notifications while another blocks on inbound reads.

use crate::protocol::Message;

#[async_trait::async_trait]
pub trait Transport: Send {
    async fn send(&mut self, msg: Message) -> anyhow::Result<()>;
    async fn recv(&mut self) -> anyhow::Result<Message>;
    /// Split into independently owned send and receive halves.
    fn into_split(self: Box<Self>) -> (Box<dyn TransportTx>, Box<dyn TransportRx>);
}

#[async_trait::async_trait]
pub trait TransportTx: Send {
    async fn send(&mut self, msg: Message) -> anyhow::Result<()>;
}

#[async_trait::async_trait]
pub trait TransportRx: Send {
    async fn recv(&mut self) -> anyhow::Result<Message>;
}

pub mod in_memory;
pub mod tcp;

pub use in_memory::InMemoryTransport;
pub use tcp::TcpTransport;
