//! Channel-backed transport pair for tests and same-process play.

use tokio::sync::mpsc;

use crate::protocol::Message;
use crate::transport::{Transport, TransportRx, TransportTx};

pub struct InMemoryTransport {
    tx: mpsc::UnboundedSender<Message>,
    rx: mpsc::UnboundedReceiver<Message>,
}

impl InMemoryTransport {
    /// Two cross-wired endpoints: what one sends, the other receives.
    pub fn pair() -> (Self, Self) {
        let (tx_a, rx_a) = mpsc::unbounded_channel();
        let (tx_b, rx_b) = mpsc::unbounded_channel();
        (
            Self { tx: tx_a, rx: rx_b },
            Self { tx: tx_b, rx: rx_a },
        )
    }
}

pub struct InMemoryTx {
    tx: mpsc::UnboundedSender<Message>,
}

pub struct InMemoryRx {
    rx: mpsc::UnboundedReceiver<Message>,
}

#[async_trait::async_trait]
impl Transport for InMemoryTransport {
    async fn send(&mut self, msg: Message) -> anyhow::Result<()> {
        self.tx
            .send(msg)
            .map_err(|_| anyhow::anyhow!("channel closed"))
    }

    async fn recv(&mut self) -> anyhow::Result<Message> {
        self.rx
            .recv()
            .await
            .ok_or_else(|| anyhow::anyhow!("channel closed"))
    }

    fn into_split(self: Box<Self>) -> (Box<dyn TransportTx>, Box<dyn TransportRx>) {
        (
            Box::new(InMemoryTx { tx: self.tx }),
            Box::new(InMemoryRx { rx: self.rx }),
        )
    }
}

#[async_trait::async_trait]
impl TransportTx for InMemoryTx {
    async fn send(&mut self, msg: Message) -> anyhow::Result<()> {
        self.tx
            .send(msg)
            .map_err(|_| anyhow::anyhow!("channel closed"))
    }
}

#[async_trait::async_trait]
impl TransportRx for InMemoryRx {
    async fn recv(&mut self) -> anyhow::Result<Message> {
        self.rx
            .recv()
            .await
            .ok_or_else(|| anyhow::anyhow!("channel closed"))
    }
}
