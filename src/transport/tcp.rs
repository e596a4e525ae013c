//! Length-prefixed bincode framing over TCP.
//!
//! Each frame is a u32 big-endian byte length followed by the bincode
//! payload, with a size guard on both directions. Sends carry a timeout;
//! receives do not, because waiting for the opponent's move is unbounded
//! by design.

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpStream, ToSocketAddrs};
use tokio::time::{timeout, Duration};

use crate::protocol::Message;
use crate::transport::{Transport, TransportRx, TransportTx};

/// Timeout applied to writes; a peer that cannot accept a frame in this
/// long is treated as gone.
const SEND_TIMEOUT: Duration = Duration::from_secs(30);

/// Upper bound on a single frame to keep a hostile peer from forcing a
/// huge allocation.
const MAX_MESSAGE_SIZE: u32 = 1_000_000;

pub struct TcpTransport {
    reader: OwnedReadHalf,
    writer: OwnedWriteHalf,
}

impl TcpTransport {
    pub fn new(stream: TcpStream) -> Self {
        let (reader, writer) = stream.into_split();
        Self { reader, writer }
    }

    pub async fn connect<A: ToSocketAddrs>(addr: A) -> anyhow::Result<Self> {
        let stream = TcpStream::connect(addr).await?;
        Ok(Self::new(stream))
    }
}

async fn write_frame<W: AsyncWrite + Unpin>(writer: &mut W, msg: &Message) -> anyhow::Result<()> {
    let data = bincode::serialize(msg).map_err(|e| anyhow::anyhow!("serialize error: {}", e))?;
    if data.len() as u32 > MAX_MESSAGE_SIZE {
        return Err(anyhow::anyhow!(
            "message too large: {} bytes (max: {})",
            data.len(),
            MAX_MESSAGE_SIZE
        ));
    }
    let op = async {
        writer.write_all(&(data.len() as u32).to_be_bytes()).await?;
        writer.write_all(&data).await?;
        std::io::Result::Ok(())
    };
    timeout(SEND_TIMEOUT, op)
        .await
        .map_err(|_| anyhow::anyhow!("send timeout after {:?}", SEND_TIMEOUT))?
        .map_err(|e| match e.kind() {
            std::io::ErrorKind::BrokenPipe | std::io::ErrorKind::ConnectionReset => {
                anyhow::anyhow!("connection closed by peer")
            }
            _ => anyhow::anyhow!("write error: {}", e),
        })
}

async fn read_frame<R: AsyncRead + Unpin>(reader: &mut R) -> anyhow::Result<Message> {
    let mut len_buf = [0u8; 4];
    reader.read_exact(&mut len_buf).await.map_err(map_read_err)?;
    let len = u32::from_be_bytes(len_buf);
    if len == 0 {
        return Err(anyhow::anyhow!("invalid message length: 0"));
    }
    if len > MAX_MESSAGE_SIZE {
        return Err(anyhow::anyhow!(
            "message too large: {} bytes (max: {})",
            len,
            MAX_MESSAGE_SIZE
        ));
    }
    let mut buf = vec![0u8; len as usize];
    reader.read_exact(&mut buf).await.map_err(map_read_err)?;
    bincode::deserialize(&buf).map_err(|e| anyhow::anyhow!("deserialize error: {}", e))
}

fn map_read_err(e: std::io::Error) -> anyhow::Error {
    match e.kind() {
        std::io::ErrorKind::UnexpectedEof => anyhow::anyhow!("connection closed by peer"),
        std::io::ErrorKind::ConnectionReset => anyhow::anyhow!("connection reset by peer"),
        _ => anyhow::anyhow!("read error: {}", e),
    }
}

pub struct TcpTx {
    writer: OwnedWriteHalf,
}

pub struct TcpRx {
    reader: OwnedReadHalf,
}

#[async_trait::async_trait]
impl Transport for TcpTransport {
    async fn send(&mut self, msg: Message) -> anyhow::Result<()> {
        write_frame(&mut self.writer, &msg).await
    }

    async fn recv(&mut self) -> anyhow::Result<Message> {
        read_frame(&mut self.reader).await
    }

    fn into_split(self: Box<Self>) -> (Box<dyn TransportTx>, Box<dyn TransportRx>) {
        (
            Box::new(TcpTx {
                writer: self.writer,
            }),
            Box::new(TcpRx {
                reader: self.reader,
            }),
        )
    }
}

#[async_trait::async_trait]
impl TransportTx for TcpTx {
    async fn send(&mut self, msg: Message) -> anyhow::Result<()> {
        write_frame(&mut self.writer, &msg).await
    }
}

#[async_trait::async_trait]
impl TransportRx for TcpRx {
    async fn recv(&mut self) -> anyhow::Result<Message> {
        read_frame(&mut self.reader).await
    }
}
