use std::net::SocketAddr;

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream, ToSocketAddrs};
use tokio::time::{timeout, Duration};

use super::{LocalOracle, MoveOracle, OracleRequest};

/// Default timeout for network operations (10 seconds).
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Maximum frame size (1 MB). A full request is a few kilobytes.
const MAX_FRAME_SIZE: u32 = 1_000_000;

fn io_error(e: std::io::Error) -> anyhow::Error {
    match e.kind() {
        std::io::ErrorKind::UnexpectedEof => anyhow::anyhow!("Connection closed by peer"),
        std::io::ErrorKind::ConnectionReset => anyhow::anyhow!("Connection reset by peer"),
        std::io::ErrorKind::BrokenPipe => anyhow::anyhow!("Connection closed by peer"),
        _ => anyhow::anyhow!("IO error: {}", e),
    }
}

/// Write one length-prefixed frame (u32 big-endian length, then payload).
pub async fn write_frame<W>(stream: &mut W, data: &[u8], max: u32) -> anyhow::Result<()>
where
    W: AsyncWrite + Unpin,
{
    if data.len() as u64 > max as u64 {
        anyhow::bail!("Frame too large: {} bytes (max: {})", data.len(), max);
    }
    let len = (data.len() as u32).to_be_bytes();
    stream.write_all(&len).await.map_err(io_error)?;
    stream.write_all(data).await.map_err(io_error)?;
    stream.flush().await.map_err(io_error)?;
    Ok(())
}

/// Read one length-prefixed frame.
pub async fn read_frame<R>(stream: &mut R, max: u32) -> anyhow::Result<Vec<u8>>
where
    R: AsyncRead + Unpin,
{
    let mut len_buf = [0u8; 4];
    stream.read_exact(&mut len_buf).await.map_err(io_error)?;
    let len = u32::from_be_bytes(len_buf);
    if len > max {
        anyhow::bail!("Frame too large: {} bytes (max: {})", len, max);
    }
    if len == 0 {
        anyhow::bail!("Invalid frame length: 0");
    }
    let mut buf = vec![0u8; len as usize];
    stream.read_exact(&mut buf).await.map_err(io_error)?;
    Ok(buf)
}

/// Client for an external suggestion service speaking JSON frames over TCP.
///
/// The stream is held only between completed exchanges. A request that
/// fails, times out or is cancelled drops the connection, so a late reply can
/// never be read as the answer to a later request; the next call reconnects.
pub struct TcpOracle {
    stream: Option<TcpStream>,
    peer: Option<SocketAddr>,
    timeout_duration: Duration,
    max_frame_size: u32,
}

impl TcpOracle {
    pub fn new(stream: TcpStream) -> Self {
        Self::with_timeout(stream, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(stream: TcpStream, timeout_duration: Duration) -> Self {
        Self {
            peer: stream.peer_addr().ok(),
            stream: Some(stream),
            timeout_duration,
            max_frame_size: MAX_FRAME_SIZE,
        }
    }

    pub async fn connect<A: ToSocketAddrs>(addr: A) -> anyhow::Result<Self> {
        let stream = timeout(DEFAULT_TIMEOUT, TcpStream::connect(addr))
            .await
            .map_err(|_| anyhow::anyhow!("Connect timeout after {:?}", DEFAULT_TIMEOUT))??;
        Ok(Self::new(stream))
    }

    /// Whether a connection is currently held.
    pub fn is_connected(&self) -> bool {
        self.stream.is_some()
    }

    async fn reconnect(&self) -> anyhow::Result<TcpStream> {
        let peer = self
            .peer
            .ok_or_else(|| anyhow::anyhow!("Oracle connection lost and peer unknown"))?;
        log::info!("reconnecting to oracle at {}", peer);
        let stream = timeout(self.timeout_duration, TcpStream::connect(peer))
            .await
            .map_err(|_| anyhow::anyhow!("Connect timeout after {:?}", self.timeout_duration))??;
        Ok(stream)
    }
}

#[async_trait]
impl MoveOracle for TcpOracle {
    async fn suggest(&mut self, request: &OracleRequest) -> anyhow::Result<String> {
        let data = serde_json::to_vec(request)
            .map_err(|e| anyhow::anyhow!("Serialization error: {}", e))?;
        let mut stream = match self.stream.take() {
            Some(stream) => stream,
            None => self.reconnect().await?,
        };
        let max = self.max_frame_size;
        let limit = self.timeout_duration;
        let exchange = async {
            write_frame(&mut stream, &data, max).await?;
            let reply = read_frame(&mut stream, max).await?;
            String::from_utf8(reply).map_err(|e| anyhow::anyhow!("Reply is not UTF-8: {}", e))
        };
        let reply = timeout(limit, exchange)
            .await
            .map_err(|_| anyhow::anyhow!("Oracle timeout after {:?}", limit))??;
        self.stream = Some(stream);
        Ok(reply)
    }
}

/// Answer requests on one connection until the peer hangs up.
async fn handle_connection(mut stream: TcpStream, mut oracle: LocalOracle) -> anyhow::Result<()> {
    loop {
        let frame = match read_frame(&mut stream, MAX_FRAME_SIZE).await {
            Ok(frame) => frame,
            Err(e) => {
                log::debug!("oracle connection finished: {}", e);
                return Ok(());
            }
        };
        let request: OracleRequest = serde_json::from_slice(&frame)
            .map_err(|e| anyhow::anyhow!("Deserialization error: {}", e))?;
        let reply = oracle.suggest(&request).await?;
        write_frame(&mut stream, reply.as_bytes(), MAX_FRAME_SIZE).await?;
    }
}

/// Serve the local heuristic over TCP. Each connection gets its own oracle,
/// seeded from `seed` plus the connection number when a seed is given.
pub async fn serve_oracle(listener: TcpListener, seed: Option<u64>) -> anyhow::Result<()> {
    let mut connections: u64 = 0;
    loop {
        let (stream, peer) = listener.accept().await?;
        connections += 1;
        log::info!("oracle client connected from {}", peer);
        let oracle = match seed {
            Some(s) => LocalOracle::seeded(s.wrapping_add(connections)),
            None => LocalOracle::new(),
        };
        tokio::spawn(async move {
            if let Err(e) = handle_connection(stream, oracle).await {
                log::warn!("oracle connection from {} failed: {}", peer, e);
            }
        });
    }
}
