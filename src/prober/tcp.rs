//! TCP connect probe.
//!
//! Measures how long the operating system takes to complete a TCP
//! handshake with the target. No payload is sent; the stream is closed
//! as soon as the connection is established.

use crate::error::{ProbeError, ProbeResult};
use crate::prober::traits::Connector;
use async_trait::async_trait;
use std::future::Future;
use std::io;
use std::net::SocketAddrV4;
use std::time::{Duration, Instant};
use tokio::net::TcpStream;
use tokio::time::timeout;

/// Connector backed by real TCP sockets.
///
/// Does not require elevated privileges.
#[derive(Debug, Clone, Copy, Default)]
pub struct TcpConnector;

impl TcpConnector {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Connector for TcpConnector {
    async fn connect(&self, addr: SocketAddrV4, connect_timeout: Duration) -> ProbeResult<u64> {
        timed_connect(addr, connect_timeout, TcpStream::connect(addr)).await
    }
}

/// Time a pending handshake, bounded by `connect_timeout`.
///
/// Dropping the handshake future on timeout closes the pending socket.
async fn timed_connect<F, S>(
    addr: SocketAddrV4,
    connect_timeout: Duration,
    handshake: F,
) -> ProbeResult<u64>
where
    F: Future<Output = io::Result<S>>,
{
    let start = Instant::now();

    match timeout(connect_timeout, handshake).await {
        Ok(Ok(stream)) => {
            let elapsed = start.elapsed().as_millis() as u64;
            drop(stream);
            Ok(elapsed)
        }
        Ok(Err(source)) => Err(ProbeError::Connection { addr, source }),
        Err(_) => Err(ProbeError::Timeout {
            addr,
            timeout: connect_timeout,
        }),
    }
}
