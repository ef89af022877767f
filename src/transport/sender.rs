//! One-shot TCP delivery of signed packets
use log::{debug, warn};
use std::future::Future;
use std::io;
use std::time::Duration;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;

use crate::error::SendError;

/// Timeouts applied to each delivery
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SendOptions {
    pub connect_timeout: Duration,
    /// Limit for each individual write call, not the whole packet
    pub write_timeout: Duration,
}

impl Default for SendOptions {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            write_timeout: Duration::from_secs(10),
        }
    }
}

/// Outcome of a successful delivery
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SendReport {
    pub bytes: usize,
    pub writes: usize,
}

/// Write the whole packet, looping over short writes
///
/// Returns the number of write calls issued. A write that makes no
/// progress means the peer is gone and fails with `WriteZero`; nothing is
/// reported as sent in that case.
pub async fn write_all_counted<W>(
    writer: &mut W,
    packet: &[u8],
    write_timeout: Duration,
) -> Result<usize, SendError>
where
    W: AsyncWrite + Unpin,
{
    let total = packet.len();
    let mut sent = 0;
    let mut writes = 0;

    while sent < total {
        let n = match timeout(write_timeout, writer.write(&packet[sent..])).await {
            Ok(Ok(n)) => n,
            Ok(Err(e)) => return Err(SendError::Write(e)),
            Err(_) => return Err(SendError::WriteTimeout { sent, total }),
        };
        writes += 1;

        if n == 0 {
            return Err(SendError::WriteZero { sent, total });
        }

        sent += n;
        if sent < total {
            debug!("Short write: {} of {} bytes sent", sent, total);
        }
    }

    writer.flush().await?;
    Ok(writes)
}

/// Await a connection attempt for at most `limit`
async fn connect_within<T, F>(addr: &str, limit: Duration, connect: F) -> Result<T, SendError>
where
    F: Future<Output = io::Result<T>>,
{
    match timeout(limit, connect).await {
        Ok(Ok(stream)) => Ok(stream),
        Ok(Err(source)) => Err(SendError::Connect {
            addr: addr.to_string(),
            source,
        }),
        Err(_) => Err(SendError::ConnectTimeout {
            addr: addr.to_string(),
            timeout: limit,
        }),
    }
}

/// Open a new connection to `host:port`, write the packet and close it
///
/// No acknowledgment is read back: success means every byte was handed to
/// the transport. The stream is owned by this function and is closed on
/// every return path.
pub async fn send_packet(
    packet: &[u8],
    host: &str,
    port: u16,
    options: &SendOptions,
) -> Result<SendReport, SendError> {
    let addr = format!("{}:{}", host, port);

    let mut stream = connect_within(
        &addr,
        options.connect_timeout,
        TcpStream::connect((host, port)),
    )
    .await?;

    if let Err(e) = stream.set_nodelay(true) {
        debug!("Failed to set TCP_NODELAY on {}: {}", addr, e);
    }

    let writes = write_all_counted(&mut stream, packet, options.write_timeout).await?;

    // Bytes are already delivered to the transport; a failed FIN is not a send failure
    if let Err(e) = stream.shutdown().await {
        warn!("Failed to shut down connection to {}: {}", addr, e);
    }

    Ok(SendReport {
        bytes: packet.len(),
        writes,
    })
}
