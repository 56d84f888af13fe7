//! Message framing for the MCP byte-stream transports.
//!
//! Frame format: one UTF-8 JSON message per line.
//! ```text
//! {"jsonrpc":"2.0","id":1,"method":"ping"}\n
//! ```
//! Blank lines are skipped. A trailing `\r` is stripped.

use serde::Serialize;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

/// One line read off the stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    Message(Vec<u8>),
    /// The line exceeded the size cap and was discarded; holds its length.
    Oversized(usize),
}

/// Read one frame from the stream.
///
/// Returns `None` on clean EOF. Lines longer than `max_message_bytes` are
/// drained without being buffered.
pub async fn read_message<R: AsyncBufRead + Unpin>(
    reader: &mut R,
    max_message_bytes: usize,
) -> std::io::Result<Option<Frame>> {
    loop {
        let mut line = Vec::new();
        let mut line_len = 0usize;
        let mut saw_bytes = false;

        loop {
            let (consumed, done) = {
                let available = reader.fill_buf().await?;
                if available.is_empty() {
                    (0, true)
                } else {
                    saw_bytes = true;
                    let (chunk, consumed, done) = match available.iter().position(|b| *b == b'\n') {
                        Some(i) => (&available[..i], i + 1, true),
                        None => (available, available.len(), false),
                    };
                    line_len += chunk.len();
                    if line_len <= max_message_bytes {
                        line.extend_from_slice(chunk);
                    } else {
                        line = Vec::new();
                    }
                    (consumed, done)
                }
            };
            reader.consume(consumed);
            if done {
                break;
            }
        }

        if !saw_bytes {
            return Ok(None);
        }
        if line_len > max_message_bytes {
            return Ok(Some(Frame::Oversized(line_len)));
        }
        if line.last() == Some(&b'\r') {
            line.pop();
        }
        if line.iter().all(u8::is_ascii_whitespace) {
            continue;
        }
        return Ok(Some(Frame::Message(line)));
    }
}

/// Write one message followed by a newline and flush.
pub async fn write_message<W: AsyncWrite + Unpin, T: Serialize>(
    writer: &mut W,
    message: &T,
) -> std::io::Result<()> {
    let mut payload = serde_json::to_vec(message).map_err(|e| {
        tracing::error!("JSON encoding failed: {}", e);
        std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
    })?;
    payload.push(b'\n');
    writer.write_all(&payload).await?;
    writer.flush().await?;
    Ok(())
}
