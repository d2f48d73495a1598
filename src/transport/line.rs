//! Raw line-protocol client.
//!
//! One [`LineClient`] drives exactly one login+request cycle over a single
//! TCP connection and is dropped afterwards. No pooling: separate connections
//! are part of protocol realism and of the timing-jitter contract.

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::time::{timeout, Duration};

use crate::error::BotError;

/// Bounded-timeout client for line-oriented request/response protocols.
#[derive(Debug)]
pub struct LineClient {
    reader: BufReader<TcpStream>,
    call_timeout: Duration,
    peer: String,
}

impl LineClient {
    /// Open a connection to `host:port`. The same timeout bounds the connect
    /// and every subsequent read/write.
    pub async fn connect(host: &str, port: u16, call_timeout: Duration) -> Result<Self, BotError> {
        let peer = format!("{host}:{port}");
        let stream = timeout(call_timeout, TcpStream::connect(&peer))
            .await
            .map_err(|_| BotError::transport(format!("connect to {peer} timed out")))?
            .map_err(|e| BotError::transport(format!("connect to {peer} failed: {e}")))?;
        Ok(Self {
            reader: BufReader::new(stream),
            call_timeout,
            peer,
        })
    }

    /// Send one command line; the trailing newline is appended here.
    pub async fn send_line(&mut self, command: &str) -> Result<(), BotError> {
        let stream = self.reader.get_mut();
        timeout(self.call_timeout, async {
            stream.write_all(command.as_bytes()).await?;
            stream.write_all(b"\n").await?;
            stream.flush().await
        })
        .await
        .map_err(|_| BotError::transport(format!("write to {} timed out", self.peer)))?
        .map_err(|e| BotError::transport(format!("write to {} failed: {e}", self.peer)))
    }

    /// Read one response line, with the line terminator trimmed.
    pub async fn read_line(&mut self) -> Result<String, BotError> {
        let mut line = String::new();
        let read = timeout(self.call_timeout, self.reader.read_line(&mut line))
            .await
            .map_err(|_| BotError::transport(format!("read from {} timed out", self.peer)))?
            .map_err(|e| BotError::transport(format!("read from {} failed: {e}", self.peer)))?;
        if read == 0 {
            return Err(BotError::transport(format!(
                "connection to {} closed by peer",
                self.peer
            )));
        }
        Ok(line.trim_end_matches(['\r', '\n']).to_string())
    }

    /// Read a multi-line response block terminated by a lone `.` line.
    ///
    /// The whole block is bounded by a single call timeout so a drip-feeding
    /// target cannot stall the attempt.
    pub async fn read_block(&mut self) -> Result<String, BotError> {
        timeout(self.call_timeout, async {
            let mut block = String::new();
            loop {
                let mut line = String::new();
                let read = self
                    .reader
                    .read_line(&mut line)
                    .await
                    .map_err(|e| BotError::transport(format!("read failed: {e}")))?;
                if read == 0 {
                    // EOF also ends the block; some targets just close.
                    return Ok(block);
                }
                if line.trim_end_matches(['\r', '\n']) == "." {
                    return Ok(block);
                }
                block.push_str(&line);
            }
        })
        .await
        .map_err(|_| BotError::transport(format!("read from {} timed out", self.peer)))?
    }
}

/// Extract the text between the first `open`/`close` delimiter pair.
///
/// Used by adapters to pull assigned identifiers like `(ID: 42)` out of a
/// response line.
pub fn extract_delimited<'a>(haystack: &'a str, open: &str, close: &str) -> Option<&'a str> {
    let start = haystack.find(open)? + open.len();
    let end = haystack[start..].find(close)? + start;
    Some(&haystack[start..end])
}
