//! Byte transport capability
//!
//! The core consumes exactly two operations: read one byte, write a whole
//! buffer. Keeping that capability behind a trait lets the parser, search
//! loop, and engine run unchanged against TCP or an in-memory script.

use crate::{Error, Result};
use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

/// Blocking byte I/O consumed by the job loop.
///
/// Both operations complete fully or fail; there is no partial success and
/// no retry at this layer.
#[async_trait]
pub trait Transport: Send {
    /// Read a single byte, waiting until one is available
    async fn read_byte(&mut self) -> Result<u8>;

    /// Write the whole buffer
    async fn write_bytes(&mut self, buf: &[u8]) -> Result<()>;
}

/// Transport over a TCP stream
pub struct TcpTransport {
    stream: TcpStream,
}

impl TcpTransport {
    /// Wrap an accepted TCP stream
    pub fn new(stream: TcpStream) -> Self {
        Self { stream }
    }
}

#[async_trait]
impl Transport for TcpTransport {
    async fn read_byte(&mut self) -> Result<u8> {
        let mut byte = [0u8; 1];
        let n = self
            .stream
            .read(&mut byte)
            .await
            .map_err(|e| Error::transport(format!("read failed: {e}")))?;
        if n == 0 {
            return Err(Error::transport("connection closed"));
        }
        Ok(byte[0])
    }

    async fn write_bytes(&mut self, buf: &[u8]) -> Result<()> {
        self.stream
            .write_all(buf)
            .await
            .map_err(|e| Error::transport(format!("write failed: {e}")))
    }
}

/// In-memory transport fed from a scripted input buffer, capturing writes.
///
/// Used by tests and by the engine tests to drive full job/share exchanges
/// without a socket.
#[derive(Debug, Default)]
pub struct MemoryTransport {
    input: Vec<u8>,
    position: usize,
    output: Vec<u8>,
}

impl MemoryTransport {
    /// Create a transport that will serve the given bytes
    pub fn new(input: impl Into<Vec<u8>>) -> Self {
        Self {
            input: input.into(),
            position: 0,
            output: Vec::new(),
        }
    }

    /// Everything written so far
    pub fn written(&self) -> &[u8] {
        &self.output
    }
}

#[async_trait]
impl Transport for MemoryTransport {
    async fn read_byte(&mut self) -> Result<u8> {
        match self.input.get(self.position) {
            Some(&byte) => {
                self.position += 1;
                Ok(byte)
            }
            None => Err(Error::transport("input exhausted")),
        }
    }

    async fn write_bytes(&mut self, buf: &[u8]) -> Result<()> {
        self.output.extend_from_slice(buf);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[tokio::test]
    async fn test_memory_transport_reads_in_order() {
        let mut transport = MemoryTransport::new(vec![1u8, 2, 3]);
        assert_eq!(transport.read_byte().await.unwrap(), 1);
        assert_eq!(transport.read_byte().await.unwrap(), 2);
        assert_eq!(transport.read_byte().await.unwrap(), 3);
        assert_matches!(
            transport.read_byte().await,
            Err(Error::Transport { .. })
        );
    }

    #[tokio::test]
    async fn test_memory_transport_captures_writes() {
        let mut transport = MemoryTransport::new(Vec::new());
        transport.write_bytes(b"abc").await.unwrap();
        transport.write_bytes(b"def").await.unwrap();
        assert_eq!(transport.written(), b"abcdef");
    }

    #[tokio::test]
    async fn test_tcp_transport_eof_is_transport_error() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let client = tokio::spawn(async move {
            let stream = TcpStream::connect(addr).await.unwrap();
            drop(stream); // immediate close
        });

        let (stream, _) = listener.accept().await.unwrap();
        let mut transport = TcpTransport::new(stream);
        client.await.unwrap();

        assert_matches!(
            transport.read_byte().await,
            Err(Error::Transport { .. })
        );
    }
}
