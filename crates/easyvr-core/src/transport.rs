//! Byte-stream transport abstraction.
//!
//! The engine needs only two things from the link: write some bytes, and
//! read one byte with a bounded wait. [`StreamTransport`] provides both over
//! any tokio stream (a serial port, a TCP bridge, a duplex pipe in tests).

use std::io;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// How long a single-byte read may wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wait {
    /// Return at once if no byte is pending.
    Immediate,
    /// Wait at most this long.
    Within(Duration),
    /// Block until a byte arrives.
    Forever,
}

impl From<Duration> for Wait {
    fn from(duration: Duration) -> Self {
        if duration.is_zero() {
            Wait::Immediate
        } else {
            Wait::Within(duration)
        }
    }
}

/// A half-duplex byte link to the module.
///
/// `read_byte` returns `Ok(None)` when nothing arrived in time. Errors are
/// reserved for the link itself failing.
#[async_trait]
pub trait Transport: Send {
    /// Write all of `bytes`.
    async fn write(&mut self, bytes: &[u8]) -> io::Result<()>;

    /// Read one byte, waiting as allowed by `wait`.
    async fn read_byte(&mut self, wait: Wait) -> io::Result<Option<u8>>;

    /// Push buffered output to the wire.
    async fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// [`Transport`] over any async byte stream.
#[derive(Debug)]
pub struct StreamTransport<S> {
    stream: S,
}

impl<S> StreamTransport<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    /// Wrap an already opened and configured stream.
    pub fn new(stream: S) -> Self {
        Self { stream }
    }

    /// Get a reference to the underlying stream.
    pub fn get_ref(&self) -> &S {
        &self.stream
    }

    /// Unwrap the underlying stream.
    pub fn into_inner(self) -> S {
        self.stream
    }
}

#[async_trait]
impl<S> Transport for StreamTransport<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    async fn write(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.stream.write_all(bytes).await
    }

    async fn read_byte(&mut self, wait: Wait) -> io::Result<Option<u8>> {
        let mut buf = [0u8; 1];
        let limit = match wait {
            Wait::Immediate => Some(Duration::ZERO),
            Wait::Within(duration) => Some(duration),
            Wait::Forever => None,
        };

        let read = match limit {
            None => self.stream.read(&mut buf).await?,
            Some(limit) => match tokio::time::timeout(limit, self.stream.read(&mut buf)).await {
                Ok(result) => result?,
                Err(_) => return Ok(None),
            },
        };

        if read == 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "transport closed",
            ));
        }
        Ok(Some(buf[0]))
    }

    async fn flush(&mut self) -> io::Result<()> {
        self.stream.flush().await
    }
}
