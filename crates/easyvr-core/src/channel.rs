//! Command/argument channel.
//!
//! Framing primitives on top of a [`Transport`]. The module never volunteers
//! an argument: the host asks for each one by writing the ACK byte and then
//! reads a single byte from the argument alphabet.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::debug;

use easyvr_types::codec;

use crate::error::{Error, Result};
use crate::metrics::LinkMetrics;
use crate::transport::{Transport, Wait};

/// Framing layer owned by the engine.
///
/// The channel remembers which operation sent the last command byte so
/// timeout and protocol errors name the transaction they broke.
#[derive(Debug)]
pub struct Channel<T> {
    transport: T,
    metrics: Arc<LinkMetrics>,
    operation: &'static str,
    sent_at: Option<Instant>,
}

impl<T: Transport> Channel<T> {
    /// Wrap a transport.
    pub fn new(transport: T, metrics: Arc<LinkMetrics>) -> Self {
        Self {
            transport,
            metrics,
            operation: "idle",
            sent_at: None,
        }
    }

    /// Name of the operation that sent the last command byte.
    pub fn operation(&self) -> &'static str {
        self.operation
    }

    /// Unwrap the transport.
    pub fn into_transport(self) -> T {
        self.transport
    }

    /// Start a transaction by writing its command byte.
    pub async fn send_command(&mut self, operation: &'static str, command: u8) -> Result<()> {
        self.operation = operation;
        debug!("{}: command '{}'", operation, command as char);
        self.write(&[command]).await?;
        self.metrics.record_transaction();
        self.sent_at = Some(Instant::now());
        Ok(())
    }

    /// Write one encoded argument.
    pub async fn send_argument(&mut self, value: impl Into<i32>) -> Result<()> {
        let byte = codec::encode(value.into())?;
        self.write(&[byte]).await
    }

    /// Write several encoded arguments.
    ///
    /// All values are encoded before anything is written.
    pub async fn send_arguments(&mut self, values: &[i32]) -> Result<()> {
        let bytes = values
            .iter()
            .map(|value| codec::encode(*value))
            .collect::<easyvr_types::ParseResult<Vec<u8>>>()?;
        self.write(&bytes).await
    }

    /// Write a literal byte (label characters, sub-request bytes, ACK).
    pub async fn send_raw(&mut self, byte: u8) -> Result<()> {
        self.write(&[byte]).await
    }

    /// Write literal bytes.
    pub async fn send_raw_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        self.write(bytes).await
    }

    /// Request one argument byte and return it undecoded.
    ///
    /// The byte must still belong to the argument alphabet.
    pub async fn receive_raw(&mut self, timeout: Duration) -> Result<u8> {
        self.send_raw(codec::ARG_ACK).await?;
        let byte = self.read_bounded(timeout).await?;
        if !codec::is_argument_byte(byte) {
            self.metrics.record_protocol_fault();
            return Err(Error::protocol(
                self.operation,
                format!("byte 0x{byte:02X} is not an argument"),
            ));
        }
        self.metrics.record_byte_read();
        Ok(byte)
    }

    /// Request and decode one argument.
    pub async fn receive_argument(&mut self, timeout: Duration) -> Result<i8> {
        let byte = self.receive_raw(timeout).await?;
        Ok(codec::decode(byte)?)
    }

    /// Read the status byte that opens a reply. No ACK is sent.
    pub async fn read_status(&mut self, timeout: Duration) -> Result<u8> {
        let byte = self.read_bounded(timeout).await?;
        self.metrics.record_byte_read();
        if let Some(sent_at) = self.sent_at.take() {
            self.metrics.reply_latency.record(sent_at.elapsed());
        }
        debug!("{}: status '{}'", self.operation, byte as char);
        Ok(byte)
    }

    /// Read a status byte only if one is already waiting.
    pub async fn poll_status(&mut self) -> Result<Option<u8>> {
        match self.read(Wait::Immediate).await? {
            Some(byte) => {
                self.metrics.record_byte_read();
                debug!("{}: status '{}' (polled)", self.operation, byte as char);
                Ok(Some(byte))
            }
            None => Ok(None),
        }
    }

    async fn read_bounded(&mut self, timeout: Duration) -> Result<u8> {
        match self.read(Wait::from(timeout)).await? {
            Some(byte) => Ok(byte),
            None => {
                self.metrics.record_timeout();
                Err(Error::timeout(self.operation, timeout))
            }
        }
    }

    async fn read(&mut self, wait: Wait) -> Result<Option<u8>> {
        self.transport.read_byte(wait).await.map_err(|e| {
            self.metrics.record_io_error();
            Error::Io(e)
        })
    }

    async fn write(&mut self, bytes: &[u8]) -> Result<()> {
        if let Err(e) = self.transport.write(bytes).await {
            self.metrics.record_io_error();
            return Err(Error::Io(e));
        }
        self.metrics.record_bytes_written(bytes.len() as u64);
        Ok(())
    }
}
