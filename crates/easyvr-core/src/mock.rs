//! Scripted mock transport for testing.
//!
//! [`MockTransport`] plays the module side of the link from a queue of
//! reply bytes and records everything the host writes. It is a cheap
//! cloneable handle: keep one clone in the test and move another into the
//! engine.
//!
//! # Features
//!
//! - **Scripted replies**: queue status and argument bytes up front
//! - **Failure injection**: make writes fail with an I/O error
//! - **Latency simulation**: delay replies to exercise timeouts

use std::collections::VecDeque;
use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use easyvr_types::codec;

use crate::transport::{Transport, Wait};

#[derive(Debug, Default)]
struct MockState {
    replies: Mutex<VecDeque<u8>>,
    written: Mutex<Vec<u8>>,
    read_count: AtomicU32,
    write_count: AtomicU32,
    fail_writes: AtomicBool,
    /// Simulated reply latency in milliseconds (0 = no delay).
    latency_ms: AtomicU64,
}

/// A scripted EasyVR module for tests.
///
/// A read with nothing queued reports "no data" at once, whatever the wait,
/// so tests never sleep on an exhausted script.
///
/// # Example
///
/// ```
/// use easyvr_core::{EasyVr, MockTransport};
///
/// #[tokio::main]
/// async fn main() {
///     let mock = MockTransport::new();
///     mock.queue_reply(b"o").await;
///
///     let mut easyvr = EasyVr::new(mock.clone());
///     assert!(easyvr.add_command(3, 5).await.unwrap());
///     assert_eq!(mock.written().await, b"gDF");
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct MockTransport {
    state: Arc<MockState>,
}

impl MockTransport {
    /// Create a mock with an empty script.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append raw reply bytes to the script.
    pub async fn queue_reply(&self, bytes: &[u8]) {
        self.state.replies.lock().await.extend(bytes);
    }

    /// Append argument values to the script, encoded.
    ///
    /// # Panics
    ///
    /// Panics if a value is outside `-1..=31`.
    pub async fn queue_arguments(&self, values: &[i32]) {
        let mut replies = self.state.replies.lock().await;
        for value in values {
            let byte = codec::encode(*value)
                .unwrap_or_else(|_| panic!("mock argument {value} is not encodable"));
            replies.push_back(byte);
        }
    }

    /// Number of scripted bytes not yet read.
    pub async fn pending_replies(&self) -> usize {
        self.state.replies.lock().await.len()
    }

    /// Everything the host has written so far.
    pub async fn written(&self) -> Vec<u8> {
        self.state.written.lock().await.clone()
    }

    /// Take and clear the write log.
    pub async fn take_written(&self) -> Vec<u8> {
        std::mem::take(&mut *self.state.written.lock().await)
    }

    /// Make every following write fail.
    pub fn set_fail_writes(&self, fail: bool) {
        self.state.fail_writes.store(fail, Ordering::Relaxed);
    }

    /// Set simulated reply latency.
    ///
    /// A read whose wait is shorter than the latency gets no data.
    /// Set to `Duration::ZERO` to disable latency simulation.
    pub fn set_latency(&self, latency: Duration) {
        self.state
            .latency_ms
            .store(latency.as_millis() as u64, Ordering::Relaxed);
    }

    /// Number of read attempts, including ones that got no data.
    pub fn read_count(&self) -> u32 {
        self.state.read_count.load(Ordering::Relaxed)
    }

    /// Number of successful write calls.
    pub fn write_count(&self) -> u32 {
        self.state.write_count.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn write(&mut self, bytes: &[u8]) -> io::Result<()> {
        if self.state.fail_writes.load(Ordering::Relaxed) {
            return Err(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "mock write failure",
            ));
        }
        self.state.write_count.fetch_add(1, Ordering::Relaxed);
        self.state.written.lock().await.extend_from_slice(bytes);
        Ok(())
    }

    async fn read_byte(&mut self, wait: Wait) -> io::Result<Option<u8>> {
        self.state.read_count.fetch_add(1, Ordering::Relaxed);

        let latency = Duration::from_millis(self.state.latency_ms.load(Ordering::Relaxed));
        if !latency.is_zero() && !self.state.replies.lock().await.is_empty() {
            match wait {
                Wait::Immediate => return Ok(None),
                Wait::Within(limit) if limit < latency => {
                    tokio::time::sleep(limit).await;
                    return Ok(None);
                }
                _ => tokio::time::sleep(latency).await,
            }
        }

        Ok(self.state.replies.lock().await.pop_front())
    }
}
