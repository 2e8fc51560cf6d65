//! Async protocol engine for EasyVR speech recognition modules.
//!
//! EasyVR modules talk a half-duplex, byte-oriented protocol over a serial
//! line: the host sends a command byte and encoded arguments, and the module
//! answers with a status byte and further arguments, each requested with an
//! ACK. This crate drives that protocol over any async byte stream.
//!
//! # Features
//!
//! - **Custom commands**: add, label, train, recognise, export and import
//! - **Built-in words and grammars**: recognition and label dumps
//! - **Recorded messages**: record, play, erase and memory maintenance
//! - **Sound table**: playback, phone tones and table dumps
//! - **SonicNet tokens**: send, embed into playback and detect
//! - **I/O pins and lip-sync**
//! - **Link health**: retry with backoff and link metrics
//!
//! # Quick Start
//!
//! ```no_run
//! use easyvr_core::{EasyVr, StreamTransport};
//! use easyvr_core::easyvr_types::Language;
//!
//! # async fn example(port: tokio::io::DuplexStream) -> easyvr_core::Result<()> {
//! let mut easyvr = EasyVr::new(StreamTransport::new(port));
//! if !easyvr.detect().await? {
//!     return Ok(());
//! }
//! easyvr.set_language(Language::English).await?;
//!
//! easyvr.recognize_command(1).await?;
//! while !easyvr.has_finished().await? {
//!     tokio::time::sleep(std::time::Duration::from_millis(20)).await;
//! }
//! if let Some(index) = easyvr.get_command() {
//!     println!("Recognised command {index}");
//! }
//! # Ok(())
//! # }
//! ```

pub mod channel;
pub mod commands;
pub mod config;
pub mod device;
pub mod error;
pub mod grammar;
pub mod lipsync;
pub mod messages;
pub mod metrics;
pub mod mock;
pub mod pins;
pub mod retry;
pub mod service;
pub mod settings;
pub mod sonicnet;
pub mod sound;
pub mod status;
pub mod transport;

pub use easyvr_types;

// Core exports
pub use channel::Channel;
pub use config::EngineConfig;
pub use device::{EasyVr, Pending};
pub use error::{Error, Result};
pub use metrics::{LatencySummary, LinkMetrics, LinkMetricsSummary};
pub use mock::MockTransport;
pub use retry::{RetryConfig, with_retry};
pub use status::{RecognitionKind, SessionState, StatusFlags, StatusOutcome};
pub use transport::{StreamTransport, Transport, Wait};

/// Type alias for an engine shared between tasks.
///
/// The protocol allows one transaction at a time, so the engine sits behind
/// an async mutex and each lock covers whole transactions.
///
/// # Example
///
/// ```
/// use easyvr_core::{EasyVr, MockTransport, SharedEasyVr};
///
/// # async fn example() -> easyvr_core::Result<()> {
/// let shared: SharedEasyVr<MockTransport> = EasyVr::new(MockTransport::new()).into_shared();
///
/// let task_side = std::sync::Arc::clone(&shared);
/// tokio::spawn(async move {
///     let _ = task_side.lock().await.get_id().await;
/// });
/// # Ok(())
/// # }
/// ```
pub type SharedEasyVr<T> = std::sync::Arc<tokio::sync::Mutex<EasyVr<T>>>;
