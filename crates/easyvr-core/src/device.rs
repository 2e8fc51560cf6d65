//! EasyVR protocol engine.
//!
//! [`EasyVr`] owns the transport, the session state and the marker of the
//! transaction in flight. The protocol is strictly half-duplex, so every
//! operation takes `&mut self` and refuses to start while another
//! transaction is still outstanding. Share an engine between tasks through
//! [`SharedEasyVr`].
//!
//! Operations are grouped by feature in sibling modules (`settings`,
//! `commands`, `grammar`, `messages`, `sound`, `sonicnet`, `pins`,
//! `lipsync`, `service`); this module holds construction, the transaction
//! helpers they share, housekeeping and the result accessors.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use easyvr_types::label::LabelDecoder;
use easyvr_types::protocol::{CMD_BAUDRATE, CMD_BREAK, CMD_ID, CMD_SLEEP, STS_INTERR, STS_SUCCESS};
use easyvr_types::types::{COMMAND_MAX, GROUP_MAX};
use easyvr_types::{Baudrate, ErrorCode, ModuleId, ParseError, StatusCode, WakeMode};

use crate::channel::Channel;
use crate::config::EngineConfig;
use crate::error::{Error, Result};
use crate::metrics::LinkMetrics;
use crate::status::{SessionState, StatusOutcome, decode_status};
use crate::transport::Transport;
use crate::SharedEasyVr;

/// The transaction currently outstanding on the link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Pending {
    /// Nothing outstanding.
    #[default]
    Idle,
    /// An asynchronous operation waiting for [`EasyVr::has_finished`].
    Async { operation: &'static str },
    /// The module sleeps until woken or until it reports `awakened`.
    Asleep,
    /// A lip-sync stream read with [`EasyVr::fetch_mouth_position`].
    LipSync,
    /// Word labels still to be read with [`EasyVr::next_word_label`].
    GrammarLabels { remaining: u8 },
}

impl fmt::Display for Pending {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Pending::Idle => write!(f, "idle"),
            Pending::Async { operation } => write!(f, "'{operation}' still running"),
            Pending::Asleep => write!(f, "module asleep"),
            Pending::LipSync => write!(f, "lip-sync stream active"),
            Pending::GrammarLabels { remaining } => {
                write!(f, "{remaining} grammar labels still to read")
            }
        }
    }
}

/// Client for one EasyVR module on one transport.
#[derive(Debug)]
pub struct EasyVr<T> {
    pub(crate) channel: Channel<T>,
    pub(crate) session: SessionState,
    pub(crate) pending: Pending,
    pub(crate) config: EngineConfig,
    metrics: Arc<LinkMetrics>,
}

impl<T: Transport> EasyVr<T> {
    /// Create an engine with the default configuration.
    pub fn new(transport: T) -> Self {
        Self::build(transport, EngineConfig::default())
    }

    /// Create an engine with a custom configuration.
    pub fn with_config(transport: T, config: EngineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(transport, config))
    }

    fn build(transport: T, config: EngineConfig) -> Self {
        let metrics = LinkMetrics::shared();
        Self {
            channel: Channel::new(transport, Arc::clone(&metrics)),
            session: SessionState::default(),
            pending: Pending::Idle,
            config,
            metrics,
        }
    }

    /// Wrap this engine for use from several tasks.
    pub fn into_shared(self) -> SharedEasyVr<T> {
        Arc::new(Mutex::new(self))
    }

    /// Give the transport back, for example to change the port speed.
    pub fn into_transport(self) -> T {
        self.channel.into_transport()
    }

    /// Get the engine configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Get a handle to the link metrics.
    pub fn metrics(&self) -> Arc<LinkMetrics> {
        Arc::clone(&self.metrics)
    }

    /// Whether enough link faults happened in a row to suspect the link.
    pub fn is_link_degraded(&self) -> bool {
        self.metrics.is_degraded(self.config.degraded_after)
    }

    /// The transaction currently outstanding.
    pub fn pending(&self) -> Pending {
        self.pending
    }

    /// The last decoded outcome.
    pub fn session(&self) -> &SessionState {
        &self.session
    }

    // --- Transaction helpers ---

    pub(crate) fn ensure_idle(&self) -> Result<()> {
        match self.pending {
            Pending::Idle => Ok(()),
            pending => Err(Error::Busy { pending }),
        }
    }

    /// Check the link is free, then send the command byte.
    pub(crate) async fn begin(&mut self, operation: &'static str, command: u8) -> Result<()> {
        self.ensure_idle()?;
        self.channel.send_command(operation, command).await
    }

    /// Mark the transaction just sent as running in the background.
    pub(crate) fn start_async(&mut self, operation: &'static str) {
        debug!("{} started, poll has_finished", operation);
        self.pending = Pending::Async { operation };
    }

    /// Read the status byte and compare it with `expected`.
    ///
    /// A different known status is `Ok(false)`; an unknown byte is a
    /// protocol error.
    pub(crate) async fn expect(&mut self, expected: StatusCode, timeout: Duration) -> Result<bool> {
        let byte = self.channel.read_status(timeout).await?;
        self.classify(byte, expected)
    }

    pub(crate) fn classify(&self, byte: u8, expected: StatusCode) -> Result<bool> {
        match StatusCode::try_from(byte) {
            Ok(code) if code == expected => Ok(true),
            Ok(code) => {
                debug!("{}: declined with {}", self.channel.operation(), code);
                self.metrics.record_declined();
                Ok(false)
            }
            Err(_) => {
                self.metrics.record_protocol_fault();
                Err(Error::unexpected_status(self.channel.operation(), byte))
            }
        }
    }

    /// Read the status byte and check for plain success.
    pub(crate) async fn expect_success(&mut self, timeout: Duration) -> Result<bool> {
        self.expect(StatusCode::Success, timeout).await
    }

    /// Run a reply through the status decoder.
    pub(crate) async fn decode(&mut self, byte: u8) -> StatusOutcome {
        let timeout = self.config.rx_timeout;
        decode_status(&mut self.channel, &mut self.session, byte, timeout).await
    }

    /// Decode a reply that may carry any status, rejecting unknown bytes.
    pub(crate) async fn decode_reply(&mut self, byte: u8) -> Result<StatusOutcome> {
        if StatusCode::try_from(byte).is_err() {
            self.session.force_communication_error();
            self.metrics.record_protocol_fault();
            return Err(Error::unexpected_status(self.channel.operation(), byte));
        }
        Ok(self.decode(byte).await)
    }

    pub(crate) async fn receive_argument(&mut self) -> Result<i8> {
        self.channel.receive_argument(self.config.rx_timeout).await
    }

    /// Receive an argument that has no `-1` meaning.
    pub(crate) async fn receive_unsigned_argument(&mut self) -> Result<u8> {
        let value = self.receive_argument().await?;
        u8::try_from(value).map_err(|_| {
            self.session.force_communication_error();
            self.metrics.record_protocol_fault();
            Error::protocol(self.channel.operation(), format!("unexpected argument {value}"))
        })
    }

    /// Receive a length-prefixed, escaped label.
    pub(crate) async fn receive_label(&mut self) -> Result<String> {
        let units = count_from_arg(self.receive_argument().await?);
        let mut decoder = LabelDecoder::new(usize::from(units));
        while !decoder.is_complete() {
            let byte = self.channel.receive_raw(self.config.rx_timeout).await?;
            decoder.push(byte)?;
        }
        Ok(decoder.finish())
    }

    /// Receive `count` bytes, each as two nibble arguments.
    pub(crate) async fn receive_nibble_bytes(
        &mut self,
        count: usize,
        order: NibbleOrder,
    ) -> Result<Vec<u8>> {
        let mut bytes = Vec::with_capacity(count);
        for _ in 0..count {
            let first = self.receive_argument().await? as u8 & 0x0F;
            let second = self.receive_argument().await? as u8 & 0x0F;
            bytes.push(match order {
                NibbleOrder::LowFirst => (second << 4) | first,
                NibbleOrder::HighFirst => (first << 4) | second,
            });
        }
        Ok(bytes)
    }

    // --- Completion ---

    /// Poll for the end of the outstanding transaction without waiting.
    ///
    /// Returns `false` when no reply is waiting yet. Otherwise the reply is
    /// decoded into the session state, the link becomes idle and the result
    /// accessors report what happened.
    ///
    /// An open grammar label or lip-sync stream is not a completion to poll
    /// for; read it to the end or call [`stop`](Self::stop) first.
    pub async fn has_finished(&mut self) -> Result<bool> {
        if let pending @ (Pending::GrammarLabels { .. } | Pending::LipSync) = self.pending {
            return Err(Error::Busy { pending });
        }
        let Some(byte) = self.channel.poll_status().await? else {
            return Ok(false);
        };
        let outcome = self.decode(byte).await;
        debug!("{} finished: {:?}", self.channel.operation(), outcome);
        self.pending = Pending::Idle;
        Ok(true)
    }

    // --- Housekeeping ---

    /// Find the module, sending breaks until it answers.
    #[tracing::instrument(level = "info", skip_all, fields(attempts = self.config.detect_attempts))]
    pub async fn detect(&mut self) -> Result<bool> {
        self.break_until_success("detect").await
    }

    /// Wake the module from sleep.
    #[tracing::instrument(level = "info", skip_all)]
    pub async fn wake(&mut self) -> Result<bool> {
        self.break_until_success("wake").await
    }

    async fn break_until_success(&mut self, operation: &'static str) -> Result<bool> {
        for attempt in 1..=self.config.detect_attempts {
            self.channel.send_command(operation, CMD_BREAK).await?;
            match self.channel.read_status(self.config.wake_timeout).await {
                Ok(STS_SUCCESS) => {
                    info!("EasyVR answered after {} attempts", attempt);
                    self.pending = Pending::Idle;
                    return Ok(true);
                }
                Ok(byte) => debug!("attempt {}: got 0x{:02X}", attempt, byte),
                Err(Error::Timeout { .. }) => debug!("attempt {}: no answer", attempt),
                Err(e) => return Err(e),
            }
        }
        warn!(
            "EasyVR did not answer {} break attempts",
            self.config.detect_attempts
        );
        Ok(false)
    }

    /// Interrupt the outstanding operation.
    ///
    /// Succeeds when the module confirms with `interrupted` or `success`.
    pub async fn stop(&mut self) -> Result<bool> {
        self.channel.send_command("stop", CMD_BREAK).await?;
        let byte = self.channel.read_status(self.config.rx_timeout).await?;
        self.pending = Pending::Idle;
        let stopped = byte == STS_INTERR || byte == STS_SUCCESS;
        if !stopped {
            self.metrics.record_declined();
        }
        Ok(stopped)
    }

    /// Put the module to sleep until `mode` wakes it.
    ///
    /// Poll [`has_finished`](Self::has_finished) and check
    /// [`is_awakened`](Self::is_awakened), or call [`wake`](Self::wake).
    pub async fn sleep(&mut self, mode: WakeMode) -> Result<bool> {
        self.begin("sleep", CMD_SLEEP).await?;
        self.channel.send_argument(mode.as_arg()).await?;
        let asleep = self.expect_success(self.config.rx_timeout).await?;
        if asleep {
            info!("Sleeping until {:?}", mode);
            self.pending = Pending::Asleep;
        }
        Ok(asleep)
    }

    /// Read the module id.
    pub async fn get_id(&mut self) -> Result<Option<ModuleId>> {
        self.begin("get_id", CMD_ID).await?;
        if !self.expect(StatusCode::Id, self.config.rx_timeout).await? {
            return Ok(None);
        }
        let id = ModuleId::from_arg(self.receive_argument().await?);
        self.session.last_module_id = Some(id);
        debug!("Module id: {}", id);
        Ok(Some(id))
    }

    /// Switch the module to another serial speed.
    ///
    /// The reply still arrives at the old speed. Reconfigure the transport
    /// afterwards.
    pub async fn change_baudrate(&mut self, baudrate: Baudrate) -> Result<bool> {
        self.begin("change_baudrate", CMD_BAUDRATE).await?;
        self.channel.send_argument(baudrate.as_arg()).await?;
        let changed = self.expect_success(self.config.rx_timeout).await?;
        if changed {
            info!("Baud rate changed to {}", baudrate);
        }
        Ok(changed)
    }

    // --- Result accessors ---

    /// Index of the recognised custom command, if the last decode found one.
    pub fn get_command(&self) -> Option<u8> {
        self.session
            .flags
            .custom_command_recognized
            .then_some(self.session.last_value as u8)
    }

    /// Index of the recognised built-in or grammar word, if any.
    pub fn get_word(&self) -> Option<u8> {
        self.session
            .flags
            .builtin_word_recognized
            .then_some(self.session.last_value as u8)
    }

    /// The received SonicNet token, if any.
    pub fn get_token(&self) -> Option<u16> {
        self.session
            .flags
            .token_received
            .then_some(self.session.last_value as u16)
    }

    /// The pending error code, if any.
    ///
    /// A communication fault reports code `0x00`.
    pub fn get_error(&self) -> Option<ErrorCode> {
        if !self.session.flags.error_pending {
            return None;
        }
        u8::try_from(self.session.last_value).ok().map(ErrorCode)
    }

    pub fn is_awakened(&self) -> bool {
        self.session.flags.awakened
    }

    pub fn is_conflict(&self) -> bool {
        self.session.flags.training_conflict
    }

    pub fn is_invalid(&self) -> bool {
        self.session.flags.invalid_sequence
    }

    pub fn is_memory_full(&self) -> bool {
        self.session.flags.memory_full
    }

    pub fn is_timeout(&self) -> bool {
        self.session.flags.timed_out
    }
}

/// Order of the two nibble arguments making up one byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum NibbleOrder {
    LowFirst,
    HighFirst,
}

/// Counts and lengths use `-1` for 32.
pub(crate) fn count_from_arg(value: i8) -> u8 {
    if value == -1 { 32 } else { value as u8 }
}

pub(crate) fn check_group(group: u8) -> Result<u8> {
    Ok(ParseError::check_range("group", group, 0, GROUP_MAX)?)
}

pub(crate) fn check_index(index: u8) -> Result<u8> {
    Ok(ParseError::check_range("index", index, 0, COMMAND_MAX)?)
}
