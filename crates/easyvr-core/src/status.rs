//! Status decoding and session state.
//!
//! The first byte of every reply says what happened and how many argument
//! reads have to follow. [`decode_status`] performs those reads and records
//! the outcome in [`SessionState`]. It never fails: an unknown byte or a
//! broken payload leaves the session in the communication-error state.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use easyvr_types::{ErrorCode, ModuleId, StatusCode};

use crate::channel::Channel;
use crate::transport::Transport;

/// Outcome flags of the most recent decode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StatusFlags {
    /// A built-in word was recognised.
    pub builtin_word_recognized: bool,
    /// A custom command was recognised.
    pub custom_command_recognized: bool,
    /// The module reported an error, or the link failed.
    pub error_pending: bool,
    /// Recognition timed out.
    pub timed_out: bool,
    /// The command or argument sequence was rejected.
    pub invalid_sequence: bool,
    /// No room for another custom command.
    pub memory_full: bool,
    /// Training clashes with another command or built-in word.
    pub training_conflict: bool,
    /// A SonicNet token was detected.
    pub token_received: bool,
    /// The module woke up.
    pub awakened: bool,
}

/// Mutable record of the last decoded reply.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    pub flags: StatusFlags,
    /// Command index, word index, token or error code, depending on `flags`.
    pub last_value: i32,
    /// Group used by the last recognition or training request.
    pub last_group: Option<u8>,
    /// Module id from the last successful `get_id`.
    pub last_module_id: Option<ModuleId>,
}

impl SessionState {
    /// Clear every flag and the last value.
    pub fn reset_flags(&mut self) {
        self.flags = StatusFlags::default();
        self.last_value = 0;
    }

    /// Whether no flag is set.
    pub fn is_clear(&self) -> bool {
        self.flags == StatusFlags::default()
    }

    /// Enter the communication-error state: only `error_pending`, value 0.
    pub fn force_communication_error(&mut self) {
        self.reset_flags();
        self.flags.error_pending = true;
    }
}

/// What was recognised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecognitionKind {
    /// A custom (speaker-dependent) command.
    Command,
    /// A built-in word or custom grammar word.
    BuiltinWord,
}

/// Result of decoding one reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatusOutcome {
    Success,
    Recognized { kind: RecognitionKind, index: u8 },
    Token(u16),
    DeviceError(ErrorCode),
    Awakened,
    TimedOut,
    Invalid,
    /// Unknown status byte or broken payload.
    CommunicationFault,
}

/// Decode the reply opened by `byte`, reading its payload arguments.
pub(crate) async fn decode_status<T: Transport>(
    channel: &mut Channel<T>,
    session: &mut SessionState,
    byte: u8,
    timeout: Duration,
) -> StatusOutcome {
    session.reset_flags();

    let outcome = match StatusCode::try_from(byte) {
        Ok(StatusCode::Success) => Some(StatusOutcome::Success),
        Ok(StatusCode::Similar) => {
            session.flags.builtin_word_recognized = true;
            read_word_index(channel, session, RecognitionKind::BuiltinWord, timeout).await
        }
        Ok(StatusCode::Result) => {
            session.flags.custom_command_recognized = true;
            read_word_index(channel, session, RecognitionKind::Command, timeout).await
        }
        Ok(StatusCode::Token) => {
            session.flags.token_received = true;
            read_pair(channel, 5, timeout).await.map(|token| {
                session.last_value = token;
                StatusOutcome::Token(token as u16)
            })
        }
        Ok(StatusCode::Awakened) => {
            session.flags.awakened = true;
            Some(StatusOutcome::Awakened)
        }
        Ok(StatusCode::Timeout) => {
            session.flags.timed_out = true;
            Some(StatusOutcome::TimedOut)
        }
        Ok(StatusCode::Invalid) => {
            session.flags.invalid_sequence = true;
            Some(StatusOutcome::Invalid)
        }
        Ok(StatusCode::Error) => {
            session.flags.error_pending = true;
            read_error_code(channel, timeout).await.map(|code| {
                session.last_value = i32::from(code);
                StatusOutcome::DeviceError(ErrorCode(code))
            })
        }
        Ok(other) => {
            warn!("{}: status {} has no meaning here", channel.operation(), other);
            None
        }
        Err(_) => {
            warn!("{}: unknown status byte 0x{:02X}", channel.operation(), byte);
            None
        }
    };

    outcome.unwrap_or_else(|| {
        session.force_communication_error();
        StatusOutcome::CommunicationFault
    })
}

/// Payload shared by the `result` and `similar` replies: one index argument.
async fn read_word_index<T: Transport>(
    channel: &mut Channel<T>,
    session: &mut SessionState,
    kind: RecognitionKind,
    timeout: Duration,
) -> Option<StatusOutcome> {
    let index = read_payload_argument(channel, timeout).await?;
    session.last_value = i32::from(index);
    Some(StatusOutcome::Recognized {
        kind,
        index: index as u8,
    })
}

/// Two arguments combined as `(high << shift) | low`.
async fn read_pair<T: Transport>(
    channel: &mut Channel<T>,
    shift: u32,
    timeout: Duration,
) -> Option<i32> {
    let high = read_payload_argument(channel, timeout).await?;
    let low = read_payload_argument(channel, timeout).await?;
    Some((i32::from(high) << shift) | i32::from(low))
}

/// Error code sent as high then low nibble.
async fn read_error_code<T: Transport>(channel: &mut Channel<T>, timeout: Duration) -> Option<u8> {
    let high = read_payload_argument(channel, timeout).await?;
    let low = read_payload_argument(channel, timeout).await?;
    if high > 0x0F || low > 0x0F {
        warn!(
            "{}: error code nibbles out of range ({}, {})",
            channel.operation(),
            high,
            low
        );
        return None;
    }
    Some(((high as u8) << 4) | low as u8)
}

async fn read_payload_argument<T: Transport>(
    channel: &mut Channel<T>,
    timeout: Duration,
) -> Option<i8> {
    match channel.receive_argument(timeout).await {
        Ok(value) if value >= 0 => Some(value),
        Ok(value) => {
            warn!("{}: negative status payload {}", channel.operation(), value);
            None
        }
        Err(e) => {
            warn!("{}: status payload lost: {}", channel.operation(), e);
            None
        }
    }
}
