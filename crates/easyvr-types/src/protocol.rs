//! EasyVR wire protocol constants.
//!
//! Command bytes are lowercase ASCII letters (plus `~` for the service
//! channel). Several commands share a byte and are told apart by a leading
//! `-1` argument; the aliases below make that explicit at the call site.

use core::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::ParseError;

// --- Command bytes ---

/// Interrupt/reset the current operation, also used to wake the module.
pub const CMD_BREAK: u8 = b'b';
/// Enter sleep mode.
pub const CMD_SLEEP: u8 = b's';
/// Set the confidence threshold for built-in words and grammars.
pub const CMD_KNOB: u8 = b'k';
/// Set the microphone distance (first argument `-1`).
pub const CMD_MIC_DIST: u8 = b'k';
/// Set the recognition strictness level for custom commands.
pub const CMD_LEVEL: u8 = b'v';
/// Verify or repair message storage (first argument `-1`).
pub const CMD_VERIFY_RP: u8 = b'v';
/// Set the built-in word language.
pub const CMD_LANGUAGE: u8 = b'l';
/// Start real-time lip-sync (first argument `-1`).
pub const CMD_LIPSYNC: u8 = b'l';
/// Set the recognition timeout.
pub const CMD_TIMEOUT: u8 = b'o';
/// Recognise a built-in word set or grammar.
pub const CMD_RECOG_SI: u8 = b'i';
/// Train a custom command.
pub const CMD_TRAIN_SD: u8 = b't';
/// Set the trailing silence duration (first argument `-1`).
pub const CMD_TRAILING: u8 = b't';
/// Add a custom command to a group.
pub const CMD_GROUP_SD: u8 = b'g';
/// Remove a custom command from a group.
pub const CMD_UNGROUP_SD: u8 = b'u';
/// Recognise a custom command group.
pub const CMD_RECOG_SD: u8 = b'd';
/// Dump message metadata (first argument `-1`).
pub const CMD_DUMP_RP: u8 = b'd';
/// Erase the training of a custom command.
pub const CMD_ERASE_SD: u8 = b'e';
/// Erase a recorded message (first argument `-1`).
pub const CMD_ERASE_RP: u8 = b'e';
/// Set the label of a custom command.
pub const CMD_NAME_SD: u8 = b'n';
/// Count custom commands in a group.
pub const CMD_COUNT_SD: u8 = b'c';
/// Dump custom command data.
pub const CMD_DUMP_SD: u8 = b'p';
/// Play a recorded message (first argument `-1`).
pub const CMD_PLAY_RP: u8 = b'p';
/// Read the mask of non-empty groups.
pub const CMD_MASK_SD: u8 = b'm';
/// Reset memory, followed by a raw scope byte.
pub const CMD_RESETALL: u8 = b'r';
/// Record a message (first argument `-1`).
pub const CMD_RECORD_RP: u8 = b'r';
/// Request the module id.
pub const CMD_ID: u8 = b'x';
/// Set the reply delay.
pub const CMD_DELAY: u8 = b'y';
/// Change the serial baud rate.
pub const CMD_BAUDRATE: u8 = b'a';
/// Configure or read an I/O pin.
pub const CMD_QUERY_IO: u8 = b'q';
/// Play a sound table entry.
pub const CMD_PLAY_SX: u8 = b'w';
/// Play a DTMF tone (first argument `-1`).
pub const CMD_PLAY_DTMF: u8 = b'w';
/// Dump sound table metadata.
pub const CMD_DUMP_SX: u8 = b'h';
/// Dump grammar metadata and labels.
pub const CMD_DUMP_SI: u8 = b'z';
/// Send a SonicNet token.
pub const CMD_SEND_SN: u8 = b'j';
/// Detect a SonicNet token.
pub const CMD_RECV_SN: u8 = b'f';
/// Set the command latency (first argument `-1`).
pub const CMD_FAST_SD: u8 = b'f';
/// Service channel prefix.
pub const CMD_SERVICE: u8 = b'~';

// --- Raw sub-request bytes ---

/// Reset scope: whole memory.
pub const RESET_ALL: u8 = b'R';
/// Reset scope: custom commands only.
pub const RESET_COMMANDS: u8 = b'D';
/// Reset scope: recorded messages only.
pub const RESET_MESSAGES: u8 = b'M';
/// Service request: export command data.
pub const SVC_EXPORT_SD: u8 = b'X';
/// Service request: import command data.
pub const SVC_IMPORT_SD: u8 = b'I';
/// Service request: verify imported command data.
pub const SVC_VERIFY_SD: u8 = b'V';
/// Service sub-reply carrying exported data.
pub const SVC_DUMP_SD: u8 = b'D';

// --- Status bytes ---

pub const STS_MASK: u8 = b'k';
pub const STS_COUNT: u8 = b'c';
pub const STS_AWAKEN: u8 = b'w';
pub const STS_DATA: u8 = b'd';
pub const STS_ERROR: u8 = b'e';
pub const STS_INVALID: u8 = b'v';
pub const STS_TIMEOUT: u8 = b't';
pub const STS_LIPSYNC: u8 = b'l';
pub const STS_INTERR: u8 = b'i';
pub const STS_SUCCESS: u8 = b'o';
pub const STS_RESULT: u8 = b'r';
pub const STS_SIMILAR: u8 = b's';
pub const STS_OUT_OF_MEM: u8 = b'm';
pub const STS_ID: u8 = b'x';
pub const STS_PIN: u8 = b'p';
pub const STS_TABLE_SX: u8 = b'h';
pub const STS_GRAMMAR: u8 = b'z';
pub const STS_TOKEN: u8 = b'f';
pub const STS_MESSAGE: u8 = b'g';
pub const STS_SERVICE: u8 = b'~';

/// Classification of the first byte of a reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[repr(u8)]
pub enum StatusCode {
    /// Group mask follows.
    Mask = STS_MASK,
    /// Command count follows.
    Count = STS_COUNT,
    /// The module woke up.
    Awakened = STS_AWAKEN,
    /// Command data follows.
    Data = STS_DATA,
    /// Error code follows.
    Error = STS_ERROR,
    /// Invalid command or argument sequence.
    Invalid = STS_INVALID,
    /// Recognition timed out.
    Timeout = STS_TIMEOUT,
    /// Lip-sync stream started.
    LipSync = STS_LIPSYNC,
    /// Operation interrupted by a break.
    Interrupted = STS_INTERR,
    /// Operation succeeded.
    Success = STS_SUCCESS,
    /// Custom command recognised, index follows.
    Result = STS_RESULT,
    /// Built-in word recognised, index follows.
    Similar = STS_SIMILAR,
    /// No room for another command.
    OutOfMemory = STS_OUT_OF_MEM,
    /// Module id follows.
    Id = STS_ID,
    /// Pin level follows.
    Pin = STS_PIN,
    /// Sound table data follows.
    SoundTable = STS_TABLE_SX,
    /// Grammar data follows.
    Grammar = STS_GRAMMAR,
    /// SonicNet token follows.
    Token = STS_TOKEN,
    /// Message data follows.
    Message = STS_MESSAGE,
    /// Service reply follows.
    Service = STS_SERVICE,
}

impl StatusCode {
    /// Protocol byte of this status.
    #[must_use]
    pub fn as_byte(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for StatusCode {
    type Error = ParseError;

    /// Classify a reply byte.
    ///
    /// # Examples
    ///
    /// ```
    /// use easyvr_types::StatusCode;
    ///
    /// assert_eq!(StatusCode::try_from(b'o'), Ok(StatusCode::Success));
    /// assert!(StatusCode::try_from(b'Q').is_err());
    /// ```
    fn try_from(value: u8) -> Result<Self, ParseError> {
        Ok(match value {
            STS_MASK => StatusCode::Mask,
            STS_COUNT => StatusCode::Count,
            STS_AWAKEN => StatusCode::Awakened,
            STS_DATA => StatusCode::Data,
            STS_ERROR => StatusCode::Error,
            STS_INVALID => StatusCode::Invalid,
            STS_TIMEOUT => StatusCode::Timeout,
            STS_LIPSYNC => StatusCode::LipSync,
            STS_INTERR => StatusCode::Interrupted,
            STS_SUCCESS => StatusCode::Success,
            STS_RESULT => StatusCode::Result,
            STS_SIMILAR => StatusCode::Similar,
            STS_OUT_OF_MEM => StatusCode::OutOfMemory,
            STS_ID => StatusCode::Id,
            STS_PIN => StatusCode::Pin,
            STS_TABLE_SX => StatusCode::SoundTable,
            STS_GRAMMAR => StatusCode::Grammar,
            STS_TOKEN => StatusCode::Token,
            STS_MESSAGE => StatusCode::Message,
            STS_SERVICE => StatusCode::Service,
            _ => return Err(ParseError::UnknownStatus(value)),
        })
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} ('{}')", self, self.as_byte() as char)
    }
}
