//! Platform-agnostic protocol types for EasyVR speech recognition modules.
//!
//! This crate holds everything about the EasyVR serial protocol that does
//! not need a transport: the argument codec, command and status bytes,
//! configuration enumerations, label escaping and timing conversions.
//! The async protocol engine lives in `easyvr-core`.
//!
//! # Example
//!
//! ```
//! use easyvr_types::{codec, label::EncodedLabel, timing, Language};
//!
//! assert_eq!(codec::encode(Language::German.as_arg().into()), Ok(b'D'));
//! assert_eq!(timing::quantize_delay(93), Ok(18));
//! assert_eq!(EncodedLabel::new("Lights2").unwrap().units(), 8);
//! ```

pub mod codec;
pub mod error;
pub mod label;
pub mod protocol;
pub mod timing;
pub mod types;

pub use error::{ParseError, ParseResult};
pub use protocol::StatusCode;
pub use types::{
    Baudrate, ClapSense, CommandData, CommandLatency, Distance, ErrorCode, GrammarInfo, Knob,
    Language, Level, MessageAttenuation, MessageInfo, MessageSpeed, MessageType, ModuleId,
    PinInput, PinLevel, PinNumber, RejectionLevel, SoundTable, TokenBits, TrailingSilence,
    WakeMode,
};
