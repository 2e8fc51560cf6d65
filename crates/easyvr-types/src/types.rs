//! Configuration enumerations, identification codes and result records.
//!
//! Every enumeration here is a small closed set mapped 1:1 onto protocol
//! argument values. None of them is user-extensible.

use core::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::ParseError;

/// Defines a closed enumeration backed by protocol argument values.
macro_rules! protocol_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident ($kind:literal) {
            $( $(#[$vmeta:meta])* $variant:ident = $value:literal, )+
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
        #[repr(i8)]
        pub enum $name {
            $( $(#[$vmeta])* $variant = $value, )+
        }

        impl $name {
            /// Every variant, in ascending protocol order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Protocol argument value.
            #[must_use]
            pub fn as_arg(self) -> i8 {
                self as i8
            }
        }

        impl TryFrom<i8> for $name {
            type Error = ParseError;

            fn try_from(value: i8) -> Result<Self, ParseError> {
                match value {
                    $( $value => Ok($name::$variant), )+
                    _ => Err(ParseError::UnknownVariant {
                        kind: $kind,
                        value: i32::from(value),
                    }),
                }
            }
        }
    };
}

protocol_enum! {
    /// Serial link speed, as the divisor the module expects.
    pub enum Baudrate("baud rate") {
        B115200 = 1,
        B57600 = 2,
        B38400 = 3,
        B19200 = 6,
        B9600 = 12,
    }
}

impl Baudrate {
    /// Link speed in bits per second.
    #[must_use]
    pub fn bits_per_second(self) -> u32 {
        match self {
            Baudrate::B115200 => 115_200,
            Baudrate::B57600 => 57_600,
            Baudrate::B38400 => 38_400,
            Baudrate::B19200 => 19_200,
            Baudrate::B9600 => 9_600,
        }
    }
}

impl fmt::Display for Baudrate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} bps", self.bits_per_second())
    }
}

protocol_enum! {
    /// Language of the built-in speaker-independent word sets.
    pub enum Language("language") {
        English = 0,
        Italian = 1,
        Japanese = 2,
        German = 3,
        Spanish = 4,
        French = 5,
    }
}

protocol_enum! {
    /// Confidence threshold for built-in words and custom grammars.
    pub enum Knob("knob") {
        /// Fewest false negatives, most false positives.
        Looser = 0,
        Loose = 1,
        /// Factory setting.
        Typical = 2,
        Strict = 3,
        /// Fewest false positives, most false negatives.
        Stricter = 4,
    }
}

protocol_enum! {
    /// Strictness of custom command recognition.
    pub enum Level("level") {
        /// Factory setting.
        Easy = 1,
        Normal = 2,
        Hard = 3,
        Harder = 4,
        Hardest = 5,
    }
}

protocol_enum! {
    /// Expected distance between speaker and microphone.
    pub enum Distance("microphone distance") {
        Headset = 1,
        /// Factory setting.
        ArmsLength = 2,
        FarMic = 3,
    }
}

protocol_enum! {
    /// Silence required after speech before recognition completes.
    ///
    /// The module counts in 25 ms steps above a 100 ms floor.
    pub enum TrailingSilence("trailing silence") {
        Ms100 = 0,
        /// Factory setting.
        Ms125 = 1,
        Ms200 = 4,
        Ms300 = 8,
        Ms400 = 12,
        Ms500 = 16,
        Ms600 = 20,
        Ms700 = 24,
        Ms800 = 28,
        Ms875 = 31,
    }
}

impl TrailingSilence {
    /// Duration in milliseconds.
    #[must_use]
    pub fn millis(self) -> u16 {
        100 + 25 * self.as_arg() as u16
    }
}

protocol_enum! {
    /// Custom command recognition latency.
    pub enum CommandLatency("command latency") {
        Normal = 0,
        Fast = 1,
    }
}

protocol_enum! {
    /// Sensitivity of clap detection while asleep.
    pub enum ClapSense("clap sensitivity") {
        Low = 0,
        Mid = 1,
        High = 2,
    }
}

/// What wakes the module up from sleep.
///
/// Every mode also wakes on a received character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum WakeMode {
    OnCharacter,
    Whistle,
    LoudSound,
    TwoClaps(ClapSense),
    ThreeClaps(ClapSense),
}

impl WakeMode {
    /// Protocol argument value.
    #[must_use]
    pub fn as_arg(self) -> i8 {
        match self {
            WakeMode::OnCharacter => 0,
            WakeMode::Whistle => 1,
            WakeMode::LoudSound => 2,
            WakeMode::TwoClaps(sense) => 3 + sense.as_arg(),
            WakeMode::ThreeClaps(sense) => 6 + sense.as_arg(),
        }
    }
}

impl TryFrom<i8> for WakeMode {
    type Error = ParseError;

    fn try_from(value: i8) -> Result<Self, ParseError> {
        match value {
            0 => Ok(WakeMode::OnCharacter),
            1 => Ok(WakeMode::Whistle),
            2 => Ok(WakeMode::LoudSound),
            3..=5 => Ok(WakeMode::TwoClaps(ClapSense::try_from(value - 3)?)),
            6..=8 => Ok(WakeMode::ThreeClaps(ClapSense::try_from(value - 6)?)),
            _ => Err(ParseError::UnknownVariant {
                kind: "wake mode",
                value: i32::from(value),
            }),
        }
    }
}

protocol_enum! {
    /// General purpose I/O pin.
    pub enum PinNumber("pin number") {
        Io1 = 1,
        Io2 = 2,
        Io3 = 3,
    }
}

protocol_enum! {
    /// Output level of a pin.
    pub enum PinLevel("pin level") {
        Low = 0,
        High = 1,
    }
}

protocol_enum! {
    /// Input configuration of a pin.
    pub enum PinInput("pin input mode") {
        /// High impedance, no pull-up.
        HighZ = 2,
        /// Strong pull-up.
        Strong = 3,
        /// Weak pull-up.
        Weak = 4,
    }
}

protocol_enum! {
    /// Storage format of a recorded message.
    pub enum MessageType("message type") {
        /// Empty slot. Reported by the module, never accepted for recording.
        Empty = 0,
        EightBit = 8,
    }
}

protocol_enum! {
    /// Playback speed of a recorded message.
    pub enum MessageSpeed("message speed") {
        Normal = 0,
        Faster = 1,
    }
}

protocol_enum! {
    /// Playback attenuation of a recorded message.
    pub enum MessageAttenuation("message attenuation") {
        NoAttenuation = 0,
        Minus2Db = 1,
        Minus4Db = 2,
        Minus6Db = 3,
    }
}

protocol_enum! {
    /// Width of a SonicNet token.
    pub enum TokenBits("token width") {
        Four = 4,
        Eight = 8,
    }
}

impl TokenBits {
    /// Largest token index of this width.
    #[must_use]
    pub fn max_token(self) -> u16 {
        match self {
            TokenBits::Four => 15,
            TokenBits::Eight => 255,
        }
    }
}

protocol_enum! {
    /// Noise rejection while detecting SonicNet tokens.
    pub enum RejectionLevel("rejection level") {
        Min = 0,
        Average = 1,
        Max = 2,
    }
}

/// Custom command group used as wake-up trigger.
pub const GROUP_TRIGGER: u8 = 0;
/// Custom command group used for passwords.
pub const GROUP_PASSWORD: u8 = 16;
/// Highest custom command group.
pub const GROUP_MAX: u8 = 16;
/// Highest custom command index within a group.
pub const COMMAND_MAX: u8 = 31;

/// Built-in trigger word set.
pub const WORDSET_TRIGGER: u8 = 0;
/// Built-in action word set.
pub const WORDSET_ACTION: u8 = 1;
/// Built-in direction word set.
pub const WORDSET_DIRECTION: u8 = 2;
/// Built-in number word set.
pub const WORDSET_NUMBER: u8 = 3;

/// Grammar flag marking a trigger grammar.
pub const GRAMMAR_FLAG_TRIGGER: u8 = 0x10;

/// Highest sound table volume.
pub const VOLUME_MAX: u8 = 31;
/// Factory sound table volume.
pub const VOLUME_DEFAULT: u8 = 16;

/// Hardware generation reported by the module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[non_exhaustive]
pub enum ModuleId {
    VRbot,
    EasyVR,
    EasyVR2,
    EasyVR2_3,
    EasyVR3,
    EasyVR3_1,
    EasyVR3_2,
    EasyVR3_3,
    EasyVR3_4,
    EasyVR3_5,
    EasyVR3Plus,
    /// An id this library does not know about.
    Unknown(i8),
}

impl ModuleId {
    /// Map the id argument reported by the module.
    #[must_use]
    pub fn from_arg(value: i8) -> Self {
        match value {
            0 => ModuleId::VRbot,
            1 => ModuleId::EasyVR,
            2 => ModuleId::EasyVR2,
            3 => ModuleId::EasyVR2_3,
            8 => ModuleId::EasyVR3,
            9 => ModuleId::EasyVR3_1,
            10 => ModuleId::EasyVR3_2,
            11 => ModuleId::EasyVR3_3,
            12 => ModuleId::EasyVR3_4,
            13 => ModuleId::EasyVR3_5,
            16 => ModuleId::EasyVR3Plus,
            other => ModuleId::Unknown(other),
        }
    }

    /// Whether this generation supports SonicNet, lip-sync and sound tables.
    #[must_use]
    pub fn is_easyvr3_family(self) -> bool {
        matches!(
            self,
            ModuleId::EasyVR3
                | ModuleId::EasyVR3_1
                | ModuleId::EasyVR3_2
                | ModuleId::EasyVR3_3
                | ModuleId::EasyVR3_4
                | ModuleId::EasyVR3_5
                | ModuleId::EasyVR3Plus
        )
    }
}

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModuleId::VRbot => write!(f, "VRbot"),
            ModuleId::EasyVR => write!(f, "EasyVR"),
            ModuleId::EasyVR2 => write!(f, "EasyVR 2"),
            ModuleId::EasyVR2_3 => write!(f, "EasyVR 2 (rev. 3)"),
            ModuleId::EasyVR3 => write!(f, "EasyVR 3"),
            ModuleId::EasyVR3_1 => write!(f, "EasyVR 3 (rev. 1)"),
            ModuleId::EasyVR3_2 => write!(f, "EasyVR 3 (rev. 2)"),
            ModuleId::EasyVR3_3 => write!(f, "EasyVR 3 (rev. 3)"),
            ModuleId::EasyVR3_4 => write!(f, "EasyVR 3 (rev. 4)"),
            ModuleId::EasyVR3_5 => write!(f, "EasyVR 3 (rev. 5)"),
            ModuleId::EasyVR3Plus => write!(f, "EasyVR 3 Plus"),
            ModuleId::Unknown(id) => write!(f, "Unknown module ({id})"),
        }
    }
}

/// Error code reported by the module after an error status.
///
/// Codes outside the catalogue are kept as-is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(transparent))]
pub struct ErrorCode(pub u8);

impl ErrorCode {
    pub const DATACOL_TOO_LONG: Self = Self(0x02);
    pub const DATACOL_TOO_NOISY: Self = Self(0x03);
    pub const DATACOL_TOO_SOFT: Self = Self(0x04);
    pub const DATACOL_TOO_LOUD: Self = Self(0x05);
    pub const DATACOL_TOO_SOON: Self = Self(0x06);
    pub const DATACOL_TOO_CHOPPY: Self = Self(0x07);
    pub const DATACOL_BAD_WEIGHTS: Self = Self(0x08);
    pub const DATACOL_BAD_SETUP: Self = Self(0x09);

    pub const RECOG_FAIL: Self = Self(0x11);
    pub const RECOG_LOW_CONF: Self = Self(0x12);
    pub const RECOG_MID_CONF: Self = Self(0x13);
    pub const RECOG_BAD_TEMPLATE: Self = Self(0x14);
    pub const RECOG_BAD_WEIGHTS: Self = Self(0x15);
    pub const RECOG_DURATION: Self = Self(0x17);

    pub const T2SI_EXCESS_STATES: Self = Self(0x21);
    pub const T2SI_BAD_VERSION: Self = Self(0x22);
    pub const T2SI_OUT_OF_RAM: Self = Self(0x23);
    pub const T2SI_UNEXPECTED: Self = Self(0x24);
    pub const T2SI_OVERFLOW: Self = Self(0x25);
    pub const T2SI_PARAMETER: Self = Self(0x26);
    pub const T2SI_NN_TOO_BIG: Self = Self(0x29);
    pub const T2SI_NN_BAD_VERSION: Self = Self(0x2A);
    pub const T2SI_NN_NOT_READY: Self = Self(0x2B);
    pub const T2SI_NN_BAD_LAYERS: Self = Self(0x2C);
    pub const T2SI_TRIG_OOV: Self = Self(0x2D);
    pub const T2SI_TOO_SHORT: Self = Self(0x2F);

    pub const RP_BAD_LEVEL: Self = Self(0x31);
    pub const RP_NO_MSG: Self = Self(0x38);
    pub const RP_MSG_EXISTS: Self = Self(0x39);

    pub const SYNTH_BAD_VERSION: Self = Self(0x4A);
    pub const SYNTH_ID_NOT_SET: Self = Self(0x4B);
    pub const SYNTH_TOO_MANY_TABLES: Self = Self(0x4C);
    pub const SYNTH_BAD_SEN: Self = Self(0x4D);
    pub const SYNTH_BAD_MSG: Self = Self(0x4E);

    /// Recognised word is not in the trained set.
    pub const CUSTOM_NOTA: Self = Self(0x80);
    /// Custom command data failed verification.
    pub const CUSTOM_INVALID: Self = Self(0x81);

    pub const SW_STACK_OVERFLOW: Self = Self(0xC0);
    pub const INTERNAL_T2SI_BAD_SETUP: Self = Self(0xCC);

    const CATALOGUE: &'static [(ErrorCode, &'static str)] = &[
        (Self::DATACOL_TOO_LONG, "spoke too long"),
        (Self::DATACOL_TOO_NOISY, "too noisy"),
        (Self::DATACOL_TOO_SOFT, "spoke too soft"),
        (Self::DATACOL_TOO_LOUD, "spoke too loud"),
        (Self::DATACOL_TOO_SOON, "spoke too soon"),
        (Self::DATACOL_TOO_CHOPPY, "too many segments"),
        (Self::DATACOL_BAD_WEIGHTS, "invalid SI weights"),
        (Self::DATACOL_BAD_SETUP, "invalid setup"),
        (Self::RECOG_FAIL, "recognition failed"),
        (Self::RECOG_LOW_CONF, "recognition result doubtful"),
        (Self::RECOG_MID_CONF, "recognition result maybe"),
        (Self::RECOG_BAD_TEMPLATE, "invalid SD template"),
        (Self::RECOG_BAD_WEIGHTS, "invalid SI weights"),
        (Self::RECOG_DURATION, "incompatible pattern durations"),
        (Self::T2SI_EXCESS_STATES, "state structure is too big"),
        (Self::T2SI_BAD_VERSION, "RSC code version/grammar ROM dont match"),
        (Self::T2SI_OUT_OF_RAM, "reached limit of available RAM"),
        (Self::T2SI_UNEXPECTED, "an unexpected error occurred"),
        (Self::T2SI_OVERFLOW, "ran out of time to process"),
        (Self::T2SI_PARAMETER, "bad macro or grammar parameter"),
        (Self::T2SI_NN_TOO_BIG, "layer size out of limits"),
        (Self::T2SI_NN_BAD_VERSION, "net structure incompatibility"),
        (Self::T2SI_NN_NOT_READY, "initialization not complete"),
        (Self::T2SI_NN_BAD_LAYERS, "not correct number of layers"),
        (Self::T2SI_TRIG_OOV, "trigger recognized out of vocabulary"),
        (Self::T2SI_TOO_SHORT, "utterance was too short"),
        (Self::RP_BAD_LEVEL, "play: bad volume level"),
        (Self::RP_NO_MSG, "play, erase, copy: message doesnt exist"),
        (Self::RP_MSG_EXISTS, "rec: message already exists"),
        (Self::SYNTH_BAD_VERSION, "bad release number in speech file"),
        (Self::SYNTH_ID_NOT_SET, "sound table id not set"),
        (Self::SYNTH_TOO_MANY_TABLES, "too many sound tables"),
        (Self::SYNTH_BAD_SEN, "bad sentence number"),
        (Self::SYNTH_BAD_MSG, "bad message data or SX technology files missing"),
        (Self::CUSTOM_NOTA, "none of the above (out of grammar)"),
        (Self::CUSTOM_INVALID, "invalid custom command data"),
        (Self::SW_STACK_OVERFLOW, "no room left in software stack"),
        (Self::INTERNAL_T2SI_BAD_SETUP, "T2SI grammar setup failed"),
    ];

    /// Human-readable description of a catalogued code.
    #[must_use]
    pub fn description(self) -> Option<&'static str> {
        Self::CATALOGUE
            .iter()
            .find(|(code, _)| *code == self)
            .map(|(_, text)| *text)
    }

    /// Whether this code is in the catalogue.
    #[must_use]
    pub fn is_known(self) -> bool {
        self.description().is_some()
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.description() {
            Some(text) => write!(f, "0x{:02X} ({})", self.0, text),
            None => write!(f, "0x{:02X}", self.0),
        }
    }
}

/// Data of one custom command, read back from the module.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CommandData {
    /// Decoded label.
    pub label: String,
    /// Number of completed training sessions (0 when untrained).
    pub training: u8,
}

/// Metadata of a custom grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GrammarInfo {
    /// Grammar flags, see [`GRAMMAR_FLAG_TRIGGER`].
    pub flags: u8,
    /// Number of word labels that follow.
    pub count: u8,
}

impl GrammarInfo {
    /// Whether this grammar is a trigger grammar.
    #[must_use]
    pub fn is_trigger(&self) -> bool {
        self.flags & GRAMMAR_FLAG_TRIGGER != 0
    }
}

/// Metadata of a recorded message slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MessageInfo {
    /// Raw message type, `0` for an empty slot.
    pub format: u8,
    /// Length in bytes.
    pub length: u32,
}

impl MessageInfo {
    /// Whether the slot holds no message.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.format == MessageType::Empty.as_arg() as u8
    }

    /// Typed message format, when the module reported a known one.
    #[must_use]
    pub fn message_type(&self) -> Option<MessageType> {
        MessageType::try_from(self.format as i8).ok()
    }
}

/// Name and size of the sound table stored on the module.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SoundTable {
    pub name: String,
    /// Number of sound entries.
    pub count: u16,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_baudrate_divisors() {
        assert_eq!(Baudrate::B115200.as_arg(), 1);
        assert_eq!(Baudrate::B9600.as_arg(), 12);
        assert_eq!(Baudrate::B9600.to_string(), "9600 bps");
    }

    #[test]
    fn test_try_from_rejects_holes() {
        assert_eq!(Baudrate::try_from(6), Ok(Baudrate::B19200));
        assert!(Baudrate::try_from(4).is_err());
        assert!(Level::try_from(0).is_err());
        assert!(Distance::try_from(4).is_err());
    }

    #[test]
    fn test_all_lists_variants_in_order() {
        assert_eq!(Language::ALL.len(), 6);
        assert_eq!(Language::ALL[0], Language::English);
        assert!(Knob::ALL.windows(2).all(|w| w[0].as_arg() < w[1].as_arg()));
    }

    #[test]
    fn test_trailing_silence_millis() {
        assert_eq!(TrailingSilence::Ms100.millis(), 100);
        assert_eq!(TrailingSilence::Ms125.millis(), 125);
        assert_eq!(TrailingSilence::Ms800.millis(), 800);
        assert_eq!(TrailingSilence::Ms875.millis(), 875);
    }

    #[test]
    fn test_wake_mode_clap_offsets() {
        assert_eq!(WakeMode::OnCharacter.as_arg(), 0);
        assert_eq!(WakeMode::TwoClaps(ClapSense::Low).as_arg(), 3);
        assert_eq!(WakeMode::TwoClaps(ClapSense::High).as_arg(), 5);
        assert_eq!(WakeMode::ThreeClaps(ClapSense::Mid).as_arg(), 7);
        assert_eq!(WakeMode::try_from(8), Ok(WakeMode::ThreeClaps(ClapSense::High)));
        assert!(WakeMode::try_from(9).is_err());
    }

    #[test]
    fn test_token_bits_limits() {
        assert_eq!(TokenBits::Four.max_token(), 15);
        assert_eq!(TokenBits::Eight.max_token(), 255);
    }

    #[test]
    fn test_module_id_mapping() {
        assert_eq!(ModuleId::from_arg(8), ModuleId::EasyVR3);
        assert_eq!(ModuleId::from_arg(16), ModuleId::EasyVR3Plus);
        assert_eq!(ModuleId::from_arg(5), ModuleId::Unknown(5));
        assert!(ModuleId::EasyVR3_5.is_easyvr3_family());
        assert!(!ModuleId::EasyVR2.is_easyvr3_family());
    }

    #[test]
    fn test_error_code_catalogue() {
        assert!(ErrorCode::CUSTOM_INVALID.is_known());
        assert_eq!(ErrorCode(0x81), ErrorCode::CUSTOM_INVALID);
        assert!(!ErrorCode(0x7F).is_known());
        assert_eq!(ErrorCode(0x7F).to_string(), "0x7F");
        assert_eq!(ErrorCode::RECOG_FAIL.to_string(), "0x11 (recognition failed)");
    }

    #[test]
    fn test_grammar_trigger_flag() {
        let info = GrammarInfo { flags: GRAMMAR_FLAG_TRIGGER, count: 3 };
        assert!(info.is_trigger());
        assert!(!GrammarInfo::default().is_trigger());
    }

    #[test]
    fn test_message_info_empty() {
        assert!(MessageInfo::default().is_empty());
        let info = MessageInfo { format: 8, length: 4096 };
        assert_eq!(info.message_type(), Some(MessageType::EightBit));
        assert!(!info.is_empty());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_serde_round_trip() {
        let json = serde_json::to_string(&WakeMode::TwoClaps(ClapSense::Mid)).unwrap();
        let back: WakeMode = serde_json::from_str(&json).unwrap();
        assert_eq!(back, WakeMode::TwoClaps(ClapSense::Mid));

        let code: ErrorCode = serde_json::from_str("17").unwrap();
        assert_eq!(code, ErrorCode::RECOG_FAIL);
    }
}
