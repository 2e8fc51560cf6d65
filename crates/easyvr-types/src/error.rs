//! Error types for protocol data handling in easyvr-types.

use thiserror::Error;

/// Errors that can occur when encoding or decoding EasyVR protocol data.
///
/// This error type is transport-agnostic and does not include
/// I/O or timeout errors (those belong in easyvr-core).
///
/// This enum is marked `#[non_exhaustive]` to allow adding new error variants
/// in future versions without breaking downstream code.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum ParseError {
    /// Malformed protocol data.
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// An integer outside the argument range `-1..=31` was given to the encoder.
    #[error("Argument value {0} is outside -1..=31")]
    InvalidArgumentValue(i32),

    /// A byte outside the argument alphabet was received.
    #[error("Byte 0x{0:02X} is not part of the argument alphabet")]
    InvalidArgumentByte(u8),

    /// A byte that is not a known status code.
    #[error("Unknown status byte 0x{0:02X}")]
    UnknownStatus(u8),

    /// A caller-supplied value outside its documented closed range.
    #[error("{name} must be in {min}..={max}, got {value}")]
    OutOfRange {
        name: &'static str,
        value: i64,
        min: i64,
        max: i64,
    },

    /// A label whose escaped length does not fit in one argument.
    #[error("Label needs {units} units, at most {max} fit in one argument")]
    LabelTooLong { units: usize, max: usize },

    /// A protocol integer that maps to no variant of a closed enumeration.
    #[error("Value {value} is not a valid {kind}")]
    UnknownVariant { kind: &'static str, value: i32 },
}

impl ParseError {
    /// Create an [`ParseError::OutOfRange`] error.
    pub fn out_of_range(
        name: &'static str,
        value: impl Into<i64>,
        min: impl Into<i64>,
        max: impl Into<i64>,
    ) -> Self {
        Self::OutOfRange {
            name,
            value: value.into(),
            min: min.into(),
            max: max.into(),
        }
    }

    /// Check `value` against an inclusive range, returning it unchanged when it fits.
    pub fn check_range<V>(name: &'static str, value: V, min: V, max: V) -> ParseResult<V>
    where
        V: Copy + PartialOrd + Into<i64>,
    {
        if value < min || value > max {
            Err(Self::out_of_range(name, value, min, max))
        } else {
            Ok(value)
        }
    }
}

/// Result type alias using easyvr-types' ParseError type.
pub type ParseResult<T> = std::result::Result<T, ParseError>;
