//! Argument codec.
//!
//! Every value exchanged after a command byte is an integer in `-1..=31`
//! carried as one byte of a fixed 33-byte alphabet. The mapping is a plain
//! table lookup in both directions; bytes outside the alphabet are rejected.

use crate::error::{ParseError, ParseResult};

/// Smallest encodable argument value.
pub const ARG_MIN: i8 = -1;

/// Largest encodable argument value.
pub const ARG_MAX: i8 = 31;

/// Byte the host sends to ask the module for the next argument.
pub const ARG_ACK: u8 = b' ';

/// Encoded bytes indexed by `value + 1`.
const ENCODE_TABLE: [u8; 33] = [
    b'@', // -1
    b'A', b'B', b'C', b'D', b'E', b'F', b'G', b'H', b'I', b'J', b'K', b'L', b'M', //
    b'N', b'O', b'P', b'Q', b'R', b'S', b'T', b'U', b'V', b'W', b'X', b'Y', b'Z', //
    b'^', // 26
    b'[', // 27
    b'\\', // 28
    b']', // 29
    b'_', // 30
    b'`', // 31
];

/// Decoded values indexed by `byte - b'@'`; `None` marks a hole.
const DECODE_TABLE: [Option<i8>; 33] = {
    let mut table = [None; 33];
    let mut i = 0;
    while i < ENCODE_TABLE.len() {
        table[(ENCODE_TABLE[i] - b'@') as usize] = Some(i as i8 - 1);
        i += 1;
    }
    table
};

/// Encode an argument value into its protocol byte.
///
/// # Examples
///
/// ```
/// use easyvr_types::codec;
///
/// assert_eq!(codec::encode(-1), Ok(b'@'));
/// assert_eq!(codec::encode(0), Ok(b'A'));
/// assert_eq!(codec::encode(26), Ok(b'^'));
/// assert!(codec::encode(32).is_err());
/// ```
pub fn encode(value: i32) -> ParseResult<u8> {
    if !(i32::from(ARG_MIN)..=i32::from(ARG_MAX)).contains(&value) {
        return Err(ParseError::InvalidArgumentValue(value));
    }
    Ok(ENCODE_TABLE[(value + 1) as usize])
}

/// Decode a protocol byte back into its argument value.
///
/// # Examples
///
/// ```
/// use easyvr_types::codec;
///
/// assert_eq!(codec::decode(b'`'), Ok(31));
/// assert!(codec::decode(b'a').is_err());
/// ```
pub fn decode(byte: u8) -> ParseResult<i8> {
    byte.checked_sub(b'@')
        .and_then(|offset| DECODE_TABLE.get(offset as usize).copied().flatten())
        .ok_or(ParseError::InvalidArgumentByte(byte))
}

/// Whether `byte` belongs to the argument alphabet.
#[must_use]
pub fn is_argument_byte(byte: u8) -> bool {
    decode(byte).is_ok()
}
