//! Label escaping for command, grammar and sound table names.
//!
//! Labels travel as raw bytes, not arguments. Letters go uppercase, any
//! other non-digit becomes `_`, and a digit is sent as the escape byte `^`
//! followed by the digit as an encoded argument. The length argument
//! counts wire units, so each digit costs two.

use crate::codec;
use crate::error::{ParseError, ParseResult};

/// Escape byte announcing a digit argument.
pub const DIGIT_ESCAPE: u8 = b'^';

/// Most wire units a label may occupy.
pub const MAX_LABEL_UNITS: usize = 31;

/// A label ready to be written: the length argument and the raw bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedLabel {
    units: i8,
    bytes: Vec<u8>,
}

impl EncodedLabel {
    /// Escape `name` for transmission.
    ///
    /// # Examples
    ///
    /// ```
    /// use easyvr_types::label::EncodedLabel;
    ///
    /// let label = EncodedLabel::new("A1b").unwrap();
    /// assert_eq!(label.units(), 4);
    /// assert_eq!(label.bytes(), b"A^BB");
    /// ```
    pub fn new(name: &str) -> ParseResult<Self> {
        let mut bytes = Vec::with_capacity(name.len() * 2);
        for c in name.chars() {
            if c.is_ascii_digit() {
                bytes.push(DIGIT_ESCAPE);
                bytes.push(codec::encode(i32::from(c as u8 - b'0'))?);
            } else if c.is_ascii_alphabetic() {
                bytes.push(c.to_ascii_uppercase() as u8);
            } else {
                bytes.push(b'_');
            }
        }
        if bytes.len() > MAX_LABEL_UNITS {
            return Err(ParseError::LabelTooLong {
                units: bytes.len(),
                max: MAX_LABEL_UNITS,
            });
        }
        Ok(Self {
            units: bytes.len() as i8,
            bytes,
        })
    }

    /// Value of the length argument.
    #[must_use]
    pub fn units(&self) -> i8 {
        self.units
    }

    /// Raw bytes to write after the length argument.
    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }
}

/// Incremental label decoder fed one received byte at a time.
///
/// Each byte is requested with its own ACK, so decoding is driven by the
/// reader rather than by a slice.
#[derive(Debug, Clone, Default)]
pub struct LabelDecoder {
    remaining: usize,
    escaped: bool,
    text: String,
}

impl LabelDecoder {
    /// Start decoding a label of `units` wire units.
    #[must_use]
    pub fn new(units: usize) -> Self {
        Self {
            remaining: units,
            escaped: false,
            text: String::with_capacity(units),
        }
    }

    /// Whether the whole label has been received.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.remaining == 0 && !self.escaped
    }

    /// Feed the next received byte.
    pub fn push(&mut self, byte: u8) -> ParseResult<()> {
        if self.is_complete() {
            return Err(ParseError::InvalidData(format!(
                "label already complete, extra byte 0x{byte:02X}"
            )));
        }
        self.remaining = self.remaining.saturating_sub(1);
        if self.escaped {
            self.escaped = false;
            let digit = codec::decode(byte)?;
            if !(0..=9).contains(&digit) {
                return Err(ParseError::InvalidData(format!(
                    "escaped label digit out of range: {digit}"
                )));
            }
            self.text.push(char::from(b'0' + digit as u8));
        } else if byte == DIGIT_ESCAPE {
            self.escaped = true;
        } else {
            self.text.push(char::from(byte));
        }
        Ok(())
    }

    /// Decoded text so far.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Finish decoding and take the text.
    #[must_use]
    pub fn finish(self) -> String {
        self.text
    }
}

/// Decode a complete label from its wire units.
pub fn decode(units: usize, bytes: impl IntoIterator<Item = u8>) -> ParseResult<String> {
    let mut decoder = LabelDecoder::new(units);
    let mut bytes = bytes.into_iter();
    while !decoder.is_complete() {
        let byte = bytes
            .next()
            .ok_or_else(|| ParseError::InvalidData("label truncated".into()))?;
        decoder.push(byte)?;
    }
    Ok(decoder.finish())
}
