//! Delay quantization and SonicNet tick conversion.

use crate::error::{ParseError, ParseResult};

/// Longest supported reply delay in milliseconds.
pub const MAX_DELAY_MS: u16 = 1000;

/// Longest SonicNet delay or timeout in milliseconds (1023 ticks).
pub const SONICNET_MAX_MS: u16 = 28090;

/// Detection timeout tick value meaning "wait forever".
pub const NO_TIME_LIMIT: u16 = 0;

/// Map a reply delay in milliseconds onto the module's delay argument.
///
/// Up to 10 ms the value is sent as-is, then in 10 ms steps up to 100 ms and
/// 100 ms steps up to 1 s. Longer delays are rejected.
///
/// # Examples
///
/// ```
/// use easyvr_types::timing::quantize_delay;
///
/// assert_eq!(quantize_delay(5), Ok(5));
/// assert_eq!(quantize_delay(23), Ok(11));
/// assert_eq!(quantize_delay(500), Ok(23));
/// assert!(quantize_delay(1500).is_err());
/// ```
pub fn quantize_delay(millis: u16) -> ParseResult<i8> {
    let arg = match millis {
        0..=10 => millis,
        11..=100 => millis / 10 + 9,
        101..=MAX_DELAY_MS => millis / 100 + 18,
        _ => return Err(ParseError::out_of_range("delay", millis, 0u16, MAX_DELAY_MS)),
    };
    Ok(arg as i8)
}

/// Delay before an embedded token, in 27.46 ms ticks. Never less than one tick.
pub fn token_delay_ticks(millis: u16) -> ParseResult<u16> {
    ParseError::check_range("token delay", millis, 0, SONICNET_MAX_MS)?;
    let ticks = (u32::from(millis) * 2 + 27) / 55;
    Ok(ticks.max(1) as u16)
}

/// Token detection timeout in ticks, [`NO_TIME_LIMIT`] for zero.
pub fn token_timeout_ticks(millis: u16) -> ParseResult<u16> {
    ParseError::check_range("token timeout", millis, 0, SONICNET_MAX_MS)?;
    if millis == 0 {
        return Ok(NO_TIME_LIMIT);
    }
    Ok(((u32::from(millis) * 2 + 53) / 55) as u16)
}

/// Split a 10-bit value into its high and low 5-bit argument halves.
#[must_use]
pub fn split_10bit(value: u16) -> [i8; 2] {
    [((value >> 5) & 0x1F) as i8, (value & 0x1F) as i8]
}
