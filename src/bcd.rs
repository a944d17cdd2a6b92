//! Binary-coded decimal helpers.
//!
//! The DS3231 stores every time and date field as packed BCD: the high nibble
//! holds the tens digit and the low nibble the ones digit. Both conversions
//! work on the raw byte without validating it, so malformed register contents
//! decode to a deterministic (if meaningless) value instead of failing.

/// Converts a packed BCD byte to its binary value.
///
/// `0x59` decodes to `59`. Nibbles above 9 are not rejected.
#[must_use]
pub const fn decode(value: u8) -> u8 {
    value.wrapping_sub(6u8.wrapping_mul(value >> 4))
}

/// Converts a binary value (0-99) to a packed BCD byte.
#[must_use]
pub const fn encode(value: u8) -> u8 {
    value.wrapping_add(6u8.wrapping_mul(value / 10))
}
