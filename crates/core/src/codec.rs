//! Decimal codec for counter values
//!
//! Counters are stored as plain ASCII decimal so that any client can read
//! them with an ordinary get. This is the only wire format the modify engine
//! owns, and [`parse`] accepts exactly what [`format`] produces (plus leading
//! zeros).
//!
//! ## Rules
//!
//! - `parse` accepts 1..[`NUMERIC_PARSE_CAP`] bytes of ASCII digits and
//!   nothing else: no sign, no whitespace, no trailing bytes.
//! - Values above `u64::MAX` do not parse.
//! - `format` writes the canonical form: no sign, no leading zeros, at most
//!   [`MAX_U64_DECIMAL_LEN`] bytes.

use std::ops::Deref;

/// Inputs of this many bytes or more are never parsed
///
/// Mirrors the fixed scratch buffer counters have always been parsed through:
/// 49 bytes of content plus room for a terminator.
pub const NUMERIC_PARSE_CAP: usize = 50;

/// Length of `u64::MAX` in decimal
pub const MAX_U64_DECIMAL_LEN: usize = 20;

/// Parse a stored value as an unsigned decimal integer
///
/// Returns `None` for empty input, input of [`NUMERIC_PARSE_CAP`] bytes or
/// more, any non-digit byte, or a value that does not fit in `u64`.
///
/// # Examples
///
/// ```
/// use strata_core::codec::parse;
///
/// assert_eq!(parse(b"15"), Some(15));
/// assert_eq!(parse(b"007"), Some(7));
/// assert_eq!(parse(b"abc"), None);
/// assert_eq!(parse(b"-1"), None);
/// ```
pub fn parse(bytes: &[u8]) -> Option<u64> {
    if bytes.is_empty() || bytes.len() >= NUMERIC_PARSE_CAP {
        return None;
    }
    let mut number: u64 = 0;
    for &byte in bytes {
        if !byte.is_ascii_digit() {
            return None;
        }
        number = number
            .checked_mul(10)?
            .checked_add(u64::from(byte - b'0'))?;
    }
    Some(number)
}

/// Format a number in canonical decimal
///
/// # Examples
///
/// ```
/// use strata_core::codec::format;
///
/// assert_eq!(format(0).as_bytes(), b"0");
/// assert_eq!(format(u64::MAX).as_bytes(), b"18446744073709551615");
/// ```
pub fn format(number: u64) -> DecimalBuf {
    let mut digits = [0u8; MAX_U64_DECIMAL_LEN];
    let mut pos = MAX_U64_DECIMAL_LEN;
    let mut rest = number;
    loop {
        pos -= 1;
        digits[pos] = b'0' + (rest % 10) as u8;
        rest /= 10;
        if rest == 0 {
            break;
        }
    }

    let len = MAX_U64_DECIMAL_LEN - pos;
    let mut buf = [0u8; MAX_U64_DECIMAL_LEN];
    buf[..len].copy_from_slice(&digits[pos..]);
    DecimalBuf {
        buf,
        len: len as u8,
    }
}

/// Owned, fixed-capacity buffer holding a formatted number
///
/// Plain bytes plus an explicit length. Large enough for every `u64`, so
/// formatting can never overflow it.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct DecimalBuf {
    buf: [u8; MAX_U64_DECIMAL_LEN],
    len: u8,
}

impl DecimalBuf {
    /// The formatted digits
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf[..self.len as usize]
    }

    /// Number of digits
    pub fn len(&self) -> usize {
        self.len as usize
    }

    /// Always false; every number has at least one digit
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl Deref for DecimalBuf {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        self.as_bytes()
    }
}

impl AsRef<[u8]> for DecimalBuf {
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}

impl std::fmt::Debug for DecimalBuf {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "DecimalBuf({})", self.as_bytes().escape_ascii())
    }
}
