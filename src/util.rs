//! Small helpers shared across the crate.

use std::hash::Hash;

use siphasher::sip128::{Hasher128, SipHasher13};

/// Hash the item with a 128-bit sip hash.
pub(crate) fn hash128<T: Hash + ?Sized>(value: &T) -> u128 {
    let mut state = SipHasher13::new();
    value.hash(&mut state);
    state.finish128().as_u128()
}

pub(crate) fn flate_compress(data: &[u8]) -> Vec<u8> {
    const COMPRESSION_LEVEL: u8 = 6;
    miniz_oxide::deflate::compress_to_vec_zlib(data, COMPRESSION_LEVEL)
}

/// Quote a string as a PDF literal string, escaping `\`, `(` and `)`.
pub(crate) fn pdf_string_literal(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('(');
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '(' => out.push_str("\\("),
            ')' => out.push_str("\\)"),
            _ => out.push(c),
        }
    }
    out.push(')');
    out
}

/// Quote a metadata string. ASCII text becomes a literal string, anything
/// else is written as a UTF-16BE hex string with a byte order mark.
pub(crate) fn pdf_meta_string(s: &str) -> String {
    if s.is_ascii() {
        pdf_string_literal(s)
    } else {
        let mut out = String::from("<FEFF");
        for unit in s.encode_utf16() {
            out.push_str(&format!("{unit:04X}"));
        }
        out.push('>');
        out
    }
}

/// Format a number the way the `%f` conversion would, with six decimals.
pub(crate) fn fmt_fixed(v: f32) -> String {
    format!("{v:.6}")
}

/// A date with an UTC offset, rendered as `(D:YYYYMMDDhhmmss+hh'mm')`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct DateTime {
    /// The year.
    pub year: u16,
    /// The month, from 1.
    pub month: u8,
    /// The day, from 1.
    pub day: u8,
    /// The hour, from 0.
    pub hour: u8,
    /// The minute, from 0.
    pub minute: u8,
    /// The second, from 0.
    pub second: u8,
    /// The UTC offset in hours, negative for west of Greenwich.
    pub utc_offset_hour: i8,
    /// The UTC offset minutes, always with the sign of the hour offset.
    pub utc_offset_minute: u8,
}

impl DateTime {
    /// Create a new date at midnight on January 1st, UTC.
    pub fn new(year: u16) -> Self {
        Self {
            year,
            month: 1,
            day: 1,
            hour: 0,
            minute: 0,
            second: 0,
            utc_offset_hour: 0,
            utc_offset_minute: 0,
        }
    }

    pub(crate) fn to_pdf_date(self) -> String {
        let sign = if self.utc_offset_hour < 0 { '-' } else { '+' };
        format!(
            "(D:{:04}{:02}{:02}{:02}{:02}{:02}{}{:02}'{:02}')",
            self.year,
            self.month,
            self.day,
            self.hour,
            self.minute,
            self.second,
            sign,
            self.utc_offset_hour.unsigned_abs(),
            self.utc_offset_minute,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_string_escapes() {
        assert_eq!(pdf_string_literal("a(b)c\\d"), "(a\\(b\\)c\\\\d)");
    }

    #[test]
    fn meta_string_unicode() {
        assert_eq!(pdf_meta_string("ok"), "(ok)");
        assert_eq!(pdf_meta_string("ä"), "<FEFF00E4>");
    }

    #[test]
    fn pdf_date_format() {
        let mut dt = DateTime::new(2024);
        dt.month = 11;
        dt.day = 8;
        dt.hour = 22;
        dt.minute = 23;
        dt.second = 18;
        dt.utc_offset_hour = -1;
        dt.utc_offset_minute = 30;
        assert_eq!(dt.to_pdf_date(), "(D:20241108222318-01'30')");
    }
}
