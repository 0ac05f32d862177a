//! Field data types of entity ROM structs

use serde::Deserialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    U8,
    U16,
    U24,
    U32,
    S8,
    S16,
    S24,
    S32,
}

impl DataType {
    /// Size in bytes
    pub fn size(self) -> usize {
        match self {
            DataType::U8 | DataType::S8 => 1,
            DataType::U16 | DataType::S16 => 2,
            DataType::U24 | DataType::S24 => 3,
            DataType::U32 | DataType::S32 => 4,
        }
    }

    pub fn is_signed(self) -> bool {
        matches!(
            self,
            DataType::S8 | DataType::S16 | DataType::S24 | DataType::S32
        )
    }

    /// Inclusive range of representable values
    pub fn range(self) -> (i64, i64) {
        let bits = self.size() as u32 * 8;
        if self.is_signed() {
            (-(1i64 << (bits - 1)), (1i64 << (bits - 1)) - 1)
        } else {
            (0, (1i64 << bits) - 1)
        }
    }

    pub fn check(self, value: i64) -> Result<i64, String> {
        let (min, max) = self.range();
        if value < min || value > max {
            return Err(format!(
                "value {} is out of range for {} ({}..={})",
                value, self, min, max
            ));
        }
        Ok(value)
    }

    /// Parse a decimal or hexadecimal value and check it fits
    pub fn parse_value(self, s: &str) -> Result<i64, String> {
        let value = parse_integer(s).ok_or_else(|| format!("invalid number: {}", s))?;
        self.check(value)
    }

    /// Append `value` in little endian at this type's width
    pub fn encode(self, value: i64, out: &mut Vec<u8>) {
        out.extend_from_slice(&value.to_le_bytes()[..self.size()]);
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DataType::U8 => "u8",
            DataType::U16 => "u16",
            DataType::U24 => "u24",
            DataType::U32 => "u32",
            DataType::S8 => "s8",
            DataType::S16 => "s16",
            DataType::S24 => "s24",
            DataType::S32 => "s32",
        };
        f.write_str(s)
    }
}

/// Parse a decimal or `0x` hexadecimal integer with an optional leading `-`
pub fn parse_integer(s: &str) -> Option<i64> {
    let (negative, digits) = match s.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, s),
    };

    let (radix, digits) = match digits.strip_prefix("0x").or_else(|| digits.strip_prefix("0X")) {
        Some(hex) => (16, hex),
        None => (10, digits),
    };
    // from_str_radix takes its own sign; only the one stripped above is allowed
    if !digits.chars().next()?.is_digit(radix) {
        return None;
    }
    let value = i64::from_str_radix(digits, radix).ok()?;

    Some(if negative { -value } else { value })
}
