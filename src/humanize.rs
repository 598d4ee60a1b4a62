//! Human-readable sizes and durations for configuration values

use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    #[error("Invalid number: {0}")]
    InvalidNumber(#[from] std::num::ParseIntError),

    #[error("Invalid unit: {0}")]
    InvalidUnit(String),

    #[error("Value out of range: {0}")]
    Overflow(String),
}

/// Split `"250ms"` into `(250, "ms")`; a bare number has an empty unit
fn split_unit(input: &str) -> Result<(u64, &str), ParseError> {
    let input = input.trim();
    let pos = input
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(input.len());
    if pos == 0 {
        return Err(ParseError::InvalidFormat(input.to_string()));
    }
    let value = input[..pos].parse()?;
    Ok((value, input[pos..].trim()))
}

/// Byte size wrapper accepting `"64KB"`-style strings or plain integers
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct ByteSize(pub u64);

impl ByteSize {
    const UNITS: &'static [(&'static str, u64)] = &[
        ("TB", 1 << 40),
        ("GB", 1 << 30),
        ("MB", 1 << 20),
        ("KB", 1 << 10),
    ];

    pub fn as_u64(&self) -> u64 {
        self.0
    }

    pub fn as_usize(&self) -> usize {
        usize::try_from(self.0).unwrap_or(usize::MAX)
    }
}

impl FromStr for ByteSize {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (value, unit) = split_unit(s)?;
        let multiplier: u64 = match unit.to_ascii_uppercase().as_str() {
            "" | "B" => 1,
            "K" | "KB" | "KIB" => 1 << 10,
            "M" | "MB" | "MIB" => 1 << 20,
            "G" | "GB" | "GIB" => 1 << 30,
            "T" | "TB" | "TIB" => 1 << 40,
            other => return Err(ParseError::InvalidUnit(other.to_string())),
        };
        value
            .checked_mul(multiplier)
            .map(ByteSize)
            .ok_or_else(|| ParseError::Overflow(s.to_string()))
    }
}

impl fmt::Display for ByteSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &(unit, divisor) in Self::UNITS {
            if self.0 >= divisor && self.0 % divisor == 0 {
                return write!(f, "{}{}", self.0 / divisor, unit);
            }
        }
        write!(f, "{}B", self.0)
    }
}

/// Duration accepting `"1s"`, `"250ms"`, `"2m"` or a plain number of milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct HumanDuration(pub Duration);

impl HumanDuration {
    pub fn from_millis(millis: u64) -> Self {
        Self(Duration::from_millis(millis))
    }

    pub fn as_duration(&self) -> Duration {
        self.0
    }
}

impl FromStr for HumanDuration {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (value, unit) = split_unit(s)?;
        let duration = match unit.to_ascii_lowercase().as_str() {
            "" | "ms" => Duration::from_millis(value),
            "s" | "sec" | "secs" => Duration::from_secs(value),
            "m" | "min" | "mins" => value
                .checked_mul(60)
                .map(Duration::from_secs)
                .ok_or_else(|| ParseError::Overflow(s.to_string()))?,
            other => return Err(ParseError::InvalidUnit(other.to_string())),
        };
        Ok(HumanDuration(duration))
    }
}

impl fmt::Display for HumanDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let millis = self.0.as_millis();
        if millis >= 60_000 && millis % 60_000 == 0 {
            write!(f, "{}m", millis / 60_000)
        } else if millis >= 1000 && millis % 1000 == 0 {
            write!(f, "{}s", millis / 1000)
        } else {
            write!(f, "{millis}ms")
        }
    }
}

impl Serialize for HumanDuration {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Shared visitor: strings are parsed, integers taken as the base unit
macro_rules! impl_human_deserialize {
    ($ty:ident, $expecting:literal, $from_int:expr) => {
        impl<'de> Deserialize<'de> for $ty {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                struct HumanVisitor;

                impl<'de> serde::de::Visitor<'de> for HumanVisitor {
                    type Value = $ty;

                    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                        formatter.write_str($expecting)
                    }

                    fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
                    where
                        E: serde::de::Error,
                    {
                        Ok($from_int(v))
                    }

                    fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
                    where
                        E: serde::de::Error,
                    {
                        u64::try_from(v)
                            .map($from_int)
                            .map_err(|_| E::custom("value must not be negative"))
                    }

                    fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
                    where
                        E: serde::de::Error,
                    {
                        v.parse::<$ty>().map_err(E::custom)
                    }
                }

                deserializer.deserialize_any(HumanVisitor)
            }
        }
    };
}

impl_human_deserialize!(ByteSize, "a byte size such as \"64KB\" or an integer", ByteSize);
impl_human_deserialize!(
    HumanDuration,
    "a duration such as \"1s\" or an integer number of milliseconds",
    HumanDuration::from_millis
);
