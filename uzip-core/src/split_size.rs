use crate::error::{Error, Result};
use std::fmt;
use std::str::FromStr;

/// Maximum size of each volume, e.g. `500m`, `2g`, `100k`.
///
/// The original spelling is kept: it is handed to 7-Zip verbatim (`-v2g`)
/// and recorded as-is in the manifest.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SplitSize(String);

impl SplitSize {
    pub fn parse(token: &str) -> Result<Self> {
        if is_valid(token) {
            Ok(Self(token.to_string()))
        } else {
            Err(Error::InvalidSplitSize(token.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// `<digits><k|m|g>`, case-insensitive.
pub fn is_valid(token: &str) -> bool {
    let Some(unit) = token.chars().last() else {
        return false;
    };
    if !matches!(unit.to_ascii_lowercase(), 'k' | 'm' | 'g') {
        return false;
    }
    let digits = &token[..token.len() - 1];
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

impl FromStr for SplitSize {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for SplitSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
