//! CUPS (universal supply point code) checksum validation.

use std::{fmt::Display, str::FromStr};

use serde::Serialize;

const CHECKSUM_TABLE: &[u8; 23] = b"TRWAGMYFPDXBNJZSQVHLCKE";

/// The two control letters of a 16-digit CUPS body.
#[must_use]
pub fn checksum(digits: &str) -> Option<[char; 2]> {
    let number: u64 = digits.parse().ok()?;
    let remainder = number % 529;
    let first = CHECKSUM_TABLE[usize::try_from(remainder / 23).ok()?] as char;
    let second = CHECKSUM_TABLE[usize::try_from(remainder % 23).ok()?] as char;
    Some([first, second])
}

/// Validate a 20- or 22-character CUPS code against its control letters.
#[must_use]
pub fn check_cups_number(code: &str) -> bool {
    if code.len() < 20 || !code.is_ascii() {
        return false;
    }
    let body = &code[2..18];
    let Some([first, second]) = checksum(body) else {
        return false;
    };
    let check = format!("ES{body}{first}{second}");
    code[..20] == check
}

/// A validated supply point code.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct Cups(String);

impl Cups {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for Cups {
    type Err = InvalidCups;

    fn from_str(code: &str) -> Result<Self, Self::Err> {
        if check_cups_number(code) {
            Ok(Self(code.to_string()))
        } else {
            Err(InvalidCups(code.to_string()))
        }
    }
}

impl Display for Cups {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Eq, PartialEq, thiserror::Error)]
#[error("invalid CUPS number: {0}")]
pub struct InvalidCups(String);
