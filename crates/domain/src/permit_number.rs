// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::error::DomainError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// A human-readable permit number: `P{year}-{municipality code}-{sequence}`.
///
/// The sequence is zero-padded to at least three digits, e.g. `P2026-SPRING-007`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PermitNumber {
    year: i32,
    municipality_code: String,
    sequence: i64,
}

impl PermitNumber {
    /// Creates a permit number from its parts.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidPermitNumber` if the year is outside
    /// 1000..=9999, the code is empty or not uppercase ASCII letters, or the
    /// sequence is not positive.
    pub fn new(year: i32, municipality_code: &str, sequence: i64) -> Result<Self, DomainError> {
        if !(1000..=9999).contains(&year) {
            return Err(DomainError::InvalidPermitNumber(format!(
                "year {year} must have four digits"
            )));
        }
        if municipality_code.is_empty()
            || !municipality_code.chars().all(|c| c.is_ascii_uppercase())
        {
            return Err(DomainError::InvalidPermitNumber(format!(
                "municipality code '{municipality_code}' must be uppercase letters"
            )));
        }
        if sequence < 1 {
            return Err(DomainError::InvalidPermitNumber(format!(
                "sequence {sequence} must be positive"
            )));
        }
        Ok(Self {
            year,
            municipality_code: municipality_code.to_string(),
            sequence,
        })
    }

    #[must_use]
    pub const fn year(&self) -> i32 {
        self.year
    }

    #[must_use]
    pub fn municipality_code(&self) -> &str {
        &self.municipality_code
    }

    #[must_use]
    pub const fn sequence(&self) -> i64 {
        self.sequence
    }
}

impl std::fmt::Display for PermitNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "P{}-{}-{:03}",
            self.year, self.municipality_code, self.sequence
        )
    }
}

impl FromStr for PermitNumber {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || DomainError::InvalidPermitNumber(format!("'{s}' is malformed"));

        let rest: &str = s.strip_prefix('P').ok_or_else(malformed)?;
        let mut parts = rest.splitn(3, '-');
        let (Some(year), Some(code), Some(sequence)) = (parts.next(), parts.next(), parts.next())
        else {
            return Err(malformed());
        };
        if !sequence.chars().all(|c| c.is_ascii_digit()) {
            return Err(malformed());
        }

        let year: i32 = year.parse().map_err(|_| malformed())?;
        let sequence: i64 = sequence.parse().map_err(|_| malformed())?;
        Self::new(year, code, sequence)
    }
}

impl TryFrom<String> for PermitNumber {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<PermitNumber> for String {
    fn from(value: PermitNumber) -> Self {
        value.to_string()
    }
}
