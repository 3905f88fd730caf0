// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::error::DomainError;
use crate::fees::FeeLimits;
use chrono::Datelike;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Maximum length of the municipality code embedded in permit numbers.
const MUNICIPALITY_CODE_LENGTH: usize = 6;

/// Derives the permit number code for a municipality name.
///
/// The name is uppercased, stripped of everything but ASCII letters and
/// truncated to six characters: `"Spring Valley"` becomes `"SPRING"`.
#[must_use]
pub fn municipality_code(name: &str) -> String {
    name.chars()
        .filter(char::is_ascii_alphabetic)
        .map(|c| c.to_ascii_uppercase())
        .take(MUNICIPALITY_CODE_LENGTH)
        .collect()
}

/// A municipality operating the permit portal.
///
/// This is the live record owned by municipal staff. Permits keep a
/// [`MunicipalitySnapshot`] instead of sharing this value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Municipality {
    /// The canonical numeric identifier assigned by the database.
    /// `None` indicates the municipality has not been persisted yet.
    municipality_id: Option<i64>,
    name: String,
    /// IANA timezone used to decide the calendar year of a submission.
    timezone: Option<String>,
    fee_limits: FeeLimits,
}

impl Municipality {
    /// Creates a municipality without a persisted ID, in UTC, with no fee limits.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidMunicipality` if the name is empty or
    /// contains no letters to build a permit number code from.
    pub fn new(name: &str) -> Result<Self, DomainError> {
        let trimmed: &str = name.trim();
        if trimmed.is_empty() {
            return Err(DomainError::InvalidMunicipality(String::from(
                "Municipality name cannot be empty",
            )));
        }
        if municipality_code(trimmed).is_empty() {
            return Err(DomainError::InvalidMunicipality(format!(
                "Municipality name '{trimmed}' contains no letters"
            )));
        }
        Ok(Self {
            municipality_id: None,
            name: trimmed.to_string(),
            timezone: None,
            fee_limits: FeeLimits::default(),
        })
    }

    /// Returns this municipality with a persisted ID.
    #[must_use]
    pub fn with_id(mut self, municipality_id: i64) -> Self {
        self.municipality_id = Some(municipality_id);
        self
    }

    /// Returns this municipality in the given IANA timezone.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidTimezone` if the timezone is unknown.
    pub fn with_timezone(mut self, timezone: &str) -> Result<Self, DomainError> {
        parse_timezone(timezone)?;
        self.timezone = Some(timezone.to_string());
        Ok(self)
    }

    /// Returns this municipality with the given fee limits.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidFeeLimits` if the limits are inconsistent.
    pub fn with_fee_limits(mut self, fee_limits: FeeLimits) -> Result<Self, DomainError> {
        fee_limits.validate()?;
        self.fee_limits = fee_limits;
        Ok(self)
    }

    #[must_use]
    pub const fn municipality_id(&self) -> Option<i64> {
        self.municipality_id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn timezone(&self) -> Option<&str> {
        self.timezone.as_deref()
    }

    #[must_use]
    pub const fn fee_limits(&self) -> &FeeLimits {
        &self.fee_limits
    }

    /// Returns the permit number code for this municipality.
    #[must_use]
    pub fn code(&self) -> String {
        municipality_code(&self.name)
    }

    /// Returns the calendar year of `instant` in this municipality's timezone.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured timezone is unknown or the instant
    /// cannot be represented.
    pub fn local_year(&self, instant: OffsetDateTime) -> Result<i32, DomainError> {
        let utc = chrono::DateTime::from_timestamp(instant.unix_timestamp(), 0).ok_or_else(
            || DomainError::DateArithmeticOverflow {
                operation: String::from("converting submission time to the municipality timezone"),
            },
        )?;

        match &self.timezone {
            Some(timezone) => Ok(utc.with_timezone(&parse_timezone(timezone)?).year()),
            None => Ok(utc.year()),
        }
    }

    /// Captures the display data a permit keeps for its lifetime.
    #[must_use]
    pub fn snapshot(&self) -> MunicipalitySnapshot {
        MunicipalitySnapshot {
            name: self.name.clone(),
            code: self.code(),
        }
    }
}

fn parse_timezone(timezone: &str) -> Result<Tz, DomainError> {
    timezone
        .parse::<Tz>()
        .map_err(|_| DomainError::InvalidTimezone {
            timezone: timezone.to_string(),
        })
}

/// Municipality data copied onto a permit when it is created.
///
/// Renaming the municipality later does not change existing permits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MunicipalitySnapshot {
    pub name: String,
    pub code: String,
}
