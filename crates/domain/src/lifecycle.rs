// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Lifecycle dates stamped as a permit moves through its statuses.

use crate::error::DomainError;
use crate::status::PermitStatus;
use chrono::{Datelike, Months, NaiveDate};
use time::{Date, Month, OffsetDateTime};

/// Months between approval and expiration unless configured otherwise.
pub const DEFAULT_EXPIRATION_MONTHS: u32 = 6;

/// Adds calendar months to an instant, keeping the time of day.
///
/// Days past the end of the target month are clamped to its last day, so
/// August 31 plus six months is the last day of February.
///
/// # Errors
///
/// Returns `DomainError::DateArithmeticOverflow` if the result cannot be represented.
pub fn add_months(instant: OffsetDateTime, months: u32) -> Result<OffsetDateTime, DomainError> {
    let overflow = || DomainError::DateArithmeticOverflow {
        operation: format!("adding {months} months to {}", instant.date()),
    };

    // Convert time::Date to chrono::NaiveDate for month arithmetic
    let date: Date = instant.date();
    let naive: NaiveDate =
        NaiveDate::from_ymd_opt(date.year(), u32::from(u8::from(date.month())), u32::from(date.day()))
            .ok_or_else(overflow)?;
    let shifted: NaiveDate = naive
        .checked_add_months(Months::new(months))
        .ok_or_else(overflow)?;

    let month_number: u8 = u8::try_from(shifted.month()).map_err(|_| overflow())?;
    let day: u8 = u8::try_from(shifted.day()).map_err(|_| overflow())?;
    let month: Month = Month::try_from(month_number).map_err(|_| overflow())?;
    let new_date: Date =
        Date::from_calendar_date(shifted.year(), month, day).map_err(|_| overflow())?;

    Ok(instant.replace_date(new_date))
}

/// Dates recorded over a permit's lifecycle.
///
/// Each date is set at most once; later transitions into the same status
/// do not move it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LifecycleDates {
    pub submitted: Option<OffsetDateTime>,
    pub approved: Option<OffsetDateTime>,
    pub completed: Option<OffsetDateTime>,
    pub expiration: Option<OffsetDateTime>,
}

impl LifecycleDates {
    /// Stamps the dates that entering `target` sets, if they are not set yet.
    ///
    /// Entering `Approved` also fixes the expiration date
    /// `expiration_months` after approval.
    ///
    /// # Errors
    ///
    /// Returns an error if the expiration date overflows.
    pub fn stamp_for(
        &mut self,
        target: PermitStatus,
        now: OffsetDateTime,
        expiration_months: u32,
    ) -> Result<(), DomainError> {
        match target {
            PermitStatus::Submitted => {
                self.submitted.get_or_insert(now);
            }
            PermitStatus::Approved => {
                if self.approved.is_none() {
                    self.approved = Some(now);
                    self.expiration = Some(add_months(now, expiration_months)?);
                }
            }
            PermitStatus::Completed => {
                self.completed.get_or_insert(now);
            }
            _ => {}
        }
        Ok(())
    }
}
