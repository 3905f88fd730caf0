// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Reviewing departments and their per-permit review outcomes.

use crate::error::DomainError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use time::OffsetDateTime;

/// A municipal department that reviews permit applications.
///
/// Department codes are normalized to lowercase snake case so that
/// `"Fire"`, `"fire"` and `" FIRE "` identify the same department.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Department {
    code: String,
}

impl Department {
    /// Creates a department from its code.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidDepartment` if the code is empty or
    /// contains characters other than letters, digits, spaces, `-` or `_`.
    pub fn new(code: &str) -> Result<Self, DomainError> {
        let trimmed: &str = code.trim();
        if trimmed.is_empty() {
            return Err(DomainError::InvalidDepartment(String::from(
                "Department code cannot be empty",
            )));
        }
        if !trimmed
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, ' ' | '-' | '_'))
        {
            return Err(DomainError::InvalidDepartment(format!(
                "Department code '{trimmed}' contains invalid characters"
            )));
        }

        let normalized: String = trimmed
            .to_ascii_lowercase()
            .split([' ', '-', '_'])
            .filter(|part| !part.is_empty())
            .collect::<Vec<&str>>()
            .join("_");

        Ok(Self { code: normalized })
    }

    /// Returns the normalized department code.
    #[must_use]
    pub fn code(&self) -> &str {
        &self.code
    }
}

impl TryFrom<String> for Department {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(&value)
    }
}

impl From<Department> for String {
    fn from(value: Department) -> Self {
        value.code
    }
}

impl FromStr for Department {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl std::fmt::Display for Department {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code)
    }
}

/// Outcome of one department's review.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ReviewStatus {
    /// No verdict recorded yet.
    #[default]
    Pending,
    /// The department approves the application.
    Approved,
    /// The department rejects the application.
    Rejected,
    /// The department wants changes before it can decide.
    ChangesRequested,
}

impl ReviewStatus {
    /// Returns the string representation of the review status.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::ChangesRequested => "changes_requested",
        }
    }
}

impl FromStr for ReviewStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            "changes_requested" => Ok(Self::ChangesRequested),
            _ => Err(DomainError::InvalidReviewStatus {
                status: s.to_string(),
            }),
        }
    }
}

impl std::fmt::Display for ReviewStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One department's review of one permit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepartmentReview {
    pub department: Department,
    pub status: ReviewStatus,
    pub reviewer: Option<String>,
    pub notes: Option<String>,
    pub reviewed_at: Option<OffsetDateTime>,
}

impl DepartmentReview {
    /// Creates a pending review with no reviewer attribution.
    #[must_use]
    pub const fn pending(department: Department) -> Self {
        Self {
            department,
            status: ReviewStatus::Pending,
            reviewer: None,
            notes: None,
            reviewed_at: None,
        }
    }

    /// Creates a review carrying a reviewer's verdict.
    #[must_use]
    pub const fn decided(
        department: Department,
        status: ReviewStatus,
        reviewer: String,
        notes: Option<String>,
        reviewed_at: OffsetDateTime,
    ) -> Self {
        Self {
            department,
            status,
            reviewer: Some(reviewer),
            notes,
            reviewed_at: Some(reviewed_at),
        }
    }
}
