// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::status::PermitStatus;

/// Errors that can occur during domain validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A status string does not name a permit status.
    InvalidPermitStatus {
        /// The unrecognized status string.
        status: String,
    },
    /// The requested status change is not an edge of the permit lifecycle.
    InvalidStatusTransition {
        /// The current status.
        from: PermitStatus,
        /// The requested status.
        to: PermitStatus,
        /// The statuses reachable from `from`.
        allowed: Vec<PermitStatus>,
    },
    /// A review status string does not name a review status.
    InvalidReviewStatus {
        /// The unrecognized status string.
        status: String,
    },
    /// Department identifier is empty or invalid.
    InvalidDepartment(String),
    /// A field definition is malformed.
    InvalidFieldDefinition {
        /// The field name (may be empty if the name itself is invalid).
        field: String,
        /// Description of the problem.
        reason: String,
    },
    /// Two field definitions share a name.
    DuplicateFieldName(String),
    /// A fee rule is malformed.
    InvalidFeeRule {
        /// Position of the rule in the permit type's fee schedule.
        index: usize,
        /// Description of the problem.
        reason: String,
    },
    /// Municipality fee limits are inconsistent.
    InvalidFeeLimits(String),
    /// Permit type code or name is empty or invalid.
    InvalidPermitType(String),
    /// Municipality name is empty or yields no permit number code.
    InvalidMunicipality(String),
    /// Municipality timezone is not a known IANA timezone.
    InvalidTimezone {
        /// The unrecognized timezone.
        timezone: String,
    },
    /// Date arithmetic overflow.
    DateArithmeticOverflow {
        /// Description of the operation that failed.
        operation: String,
    },
    /// A permit number is malformed.
    InvalidPermitNumber(String),
    /// A fee could not be computed without overflowing.
    FeeAmountOverflow {
        /// The fee rule or total being computed.
        description: String,
        /// The application field the rule reads, if any.
        field: Option<String>,
    },
}

impl std::fmt::Display for DomainError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidPermitStatus { status } => {
                write!(f, "Invalid permit status: '{status}'")
            }
            Self::InvalidStatusTransition { from, to, allowed } => {
                let allowed_list: Vec<&str> = allowed.iter().map(PermitStatus::as_str).collect();
                write!(
                    f,
                    "Cannot transition permit from '{from}' to '{to}'; allowed: [{}]",
                    allowed_list.join(", ")
                )
            }
            Self::InvalidReviewStatus { status } => {
                write!(f, "Invalid review status: '{status}'")
            }
            Self::InvalidDepartment(msg) => write!(f, "Invalid department: {msg}"),
            Self::InvalidFieldDefinition { field, reason } => {
                write!(f, "Invalid field definition '{field}': {reason}")
            }
            Self::DuplicateFieldName(name) => {
                write!(f, "Field '{name}' is defined more than once")
            }
            Self::InvalidFeeRule { index, reason } => {
                write!(f, "Invalid fee rule #{index}: {reason}")
            }
            Self::InvalidFeeLimits(msg) => write!(f, "Invalid fee limits: {msg}"),
            Self::InvalidPermitType(msg) => write!(f, "Invalid permit type: {msg}"),
            Self::InvalidMunicipality(msg) => write!(f, "Invalid municipality: {msg}"),
            Self::InvalidTimezone { timezone } => {
                write!(f, "Unknown timezone '{timezone}'")
            }
            Self::DateArithmeticOverflow { operation } => {
                write!(f, "Date arithmetic overflow while {operation}")
            }
            Self::InvalidPermitNumber(msg) => write!(f, "Invalid permit number: {msg}"),
            Self::FeeAmountOverflow { description, field } => match field {
                Some(field) => write!(
                    f,
                    "Fee '{description}' overflowed: value of '{field}' is too large"
                ),
                None => write!(f, "Fee '{description}' overflowed"),
            },
        }
    }
}

impl std::error::Error for DomainError {}

impl DomainError {
    /// Returns true if this error describes bad permit type or municipality
    /// configuration, which is reported to municipal staff rather than applicants.
    #[must_use]
    pub const fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidFieldDefinition { .. }
                | Self::DuplicateFieldName(_)
                | Self::InvalidFeeRule { .. }
                | Self::InvalidFeeLimits(_)
                | Self::InvalidPermitType(_)
                | Self::InvalidMunicipality(_)
                | Self::InvalidTimezone { .. }
                | Self::InvalidDepartment(_)
        )
    }
}
