// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Permit status states and the legal transition graph.
//!
//! Every status change requested of a permit is checked against the
//! adjacency table in [`PermitStatus::allowed_transitions`]. Any
//! non-terminal status may additionally move to `Cancelled`.

use crate::error::DomainError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Status of a permit application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermitStatus {
    /// Application started but not yet submitted.
    Draft,
    /// Application submitted, awaiting intake.
    Submitted,
    /// Departments are reviewing the application.
    UnderReview,
    /// Staff asked the applicant for more information.
    AdditionalInfo,
    /// Staff asked the applicant to correct the application.
    PendingCorrections,
    /// A pre-approval inspection was requested during review.
    InspectionRequested,
    /// Application approved; permit not yet issued.
    Approved,
    /// Permit issued and in force.
    Active,
    /// Permit work is being inspected.
    Inspections,
    /// All work inspected and closed out.
    Completed,
    /// Withdrawn by the applicant or staff.
    Cancelled,
    /// Denied by staff.
    Denied,
    /// Permit lapsed before completion.
    Expired,
}

const FROM_DRAFT: &[PermitStatus] = &[PermitStatus::Submitted, PermitStatus::Cancelled];
const FROM_SUBMITTED: &[PermitStatus] = &[PermitStatus::UnderReview, PermitStatus::Cancelled];
const FROM_UNDER_REVIEW: &[PermitStatus] = &[
    PermitStatus::Approved,
    PermitStatus::Denied,
    PermitStatus::AdditionalInfo,
    PermitStatus::PendingCorrections,
    PermitStatus::InspectionRequested,
    PermitStatus::Cancelled,
];
const FROM_ADDITIONAL_INFO: &[PermitStatus] = &[
    PermitStatus::UnderReview,
    PermitStatus::Denied,
    PermitStatus::Cancelled,
];
const FROM_PENDING_CORRECTIONS: &[PermitStatus] = &[
    PermitStatus::UnderReview,
    PermitStatus::Denied,
    PermitStatus::Cancelled,
];
const FROM_INSPECTION_REQUESTED: &[PermitStatus] =
    &[PermitStatus::UnderReview, PermitStatus::Cancelled];
const FROM_APPROVED: &[PermitStatus] = &[
    PermitStatus::Active,
    PermitStatus::Inspections,
    PermitStatus::Expired,
    PermitStatus::Cancelled,
];
const FROM_ACTIVE: &[PermitStatus] = &[
    PermitStatus::Inspections,
    PermitStatus::Completed,
    PermitStatus::Expired,
    PermitStatus::Cancelled,
];
const FROM_INSPECTIONS: &[PermitStatus] = &[
    PermitStatus::Active,
    PermitStatus::Completed,
    PermitStatus::Expired,
    PermitStatus::Cancelled,
];
const FROM_TERMINAL: &[PermitStatus] = &[];

impl PermitStatus {
    /// All statuses, in lifecycle order.
    pub const ALL: [Self; 13] = [
        Self::Draft,
        Self::Submitted,
        Self::UnderReview,
        Self::AdditionalInfo,
        Self::PendingCorrections,
        Self::InspectionRequested,
        Self::Approved,
        Self::Active,
        Self::Inspections,
        Self::Completed,
        Self::Cancelled,
        Self::Denied,
        Self::Expired,
    ];

    /// Returns the string representation of the status.
    ///
    /// This is used for persistence and API serialization.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Submitted => "submitted",
            Self::UnderReview => "under_review",
            Self::AdditionalInfo => "additional_info",
            Self::PendingCorrections => "pending_corrections",
            Self::InspectionRequested => "inspection_requested",
            Self::Approved => "approved",
            Self::Active => "active",
            Self::Inspections => "inspections",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
            Self::Denied => "denied",
            Self::Expired => "expired",
        }
    }

    /// Parses a status from its string representation.
    ///
    /// Hyphenated spellings (`under-review`) are accepted alongside the
    /// canonical snake case form.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidPermitStatus` if the string is not a valid status.
    fn parse_str(s: &str) -> Result<Self, DomainError> {
        let normalized: String = s.trim().to_ascii_lowercase().replace('-', "_");
        Self::ALL
            .iter()
            .copied()
            .find(|status| status.as_str() == normalized)
            .ok_or_else(|| DomainError::InvalidPermitStatus {
                status: s.to_string(),
            })
    }

    /// Returns true if this status is terminal (cannot transition to another state).
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Completed | Self::Cancelled | Self::Denied | Self::Expired
        )
    }

    /// Returns true if department reviews may be recorded in this status.
    #[must_use]
    pub const fn accepts_reviews(&self) -> bool {
        matches!(
            self,
            Self::UnderReview | Self::AdditionalInfo | Self::PendingCorrections
        )
    }

    /// Returns true if a review reset forces this status back to `UnderReview`.
    #[must_use]
    pub const fn is_past_review(&self) -> bool {
        matches!(
            self,
            Self::AdditionalInfo
                | Self::PendingCorrections
                | Self::InspectionRequested
                | Self::Approved
        )
    }

    /// Returns true if the applicant's payload may still be amended.
    #[must_use]
    pub const fn allows_amendment(&self) -> bool {
        matches!(
            self,
            Self::Draft | Self::AdditionalInfo | Self::PendingCorrections
        )
    }

    /// Returns the statuses reachable from this status in one step.
    #[must_use]
    pub const fn allowed_transitions(&self) -> &'static [Self] {
        match self {
            Self::Draft => FROM_DRAFT,
            Self::Submitted => FROM_SUBMITTED,
            Self::UnderReview => FROM_UNDER_REVIEW,
            Self::AdditionalInfo => FROM_ADDITIONAL_INFO,
            Self::PendingCorrections => FROM_PENDING_CORRECTIONS,
            Self::InspectionRequested => FROM_INSPECTION_REQUESTED,
            Self::Approved => FROM_APPROVED,
            Self::Active => FROM_ACTIVE,
            Self::Inspections => FROM_INSPECTIONS,
            Self::Completed | Self::Cancelled | Self::Denied | Self::Expired => FROM_TERMINAL,
        }
    }

    /// Returns true if `target` is reachable from this status in one step.
    #[must_use]
    pub fn can_transition_to(&self, target: Self) -> bool {
        self.allowed_transitions().contains(&target)
    }

    /// Validates if a transition from this status to another is permitted.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidStatusTransition` carrying the allowed set
    /// if the transition is not an edge of the lifecycle graph.
    pub fn validate_transition(&self, target: Self) -> Result<(), DomainError> {
        if self.can_transition_to(target) {
            Ok(())
        } else {
            Err(DomainError::InvalidStatusTransition {
                from: *self,
                to: target,
                allowed: self.allowed_transitions().to_vec(),
            })
        }
    }
}

impl FromStr for PermitStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_str(s)
    }
}

impl std::fmt::Display for PermitStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_string_round_trip() {
        for status in PermitStatus::ALL {
            let s = status.as_str();
            match PermitStatus::parse_str(s) {
                Ok(parsed) => assert_eq!(status, parsed),
                Err(e) => panic!("Failed to parse status string: {s}: {e}"),
            }
        }
    }

    #[test]
    fn test_hyphenated_status_is_accepted() {
        assert_eq!(
            "under-review".parse::<PermitStatus>(),
            Ok(PermitStatus::UnderReview)
        );
        assert_eq!(
            "Inspection-Requested".parse::<PermitStatus>(),
            Ok(PermitStatus::InspectionRequested)
        );
    }

    #[test]
    fn test_invalid_status_string() {
        let result = PermitStatus::parse_str("on_hold");
        assert!(matches!(
            result,
            Err(DomainError::InvalidPermitStatus { .. })
        ));
    }

    #[test]
    fn test_terminal_states() {
        let terminal: Vec<PermitStatus> = PermitStatus::ALL
            .into_iter()
            .filter(PermitStatus::is_terminal)
            .collect();
        assert_eq!(
            terminal,
            vec![
                PermitStatus::Completed,
                PermitStatus::Cancelled,
                PermitStatus::Denied,
                PermitStatus::Expired,
            ]
        );
    }

    #[test]
    fn test_no_transitions_from_terminal_states() {
        for status in PermitStatus::ALL.into_iter().filter(PermitStatus::is_terminal) {
            assert!(status.allowed_transitions().is_empty());
            for target in PermitStatus::ALL {
                assert!(status.validate_transition(target).is_err());
            }
        }
    }

    #[test]
    fn test_every_non_terminal_status_can_be_cancelled() {
        for status in PermitStatus::ALL
            .into_iter()
            .filter(|status| !status.is_terminal())
        {
            assert!(
                status.can_transition_to(PermitStatus::Cancelled),
                "{status} should be cancellable"
            );
        }
    }

    #[test]
    fn test_review_outcomes_from_under_review() {
        let current = PermitStatus::UnderReview;

        assert!(current.validate_transition(PermitStatus::Approved).is_ok());
        assert!(current.validate_transition(PermitStatus::Denied).is_ok());
        assert!(
            current
                .validate_transition(PermitStatus::AdditionalInfo)
                .is_ok()
        );
        assert!(current.validate_transition(PermitStatus::Completed).is_err());
        assert!(current.validate_transition(PermitStatus::Active).is_err());
    }

    #[test]
    fn test_issued_permit_paths() {
        assert!(PermitStatus::Approved.can_transition_to(PermitStatus::Active));
        assert!(PermitStatus::Approved.can_transition_to(PermitStatus::Inspections));
        assert!(PermitStatus::Inspections.can_transition_to(PermitStatus::Completed));
        assert!(!PermitStatus::Approved.can_transition_to(PermitStatus::Completed));
        assert!(!PermitStatus::Submitted.can_transition_to(PermitStatus::Approved));
    }

    #[test]
    fn test_self_transition_is_rejected() {
        for status in PermitStatus::ALL {
            assert!(!status.can_transition_to(status));
        }
    }

    #[test]
    fn test_invalid_transition_reports_allowed_set() {
        let result = PermitStatus::Submitted.validate_transition(PermitStatus::Approved);

        match result {
            Err(DomainError::InvalidStatusTransition { from, to, allowed }) => {
                assert_eq!(from, PermitStatus::Submitted);
                assert_eq!(to, PermitStatus::Approved);
                assert_eq!(
                    allowed,
                    vec![PermitStatus::UnderReview, PermitStatus::Cancelled]
                );
            }
            other => panic!("Expected InvalidStatusTransition, got {other:?}"),
        }
    }
}
