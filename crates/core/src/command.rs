// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use permit_portal_domain::{Department, PermitStatus, ReviewStatus};

/// A command represents user intent against an existing permit as data only.
///
/// Commands are the only way to request changes to a permit's status or
/// reviews. Submission and amendment need catalog data and have their own
/// entry points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Move the permit to another status.
    Transition {
        /// The requested status.
        target: PermitStatus,
        /// Notes recorded with the change.
        notes: Option<String>,
    },
    /// Record one department's verdict.
    RecordDepartmentReview {
        /// The reviewing department. Must be one the permit requires.
        department: Department,
        /// The verdict. `Pending` is not a verdict and is rejected.
        status: ReviewStatus,
        /// The reviewer's comments.
        notes: Option<String>,
        /// Name of the reviewer, shown on the review.
        reviewer: String,
    },
    /// Return department reviews to pending so they can be redone.
    ResetReviews {
        /// Departments to reset. Empty resets every required department.
        departments: Vec<Department>,
        notes: Option<String>,
    },
}

impl Command {
    /// Returns the audit action name for this command.
    #[must_use]
    pub const fn action_name(&self) -> &'static str {
        match self {
            Self::Transition { .. } => "TransitionPermit",
            Self::RecordDepartmentReview { .. } => "RecordDepartmentReview",
            Self::ResetReviews { .. } => "ResetDepartmentReviews",
        }
    }
}
