// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::error::CoreError;
use permit_portal_audit::{AuditEvent, StateSnapshot};
use permit_portal_domain::{
    ApplicantInfo, ApplicationPayload, ContractorInfo, DEFAULT_EXPIRATION_MONTHS, Department,
    DepartmentReview, FeeLineItem, HiddenFieldPolicy, LifecycleDates, MunicipalitySnapshot,
    PermitNumber, PermitStatus, ReviewStatus,
};
use rust_decimal::Decimal;
use std::collections::{BTreeMap, BTreeSet};
use time::OffsetDateTime;

/// Settings and clock reading used while applying a change.
///
/// Passing the time in keeps every operation deterministic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApplyContext {
    /// The instant the change happens.
    pub now: OffsetDateTime,
    /// Months between approval and expiration.
    pub expiration_months: u32,
    /// Whether fields hidden by their display condition are validated.
    pub hidden_field_policy: HiddenFieldPolicy,
}

impl ApplyContext {
    /// Creates a context with the default expiration and validation policy.
    #[must_use]
    pub fn new(now: OffsetDateTime) -> Self {
        Self {
            now,
            expiration_months: DEFAULT_EXPIRATION_MONTHS,
            hidden_field_policy: HiddenFieldPolicy::default(),
        }
    }

    #[must_use]
    pub const fn with_expiration_months(mut self, expiration_months: u32) -> Self {
        self.expiration_months = expiration_months;
        self
    }

    #[must_use]
    pub const fn with_hidden_field_policy(mut self, policy: HiddenFieldPolicy) -> Self {
        self.hidden_field_policy = policy;
        self
    }
}

/// A permit application and everything recorded about it.
///
/// Municipality display data, required departments and required
/// inspections are copied from the catalog when the permit is created and
/// never follow later catalog edits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermitRecord {
    /// The canonical numeric identifier assigned by the database.
    /// `None` indicates the permit has not been persisted yet.
    pub permit_id: Option<i64>,
    /// Assigned once, on first persistence, and never changed.
    pub permit_number: Option<PermitNumber>,
    pub municipality_id: i64,
    pub municipality: MunicipalitySnapshot,
    pub permit_type_id: i64,
    pub permit_type_code: String,
    pub applicant: ApplicantInfo,
    pub contractor: Option<ContractorInfo>,
    pub payload: ApplicationPayload,
    pub fees: Vec<FeeLineItem>,
    pub total_fees: Decimal,
    pub status: PermitStatus,
    pub dates: LifecycleDates,
    /// Append-only timeline of every change made to this permit.
    pub notes: Vec<AuditEvent>,
    pub required_departments: BTreeSet<Department>,
    pub required_inspections: Vec<String>,
    pub reviews: BTreeMap<Department, DepartmentReview>,
    /// Optimistic concurrency counter, incremented by every save.
    pub version: i64,
    pub created_at: OffsetDateTime,
}

impl PermitRecord {
    /// Checks that the stored total equals the sum of the fee line items.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::FeeInvariantViolated` if they differ.
    pub fn check_fee_invariant(&self) -> Result<(), CoreError> {
        let sum: Decimal = self.fees.iter().map(|item| item.amount).sum();
        if sum == self.total_fees {
            Ok(())
        } else {
            Err(CoreError::FeeInvariantViolated {
                total: self.total_fees,
                sum,
            })
        }
    }

    /// Returns the review for `department`, treating a missing row as pending.
    #[must_use]
    pub fn review_for(&self, department: &Department) -> DepartmentReview {
        self.reviews
            .get(department)
            .cloned()
            .unwrap_or_else(|| DepartmentReview::pending(department.clone()))
    }

    /// Creates pending reviews for required departments that have none.
    pub(crate) fn open_reviews(&mut self) {
        for department in &self.required_departments {
            self.reviews
                .entry(department.clone())
                .or_insert_with(|| DepartmentReview::pending(department.clone()));
        }
    }

    /// Summarizes department review progress.
    #[must_use]
    pub fn review_summary(&self) -> ReviewSummary {
        let mut summary: ReviewSummary = ReviewSummary::default();
        for department in &self.required_departments {
            let review: DepartmentReview = self.review_for(department);
            match review.status {
                ReviewStatus::Pending => summary.pending.push(department.clone()),
                ReviewStatus::Approved => summary.approved.push(department.clone()),
                ReviewStatus::Rejected => summary.rejected.push(department.clone()),
                ReviewStatus::ChangesRequested => {
                    summary.changes_requested.push(department.clone());
                }
            }
            summary.per_department.push(review);
        }
        summary
    }

    /// Converts the record to a snapshot for audit purposes.
    #[must_use]
    pub fn to_snapshot(&self) -> StateSnapshot {
        let reviews: Vec<String> = self
            .required_departments
            .iter()
            .map(|department| format!("{department}:{}", self.review_for(department).status))
            .collect();

        StateSnapshot::new(format!(
            "status={},total_fees={},reviews=[{}]",
            self.status,
            self.total_fees,
            reviews.join(",")
        ))
    }
}

/// Department review progress for one permit.
///
/// Departments appear in the required-department order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ReviewSummary {
    pub per_department: Vec<DepartmentReview>,
    pub pending: Vec<Department>,
    pub approved: Vec<Department>,
    pub rejected: Vec<Department>,
    pub changes_requested: Vec<Department>,
}

impl ReviewSummary {
    /// Returns true if every department has approved.
    #[must_use]
    pub fn all_approved(&self) -> bool {
        self.pending.is_empty() && self.rejected.is_empty() && self.changes_requested.is_empty()
    }
}

/// The result of a successful change to a permit.
///
/// Changes are atomic: they either succeed completely or fail without side effects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionResult {
    /// The permit after the change.
    pub new_record: PermitRecord,
    /// The audit event recording this change.
    pub audit_event: AuditEvent,
}
