// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::command::Command;
use crate::error::CoreError;
use crate::state::{ApplyContext, PermitRecord, TransitionResult};
use permit_portal_audit::{Action, Actor, AuditEvent, Cause, StateSnapshot};
use permit_portal_domain::{
    ApplicantInfo, ApplicationPayload, ContractorInfo, Department, DepartmentReview, DomainError,
    FeeCalculation, FeeLimits, FieldDefinition, FieldError, LifecycleDates, Municipality,
    PermitStatus, PermitTypeDefinition, ReviewStatus, apply_fee_limits, calculate_fees,
    validate_application,
};
use std::collections::BTreeMap;

/// Note recorded on the automatic approval event.
pub const AUTO_APPROVAL_NOTE: &str = "all department reviews completed";

/// Everything needed to create a permit from a submitted application.
#[derive(Debug, Clone)]
pub struct NewPermit<'a> {
    pub municipality: &'a Municipality,
    pub permit_type_id: i64,
    pub permit_type: &'a PermitTypeDefinition,
    pub applicant: ApplicantInfo,
    pub contractor: Option<ContractorInfo>,
    pub payload: ApplicationPayload,
    /// Save as a draft instead of submitting.
    pub as_draft: bool,
}

/// Outcome of checking whether a permit can be approved automatically.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AutoApprovalDecision {
    /// The permit is not under review.
    NotUnderReview,
    /// At least one department rejected. Denial stays a staff decision.
    BlockedByRejection(Vec<Department>),
    /// At least one department has not decided yet.
    AwaitingReviews(Vec<Department>),
    /// Every department has concluded favourably.
    Ready,
}

/// Validates an application and computes its fees.
///
/// # Errors
///
/// Returns `CoreError::ValidationFailed` with every field error if the
/// payload does not satisfy the permit type, or with a single error on the
/// input field whose value is too large to price.
fn validate_and_price(
    permit_type: &PermitTypeDefinition,
    fee_limits: &FeeLimits,
    payload: &ApplicationPayload,
    context: &ApplyContext,
) -> Result<FeeCalculation, CoreError> {
    let errors: Vec<FieldError> =
        validate_application(permit_type.fields(), payload, context.hidden_field_policy);
    if !errors.is_empty() {
        return Err(CoreError::ValidationFailed(errors));
    }

    calculate_fees(permit_type.fee_rules(), payload)
        .and_then(|calculation| apply_fee_limits(calculation, fee_limits))
        .map_err(|err| {
            let oversized: Option<&FieldDefinition> = match &err {
                DomainError::FeeAmountOverflow {
                    field: Some(name), ..
                } => permit_type.field(name),
                _ => None,
            };
            oversized.map_or_else(
                || CoreError::DomainViolation(err),
                |field| {
                    CoreError::ValidationFailed(vec![FieldError::new(
                        field,
                        format!("{} is too large to calculate fees", field.label),
                    )])
                },
            )
        })
}

/// Creates a permit record from a submitted application.
///
/// The payload is validated against the permit type, fees are computed and
/// bounded by the municipality's limits, and the permit type's departments
/// and inspections are copied onto the record. The record has no ID or
/// permit number until it is persisted.
///
/// # Arguments
///
/// * `request` - The application and the catalog entries it targets
/// * `actor` - The actor submitting the application
/// * `cause` - The cause or reason for this action
/// * `context` - The time and settings for this change
///
/// # Errors
///
/// Returns an error if:
/// - The municipality has not been persisted
/// - The payload fails validation
pub fn create_permit(
    request: NewPermit<'_>,
    actor: Actor,
    cause: Cause,
    context: &ApplyContext,
) -> Result<TransitionResult, CoreError> {
    let municipality_id: i64 = request.municipality.municipality_id().ok_or_else(|| {
        DomainError::InvalidMunicipality(format!(
            "Municipality '{}' has not been registered",
            request.municipality.name()
        ))
    })?;

    let fees: FeeCalculation = validate_and_price(
        request.permit_type,
        request.municipality.fee_limits(),
        &request.payload,
        context,
    )?;

    let status: PermitStatus = if request.as_draft {
        PermitStatus::Draft
    } else {
        PermitStatus::Submitted
    };
    let mut dates: LifecycleDates = LifecycleDates::default();
    dates.stamp_for(status, context.now, context.expiration_months)?;

    let mut new_record: PermitRecord = PermitRecord {
        permit_id: None,
        permit_number: None,
        municipality_id,
        municipality: request.municipality.snapshot(),
        permit_type_id: request.permit_type_id,
        permit_type_code: request.permit_type.code().to_string(),
        applicant: request.applicant,
        contractor: request.contractor,
        payload: request.payload,
        fees: fees.line_items,
        total_fees: fees.total,
        status,
        dates,
        notes: Vec::new(),
        required_departments: request.permit_type.required_departments().clone(),
        required_inspections: request.permit_type.required_inspections().to_vec(),
        reviews: BTreeMap::new(),
        version: 0,
        created_at: context.now,
    };
    new_record.check_fee_invariant()?;

    let action: Action = Action::new(
        String::from(if request.as_draft {
            "SaveDraft"
        } else {
            "SubmitPermit"
        }),
        Some(format!(
            "Created {} permit for {} with total fees {}",
            new_record.permit_type_code, new_record.municipality.name, new_record.total_fees
        )),
    );
    let audit_event: AuditEvent = AuditEvent::new(
        actor,
        cause,
        action,
        StateSnapshot::new(String::from("status=none")),
        new_record.to_snapshot(),
        None,
        context.now,
    );
    new_record.notes.push(audit_event.clone());

    Ok(TransitionResult {
        new_record,
        audit_event,
    })
}

/// Applies a command to a permit, producing the new record and an audit event.
///
/// The input record is never modified.
///
/// # Arguments
///
/// * `record` - The current permit (immutable)
/// * `command` - The command to apply
/// * `actor` - The actor performing this action
/// * `cause` - The cause or reason for this action
/// * `context` - The time and settings for this change
///
/// # Errors
///
/// Returns an error if:
/// - The transition is not allowed from the current status
/// - The department is not required for this permit
/// - Reviews are not open in the current status
/// - A lifecycle date cannot be computed
pub fn apply(
    record: &PermitRecord,
    command: Command,
    actor: Actor,
    cause: Cause,
    context: &ApplyContext,
) -> Result<TransitionResult, CoreError> {
    let action_name: &'static str = command.action_name();
    match command {
        Command::Transition { target, notes } => {
            record.status.validate_transition(target)?;
            let mut new_record: PermitRecord = record.clone();
            enter_status(&mut new_record, target, context)?;

            let action: Action = Action::new(
                String::from(action_name),
                Some(format!("{} -> {}", record.status, target)),
            );
            Ok(finish(record, new_record, actor, cause, action, notes, context))
        }
        Command::RecordDepartmentReview {
            department,
            status,
            notes,
            reviewer,
        } => {
            if !record.required_departments.contains(&department) {
                return Err(CoreError::DepartmentNotAssigned { department });
            }
            if !record.status.accepts_reviews() {
                return Err(CoreError::ReviewsNotOpen {
                    status: record.status,
                });
            }
            if status == ReviewStatus::Pending {
                return Err(CoreError::DomainViolation(DomainError::InvalidReviewStatus {
                    status: String::from("pending is not a review verdict"),
                }));
            }

            let mut new_record: PermitRecord = record.clone();
            new_record.reviews.insert(
                department.clone(),
                DepartmentReview::decided(
                    department.clone(),
                    status,
                    reviewer,
                    notes.clone(),
                    context.now,
                ),
            );

            let action: Action = Action::new(
                String::from(action_name),
                Some(format!("{department}: {status}")),
            );
            Ok(finish(record, new_record, actor, cause, action, notes, context))
        }
        Command::ResetReviews { departments, notes } => {
            if record.status != PermitStatus::UnderReview && !record.status.is_past_review() {
                return Err(CoreError::ReviewsNotOpen {
                    status: record.status,
                });
            }
            let target: PermitStatus = PermitStatus::UnderReview;

            let selected: Vec<Department> = if departments.is_empty() {
                record.required_departments.iter().cloned().collect()
            } else {
                departments
            };
            if let Some(department) = selected
                .iter()
                .find(|department| !record.required_departments.contains(department))
            {
                return Err(CoreError::DepartmentNotAssigned {
                    department: department.clone(),
                });
            }

            let mut new_record: PermitRecord = record.clone();
            // Forced return to review; lifecycle dates are kept.
            new_record.status = target;
            new_record.open_reviews();
            for department in &selected {
                new_record.reviews.insert(
                    department.clone(),
                    DepartmentReview::pending(department.clone()),
                );
            }

            let names: Vec<&str> = selected.iter().map(Department::code).collect();
            let action: Action = Action::new(
                String::from(action_name),
                Some(format!(
                    "Reset {} ({} -> {target})",
                    names.join(", "),
                    record.status
                )),
            );
            Ok(finish(record, new_record, actor, cause, action, notes, context))
        }
    }
}

/// Decides whether a permit is ready for automatic approval.
///
/// A permit with no required departments is vacuously ready; callers only
/// ask after recording a review.
#[must_use]
pub fn evaluate_auto_approval(record: &PermitRecord) -> AutoApprovalDecision {
    if record.status != PermitStatus::UnderReview {
        return AutoApprovalDecision::NotUnderReview;
    }

    let summary = record.review_summary();
    if !summary.rejected.is_empty() {
        return AutoApprovalDecision::BlockedByRejection(summary.rejected);
    }
    if !summary.pending.is_empty() {
        return AutoApprovalDecision::AwaitingReviews(summary.pending);
    }
    AutoApprovalDecision::Ready
}

/// Approves the permit on behalf of the system when it is ready.
///
/// Returns `Ok(None)` when the permit is not ready.
///
/// # Errors
///
/// Returns an error if the approval transition fails, e.g. the expiration
/// date cannot be computed.
pub fn apply_auto_approval(
    record: &PermitRecord,
    system_actor: Actor,
    context: &ApplyContext,
) -> Result<Option<TransitionResult>, CoreError> {
    if evaluate_auto_approval(record) != AutoApprovalDecision::Ready {
        return Ok(None);
    }

    let cause: Cause = Cause::new(
        String::from("auto-approval"),
        String::from("Every required department approved the permit"),
    );
    apply(
        record,
        Command::Transition {
            target: PermitStatus::Approved,
            notes: Some(String::from(AUTO_APPROVAL_NOTE)),
        },
        system_actor,
        cause,
        context,
    )
    .map(Some)
}

/// Replaces a permit's application and recomputes its fees.
///
/// The status does not change.
///
/// # Errors
///
/// Returns an error if:
/// - The permit's status does not allow amendment
/// - The permit type is not the permit's own type
/// - The new payload fails validation
pub fn amend_application(
    record: &PermitRecord,
    permit_type: &PermitTypeDefinition,
    fee_limits: &FeeLimits,
    payload: ApplicationPayload,
    actor: Actor,
    cause: Cause,
    context: &ApplyContext,
) -> Result<TransitionResult, CoreError> {
    if !record.status.allows_amendment() {
        return Err(CoreError::AmendmentNotAllowed {
            status: record.status,
        });
    }
    if permit_type.code() != record.permit_type_code {
        return Err(CoreError::DomainViolation(DomainError::InvalidPermitType(
            format!(
                "Permit is a '{}' permit, not '{}'",
                record.permit_type_code,
                permit_type.code()
            ),
        )));
    }

    let fees: FeeCalculation = validate_and_price(permit_type, fee_limits, &payload, context)?;

    let mut new_record: PermitRecord = record.clone();
    new_record.payload = payload;
    new_record.fees = fees.line_items;
    new_record.total_fees = fees.total;
    new_record.check_fee_invariant()?;

    let action: Action = Action::new(
        String::from("AmendApplication"),
        Some(format!(
            "Total fees {} -> {}",
            record.total_fees, new_record.total_fees
        )),
    );
    Ok(finish(record, new_record, actor, cause, action, None, context))
}

/// Sets the status and its side effects on a record being built.
fn enter_status(
    record: &mut PermitRecord,
    target: PermitStatus,
    context: &ApplyContext,
) -> Result<(), CoreError> {
    record
        .dates
        .stamp_for(target, context.now, context.expiration_months)?;
    if target == PermitStatus::UnderReview {
        record.open_reviews();
    }
    record.status = target;
    Ok(())
}

/// Records the audit event for a change and appends it to the timeline.
fn finish(
    before: &PermitRecord,
    mut new_record: PermitRecord,
    actor: Actor,
    cause: Cause,
    action: Action,
    notes: Option<String>,
    context: &ApplyContext,
) -> TransitionResult {
    let audit_event: AuditEvent = AuditEvent::new(
        actor,
        cause,
        action,
        before.to_snapshot(),
        new_record.to_snapshot(),
        notes,
        context.now,
    );
    new_record.notes.push(audit_event.clone());

    TransitionResult {
        new_record,
        audit_event,
    }
}
