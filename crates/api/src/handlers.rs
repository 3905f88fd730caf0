// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Operation handlers.
//!
//! Every handler authorizes the actor before anything is written, applies
//! the change through the core engine and stores the result. Changes to an
//! existing permit run inside [`SqlitePersistence::modify_permit`], so the
//! permit cannot move between the authorization check and the save.

use permit_portal::{
    ApplyContext, AutoApprovalDecision, Command, CoreError, NewPermit, PermitRecord,
    ReviewSummary, TransitionResult,
    amend_application as amend_application_impl, apply, apply_auto_approval, create_permit,
    evaluate_auto_approval,
};
use permit_portal_audit::{AuditEvent, Cause};
use permit_portal_domain::{
    Department, DepartmentReview, FeeLimits, Municipality, PermitNumber, PermitStatus,
    PermitTypeDefinition, ReviewStatus,
};
use permit_portal_persistence::{SqlitePersistence, StoredPermitType};
use time::OffsetDateTime;
use tracing::{debug, info, warn};

use crate::auth::{AuthenticatedActor, AuthorizationService};
use crate::config::WorkflowConfig;
use crate::error::{
    ApiError, translate_core_error, translate_domain_error, translate_persistence_error,
};
use crate::request_response::{
    AmendApplicationRequest, AuditEventInfo, AuditTrailResponse, DepartmentReviewInfo,
    DepartmentReviewRequest, DepartmentReviewResponse, DepartmentReviewSummary,
    ListPermitTypesResponse, ListPermitsRequest, ListPermitsResponse, MunicipalityResponse,
    PermitResponse, PermitSummaryInfo, PermitTypeInfo, RegisterMunicipalityRequest,
    ResetReviewsRequest, SavePermitTypeRequest, SavePermitTypeResponse, SubmitPermitRequest,
    TransitionPermitRequest,
};

// ============================================================================
// Helpers
// ============================================================================

/// Runs `attempt` again while it fails with a retryable conflict.
///
/// `attempt` must redo the whole read-modify-write so every try works on
/// fresh data.
fn with_retries<T, F>(operation: &str, config: &WorkflowConfig, mut attempt: F) -> Result<T, ApiError>
where
    F: FnMut() -> Result<T, ApiError>,
{
    let max_attempts: u32 = config.max_number_allocation_attempts.max(1);
    let mut tries: u32 = 1;
    loop {
        match attempt() {
            Err(err) if err.is_retryable() && tries < max_attempts => {
                warn!(
                    operation,
                    attempt = tries,
                    max_attempts,
                    error = %err,
                    "Write conflicted with another writer, retrying"
                );
                tries += 1;
            }
            Err(err) if err.is_retryable() => {
                warn!(operation, attempts = tries, error = %err, "Giving up after conflicts");
                return Err(err);
            }
            result => return result,
        }
    }
}

fn parse_department(value: &str) -> Result<Department, ApiError> {
    Department::new(value).map_err(|err| ApiError::InvalidInput {
        field: String::from("department"),
        message: err.to_string(),
    })
}

fn department_codes(departments: &[Department]) -> Vec<String> {
    departments
        .iter()
        .map(|department| department.code().to_string())
        .collect()
}

fn review_info(review: &DepartmentReview) -> DepartmentReviewInfo {
    DepartmentReviewInfo {
        department: review.department.code().to_string(),
        status: review.status,
        reviewer: review.reviewer.clone(),
        notes: review.notes.clone(),
        reviewed_at: review.reviewed_at,
    }
}

fn stored_identity(record: &PermitRecord) -> Result<(i64, String), ApiError> {
    match (record.permit_id, &record.permit_number) {
        (Some(permit_id), Some(permit_number)) => Ok((permit_id, permit_number.to_string())),
        _ => Err(ApiError::Internal {
            message: String::from("Permit was returned without its ID or permit number"),
        }),
    }
}

fn permit_response(record: &PermitRecord) -> Result<PermitResponse, ApiError> {
    let (permit_id, permit_number): (i64, String) = stored_identity(record)?;
    let summary: ReviewSummary = record.review_summary();

    Ok(PermitResponse {
        permit_id,
        permit_number,
        municipality_id: record.municipality_id,
        municipality_name: record.municipality.name.clone(),
        permit_type_id: record.permit_type_id,
        permit_type_code: record.permit_type_code.clone(),
        applicant: record.applicant.clone(),
        contractor: record.contractor.clone(),
        payload: record.payload.clone(),
        fees: record.fees.clone(),
        total_fees: record.total_fees,
        status: record.status,
        submitted_at: record.dates.submitted,
        approved_at: record.dates.approved,
        completed_at: record.dates.completed,
        expires_at: record.dates.expiration,
        required_departments: record
            .required_departments
            .iter()
            .map(|department| department.code().to_string())
            .collect(),
        required_inspections: record.required_inspections.clone(),
        reviews: summary.per_department.iter().map(review_info).collect(),
        version: record.version,
    })
}

fn audit_event_info(event: &AuditEvent) -> Result<AuditEventInfo, ApiError> {
    let event_id: i64 = event.event_id.ok_or_else(|| ApiError::Internal {
        message: String::from("Audit event was returned without its ID"),
    })?;

    Ok(AuditEventInfo {
        event_id,
        actor_id: event.actor.id.clone(),
        actor_type: event.actor.actor_type.clone(),
        cause: event.cause.description.clone(),
        action: event.action.name.clone(),
        details: event.action.details.clone(),
        before: event.before.data.clone(),
        after: event.after.data.clone(),
        notes: event.notes.clone(),
        recorded_at: event.recorded_at,
    })
}

fn load_permit(persistence: &mut SqlitePersistence, permit_id: i64) -> Result<PermitRecord, ApiError> {
    persistence
        .load_permit(permit_id)
        .map_err(translate_persistence_error)
}

/// Describes an auto-approval decision for responses and logs.
fn describe_decision(decision: &AutoApprovalDecision) -> String {
    match decision {
        AutoApprovalDecision::NotUnderReview => {
            String::from("Review recorded; the permit is not under review")
        }
        AutoApprovalDecision::BlockedByRejection(departments) => format!(
            "Review recorded; rejected by {}, awaiting a staff decision",
            department_codes(departments).join(", ")
        ),
        AutoApprovalDecision::AwaitingReviews(departments) => format!(
            "Review recorded; awaiting {}",
            department_codes(departments).join(", ")
        ),
        AutoApprovalDecision::Ready => {
            String::from("Review recorded; all department reviews completed and the permit was approved")
        }
    }
}

// ============================================================================
// Permit workflow
// ============================================================================

/// Submits a permit application, or saves it as a draft.
///
/// This function:
/// - Resolves the permit type and its municipality
/// - Verifies the actor may submit to that municipality
/// - Validates the payload and computes fees
/// - Stores the permit, assigning its permit number
///
/// # Arguments
///
/// * `persistence` - The persistence layer
/// * `request` - The application
/// * `authenticated_actor` - The authenticated actor performing this action
/// * `cause` - The cause or reason for this action
/// * `config` - Workflow settings
/// * `now` - The time of submission
///
/// # Returns
///
/// * `Ok(PermitResponse)` with the stored permit and its number
/// * `Err(ApiError)` if unauthorized, invalid, or the store fails
///
/// # Errors
///
/// Returns an error if:
/// - The permit type does not exist
/// - The actor may not submit to the permit type's municipality
/// - The payload fails validation (`ValidationFailed` lists every field)
/// - Permit numbering kept conflicting with other writers
pub fn submit_permit(
    persistence: &mut SqlitePersistence,
    request: SubmitPermitRequest,
    authenticated_actor: &AuthenticatedActor,
    cause: Cause,
    config: &WorkflowConfig,
    now: OffsetDateTime,
) -> Result<PermitResponse, ApiError> {
    let stored_type: StoredPermitType = persistence
        .get_permit_type(request.permit_type_id)
        .map_err(translate_persistence_error)?;

    AuthorizationService::authorize_submit(authenticated_actor, stored_type.municipality_id)?;

    let municipality: Municipality = persistence
        .get_municipality(stored_type.municipality_id)
        .map_err(translate_persistence_error)?;

    let new_permit: NewPermit<'_> = NewPermit {
        municipality: &municipality,
        permit_type_id: stored_type.permit_type_id,
        permit_type: &stored_type.definition,
        applicant: request.applicant,
        contractor: request.contractor,
        payload: request.payload,
        as_draft: request.as_draft,
    };
    let result: TransitionResult = create_permit(
        new_permit,
        authenticated_actor.to_audit_actor(),
        cause,
        &config.apply_context(now),
    )
    .map_err(|err| {
        if let CoreError::ValidationFailed(errors) = &err {
            warn!(
                permit_type = stored_type.definition.code(),
                invalid_fields = errors.len(),
                "Application failed validation"
            );
        }
        translate_core_error(err)
    })?;

    let stored: PermitRecord = with_retries("submit_permit", config, || {
        persistence
            .insert_permit(&result.new_record)
            .map_err(translate_persistence_error)
    })?;

    let response: PermitResponse = permit_response(&stored)?;
    info!(
        permit_id = response.permit_id,
        permit_number = %response.permit_number,
        status = %response.status,
        total_fees = %response.total_fees,
        actor = %authenticated_actor.id,
        "Permit created"
    );
    Ok(response)
}

/// Moves a permit to another status.
///
/// # Errors
///
/// Returns an error if:
/// - The status string is not a permit status
/// - The permit does not exist
/// - The actor may not request this status
/// - The lifecycle does not allow the change (`InvalidTransition`)
pub fn transition_permit(
    persistence: &mut SqlitePersistence,
    request: &TransitionPermitRequest,
    authenticated_actor: &AuthenticatedActor,
    cause: &Cause,
    config: &WorkflowConfig,
    now: OffsetDateTime,
) -> Result<PermitResponse, ApiError> {
    let target: PermitStatus = request
        .new_status
        .parse()
        .map_err(translate_domain_error)?;

    let (stored, from): (PermitRecord, PermitStatus) =
        with_retries("transition_permit", config, || {
            persistence
                .modify_permit(request.permit_id, |current| {
                    AuthorizationService::authorize_transition(
                        authenticated_actor,
                        current,
                        target,
                    )?;
                    let result: TransitionResult = apply(
                        current,
                        Command::Transition {
                            target,
                            notes: request.notes.clone(),
                        },
                        authenticated_actor.to_audit_actor(),
                        cause.clone(),
                        &config.apply_context(now),
                    )
                    .map_err(translate_core_error)?;
                    Ok::<_, ApiError>((result.new_record, current.status))
                })
                .map_err(ApiError::from)
        })
        .inspect_err(|err| {
            warn!(
                permit_id = request.permit_id,
                target = %target,
                actor = %authenticated_actor.id,
                error = %err,
                "Transition rejected"
            );
        })?;

    info!(
        permit_id = request.permit_id,
        from = %from,
        to = %stored.status,
        actor = %authenticated_actor.id,
        "Permit transitioned"
    );
    permit_response(&stored)
}

/// Records a department's review and approves the permit when it was the
/// last approval outstanding.
///
/// The review, the auto-approval check and the approval itself are saved
/// together. When two final reviews race, exactly one of them approves.
///
/// # Arguments
///
/// * `persistence` - The persistence layer
/// * `request` - The review
/// * `authenticated_actor` - The reviewer; recorded as the review's author
/// * `cause` - The cause or reason for this action
/// * `config` - Workflow settings, including the system actor
/// * `now` - The time of the review
///
/// # Errors
///
/// Returns an error if:
/// - The department or status string is invalid
/// - The actor does not review for the department (`Unauthorized`)
/// - The department is not required by the permit (`Unauthorized`)
/// - The permit is not open for reviews
pub fn submit_department_review(
    persistence: &mut SqlitePersistence,
    request: &DepartmentReviewRequest,
    authenticated_actor: &AuthenticatedActor,
    cause: &Cause,
    config: &WorkflowConfig,
    now: OffsetDateTime,
) -> Result<DepartmentReviewResponse, ApiError> {
    let department: Department = parse_department(&request.department)?;
    let status: ReviewStatus = request.status.parse().map_err(translate_domain_error)?;

    let (stored, decision): (PermitRecord, AutoApprovalDecision) =
        with_retries("submit_department_review", config, || {
            persistence
                .modify_permit(request.permit_id, |current| {
                    AuthorizationService::authorize_department_review(
                        authenticated_actor,
                        current,
                        &department,
                    )?;
                    let context: ApplyContext = config.apply_context(now);
                    let reviewed: PermitRecord = apply(
                        current,
                        Command::RecordDepartmentReview {
                            department: department.clone(),
                            status,
                            notes: request.notes.clone(),
                            reviewer: authenticated_actor.id.clone(),
                        },
                        authenticated_actor.to_audit_actor(),
                        cause.clone(),
                        &context,
                    )
                    .map_err(translate_core_error)?
                    .new_record;

                    let decision: AutoApprovalDecision = evaluate_auto_approval(&reviewed);
                    let finished: PermitRecord =
                        apply_auto_approval(&reviewed, config.system_actor(), &context)
                            .map_err(translate_core_error)?
                            .map_or(reviewed, |approval| approval.new_record);
                    Ok::<_, ApiError>((finished, decision))
                })
                .map_err(ApiError::from)
        })
        .inspect_err(|err| {
            warn!(
                permit_id = request.permit_id,
                department = %department,
                actor = %authenticated_actor.id,
                error = %err,
                "Department review rejected"
            );
        })?;

    let auto_approved: bool = decision == AutoApprovalDecision::Ready;
    debug!(
        permit_id = request.permit_id,
        decision = ?decision,
        "Evaluated auto-approval"
    );
    info!(
        permit_id = request.permit_id,
        department = %department,
        review_status = %status,
        auto_approved,
        actor = %authenticated_actor.id,
        "Department review recorded"
    );

    Ok(DepartmentReviewResponse {
        permit: permit_response(&stored)?,
        auto_approved,
        message: describe_decision(&decision),
    })
}

/// Summarizes a permit's department reviews.
///
/// # Errors
///
/// Returns an error if the permit does not exist or the actor may not view it.
pub fn get_department_review_summary(
    persistence: &mut SqlitePersistence,
    permit_id: i64,
    authenticated_actor: &AuthenticatedActor,
) -> Result<DepartmentReviewSummary, ApiError> {
    let record: PermitRecord = load_permit(persistence, permit_id)?;
    AuthorizationService::authorize_view_permit(authenticated_actor, &record)?;

    let (permit_id, permit_number): (i64, String) = stored_identity(&record)?;
    let summary: ReviewSummary = record.review_summary();
    Ok(DepartmentReviewSummary {
        permit_id,
        permit_number,
        status: record.status,
        reviews: summary.per_department.iter().map(review_info).collect(),
        pending: department_codes(&summary.pending),
        approved: department_codes(&summary.approved),
        rejected: department_codes(&summary.rejected),
        changes_requested: department_codes(&summary.changes_requested),
    })
}

/// Returns department reviews to pending so they can be redone.
///
/// A permit that had moved past review goes back to `under_review`.
///
/// # Errors
///
/// Returns an error if:
/// - A department code is invalid or not required by the permit
/// - The actor is not staff of the permit's municipality
/// - The permit's status does not allow a reset
pub fn reset_reviews(
    persistence: &mut SqlitePersistence,
    request: &ResetReviewsRequest,
    authenticated_actor: &AuthenticatedActor,
    cause: &Cause,
    config: &WorkflowConfig,
    now: OffsetDateTime,
) -> Result<PermitResponse, ApiError> {
    let departments: Vec<Department> = request
        .departments
        .iter()
        .map(|code| parse_department(code))
        .collect::<Result<_, _>>()?;

    let (stored, ()): (PermitRecord, ()) = with_retries("reset_reviews", config, || {
        persistence
            .modify_permit(request.permit_id, |current| {
                AuthorizationService::authorize_reset_reviews(authenticated_actor, current)?;
                let result: TransitionResult = apply(
                    current,
                    Command::ResetReviews {
                        departments: departments.clone(),
                        notes: request.notes.clone(),
                    },
                    authenticated_actor.to_audit_actor(),
                    cause.clone(),
                    &config.apply_context(now),
                )
                .map_err(translate_core_error)?;
                Ok::<_, ApiError>((result.new_record, ()))
            })
            .map_err(ApiError::from)
    })?;

    info!(
        permit_id = request.permit_id,
        departments = departments.len(),
        status = %stored.status,
        actor = %authenticated_actor.id,
        "Department reviews reset"
    );
    permit_response(&stored)
}

/// Replaces a permit's application and recomputes its fees.
///
/// The payload is validated against the permit type's current definition
/// and fees are bounded by the municipality's current limits.
///
/// # Errors
///
/// Returns an error if:
/// - The permit does not exist
/// - The actor is neither the applicant nor staff of the municipality
/// - The permit's status does not allow amendment
/// - The payload fails validation
pub fn amend_application(
    persistence: &mut SqlitePersistence,
    request: &AmendApplicationRequest,
    authenticated_actor: &AuthenticatedActor,
    cause: &Cause,
    config: &WorkflowConfig,
    now: OffsetDateTime,
) -> Result<PermitResponse, ApiError> {
    // Catalog lookups need the connection, so they happen before the
    // permit is locked. Both IDs are fixed for the permit's lifetime.
    let record: PermitRecord = load_permit(persistence, request.permit_id)?;
    AuthorizationService::authorize_amend(authenticated_actor, &record)?;
    let stored_type: StoredPermitType = persistence
        .get_permit_type(record.permit_type_id)
        .map_err(translate_persistence_error)?;
    let fee_limits: FeeLimits = *persistence
        .get_municipality(record.municipality_id)
        .map_err(translate_persistence_error)?
        .fee_limits();

    let (stored, previous_total) = with_retries("amend_application", config, || {
        persistence
            .modify_permit(request.permit_id, |current| {
                AuthorizationService::authorize_amend(authenticated_actor, current)?;
                let result: TransitionResult = amend_application_impl(
                    current,
                    &stored_type.definition,
                    &fee_limits,
                    request.payload.clone(),
                    authenticated_actor.to_audit_actor(),
                    cause.clone(),
                    &config.apply_context(now),
                )
                .map_err(translate_core_error)?;
                Ok::<_, ApiError>((result.new_record, current.total_fees))
            })
            .map_err(ApiError::from)
    })?;

    info!(
        permit_id = request.permit_id,
        previous_total = %previous_total,
        total_fees = %stored.total_fees,
        actor = %authenticated_actor.id,
        "Application amended"
    );
    permit_response(&stored)
}

/// Retrieves a permit.
///
/// # Errors
///
/// Returns an error if the permit does not exist or the actor may not view it.
pub fn get_permit(
    persistence: &mut SqlitePersistence,
    permit_id: i64,
    authenticated_actor: &AuthenticatedActor,
) -> Result<PermitResponse, ApiError> {
    let record: PermitRecord = load_permit(persistence, permit_id)?;
    AuthorizationService::authorize_view_permit(authenticated_actor, &record)?;
    permit_response(&record)
}

/// Retrieves a permit by its permit number.
///
/// # Errors
///
/// Returns an error if the number is malformed, no permit carries it, or
/// the actor may not view the permit.
pub fn get_permit_by_number(
    persistence: &mut SqlitePersistence,
    permit_number: &str,
    authenticated_actor: &AuthenticatedActor,
) -> Result<PermitResponse, ApiError> {
    let number: PermitNumber = permit_number.parse().map_err(translate_domain_error)?;
    let record: PermitRecord = persistence
        .load_permit_by_number(&number)
        .map_err(translate_persistence_error)?;
    AuthorizationService::authorize_view_permit(authenticated_actor, &record)?;
    permit_response(&record)
}

/// Retrieves a permit's audit trail, oldest first.
///
/// # Errors
///
/// Returns an error if the permit does not exist or the actor may not view it.
pub fn get_permit_audit_trail(
    persistence: &mut SqlitePersistence,
    permit_id: i64,
    authenticated_actor: &AuthenticatedActor,
) -> Result<AuditTrailResponse, ApiError> {
    let record: PermitRecord = load_permit(persistence, permit_id)?;
    AuthorizationService::authorize_view_permit(authenticated_actor, &record)?;

    let events: Vec<AuditEvent> = persistence
        .get_audit_trail(permit_id)
        .map_err(translate_persistence_error)?;
    Ok(AuditTrailResponse {
        permit_id,
        events: events
            .iter()
            .map(audit_event_info)
            .collect::<Result<_, _>>()?,
    })
}

/// Lists a municipality's permits, oldest first.
///
/// # Errors
///
/// Returns an error if the status filter is invalid or the actor does not
/// work for the municipality.
pub fn list_permits(
    persistence: &mut SqlitePersistence,
    request: &ListPermitsRequest,
    authenticated_actor: &AuthenticatedActor,
) -> Result<ListPermitsResponse, ApiError> {
    AuthorizationService::authorize_list_permits(authenticated_actor, request.municipality_id)?;
    let status: Option<PermitStatus> = request
        .status
        .as_deref()
        .map(str::parse::<PermitStatus>)
        .transpose()
        .map_err(translate_domain_error)?;

    let permit_ids: Vec<i64> = persistence
        .list_permit_ids(request.municipality_id, status)
        .map_err(translate_persistence_error)?;

    let mut permits: Vec<PermitSummaryInfo> = Vec::with_capacity(permit_ids.len());
    for permit_id in permit_ids {
        let record: PermitRecord = load_permit(persistence, permit_id)?;
        let (permit_id, permit_number): (i64, String) = stored_identity(&record)?;
        permits.push(PermitSummaryInfo {
            permit_id,
            permit_number,
            permit_type_code: record.permit_type_code,
            applicant_name: record.applicant.name,
            status: record.status,
            total_fees: record.total_fees,
        });
    }

    Ok(ListPermitsResponse {
        municipality_id: request.municipality_id,
        permits,
    })
}

// ============================================================================
// Catalog
// ============================================================================

/// Registers a municipality.
///
/// Only administrators may register municipalities.
///
/// # Errors
///
/// Returns an error if:
/// - The actor is not an administrator
/// - The name, timezone or fee limits are invalid (`ConfigurationError`)
/// - A municipality with the same name exists
pub fn register_municipality(
    persistence: &mut SqlitePersistence,
    request: &RegisterMunicipalityRequest,
    authenticated_actor: &AuthenticatedActor,
) -> Result<MunicipalityResponse, ApiError> {
    AuthorizationService::authorize_register_municipality(authenticated_actor)?;

    let mut municipality: Municipality =
        Municipality::new(&request.name).map_err(translate_domain_error)?;
    if let Some(timezone) = &request.timezone {
        municipality = municipality
            .with_timezone(timezone)
            .map_err(translate_domain_error)?;
    }
    municipality = municipality
        .with_fee_limits(FeeLimits {
            minimum_fee: request.minimum_fee,
            maximum_fee: request.maximum_fee,
        })
        .map_err(translate_domain_error)?;

    let registered: Municipality = persistence
        .register_municipality(&municipality)
        .map_err(translate_persistence_error)?;
    let municipality_id: i64 = registered.municipality_id().ok_or_else(|| ApiError::Internal {
        message: String::from("Registered municipality has no ID"),
    })?;

    info!(
        municipality_id,
        name = registered.name(),
        actor = %authenticated_actor.id,
        "Municipality registered"
    );
    Ok(MunicipalityResponse {
        municipality_id,
        name: registered.name().to_string(),
        code: registered.code(),
        timezone: registered.timezone().map(str::to_string),
        minimum_fee: registered.fee_limits().minimum_fee,
        maximum_fee: registered.fee_limits().maximum_fee,
        message: format!("Registered municipality '{}'", registered.name()),
    })
}

/// Creates or replaces a permit type.
///
/// The definition is validated before it is stored; tiered fee rules are
/// sorted by their lower bound. Existing permits keep the departments and
/// inspections they were created with.
///
/// # Errors
///
/// Returns an error if:
/// - The actor is not staff of the municipality
/// - The definition is malformed (`ConfigurationError`)
/// - The municipality does not exist
pub fn save_permit_type(
    persistence: &mut SqlitePersistence,
    request: SavePermitTypeRequest,
    authenticated_actor: &AuthenticatedActor,
    now: OffsetDateTime,
) -> Result<SavePermitTypeResponse, ApiError> {
    AuthorizationService::authorize_manage_permit_types(
        authenticated_actor,
        request.municipality_id,
    )?;

    let definition: PermitTypeDefinition = PermitTypeDefinition::new(request.definition)
        .map_err(|err| {
            warn!(
                municipality_id = request.municipality_id,
                error = %err,
                "Permit type configuration rejected"
            );
            translate_domain_error(err)
        })?;

    let permit_type_id: i64 = persistence
        .save_permit_type(request.municipality_id, &definition, now)
        .map_err(translate_persistence_error)?;

    info!(
        permit_type_id,
        municipality_id = request.municipality_id,
        code = definition.code(),
        actor = %authenticated_actor.id,
        "Permit type saved"
    );
    Ok(SavePermitTypeResponse {
        permit_type_id,
        municipality_id: request.municipality_id,
        code: definition.code().to_string(),
        name: definition.name().to_string(),
        message: format!("Saved permit type '{}'", definition.code()),
    })
}

/// Lists the permit types a municipality offers.
///
/// Any actor may read the catalog.
///
/// # Errors
///
/// Returns an error if the municipality does not exist.
pub fn list_permit_types(
    persistence: &mut SqlitePersistence,
    municipality_id: i64,
) -> Result<ListPermitTypesResponse, ApiError> {
    persistence
        .get_municipality(municipality_id)
        .map_err(translate_persistence_error)?;
    let permit_types: Vec<StoredPermitType> = persistence
        .list_permit_types(municipality_id)
        .map_err(translate_persistence_error)?;

    Ok(ListPermitTypesResponse {
        municipality_id,
        permit_types: permit_types
            .into_iter()
            .map(|stored| PermitTypeInfo {
                permit_type_id: stored.permit_type_id,
                definition: stored.definition.into(),
            })
            .collect(),
    })
}
