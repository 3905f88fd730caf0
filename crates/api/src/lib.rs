// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

#![deny(
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    clippy::style,
    clippy::correctness,
    clippy::all,
    clippy::suspicious,
    clippy::complexity,
    clippy::perf,
    clippy::unwrap_used,
    clippy::expect_used
)]
#![allow(clippy::multiple_crate_versions)]

//! API boundary for the permit workflow engine.
//!
//! Callers authenticate actors themselves and hand the handlers an
//! [`AuthenticatedActor`]. Handlers authorize, apply the change through the
//! core engine, persist it and translate every lower-level error into an
//! [`ApiError`].

mod auth;
mod config;
mod error;
mod handlers;
mod request_response;

#[cfg(test)]
mod tests;

pub use auth::{AuthenticatedActor, AuthorizationService, Role};
pub use config::{
    ConfigError, EXPIRATION_MONTHS_VAR, HIDDEN_FIELD_POLICY_VAR, NUMBER_ALLOCATION_ATTEMPTS_VAR,
    SYSTEM_ACTOR_ID_VAR, WorkflowConfig,
};
pub use error::{
    ApiError, AuthError, translate_core_error, translate_domain_error, translate_persistence_error,
};
pub use handlers::{
    amend_application, get_department_review_summary, get_permit, get_permit_audit_trail,
    get_permit_by_number, list_permit_types, list_permits, register_municipality, reset_reviews,
    save_permit_type, submit_department_review, submit_permit, transition_permit,
};
pub use request_response::{
    AmendApplicationRequest, AuditEventInfo, AuditTrailResponse, DepartmentReviewInfo,
    DepartmentReviewRequest, DepartmentReviewResponse, DepartmentReviewSummary,
    ListPermitTypesResponse, ListPermitsRequest, ListPermitsResponse, MunicipalityResponse,
    PermitResponse, PermitSummaryInfo, PermitTypeInfo, RegisterMunicipalityRequest,
    ResetReviewsRequest, SavePermitTypeRequest, SavePermitTypeResponse, SubmitPermitRequest,
    TransitionPermitRequest,
};
