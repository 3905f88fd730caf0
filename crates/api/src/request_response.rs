// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! API request and response data transfer objects.

use permit_portal_domain::{
    ApplicantInfo, ApplicationPayload, ContractorInfo, FeeLineItem, PermitStatus,
    PermitTypeConfig, ReviewStatus,
};
use rust_decimal::Decimal;
use time::OffsetDateTime;

/// API request to submit a permit application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitPermitRequest {
    /// The permit type applied for.
    pub permit_type_id: i64,
    pub applicant: ApplicantInfo,
    pub contractor: Option<ContractorInfo>,
    /// The application form's values keyed by field name.
    pub payload: ApplicationPayload,
    /// Save as a draft instead of submitting.
    pub as_draft: bool,
}

/// API request to move a permit to another status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionPermitRequest {
    pub permit_id: i64,
    /// The requested status, e.g. `"under_review"`.
    pub new_status: String,
    pub notes: Option<String>,
}

/// API request to record a department's review.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepartmentReviewRequest {
    pub permit_id: i64,
    /// The department code, e.g. `"fire"`.
    pub department: String,
    /// The verdict: `approved`, `rejected` or `changes_requested`.
    pub status: String,
    pub notes: Option<String>,
}

/// API request to return department reviews to pending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResetReviewsRequest {
    pub permit_id: i64,
    /// Department codes to reset. Empty resets every required department.
    pub departments: Vec<String>,
    pub notes: Option<String>,
}

/// API request to replace a permit's application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AmendApplicationRequest {
    pub permit_id: i64,
    pub payload: ApplicationPayload,
}

/// API request to list a municipality's permits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListPermitsRequest {
    pub municipality_id: i64,
    /// Only list permits in this status.
    pub status: Option<String>,
}

/// API request to register a municipality.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterMunicipalityRequest {
    pub name: String,
    /// IANA timezone, e.g. `"America/Chicago"`. Defaults to UTC.
    pub timezone: Option<String>,
    pub minimum_fee: Option<Decimal>,
    pub maximum_fee: Option<Decimal>,
}

/// API request to create or replace a permit type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavePermitTypeRequest {
    pub municipality_id: i64,
    /// The permit type. An existing type with the same code is replaced.
    pub definition: PermitTypeConfig,
}

/// One department's review as returned by the API.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct DepartmentReviewInfo {
    pub department: String,
    pub status: ReviewStatus,
    pub reviewer: Option<String>,
    pub notes: Option<String>,
    pub reviewed_at: Option<OffsetDateTime>,
}

/// A permit as returned by the API.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct PermitResponse {
    pub permit_id: i64,
    /// The permit number, e.g. `P2026-SPRING-001`.
    pub permit_number: String,
    pub municipality_id: i64,
    /// The municipality's name when the permit was created.
    pub municipality_name: String,
    pub permit_type_id: i64,
    pub permit_type_code: String,
    pub applicant: ApplicantInfo,
    pub contractor: Option<ContractorInfo>,
    pub payload: ApplicationPayload,
    pub fees: Vec<FeeLineItem>,
    pub total_fees: Decimal,
    pub status: PermitStatus,
    pub submitted_at: Option<OffsetDateTime>,
    pub approved_at: Option<OffsetDateTime>,
    pub completed_at: Option<OffsetDateTime>,
    pub expires_at: Option<OffsetDateTime>,
    pub required_departments: Vec<String>,
    pub required_inspections: Vec<String>,
    pub reviews: Vec<DepartmentReviewInfo>,
    /// Incremented on every save.
    pub version: i64,
}

/// API response for a recorded department review.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct DepartmentReviewResponse {
    pub permit: PermitResponse,
    /// True if this review completed the set and the permit was approved.
    pub auto_approved: bool,
    /// A human-readable summary of where the review set stands.
    pub message: String,
}

/// API response summarizing a permit's department reviews.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct DepartmentReviewSummary {
    pub permit_id: i64,
    pub permit_number: String,
    pub status: PermitStatus,
    pub reviews: Vec<DepartmentReviewInfo>,
    pub pending: Vec<String>,
    pub approved: Vec<String>,
    pub rejected: Vec<String>,
    pub changes_requested: Vec<String>,
}

/// One entry of a permit's audit trail.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct AuditEventInfo {
    pub event_id: i64,
    pub actor_id: String,
    pub actor_type: String,
    pub cause: String,
    pub action: String,
    pub details: Option<String>,
    pub before: String,
    pub after: String,
    pub notes: Option<String>,
    pub recorded_at: OffsetDateTime,
}

/// API response for a permit's audit trail, oldest first.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct AuditTrailResponse {
    pub permit_id: i64,
    pub events: Vec<AuditEventInfo>,
}

/// A permit as listed for staff.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct PermitSummaryInfo {
    pub permit_id: i64,
    pub permit_number: String,
    pub permit_type_code: String,
    pub applicant_name: String,
    pub status: PermitStatus,
    pub total_fees: Decimal,
}

/// API response for a permit listing.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ListPermitsResponse {
    pub municipality_id: i64,
    pub permits: Vec<PermitSummaryInfo>,
}

/// API response for a registered municipality.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct MunicipalityResponse {
    pub municipality_id: i64,
    pub name: String,
    /// The code used in permit numbers.
    pub code: String,
    pub timezone: Option<String>,
    pub minimum_fee: Option<Decimal>,
    pub maximum_fee: Option<Decimal>,
    pub message: String,
}

/// API response for a saved permit type.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SavePermitTypeResponse {
    pub permit_type_id: i64,
    pub municipality_id: i64,
    pub code: String,
    pub name: String,
    pub message: String,
}

/// A permit type as offered to applicants.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct PermitTypeInfo {
    pub permit_type_id: i64,
    pub definition: PermitTypeConfig,
}

/// API response for a municipality's permit types.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ListPermitTypesResponse {
    pub municipality_id: i64,
    pub permit_types: Vec<PermitTypeInfo>,
}
