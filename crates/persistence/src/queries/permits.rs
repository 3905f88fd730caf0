// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use diesel::SqliteConnection;
use diesel::prelude::*;
use permit_portal::PermitRecord;
use permit_portal_audit::AuditEvent;
use permit_portal_domain::{
    ApplicantInfo, ApplicationPayload, ContractorInfo, Department, DepartmentReview, FeeLineItem,
    LifecycleDates, MunicipalitySnapshot, PermitNumber, PermitStatus, ReviewStatus,
};
use std::collections::{BTreeMap, BTreeSet};
use std::str::FromStr;

use crate::data_models::{
    DepartmentReviewRow, PermitRow, parse_amount, parse_optional_timestamp, parse_timestamp,
};
use crate::diesel_schema::{department_reviews, permits};
use crate::error::PersistenceError;
use crate::queries::audit::get_audit_trail;

/// Loads a permit with its reviews and full audit trail.
///
/// # Errors
///
/// Returns `PermitNotFound` if no such permit exists, or a reconstruction
/// error if stored data no longer validates.
pub fn load_permit(
    conn: &mut SqliteConnection,
    permit_id: i64,
) -> Result<PermitRecord, PersistenceError> {
    let row: PermitRow = permits::table
        .filter(permits::permit_id.eq(permit_id))
        .select(PermitRow::as_select())
        .first(conn)
        .map_err(|e| match e {
            diesel::result::Error::NotFound => {
                PersistenceError::PermitNotFound(permit_id.to_string())
            }
            other => other.into(),
        })?;

    let review_rows: Vec<DepartmentReviewRow> = department_reviews::table
        .filter(department_reviews::permit_id.eq(permit_id))
        .select(DepartmentReviewRow::as_select())
        .load(conn)?;

    let notes: Vec<AuditEvent> = get_audit_trail(conn, permit_id)?;

    permit_from_rows(row, review_rows, notes)
}

/// Resolves a permit number to its permit ID.
///
/// # Errors
///
/// Returns `PermitNotFound` if no permit carries this number.
pub fn find_permit_id(
    conn: &mut SqliteConnection,
    permit_number: &PermitNumber,
) -> Result<i64, PersistenceError> {
    permits::table
        .filter(permits::permit_number.eq(permit_number.to_string()))
        .select(permits::permit_id)
        .first::<i64>(conn)
        .map_err(|e| match e {
            diesel::result::Error::NotFound => {
                PersistenceError::PermitNotFound(permit_number.to_string())
            }
            other => other.into(),
        })
}

/// Lists the IDs of a municipality's permits, optionally filtered by
/// status, oldest first.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn list_permit_ids(
    conn: &mut SqliteConnection,
    municipality_id: i64,
    status: Option<PermitStatus>,
) -> Result<Vec<i64>, PersistenceError> {
    let mut query = permits::table
        .filter(permits::municipality_id.eq(municipality_id))
        .select(permits::permit_id)
        .order(permits::permit_id.asc())
        .into_boxed();

    if let Some(status) = status {
        query = query.filter(permits::status.eq(status.as_str()));
    }

    Ok(query.load::<i64>(conn)?)
}

/// Returns the version currently stored for a permit.
///
/// # Errors
///
/// Returns `PermitNotFound` if no such permit exists.
pub fn current_version(
    conn: &mut SqliteConnection,
    permit_id: i64,
) -> Result<i64, PersistenceError> {
    permits::table
        .filter(permits::permit_id.eq(permit_id))
        .select(permits::version)
        .first::<i64>(conn)
        .map_err(|e| match e {
            diesel::result::Error::NotFound => {
                PersistenceError::PermitNotFound(permit_id.to_string())
            }
            other => other.into(),
        })
}

fn permit_from_rows(
    row: PermitRow,
    review_rows: Vec<DepartmentReviewRow>,
    notes: Vec<AuditEvent>,
) -> Result<PermitRecord, PersistenceError> {
    let applicant: ApplicantInfo = serde_json::from_str(&row.applicant_json)?;
    let contractor: Option<ContractorInfo> = row
        .contractor_json
        .as_deref()
        .map(serde_json::from_str)
        .transpose()?;
    let payload: ApplicationPayload = serde_json::from_str(&row.payload_json)?;
    let fees: Vec<FeeLineItem> = serde_json::from_str(&row.fees_json)?;
    let required_departments: BTreeSet<Department> =
        serde_json::from_str(&row.required_departments_json)?;
    let required_inspections: Vec<String> = serde_json::from_str(&row.required_inspections_json)?;

    let mut reviews: BTreeMap<Department, DepartmentReview> = BTreeMap::new();
    for review_row in review_rows {
        let review: DepartmentReview = review_from_row(review_row)?;
        reviews.insert(review.department.clone(), review);
    }

    Ok(PermitRecord {
        permit_id: Some(row.permit_id),
        permit_number: Some(PermitNumber::from_str(&row.permit_number)?),
        municipality_id: row.municipality_id,
        municipality: MunicipalitySnapshot {
            name: row.municipality_name,
            code: row.municipality_code,
        },
        permit_type_id: row.permit_type_id,
        permit_type_code: row.permit_type_code,
        applicant,
        contractor,
        payload,
        fees,
        total_fees: parse_amount(&row.total_fees)?,
        status: PermitStatus::from_str(&row.status)?,
        dates: LifecycleDates {
            submitted: parse_optional_timestamp(row.submitted_at.as_deref())?,
            approved: parse_optional_timestamp(row.approved_at.as_deref())?,
            completed: parse_optional_timestamp(row.completed_at.as_deref())?,
            expiration: parse_optional_timestamp(row.expires_at.as_deref())?,
        },
        notes,
        required_departments,
        required_inspections,
        reviews,
        version: row.version,
        created_at: parse_timestamp(&row.created_at)?,
    })
}

fn review_from_row(row: DepartmentReviewRow) -> Result<DepartmentReview, PersistenceError> {
    Ok(DepartmentReview {
        department: Department::new(&row.department)?,
        status: ReviewStatus::from_str(&row.status)?,
        reviewer: row.reviewer,
        notes: row.notes,
        reviewed_at: parse_optional_timestamp(row.reviewed_at.as_deref())?,
    })
}
