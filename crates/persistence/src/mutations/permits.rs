// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use diesel::SqliteConnection;
use diesel::prelude::*;
use permit_portal::PermitRecord;
use permit_portal_domain::{DepartmentReview, Municipality, PermitNumber};
use time::OffsetDateTime;
use tracing::{debug, info, warn};

use crate::backend::sqlite::get_last_insert_rowid;
use crate::data_models::{format_optional_timestamp, format_timestamp};
use crate::diesel_schema::{department_reviews, permit_number_sequences, permits};
use crate::error::PersistenceError;
use crate::mutations::audit::persist_new_audit_events;

/// Serialized columns shared by insert and update.
struct PermitColumns {
    applicant_json: String,
    contractor_json: Option<String>,
    payload_json: String,
    fees_json: String,
    total_fees: String,
    submitted_at: Option<String>,
    approved_at: Option<String>,
    completed_at: Option<String>,
    expires_at: Option<String>,
    updated_at: String,
}

impl PermitColumns {
    fn from_record(record: &PermitRecord) -> Result<Self, PersistenceError> {
        let contractor_json: Option<String> = record
            .contractor
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;

        Ok(Self {
            applicant_json: serde_json::to_string(&record.applicant)?,
            contractor_json,
            payload_json: serde_json::to_string(&record.payload)?,
            fees_json: serde_json::to_string(&record.fees)?,
            total_fees: record.total_fees.to_string(),
            submitted_at: format_optional_timestamp(record.dates.submitted)?,
            approved_at: format_optional_timestamp(record.dates.approved)?,
            completed_at: format_optional_timestamp(record.dates.completed)?,
            expires_at: format_optional_timestamp(record.dates.expiration)?,
            updated_at: format_timestamp(last_changed_at(record))?,
        })
    }
}

/// The time of the latest recorded change, or creation if there is none.
fn last_changed_at(record: &PermitRecord) -> OffsetDateTime {
    record
        .notes
        .last()
        .map_or(record.created_at, |event| event.recorded_at)
}

/// Claims the next permit number for a municipality.
///
/// The year is the municipality's local calendar year at `at`. Counters are
/// keyed by municipality code and year, so municipalities whose names
/// derive the same code share one sequence. The counter row is created on
/// first use and incremented in place, so a rolled back transaction gives
/// its number back and sequences stay gap-free.
///
/// # Errors
///
/// Returns an error if the municipality's stored data no longer validates
/// or the counter cannot be updated.
pub fn allocate_permit_number(
    conn: &mut SqliteConnection,
    municipality: &Municipality,
    at: OffsetDateTime,
) -> Result<PermitNumber, PersistenceError> {
    let municipality_id: i64 = municipality.municipality_id().ok_or_else(|| {
        PersistenceError::InvalidRecord(format!(
            "municipality '{}' has not been registered",
            municipality.name()
        ))
    })?;
    let year: i32 = municipality.local_year(at)?;
    let code: String = municipality.code();

    let sequence: i64 = diesel::insert_into(permit_number_sequences::table)
        .values((
            permit_number_sequences::municipality_code.eq(&code),
            permit_number_sequences::year.eq(year),
            permit_number_sequences::last_sequence.eq(1_i64),
        ))
        .on_conflict((
            permit_number_sequences::municipality_code,
            permit_number_sequences::year,
        ))
        .do_update()
        .set(
            permit_number_sequences::last_sequence
                .eq(permit_number_sequences::last_sequence + 1_i64),
        )
        .returning(permit_number_sequences::last_sequence)
        .get_result(conn)?;

    let permit_number: PermitNumber = PermitNumber::new(year, &code, sequence)?;
    debug!(%permit_number, municipality_id, year, sequence, "Allocated permit number");
    Ok(permit_number)
}

/// Inserts a new permit row with its reviews and audit events.
///
/// The row starts at version 1.
///
/// # Returns
///
/// The permit ID assigned by the database.
///
/// # Errors
///
/// Returns `NumberAllocationConflict` if the number is already taken.
pub fn insert_permit(
    conn: &mut SqliteConnection,
    record: &PermitRecord,
    permit_number: &PermitNumber,
) -> Result<i64, PersistenceError> {
    let columns: PermitColumns = PermitColumns::from_record(record)?;
    let required_departments_json: String = serde_json::to_string(&record.required_departments)?;
    let required_inspections_json: String = serde_json::to_string(&record.required_inspections)?;
    let created_at: String = format_timestamp(record.created_at)?;

    diesel::insert_into(permits::table)
        .values((
            permits::permit_number.eq(permit_number.to_string()),
            permits::municipality_id.eq(record.municipality_id),
            permits::municipality_name.eq(&record.municipality.name),
            permits::municipality_code.eq(&record.municipality.code),
            permits::permit_type_id.eq(record.permit_type_id),
            permits::permit_type_code.eq(&record.permit_type_code),
            permits::applicant_json.eq(&columns.applicant_json),
            permits::contractor_json.eq(columns.contractor_json.as_deref()),
            permits::payload_json.eq(&columns.payload_json),
            permits::fees_json.eq(&columns.fees_json),
            permits::total_fees.eq(&columns.total_fees),
            permits::status.eq(record.status.as_str()),
            permits::submitted_at.eq(columns.submitted_at.as_deref()),
            permits::approved_at.eq(columns.approved_at.as_deref()),
            permits::completed_at.eq(columns.completed_at.as_deref()),
            permits::expires_at.eq(columns.expires_at.as_deref()),
            permits::required_departments_json.eq(&required_departments_json),
            permits::required_inspections_json.eq(&required_inspections_json),
            permits::version.eq(1_i64),
            permits::created_at.eq(&created_at),
            permits::updated_at.eq(&columns.updated_at),
        ))
        .execute(conn)?;

    let permit_id: i64 = get_last_insert_rowid(conn)?;
    upsert_reviews(conn, permit_id, record.reviews.values())?;
    persist_new_audit_events(conn, permit_id, &record.notes)?;

    info!(
        permit_id,
        %permit_number,
        status = %record.status,
        "Inserted permit"
    );
    Ok(permit_id)
}

/// Writes a changed permit if nobody else saved it since it was loaded.
///
/// The row is only updated when its stored version still equals
/// `record.version`; the version is then incremented. Reviews are upserted
/// and new audit events appended. The permit number is never rewritten.
///
/// # Errors
///
/// Returns `ConcurrentModification` if the stored version moved on, or
/// `PermitNotFound` if the permit does not exist.
pub fn update_permit(
    conn: &mut SqliteConnection,
    permit_id: i64,
    record: &PermitRecord,
) -> Result<(), PersistenceError> {
    let columns: PermitColumns = PermitColumns::from_record(record)?;

    let updated: usize = diesel::update(
        permits::table
            .filter(permits::permit_id.eq(permit_id))
            .filter(permits::version.eq(record.version)),
    )
    .set((
        permits::applicant_json.eq(&columns.applicant_json),
        permits::contractor_json.eq(columns.contractor_json.as_deref()),
        permits::payload_json.eq(&columns.payload_json),
        permits::fees_json.eq(&columns.fees_json),
        permits::total_fees.eq(&columns.total_fees),
        permits::status.eq(record.status.as_str()),
        permits::submitted_at.eq(columns.submitted_at.as_deref()),
        permits::approved_at.eq(columns.approved_at.as_deref()),
        permits::completed_at.eq(columns.completed_at.as_deref()),
        permits::expires_at.eq(columns.expires_at.as_deref()),
        permits::version.eq(permits::version + 1_i64),
        permits::updated_at.eq(&columns.updated_at),
    ))
    .execute(conn)?;

    if updated == 0 {
        let exists: bool = diesel::select(diesel::dsl::exists(
            permits::table.filter(permits::permit_id.eq(permit_id)),
        ))
        .get_result(conn)?;

        if !exists {
            return Err(PersistenceError::PermitNotFound(permit_id.to_string()));
        }
        warn!(
            permit_id,
            expected_version = record.version,
            "Rejected stale permit update"
        );
        return Err(PersistenceError::ConcurrentModification {
            permit_id,
            expected_version: record.version,
        });
    }

    upsert_reviews(conn, permit_id, record.reviews.values())?;
    let appended: usize = persist_new_audit_events(conn, permit_id, &record.notes)?;

    debug!(
        permit_id,
        version = record.version + 1,
        appended,
        "Updated permit"
    );
    Ok(())
}

fn upsert_reviews<'a>(
    conn: &mut SqliteConnection,
    permit_id: i64,
    reviews: impl Iterator<Item = &'a DepartmentReview>,
) -> Result<(), PersistenceError> {
    for review in reviews {
        let reviewed_at: Option<String> = format_optional_timestamp(review.reviewed_at)?;

        diesel::insert_into(department_reviews::table)
            .values((
                department_reviews::permit_id.eq(permit_id),
                department_reviews::department.eq(review.department.code()),
                department_reviews::status.eq(review.status.as_str()),
                department_reviews::reviewer.eq(review.reviewer.as_deref()),
                department_reviews::notes.eq(review.notes.as_deref()),
                department_reviews::reviewed_at.eq(reviewed_at.as_deref()),
            ))
            .on_conflict((department_reviews::permit_id, department_reviews::department))
            .do_update()
            .set((
                department_reviews::status.eq(review.status.as_str()),
                department_reviews::reviewer.eq(review.reviewer.as_deref()),
                department_reviews::notes.eq(review.notes.as_deref()),
                department_reviews::reviewed_at.eq(reviewed_at.as_deref()),
            ))
            .execute(conn)?;
    }
    Ok(())
}
