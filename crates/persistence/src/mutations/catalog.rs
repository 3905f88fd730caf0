// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use diesel::SqliteConnection;
use diesel::prelude::*;
use permit_portal_domain::{Municipality, PermitTypeDefinition};
use time::OffsetDateTime;
use tracing::info;

use crate::backend::sqlite::get_last_insert_rowid;
use crate::data_models::format_timestamp;
use crate::diesel_schema::{municipalities, permit_types};
use crate::error::PersistenceError;
use crate::queries::catalog::get_municipality;

/// Inserts a new municipality.
///
/// # Returns
///
/// The municipality ID assigned by the database.
///
/// # Errors
///
/// Returns `InvalidRecord` if the municipality already has an ID, or
/// `DuplicateMunicipality` if the name is taken.
pub fn insert_municipality(
    conn: &mut SqliteConnection,
    municipality: &Municipality,
) -> Result<i64, PersistenceError> {
    if let Some(existing) = municipality.municipality_id() {
        return Err(PersistenceError::InvalidRecord(format!(
            "municipality '{}' is already registered with ID {existing}",
            municipality.name()
        )));
    }

    let limits = municipality.fee_limits();
    diesel::insert_into(municipalities::table)
        .values((
            municipalities::name.eq(municipality.name()),
            municipalities::timezone.eq(municipality.timezone()),
            municipalities::minimum_fee.eq(limits.minimum_fee.map(|fee| fee.to_string())),
            municipalities::maximum_fee.eq(limits.maximum_fee.map(|fee| fee.to_string())),
        ))
        .execute(conn)?;

    let municipality_id: i64 = get_last_insert_rowid(conn)?;
    info!(
        municipality_id,
        name = municipality.name(),
        "Registered municipality"
    );
    Ok(municipality_id)
}

/// Updates a municipality's name, timezone and fee limits.
///
/// Existing permits keep the municipality snapshot they were created with.
///
/// # Errors
///
/// Returns `InvalidRecord` if the municipality has no ID, or
/// `MunicipalityNotFound` if no row matches.
pub fn update_municipality(
    conn: &mut SqliteConnection,
    municipality: &Municipality,
) -> Result<(), PersistenceError> {
    let municipality_id: i64 = municipality.municipality_id().ok_or_else(|| {
        PersistenceError::InvalidRecord(format!(
            "municipality '{}' has not been registered",
            municipality.name()
        ))
    })?;

    let limits = municipality.fee_limits();
    let updated: usize = diesel::update(
        municipalities::table.filter(municipalities::municipality_id.eq(municipality_id)),
    )
    .set((
        municipalities::name.eq(municipality.name()),
        municipalities::timezone.eq(municipality.timezone()),
        municipalities::minimum_fee.eq(limits.minimum_fee.map(|fee| fee.to_string())),
        municipalities::maximum_fee.eq(limits.maximum_fee.map(|fee| fee.to_string())),
    ))
    .execute(conn)?;

    if updated == 0 {
        return Err(PersistenceError::MunicipalityNotFound(municipality_id));
    }
    info!(municipality_id, "Updated municipality");
    Ok(())
}

/// Inserts or replaces a municipality's permit type, keyed by its code.
///
/// # Returns
///
/// The permit type ID, which is stable across replacements.
///
/// # Errors
///
/// Returns `MunicipalityNotFound` if the municipality does not exist.
pub fn upsert_permit_type(
    conn: &mut SqliteConnection,
    municipality_id: i64,
    definition: &PermitTypeDefinition,
    now: OffsetDateTime,
) -> Result<i64, PersistenceError> {
    get_municipality(conn, municipality_id)?;

    let definition_json: String = serde_json::to_string(definition)?;
    let updated_at: String = format_timestamp(now)?;

    let permit_type_id: i64 = diesel::insert_into(permit_types::table)
        .values((
            permit_types::municipality_id.eq(municipality_id),
            permit_types::code.eq(definition.code()),
            permit_types::name.eq(definition.name()),
            permit_types::definition_json.eq(&definition_json),
            permit_types::updated_at.eq(&updated_at),
        ))
        .on_conflict((permit_types::municipality_id, permit_types::code))
        .do_update()
        .set((
            permit_types::name.eq(definition.name()),
            permit_types::definition_json.eq(&definition_json),
            permit_types::updated_at.eq(&updated_at),
        ))
        .returning(permit_types::permit_type_id)
        .get_result(conn)?;

    info!(
        permit_type_id,
        municipality_id,
        code = definition.code(),
        "Saved permit type"
    );
    Ok(permit_type_id)
}
