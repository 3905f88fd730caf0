// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use diesel::SqliteConnection;
use diesel::prelude::*;
use permit_portal_domain::{FeeLimits, Municipality, PermitTypeDefinition};
use tracing::debug;

use crate::data_models::{MunicipalityRow, parse_amount};
use crate::diesel_schema::{municipalities, permit_types};
use crate::error::PersistenceError;

/// A permit type definition together with its database identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredPermitType {
    pub permit_type_id: i64,
    pub municipality_id: i64,
    pub definition: PermitTypeDefinition,
}

/// Retrieves a municipality by ID.
///
/// # Errors
///
/// Returns `MunicipalityNotFound` if no such municipality exists, or a
/// reconstruction error if the stored row no longer validates.
pub fn get_municipality(
    conn: &mut SqliteConnection,
    municipality_id: i64,
) -> Result<Municipality, PersistenceError> {
    let row: MunicipalityRow = municipalities::table
        .filter(municipalities::municipality_id.eq(municipality_id))
        .select(MunicipalityRow::as_select())
        .first(conn)
        .map_err(|e| match e {
            diesel::result::Error::NotFound => {
                PersistenceError::MunicipalityNotFound(municipality_id)
            }
            other => other.into(),
        })?;

    municipality_from_row(row)
}

/// Lists all municipalities ordered by name.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn list_municipalities(
    conn: &mut SqliteConnection,
) -> Result<Vec<Municipality>, PersistenceError> {
    let rows: Vec<MunicipalityRow> = municipalities::table
        .order(municipalities::name.asc())
        .select(MunicipalityRow::as_select())
        .load(conn)?;

    rows.into_iter().map(municipality_from_row).collect()
}

fn municipality_from_row(row: MunicipalityRow) -> Result<Municipality, PersistenceError> {
    let fee_limits = FeeLimits {
        minimum_fee: row.minimum_fee.as_deref().map(parse_amount).transpose()?,
        maximum_fee: row.maximum_fee.as_deref().map(parse_amount).transpose()?,
    };

    let municipality: Municipality = Municipality::new(&row.name)?
        .with_id(row.municipality_id)
        .with_fee_limits(fee_limits)?;

    match row.timezone {
        Some(timezone) => Ok(municipality.with_timezone(&timezone)?),
        None => Ok(municipality),
    }
}

/// Retrieves a permit type by ID.
///
/// The stored JSON is validated again on the way out, so a definition that
/// no longer passes validation is reported instead of used.
///
/// # Errors
///
/// Returns `PermitTypeNotFound` if no such permit type exists.
pub fn get_permit_type(
    conn: &mut SqliteConnection,
    permit_type_id: i64,
) -> Result<StoredPermitType, PersistenceError> {
    let (id, municipality_id, definition_json): (i64, i64, String) = permit_types::table
        .filter(permit_types::permit_type_id.eq(permit_type_id))
        .select((
            permit_types::permit_type_id,
            permit_types::municipality_id,
            permit_types::definition_json,
        ))
        .first(conn)
        .map_err(|e| match e {
            diesel::result::Error::NotFound => PersistenceError::PermitTypeNotFound(permit_type_id),
            other => other.into(),
        })?;

    debug!(permit_type_id, "Loaded permit type definition");
    stored_permit_type(id, municipality_id, &definition_json)
}

/// Lists a municipality's permit types ordered by code.
///
/// # Errors
///
/// Returns an error if the query fails or a definition cannot be read.
pub fn list_permit_types(
    conn: &mut SqliteConnection,
    municipality_id: i64,
) -> Result<Vec<StoredPermitType>, PersistenceError> {
    let rows: Vec<(i64, i64, String)> = permit_types::table
        .filter(permit_types::municipality_id.eq(municipality_id))
        .order(permit_types::code.asc())
        .select((
            permit_types::permit_type_id,
            permit_types::municipality_id,
            permit_types::definition_json,
        ))
        .load(conn)?;

    rows.into_iter()
        .map(|(id, owner, json)| stored_permit_type(id, owner, &json))
        .collect()
}

fn stored_permit_type(
    permit_type_id: i64,
    municipality_id: i64,
    definition_json: &str,
) -> Result<StoredPermitType, PersistenceError> {
    let definition: PermitTypeDefinition = serde_json::from_str(definition_json).map_err(|e| {
        PersistenceError::ReconstructionError(format!(
            "permit type {permit_type_id} no longer validates: {e}"
        ))
    })?;

    Ok(StoredPermitType {
        permit_type_id,
        municipality_id,
        definition,
    })
}
