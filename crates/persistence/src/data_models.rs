// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use diesel::prelude::*;
use permit_portal_audit::{Action, Actor, Cause, StateSnapshot};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::diesel_schema::{audit_events, department_reviews, municipalities, permits};
use crate::error::PersistenceError;

/// Serializable representation of an Actor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActorData {
    pub id: String,
    pub actor_type: String,
}

impl From<&Actor> for ActorData {
    fn from(actor: &Actor) -> Self {
        Self {
            id: actor.id.clone(),
            actor_type: actor.actor_type.clone(),
        }
    }
}

impl From<ActorData> for Actor {
    fn from(data: ActorData) -> Self {
        Self::new(data.id, data.actor_type)
    }
}

/// Serializable representation of a Cause.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CauseData {
    pub id: String,
    pub description: String,
}

impl From<&Cause> for CauseData {
    fn from(cause: &Cause) -> Self {
        Self {
            id: cause.id.clone(),
            description: cause.description.clone(),
        }
    }
}

impl From<CauseData> for Cause {
    fn from(data: CauseData) -> Self {
        Self::new(data.id, data.description)
    }
}

/// Serializable representation of an Action.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionData {
    pub name: String,
    pub details: Option<String>,
}

impl From<&Action> for ActionData {
    fn from(action: &Action) -> Self {
        Self {
            name: action.name.clone(),
            details: action.details.clone(),
        }
    }
}

impl From<ActionData> for Action {
    fn from(data: ActionData) -> Self {
        Self::new(data.name, data.details)
    }
}

/// Serializable representation of a `StateSnapshot`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateSnapshotData {
    pub data: String,
}

impl From<&StateSnapshot> for StateSnapshotData {
    fn from(snapshot: &StateSnapshot) -> Self {
        Self {
            data: snapshot.data.clone(),
        }
    }
}

impl From<StateSnapshotData> for StateSnapshot {
    fn from(data: StateSnapshotData) -> Self {
        Self::new(data.data)
    }
}

#[derive(Debug, Queryable, Selectable)]
#[diesel(table_name = municipalities)]
pub struct MunicipalityRow {
    pub municipality_id: i64,
    pub name: String,
    pub timezone: Option<String>,
    pub minimum_fee: Option<String>,
    pub maximum_fee: Option<String>,
}

#[derive(Debug, Queryable, Selectable)]
#[diesel(table_name = permits)]
pub struct PermitRow {
    pub permit_id: i64,
    pub permit_number: String,
    pub municipality_id: i64,
    pub municipality_name: String,
    pub municipality_code: String,
    pub permit_type_id: i64,
    pub permit_type_code: String,
    pub applicant_json: String,
    pub contractor_json: Option<String>,
    pub payload_json: String,
    pub fees_json: String,
    pub total_fees: String,
    pub status: String,
    pub submitted_at: Option<String>,
    pub approved_at: Option<String>,
    pub completed_at: Option<String>,
    pub expires_at: Option<String>,
    pub required_departments_json: String,
    pub required_inspections_json: String,
    pub version: i64,
    pub created_at: String,
}

#[derive(Debug, Queryable, Selectable)]
#[diesel(table_name = department_reviews)]
pub struct DepartmentReviewRow {
    pub department: String,
    pub status: String,
    pub reviewer: Option<String>,
    pub notes: Option<String>,
    pub reviewed_at: Option<String>,
}

#[derive(Debug, Queryable, Selectable)]
#[diesel(table_name = audit_events)]
pub struct AuditEventRow {
    pub event_id: i64,
    pub actor_json: String,
    pub cause_json: String,
    pub action_json: String,
    pub before_snapshot_json: String,
    pub after_snapshot_json: String,
    pub notes: Option<String>,
    pub recorded_at: String,
}

/// Formats a timestamp for a TEXT column.
///
/// # Errors
///
/// Returns an error if the timestamp has no RFC 3339 representation.
pub fn format_timestamp(instant: OffsetDateTime) -> Result<String, PersistenceError> {
    instant
        .format(&Rfc3339)
        .map_err(|e| PersistenceError::SerializationError(e.to_string()))
}

/// Formats an optional timestamp for a nullable TEXT column.
///
/// # Errors
///
/// Returns an error if the timestamp has no RFC 3339 representation.
pub fn format_optional_timestamp(
    instant: Option<OffsetDateTime>,
) -> Result<Option<String>, PersistenceError> {
    instant.map(format_timestamp).transpose()
}

/// Parses a timestamp written by [`format_timestamp`].
///
/// # Errors
///
/// Returns an error if the column does not hold an RFC 3339 timestamp.
pub fn parse_timestamp(text: &str) -> Result<OffsetDateTime, PersistenceError> {
    OffsetDateTime::parse(text, &Rfc3339)
        .map_err(|e| PersistenceError::ReconstructionError(format!("bad timestamp '{text}': {e}")))
}

/// Parses an optional timestamp column.
///
/// # Errors
///
/// Returns an error if the column does not hold an RFC 3339 timestamp.
pub fn parse_optional_timestamp(
    text: Option<&str>,
) -> Result<Option<OffsetDateTime>, PersistenceError> {
    text.map(parse_timestamp).transpose()
}

/// Parses a currency amount stored as TEXT.
///
/// Amounts are stored as decimal strings so no precision is lost.
///
/// # Errors
///
/// Returns an error if the column does not hold a decimal number.
pub fn parse_amount(text: &str) -> Result<Decimal, PersistenceError> {
    Decimal::from_str(text)
        .map_err(|e| PersistenceError::ReconstructionError(format!("bad amount '{text}': {e}")))
}
