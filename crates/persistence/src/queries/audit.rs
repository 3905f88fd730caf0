// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use diesel::prelude::*;
use diesel::SqliteConnection;
use permit_portal_audit::AuditEvent;

use crate::data_models::{
    ActionData, ActorData, AuditEventRow, CauseData, StateSnapshotData, parse_timestamp,
};
use crate::diesel_schema::audit_events;
use crate::error::PersistenceError;

/// Retrieves an audit event by ID.
///
/// # Errors
///
/// Returns an error if the event is not found or cannot be deserialized.
pub fn get_audit_event(
    conn: &mut SqliteConnection,
    event_id: i64,
) -> Result<AuditEvent, PersistenceError> {
    let row: AuditEventRow = audit_events::table
        .filter(audit_events::event_id.eq(event_id))
        .select(AuditEventRow::as_select())
        .first(conn)
        .map_err(|e| match e {
            diesel::result::Error::NotFound => {
                PersistenceError::NotFound(format!("Audit event {event_id}"))
            }
            other => other.into(),
        })?;

    audit_event_from_row(row)
}

/// Retrieves every audit event for a permit, oldest first.
///
/// # Errors
///
/// Returns an error if the query fails or an event cannot be deserialized.
pub fn get_audit_trail(
    conn: &mut SqliteConnection,
    permit_id: i64,
) -> Result<Vec<AuditEvent>, PersistenceError> {
    let rows: Vec<AuditEventRow> = audit_events::table
        .filter(audit_events::permit_id.eq(permit_id))
        .order(audit_events::event_id.asc())
        .select(AuditEventRow::as_select())
        .load(conn)?;

    rows.into_iter().map(audit_event_from_row).collect()
}

fn audit_event_from_row(row: AuditEventRow) -> Result<AuditEvent, PersistenceError> {
    let actor: ActorData = serde_json::from_str(&row.actor_json)?;
    let cause: CauseData = serde_json::from_str(&row.cause_json)?;
    let action: ActionData = serde_json::from_str(&row.action_json)?;
    let before: StateSnapshotData = serde_json::from_str(&row.before_snapshot_json)?;
    let after: StateSnapshotData = serde_json::from_str(&row.after_snapshot_json)?;

    Ok(AuditEvent::new(
        actor.into(),
        cause.into(),
        action.into(),
        before.into(),
        after.into(),
        row.notes,
        parse_timestamp(&row.recorded_at)?,
    )
    .with_event_id(row.event_id))
}
