// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use diesel::SqliteConnection;
use diesel::prelude::*;
use permit_portal_audit::AuditEvent;
use tracing::debug;

use crate::backend::sqlite::get_last_insert_rowid;
use crate::data_models::{ActionData, ActorData, CauseData, StateSnapshotData, format_timestamp};
use crate::diesel_schema::audit_events;
use crate::error::PersistenceError;

/// Persists one audit event for a permit.
///
/// # Returns
///
/// The event ID assigned by the database.
///
/// # Errors
///
/// Returns an error if serialization or the insert fails.
pub fn persist_audit_event(
    conn: &mut SqliteConnection,
    permit_id: i64,
    event: &AuditEvent,
) -> Result<i64, PersistenceError> {
    let actor_json: String = serde_json::to_string(&ActorData::from(&event.actor))?;
    let cause_json: String = serde_json::to_string(&CauseData::from(&event.cause))?;
    let action_json: String = serde_json::to_string(&ActionData::from(&event.action))?;
    let before_json: String = serde_json::to_string(&StateSnapshotData::from(&event.before))?;
    let after_json: String = serde_json::to_string(&StateSnapshotData::from(&event.after))?;
    let recorded_at: String = format_timestamp(event.recorded_at)?;

    diesel::insert_into(audit_events::table)
        .values((
            audit_events::permit_id.eq(permit_id),
            audit_events::actor_json.eq(&actor_json),
            audit_events::cause_json.eq(&cause_json),
            audit_events::action_json.eq(&action_json),
            audit_events::before_snapshot_json.eq(&before_json),
            audit_events::after_snapshot_json.eq(&after_json),
            audit_events::notes.eq(event.notes.as_deref()),
            audit_events::recorded_at.eq(&recorded_at),
        ))
        .execute(conn)?;

    let event_id: i64 = get_last_insert_rowid(conn)?;
    debug!(
        event_id,
        permit_id,
        action = %event.action.name,
        "Persisted audit event"
    );
    Ok(event_id)
}

/// Persists the events of a permit's timeline that have no ID yet.
///
/// The timeline is append-only: the events that already carry an ID must
/// be exactly the ones stored, in order, followed only by new events.
///
/// # Errors
///
/// Returns `InvariantViolation` if stored events were dropped, reordered
/// or interleaved with new ones.
pub fn persist_new_audit_events(
    conn: &mut SqliteConnection,
    permit_id: i64,
    timeline: &[AuditEvent],
) -> Result<usize, PersistenceError> {
    let stored_ids: Vec<i64> = audit_events::table
        .filter(audit_events::permit_id.eq(permit_id))
        .order(audit_events::event_id.asc())
        .select(audit_events::event_id)
        .load(conn)?;

    let (known, new): (&[AuditEvent], &[AuditEvent]) = timeline.split_at(
        timeline
            .iter()
            .position(|event| event.event_id.is_none())
            .unwrap_or(timeline.len()),
    );

    let known_ids: Vec<Option<i64>> = known.iter().map(|event| event.event_id).collect();
    let expected_ids: Vec<Option<i64>> = stored_ids.into_iter().map(Some).collect();
    if known_ids != expected_ids {
        return Err(PersistenceError::InvariantViolation(format!(
            "audit trail of permit {permit_id} is append-only"
        )));
    }
    if new.iter().any(|event| event.event_id.is_some()) {
        return Err(PersistenceError::InvariantViolation(format!(
            "audit trail of permit {permit_id} has stored events after new ones"
        )));
    }

    for event in new {
        persist_audit_event(conn, permit_id, event)?;
    }
    Ok(new.len())
}
