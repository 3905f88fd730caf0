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
    clippy::all
)]

//! Audit trail types for permits.
//!
//! Every change to a permit is recorded as one [`AuditEvent`] naming who
//! made it, why, what changed and the permit's state on either side. The
//! events of one permit, oldest first, are its note timeline.

use time::OffsetDateTime;

/// Actor type recorded for changes the engine makes on its own, such as
/// auto-approval.
pub const SYSTEM_ACTOR_TYPE: &str = "system";

/// Who made a change: an applicant, a reviewer, staff or the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub id: String,
    /// The actor's role, e.g. `"reviewer"`, or `"system"` for the engine.
    pub actor_type: String,
}

impl Actor {
    #[must_use]
    pub const fn new(id: String, actor_type: String) -> Self {
        Self { id, actor_type }
    }

    /// The engine acting under `id`, as on automatic approvals.
    #[must_use]
    pub fn system(id: &str) -> Self {
        Self {
            id: id.to_string(),
            actor_type: String::from(SYSTEM_ACTOR_TYPE),
        }
    }

    /// Returns true if this actor is the engine rather than a person.
    #[must_use]
    pub fn is_system(&self) -> bool {
        self.actor_type == SYSTEM_ACTOR_TYPE
    }
}

/// What triggered a change, usually the caller's request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cause {
    /// Correlation ID supplied by the caller, e.g. a request ID.
    pub id: String,
    pub description: String,
}

impl Cause {
    #[must_use]
    pub const fn new(id: String, description: String) -> Self {
        Self { id, description }
    }
}

/// The change that was made.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Action {
    /// The command name, e.g. `"TransitionPermit"` or `"RecordDepartmentReview"`.
    pub name: String,
    /// A one-line summary such as `"submitted -> under_review"`.
    pub details: Option<String>,
}

impl Action {
    #[must_use]
    pub const fn new(name: String, details: Option<String>) -> Self {
        Self { name, details }
    }
}

/// The permit fields a change touched, rendered as text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateSnapshot {
    pub data: String,
}

impl StateSnapshot {
    #[must_use]
    pub const fn new(data: String) -> Self {
        Self { data }
    }
}

/// One entry in a permit's audit trail.
///
/// Each successful change to a permit appends exactly one event. Stored
/// events are never updated or deleted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditEvent {
    /// `None` until the event is stored.
    pub event_id: Option<i64>,
    pub actor: Actor,
    pub cause: Cause,
    pub action: Action,
    pub before: StateSnapshot,
    pub after: StateSnapshot,
    /// Free-text notes entered with the change.
    pub notes: Option<String>,
    pub recorded_at: OffsetDateTime,
}

impl AuditEvent {
    /// Creates an event that has not been stored yet.
    #[must_use]
    pub const fn new(
        actor: Actor,
        cause: Cause,
        action: Action,
        before: StateSnapshot,
        after: StateSnapshot,
        notes: Option<String>,
        recorded_at: OffsetDateTime,
    ) -> Self {
        Self {
            event_id: None,
            actor,
            cause,
            action,
            before,
            after,
            notes,
            recorded_at,
        }
    }

    #[must_use]
    pub const fn with_event_id(mut self, event_id: i64) -> Self {
        self.event_id = Some(event_id);
        self
    }

    /// Returns true if the engine, not a person, made this change.
    #[must_use]
    pub fn is_automatic(&self) -> bool {
        self.actor.is_system()
    }
}

#[cfg(test)]
mod tests;
