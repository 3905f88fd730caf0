// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Persistence layer for the Permit Portal.
//!
//! This crate stores municipalities, permit type definitions, permits,
//! department reviews and each permit's append-only audit trail in
//! `SQLite` through Diesel.
//!
//! ## Concurrency
//!
//! Every public write runs inside one `BEGIN IMMEDIATE` transaction, so
//! writers from any number of connections are serialized by `SQLite`
//! itself. On top of that:
//!
//! - Permit numbers come from a per-municipality, per-year counter row
//!   incremented in the same transaction that inserts the permit, and the
//!   number column is `UNIQUE`.
//! - Permit updates compare the stored version with the version the
//!   caller loaded and fail with `ConcurrentModification` when it moved.
//! - [`Persistence::modify_permit`] loads, changes and saves a permit in a
//!   single transaction, which is how reviews and automatic approval stay
//!   atomic.
//!
//! Retryable failures are reported through
//! [`PersistenceError::is_retryable`].
//!
//! ## Testing
//!
//! - In-memory databases are isolated per adapter and suit single-handle
//!   tests.
//! - Tests that exercise several handles use a temporary file, because
//!   shared-cache in-memory databases use table locks that ignore the busy
//!   timeout.

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

use diesel::SqliteConnection;
use permit_portal::PermitRecord;
use permit_portal_audit::AuditEvent;
use permit_portal_domain::{Municipality, PermitNumber, PermitStatus, PermitTypeDefinition};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use time::OffsetDateTime;

mod backend;
mod data_models;
mod diesel_schema;
mod error;
mod mutations;
mod queries;

#[cfg(test)]
mod tests;

pub use backend::sqlite::BUSY_TIMEOUT_MS;
pub use error::PersistenceError;
pub use queries::catalog::StoredPermitType;

/// Atomic counter for generating unique in-memory database names.
///
/// Each call to `new_in_memory()` receives a unique sequential ID.
static DB_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Type alias for the `SQLite` adapter.
pub type SqlitePersistence = Persistence;

/// Failure of [`Persistence::modify_permit`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModifyError<E> {
    /// Loading or saving the permit failed.
    Persistence(PersistenceError),
    /// The change itself refused to proceed. Nothing was written.
    Rejected(E),
}

impl<E> From<PersistenceError> for ModifyError<E> {
    fn from(err: PersistenceError) -> Self {
        Self::Persistence(err)
    }
}

impl<E> From<diesel::result::Error> for ModifyError<E> {
    fn from(err: diesel::result::Error) -> Self {
        Self::Persistence(err.into())
    }
}

impl<E: std::fmt::Display> std::fmt::Display for ModifyError<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Persistence(err) => write!(f, "{err}"),
            Self::Rejected(err) => write!(f, "Change rejected: {err}"),
        }
    }
}

impl<E: std::fmt::Debug + std::fmt::Display> std::error::Error for ModifyError<E> {}

/// Persistence adapter for the permit workflow.
///
/// One adapter owns one connection. Open one adapter per thread to share a
/// database file.
pub struct Persistence {
    conn: SqliteConnection,
}

impl Persistence {
    /// Creates a new persistence adapter with an in-memory `SQLite` database.
    ///
    /// Each call receives a unique database instance via atomic counter,
    /// ensuring deterministic test isolation without time-based collisions.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be initialized.
    pub fn new_in_memory() -> Result<Self, PersistenceError> {
        let db_id = DB_COUNTER.fetch_add(1, Ordering::SeqCst);
        let db_name = format!("memdb_test_{db_id}");
        let shared_memory_url = format!("file:{db_name}?mode=memory&cache=shared");

        let conn: SqliteConnection =
            backend::sqlite::open(&shared_memory_url, backend::sqlite::StoreKind::Memory)?;

        Ok(Self { conn })
    }

    /// Creates a new persistence adapter with a file-based `SQLite` database.
    ///
    /// Several adapters may open the same file; their writes are serialized.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or initialized.
    pub fn new_with_file<P: AsRef<Path>>(path: P) -> Result<Self, PersistenceError> {
        let path_str = path.as_ref().to_str().ok_or_else(|| {
            PersistenceError::InitializationError("Invalid database path".to_string())
        })?;

        let conn: SqliteConnection =
            backend::sqlite::open(path_str, backend::sqlite::StoreKind::File)?;

        Ok(Self { conn })
    }

    /// Verifies that foreign key enforcement is enabled.
    ///
    /// # Errors
    ///
    /// Returns an error if foreign key enforcement is not enabled.
    pub fn verify_foreign_key_enforcement(&mut self) -> Result<(), PersistenceError> {
        backend::sqlite::verify_foreign_key_enforcement(&mut self.conn)
    }

    // ========================================================================
    // Catalog
    // ========================================================================

    /// Registers a new municipality.
    ///
    /// # Returns
    ///
    /// The municipality with its assigned ID.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateMunicipality` if the name is taken.
    pub fn register_municipality(
        &mut self,
        municipality: &Municipality,
    ) -> Result<Municipality, PersistenceError> {
        self.conn.immediate_transaction(|conn| {
            let municipality_id: i64 = mutations::catalog::insert_municipality(conn, municipality)?;
            queries::catalog::get_municipality(conn, municipality_id)
        })
    }

    /// Updates a registered municipality.
    ///
    /// # Errors
    ///
    /// Returns `MunicipalityNotFound` if it does not exist.
    pub fn update_municipality(
        &mut self,
        municipality: &Municipality,
    ) -> Result<(), PersistenceError> {
        self.conn
            .immediate_transaction(|conn| mutations::catalog::update_municipality(conn, municipality))
    }

    /// Retrieves a municipality by ID.
    ///
    /// # Errors
    ///
    /// Returns `MunicipalityNotFound` if it does not exist.
    pub fn get_municipality(
        &mut self,
        municipality_id: i64,
    ) -> Result<Municipality, PersistenceError> {
        queries::catalog::get_municipality(&mut self.conn, municipality_id)
    }

    /// Lists all municipalities ordered by name.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn list_municipalities(&mut self) -> Result<Vec<Municipality>, PersistenceError> {
        queries::catalog::list_municipalities(&mut self.conn)
    }

    /// Saves a permit type for a municipality, replacing any with the same code.
    ///
    /// Permits already created keep the departments and inspections they
    /// copied at creation.
    ///
    /// # Returns
    ///
    /// The permit type ID.
    ///
    /// # Errors
    ///
    /// Returns `MunicipalityNotFound` if the municipality does not exist.
    pub fn save_permit_type(
        &mut self,
        municipality_id: i64,
        definition: &PermitTypeDefinition,
        now: OffsetDateTime,
    ) -> Result<i64, PersistenceError> {
        self.conn.immediate_transaction(|conn| {
            mutations::catalog::upsert_permit_type(conn, municipality_id, definition, now)
        })
    }

    /// Retrieves a permit type by ID.
    ///
    /// # Errors
    ///
    /// Returns `PermitTypeNotFound` if it does not exist.
    pub fn get_permit_type(
        &mut self,
        permit_type_id: i64,
    ) -> Result<StoredPermitType, PersistenceError> {
        queries::catalog::get_permit_type(&mut self.conn, permit_type_id)
    }

    /// Lists a municipality's permit types ordered by code.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn list_permit_types(
        &mut self,
        municipality_id: i64,
    ) -> Result<Vec<StoredPermitType>, PersistenceError> {
        queries::catalog::list_permit_types(&mut self.conn, municipality_id)
    }

    // ========================================================================
    // Permits
    // ========================================================================

    /// Persists a new permit, assigning its permit number.
    ///
    /// The number uses the municipality's local year at the permit's
    /// creation time. Numbering, the permit row, its reviews and its audit
    /// events are written in one transaction.
    ///
    /// # Returns
    ///
    /// The stored permit, with its ID, number, version and event IDs.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The record was already persisted
    /// - The fee total does not equal the sum of the line items
    /// - The municipality does not exist
    /// - Numbering collides with another writer (retryable)
    pub fn insert_permit(&mut self, record: &PermitRecord) -> Result<PermitRecord, PersistenceError> {
        if record.permit_id.is_some() || record.permit_number.is_some() {
            return Err(PersistenceError::InvalidRecord(String::from(
                "permit has already been persisted",
            )));
        }
        check_fee_invariant(record)?;

        self.conn.immediate_transaction(|conn| {
            let municipality: Municipality =
                queries::catalog::get_municipality(conn, record.municipality_id)?;
            let permit_number: PermitNumber =
                mutations::permits::allocate_permit_number(conn, &municipality, record.created_at)?;
            let permit_id: i64 = mutations::permits::insert_permit(conn, record, &permit_number)?;
            queries::permits::load_permit(conn, permit_id)
        })
    }

    /// Saves changes to a persisted permit.
    ///
    /// # Returns
    ///
    /// The stored permit with its new version and event IDs.
    ///
    /// # Errors
    ///
    /// Returns `ConcurrentModification` if the permit was saved since
    /// `record` was loaded (retryable), or `InvariantViolation` if the fee
    /// total or the audit trail is inconsistent.
    pub fn update_permit(&mut self, record: &PermitRecord) -> Result<PermitRecord, PersistenceError> {
        let permit_id: i64 = persisted_id(record)?;
        check_fee_invariant(record)?;

        self.conn.immediate_transaction(|conn| {
            mutations::permits::update_permit(conn, permit_id, record)?;
            queries::permits::load_permit(conn, permit_id)
        })
    }

    /// Loads a permit, applies `change` and saves the result atomically.
    ///
    /// No other writer can touch the permit between the load and the save.
    /// `change` returns the record to save together with any value the
    /// caller wants back.
    ///
    /// # Errors
    ///
    /// Returns `ModifyError::Rejected` with the closure's error, or
    /// `ModifyError::Persistence` if loading or saving fails. Either way
    /// nothing is written.
    pub fn modify_permit<T, E, F>(
        &mut self,
        permit_id: i64,
        change: F,
    ) -> Result<(PermitRecord, T), ModifyError<E>>
    where
        F: FnOnce(&PermitRecord) -> Result<(PermitRecord, T), E>,
    {
        self.conn.immediate_transaction(|conn| {
            let current: PermitRecord = queries::permits::load_permit(conn, permit_id)?;
            let (changed, output): (PermitRecord, T) =
                change(&current).map_err(ModifyError::Rejected)?;

            if changed.permit_id != Some(permit_id) {
                return Err(ModifyError::Persistence(PersistenceError::InvalidRecord(
                    format!("change to permit {permit_id} returned a different permit"),
                )));
            }
            check_fee_invariant(&changed)?;

            mutations::permits::update_permit(conn, permit_id, &changed)?;
            let saved: PermitRecord = queries::permits::load_permit(conn, permit_id)?;
            Ok((saved, output))
        })
    }

    /// Loads a permit by ID.
    ///
    /// # Errors
    ///
    /// Returns `PermitNotFound` if it does not exist.
    pub fn load_permit(&mut self, permit_id: i64) -> Result<PermitRecord, PersistenceError> {
        queries::permits::load_permit(&mut self.conn, permit_id)
    }

    /// Loads a permit by its permit number.
    ///
    /// # Errors
    ///
    /// Returns `PermitNotFound` if no permit carries the number.
    pub fn load_permit_by_number(
        &mut self,
        permit_number: &PermitNumber,
    ) -> Result<PermitRecord, PersistenceError> {
        let permit_id: i64 = queries::permits::find_permit_id(&mut self.conn, permit_number)?;
        queries::permits::load_permit(&mut self.conn, permit_id)
    }

    /// Lists the IDs of a municipality's permits, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn list_permit_ids(
        &mut self,
        municipality_id: i64,
        status: Option<PermitStatus>,
    ) -> Result<Vec<i64>, PersistenceError> {
        queries::permits::list_permit_ids(&mut self.conn, municipality_id, status)
    }

    /// Returns the version currently stored for a permit.
    ///
    /// # Errors
    ///
    /// Returns `PermitNotFound` if it does not exist.
    pub fn current_version(&mut self, permit_id: i64) -> Result<i64, PersistenceError> {
        queries::permits::current_version(&mut self.conn, permit_id)
    }

    // ========================================================================
    // Audit Event Queries
    // ========================================================================

    /// Retrieves a permit's audit trail, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `PermitNotFound` if the permit does not exist.
    pub fn get_audit_trail(&mut self, permit_id: i64) -> Result<Vec<AuditEvent>, PersistenceError> {
        queries::permits::current_version(&mut self.conn, permit_id)?;
        queries::audit::get_audit_trail(&mut self.conn, permit_id)
    }

    /// Retrieves an audit event by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the event is not found or cannot be deserialized.
    pub fn get_audit_event(&mut self, event_id: i64) -> Result<AuditEvent, PersistenceError> {
        queries::audit::get_audit_event(&mut self.conn, event_id)
    }
}

fn persisted_id(record: &PermitRecord) -> Result<i64, PersistenceError> {
    record.permit_id.ok_or_else(|| {
        PersistenceError::InvalidRecord(String::from("permit has not been persisted"))
    })
}

fn check_fee_invariant(record: &PermitRecord) -> Result<(), PersistenceError> {
    record
        .check_fee_invariant()
        .map_err(|e| PersistenceError::InvariantViolation(e.to_string()))
}
