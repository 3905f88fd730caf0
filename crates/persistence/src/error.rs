// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use diesel::result::DatabaseErrorKind;
use permit_portal_domain::DomainError;

/// Errors that can occur during persistence operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersistenceError {
    /// A database error occurred.
    DatabaseError(String),
    /// Database connection failed.
    DatabaseConnectionFailed(String),
    /// Database migration failed.
    MigrationFailed(String),
    /// Query execution failed.
    QueryFailed(String),
    /// Stored data could not be turned back into domain values.
    ReconstructionError(String),
    /// Serialization/deserialization error.
    SerializationError(String),
    /// Initialization error.
    InitializationError(String),
    /// Foreign key enforcement is not enabled.
    ForeignKeyEnforcementNotEnabled,
    /// The requested municipality was not found.
    MunicipalityNotFound(i64),
    /// The requested permit type was not found.
    PermitTypeNotFound(i64),
    /// The requested permit was not found.
    PermitNotFound(String),
    /// A municipality with this name already exists.
    DuplicateMunicipality(String),
    /// The permit was saved by someone else since it was loaded.
    ConcurrentModification {
        permit_id: i64,
        /// The version the caller loaded.
        expected_version: i64,
    },
    /// Two writers tried to claim the same permit number.
    NumberAllocationConflict(String),
    /// The database stayed locked by another writer past the busy timeout.
    StoreBusy(String),
    /// The record breaks an invariant and was not written.
    InvariantViolation(String),
    /// The record is in the wrong state for the requested write.
    InvalidRecord(String),
    /// The requested resource was not found.
    NotFound(String),
}

impl PersistenceError {
    /// Returns true if repeating the whole operation on fresh data may succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::ConcurrentModification { .. }
                | Self::NumberAllocationConflict(_)
                | Self::StoreBusy(_)
        )
    }

    /// Returns true if the error means a requested record does not exist.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::MunicipalityNotFound(_)
                | Self::PermitTypeNotFound(_)
                | Self::PermitNotFound(_)
                | Self::NotFound(_)
        )
    }
}

impl std::fmt::Display for PersistenceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DatabaseError(msg) => write!(f, "Database error: {msg}"),
            Self::DatabaseConnectionFailed(msg) => {
                write!(f, "Database connection failed: {msg}")
            }
            Self::MigrationFailed(msg) => write!(f, "Migration failed: {msg}"),
            Self::QueryFailed(msg) => write!(f, "Query failed: {msg}"),
            Self::ReconstructionError(msg) => write!(f, "Record reconstruction error: {msg}"),
            Self::SerializationError(msg) => write!(f, "Serialization error: {msg}"),
            Self::InitializationError(msg) => write!(f, "Initialization error: {msg}"),
            Self::ForeignKeyEnforcementNotEnabled => {
                write!(f, "Foreign key enforcement is not enabled")
            }
            Self::MunicipalityNotFound(id) => write!(f, "Municipality not found: {id}"),
            Self::PermitTypeNotFound(id) => write!(f, "Permit type not found: {id}"),
            Self::PermitNotFound(key) => write!(f, "Permit not found: {key}"),
            Self::DuplicateMunicipality(name) => {
                write!(f, "Municipality '{name}' already exists")
            }
            Self::ConcurrentModification {
                permit_id,
                expected_version,
            } => write!(
                f,
                "Permit {permit_id} was modified concurrently (expected version {expected_version})"
            ),
            Self::NumberAllocationConflict(msg) => {
                write!(f, "Permit number allocation conflict: {msg}")
            }
            Self::StoreBusy(msg) => write!(f, "Database busy: {msg}"),
            Self::InvariantViolation(msg) => write!(f, "Invariant violation: {msg}"),
            Self::InvalidRecord(msg) => write!(f, "Invalid record: {msg}"),
            Self::NotFound(msg) => write!(f, "Not found: {msg}"),
        }
    }
}

impl std::error::Error for PersistenceError {}

impl From<diesel::result::Error> for PersistenceError {
    fn from(err: diesel::result::Error) -> Self {
        match err {
            diesel::result::Error::NotFound => Self::NotFound("Record not found".to_string()),
            diesel::result::Error::DatabaseError(DatabaseErrorKind::UniqueViolation, info)
                if info.message().contains("permits.permit_number") =>
            {
                Self::NumberAllocationConflict(info.message().to_string())
            }
            diesel::result::Error::DatabaseError(DatabaseErrorKind::UniqueViolation, info)
                if info.message().contains("municipalities.name") =>
            {
                Self::DuplicateMunicipality(info.message().to_string())
            }
            diesel::result::Error::DatabaseError(_, info) if is_lock_message(info.message()) => {
                Self::StoreBusy(info.message().to_string())
            }
            _ => Self::DatabaseError(err.to_string()),
        }
    }
}

impl From<diesel::ConnectionError> for PersistenceError {
    fn from(err: diesel::ConnectionError) -> Self {
        Self::DatabaseConnectionFailed(err.to_string())
    }
}

impl From<serde_json::Error> for PersistenceError {
    fn from(err: serde_json::Error) -> Self {
        Self::SerializationError(err.to_string())
    }
}

/// Stored values are validated again when they are read back.
impl From<DomainError> for PersistenceError {
    fn from(err: DomainError) -> Self {
        Self::ReconstructionError(err.to_string())
    }
}

/// `SQLITE_BUSY` and `SQLITE_LOCKED` surface as untyped database errors.
fn is_lock_message(message: &str) -> bool {
    message.contains("database is locked")
        || message.contains("database table is locked")
        || message.contains("database is busy")
}
