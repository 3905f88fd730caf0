// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! `SQLite` connection setup for the permit store.
//!
//! Opening a store sets the busy timeout, turns on foreign keys, switches
//! file databases to WAL and runs the embedded migrations. Queries and
//! mutations live in `queries/` and `mutations/`.

use diesel::dsl::sql;
use diesel::sql_types::{BigInt, Integer, Text};
use diesel::{Connection, QueryableByName, RunQueryDsl, SqliteConnection};
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use tracing::{debug, info};

use crate::error::PersistenceError;

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// How long a writer waits for another writer's lock before giving up.
pub const BUSY_TIMEOUT_MS: u32 = 5_000;

/// Where a permit store lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    /// A private in-memory database for one adapter.
    Memory,
    /// A database file shared by any number of adapters.
    File,
}

// Diesel has no PRAGMA DSL; these rows read PRAGMA results back.
#[derive(QueryableByName)]
struct ForeignKeysRow {
    #[diesel(sql_type = Integer)]
    foreign_keys: i32,
}

#[derive(QueryableByName)]
struct JournalModeRow {
    #[diesel(sql_type = Text)]
    journal_mode: String,
}

/// Returns the rowid of the last row inserted on this connection.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn get_last_insert_rowid(conn: &mut SqliteConnection) -> Result<i64, PersistenceError> {
    Ok(diesel::select(sql::<BigInt>("last_insert_rowid()")).get_result(conn)?)
}

fn set_pragma(conn: &mut SqliteConnection, pragma: &str) -> Result<(), PersistenceError> {
    diesel::sql_query(format!("PRAGMA {pragma}"))
        .execute(conn)
        .map_err(|e| PersistenceError::QueryFailed(format!("PRAGMA {pragma}: {e}")))?;
    Ok(())
}

/// Checks that foreign keys are enforced on this connection.
///
/// # Errors
///
/// Returns `ForeignKeyEnforcementNotEnabled` if they are not.
pub fn verify_foreign_key_enforcement(conn: &mut SqliteConnection) -> Result<(), PersistenceError> {
    let row: ForeignKeysRow = diesel::sql_query("PRAGMA foreign_keys").get_result(conn)?;
    if row.foreign_keys == 0 {
        return Err(PersistenceError::ForeignKeyEnforcementNotEnabled);
    }
    Ok(())
}

/// Switches a file database to WAL and checks that the switch took.
///
/// Several adapters on one file rely on WAL so that readers never wait
/// for the writer that holds the permit lock.
fn enable_wal_mode(conn: &mut SqliteConnection) -> Result<(), PersistenceError> {
    let row: JournalModeRow = diesel::sql_query("PRAGMA journal_mode = WAL").get_result(conn)?;
    if !row.journal_mode.eq_ignore_ascii_case("wal") {
        return Err(PersistenceError::InitializationError(format!(
            "journal mode is '{}', expected 'wal'",
            row.journal_mode
        )));
    }
    debug!("SQLite journal mode set to WAL");
    Ok(())
}

/// Opens a permit store and brings its schema up to date.
///
/// The busy timeout is set before migrating so several adapters opening
/// the same file at once queue behind each other instead of failing.
///
/// # Errors
///
/// Returns an error if the connection cannot be made, a PRAGMA fails or
/// a migration fails.
pub fn open(database_url: &str, kind: StoreKind) -> Result<SqliteConnection, PersistenceError> {
    info!(database_url, ?kind, "Opening SQLite permit store");

    let mut conn: SqliteConnection = SqliteConnection::establish(database_url)
        .map_err(|e| PersistenceError::DatabaseConnectionFailed(e.to_string()))?;

    set_pragma(&mut conn, &format!("busy_timeout = {BUSY_TIMEOUT_MS}"))?;
    set_pragma(&mut conn, "foreign_keys = ON")?;
    if kind == StoreKind::File {
        enable_wal_mode(&mut conn)?;
    }

    conn.run_pending_migrations(MIGRATIONS)
        .map_err(|e| PersistenceError::MigrationFailed(e.to_string()))?;
    verify_foreign_key_enforcement(&mut conn)?;

    debug!(busy_timeout_ms = BUSY_TIMEOUT_MS, "SQLite permit store ready");
    Ok(conn)
}
