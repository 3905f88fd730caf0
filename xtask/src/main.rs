// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! # xtask
//!
//! Project automation for the permit portal workspace.
//!
//! - `cargo xtask ci` runs lints, dependency checks, the build and all tests
//! - `cargo xtask test-concurrency` runs only the tests that race several
//!   store handles against one database file
//! - `cargo xtask verify-migrations` applies the `SQLite` migrations to a
//!   scratch database, reverts them, applies them again and checks that the
//!   schema the permit store depends on survives the round trip
//!
//! Everything runs against `SQLite`; no external services are needed.

#![deny(
    clippy::pedantic,
    //clippy::cargo,
    clippy::nursery,
    clippy::style,
    clippy::correctness,
    clippy::all
)]

use std::{io, process::Output};

use cargo_metadata::MetadataCommand;
use clap::{Parser, Subcommand};
use clap_verbosity_flag::{InfoLevel, Verbosity};
use color_eyre::{eyre::Context, Result};
use diesel::sql_types::{Integer, Text};
use diesel::{QueryableByName, RunQueryDsl, SqliteConnection};
use duct::cmd;
use std::collections::{BTreeMap, BTreeSet};
use tracing_log::AsTrace;

fn main() -> Result<()> {
    color_eyre::install()?;
    let args = Args::parse();
    tracing_subscriber::fmt()
        .with_max_level(args.verbosity.log_level_filter().as_trace())
        .without_time()
        .init();

    if let Err(err) = args.command.run() {
        tracing::error!("{err}");
        std::process::exit(1);
    }
    Ok(())
}

#[derive(Debug, Parser)]
#[command(bin_name = "cargo xtask", styles = clap_cargo::style::CLAP_STYLING)]
struct Args {
    #[command(subcommand)]
    command: Command,

    #[command(flatten)]
    verbosity: Verbosity<InfoLevel>,
}

#[derive(Clone, Copy, Debug, Subcommand)]
enum Command {
    /// Lint, check dependencies, build, test and verify migrations
    CI,

    /// Build every target
    #[command(visible_alias = "b")]
    Build,

    /// Type-check every target
    #[command(visible_alias = "c")]
    Check,

    /// Write an lcov coverage report to target/lcov.info
    #[command(visible_alias = "cov")]
    Coverage,

    /// Check licenses and advisories with cargo-deny
    #[command(visible_alias = "cd")]
    Deny,

    /// Find unused dependencies with cargo-machete
    #[command(visible_alias = "m")]
    Machete,

    /// Run every linter
    #[command(visible_alias = "l")]
    Lint,

    /// Run clippy with warnings denied
    #[command(visible_alias = "cl")]
    LintClippy,

    /// Build docs the way docs.rs does
    #[command(visible_alias = "d")]
    LintDocs,

    /// Check formatting
    #[command(visible_alias = "lf")]
    LintFormatting,

    /// Lint markdown files
    #[command(visible_alias = "md")]
    LintMarkdown,

    /// Check spelling
    #[command(visible_alias = "lt")]
    LintTypos,

    /// Apply clippy fixes
    #[command(visible_alias = "fc")]
    FixClippy,

    /// Apply formatting
    #[command(visible_alias = "fmt")]
    FixFormatting,

    /// Apply spelling fixes
    #[command(visible_alias = "typos")]
    FixTypos,

    /// Run lib and doc tests
    #[command(visible_alias = "t")]
    Test,

    /// Run the file-backed concurrency tests only
    #[command(visible_alias = "tc")]
    TestConcurrency,

    /// Run doc tests
    #[command(visible_alias = "td")]
    TestDocs,

    /// Run lib tests
    #[command(visible_alias = "tl")]
    TestLibs,

    /// Verify the `SQLite` migrations apply, revert and reapply cleanly
    #[command(visible_alias = "vm")]
    VerifyMigrations,
}

/// Which toolchain a cargo invocation needs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Toolchain {
    Default,
    /// rustfmt and docs.rs flags need nightly.
    Nightly,
}

impl Command {
    fn run(self) -> Result<()> {
        match self {
            Self::CI => ci(),
            Self::Build => cargo(&["build", "--all-targets", "--all-features"]),
            Self::Check => cargo(&["check", "--all-targets", "--all-features"]),
            Self::Coverage => cargo(&[
                "llvm-cov",
                "--lcov",
                "--output-path",
                "target/lcov.info",
                "--all-features",
            ]),
            Self::Deny => cargo(&["deny", "check"]),
            Self::Machete => run(&cmd!("cargo-machete")),
            Self::Lint => lint(),
            Self::LintClippy => cargo(&[
                "clippy",
                "--all-targets",
                "--all-features",
                "--",
                "-D",
                "warnings",
            ]),
            Self::LintDocs => lint_docs(),
            Self::LintFormatting => cargo_with(Toolchain::Nightly, &["fmt", "--all", "--check"]),
            Self::LintMarkdown => run(&cmd!("markdownlint-cli2", "**/*.md", "!target", "!**/target")),
            Self::LintTypos => run(&cmd!("typos")),
            Self::FixClippy => cargo(&[
                "clippy",
                "--all-targets",
                "--all-features",
                "--fix",
                "--allow-dirty",
                "--allow-staged",
                "--",
                "-D",
                "warnings",
            ]),
            Self::FixFormatting => cargo_with(Toolchain::Nightly, &["fmt", "--all"]),
            Self::FixTypos => run(&cmd!("typos", "-w")),
            Self::Test => {
                Self::TestLibs.run()?;
                // doc tests are slow, run them last
                Self::TestDocs.run()
            }
            Self::TestConcurrency => cargo(&[
                "test",
                "--package",
                "permit-portal-persistence",
                "--package",
                "permit-portal-api",
                "--lib",
                "concurrency",
            ]),
            Self::TestDocs => cargo(&["test", "--doc", "--all-features"]),
            Self::TestLibs => cargo(&["test", "--all-targets", "--all-features"]),
            Self::VerifyMigrations => verify_migrations(),
        }
    }
}

fn ci() -> Result<()> {
    lint()?;
    for step in [
        Command::Deny,
        Command::Machete,
        Command::Build,
        Command::Test,
        Command::VerifyMigrations,
    ] {
        tracing::info!("ci step: {step:?}");
        step.run()?;
    }
    Ok(())
}

/// Every linter. Markdown lint failures are reported but do not fail.
fn lint() -> Result<()> {
    Command::LintClippy.run()?;
    Command::LintDocs.run()?;
    Command::LintFormatting.run()?;
    Command::LintTypos.run()?;
    if let Err(err) = Command::LintMarkdown.run() {
        tracing::warn!("markdownlint reported problems: {err}");
    }
    Ok(())
}

/// Build each default package's docs with docs.rs flags, warnings denied.
fn lint_docs() -> Result<()> {
    let meta = MetadataCommand::new()
        .exec()
        .wrap_err("failed to get cargo metadata")?;

    for package in meta.workspace_default_packages() {
        cargo_with(
            Toolchain::Nightly,
            &[
                "doc",
                "--no-deps",
                "--all-features",
                "--package",
                &package.name,
            ],
        )?;
    }
    Ok(())
}

fn cargo(args: &[&str]) -> Result<()> {
    cargo_with(Toolchain::Default, args)
}

fn cargo_with(toolchain: Toolchain, args: &[&str]) -> Result<()> {
    let mut expression = cmd("cargo", args);
    if toolchain == Toolchain::Nightly {
        // CARGO points at the toolchain running xtask; drop it so rustup
        // picks nightly.
        expression = expression
            .env_remove("CARGO")
            .env("RUSTUP_TOOLCHAIN", "nightly")
            .env("RUSTDOCFLAGS", "--cfg docsrs -D warnings");
    }
    run(&expression)
}

fn run(expression: &duct::Expression) -> Result<()> {
    expression.run_with_trace()?;
    Ok(())
}

/// Tables the permit store reads and writes.
const EXPECTED_TABLES: [&str; 6] = [
    "audit_events",
    "department_reviews",
    "municipalities",
    "permit_number_sequences",
    "permit_types",
    "permits",
];

/// Unique constraints the permit store relies on for correctness under
/// concurrent writers, as `(table, columns)`.
const REQUIRED_UNIQUE_CONSTRAINTS: [(&str, &[&str]); 4] = [
    ("municipalities", &["name"]),
    ("permit_types", &["municipality_id", "code"]),
    ("permits", &["permit_number"]),
    ("department_reviews", &["permit_id", "department"]),
];

/// Verify the `SQLite` migrations
///
/// 1. Applies every migration to an in-memory database
/// 2. Checks the expected tables and unique constraints exist
/// 3. Reverts every migration and checks no table is left behind
/// 4. Applies the migrations again and checks the schema is unchanged
fn verify_migrations() -> Result<()> {
    use diesel::Connection;
    use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};

    const MIGRATIONS: EmbeddedMigrations = embed_migrations!("../crates/persistence/migrations");

    tracing::info!("Starting migration verification");

    let mut conn = SqliteConnection::establish(":memory:")
        .wrap_err("Failed to create SQLite in-memory database")?;
    diesel::sql_query("PRAGMA foreign_keys = ON")
        .execute(&mut conn)
        .wrap_err("Failed to enable foreign keys on SQLite")?;

    conn.run_pending_migrations(MIGRATIONS)
        .map_err(|e| color_eyre::eyre::eyre!("Failed to apply migrations: {e}"))?;
    tracing::info!("Migrations applied");

    let applied = introspect_sqlite_schema(&mut conn)?;
    check_expected_schema(&applied)?;

    conn.revert_all_migrations(MIGRATIONS)
        .map_err(|e| color_eyre::eyre::eyre!("Failed to revert migrations: {e}"))?;
    let reverted = introspect_sqlite_schema(&mut conn)?;
    if !reverted.tables.is_empty() {
        let leftover: Vec<&str> = reverted.tables.keys().map(String::as_str).collect();
        return Err(color_eyre::eyre::eyre!(
            "Tables left behind after reverting migrations: {}",
            leftover.join(", ")
        ));
    }
    tracing::info!("Migrations reverted");

    conn.run_pending_migrations(MIGRATIONS)
        .map_err(|e| color_eyre::eyre::eyre!("Failed to reapply migrations: {e}"))?;
    let reapplied = introspect_sqlite_schema(&mut conn)?;
    compare_schemas(&applied, &reapplied)?;

    tracing::info!("✓ Migration verification passed");
    Ok(())
}

/// Normalized schema representation
#[derive(Debug, Clone, PartialEq, Eq)]
struct Schema {
    tables: BTreeMap<String, Table>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Table {
    columns: BTreeMap<String, Column>,
    primary_keys: BTreeSet<String>,
    foreign_keys: BTreeSet<ForeignKey>,
    unique_constraints: BTreeSet<UniqueConstraint>,
    indexes: BTreeSet<Index>,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct Column {
    declared_type: String,
    nullable: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct ForeignKey {
    from_column: String,
    to_table: String,
    to_column: String,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct UniqueConstraint {
    columns: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct Index {
    name: String,
    columns: Vec<String>,
}

/// Introspect `SQLite` schema
fn introspect_sqlite_schema(conn: &mut SqliteConnection) -> Result<Schema> {
    #[derive(QueryableByName)]
    struct TableName {
        #[diesel(sql_type = Text)]
        name: String,
    }

    #[derive(QueryableByName)]
    struct ColumnInfo {
        #[diesel(sql_type = Text)]
        name: String,
        #[diesel(sql_type = Text)]
        r#type: String,
        #[diesel(sql_type = Integer)]
        notnull: i32,
        #[diesel(sql_type = Integer)]
        pk: i32,
    }

    #[derive(QueryableByName)]
    struct ForeignKeyInfo {
        #[diesel(sql_type = Text)]
        table: String,
        #[diesel(sql_type = Text)]
        from: String,
        #[diesel(sql_type = Text)]
        to: String,
    }

    #[derive(QueryableByName)]
    struct IndexInfo {
        #[diesel(sql_type = Text)]
        name: String,
        #[diesel(sql_type = Text)]
        origin: String,
    }

    #[derive(QueryableByName)]
    struct IndexColumnInfo {
        #[diesel(sql_type = Text)]
        name: String,
    }

    let mut schema = Schema {
        tables: BTreeMap::new(),
    };

    let tables: Vec<TableName> = diesel::sql_query(
        "SELECT name FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%' AND name != '__diesel_schema_migrations' ORDER BY name"
    )
    .load(conn)
    .wrap_err("Failed to query SQLite tables")?;

    for table in tables {
        let mut table_info = Table {
            columns: BTreeMap::new(),
            primary_keys: BTreeSet::new(),
            foreign_keys: BTreeSet::new(),
            unique_constraints: BTreeSet::new(),
            indexes: BTreeSet::new(),
        };

        let columns: Vec<ColumnInfo> =
            diesel::sql_query(format!("PRAGMA table_info({})", table.name))
                .load(conn)
                .wrap_err(format!("Failed to get columns for table {}", table.name))?;

        for col in columns {
            if col.pk > 0 {
                table_info.primary_keys.insert(col.name.clone());
            }
            table_info.columns.insert(
                col.name,
                Column {
                    declared_type: col.r#type.to_uppercase(),
                    nullable: col.notnull == 0,
                },
            );
        }

        let fks: Vec<ForeignKeyInfo> =
            diesel::sql_query(format!("PRAGMA foreign_key_list({})", table.name))
                .load(conn)
                .wrap_err(format!(
                    "Failed to get foreign keys for table {}",
                    table.name
                ))?;

        for fk in fks {
            table_info.foreign_keys.insert(ForeignKey {
                from_column: fk.from,
                to_table: fk.table,
                to_column: fk.to,
            });
        }

        let indexes: Vec<IndexInfo> =
            diesel::sql_query(format!("PRAGMA index_list({})", table.name))
                .load(conn)
                .wrap_err(format!("Failed to get indexes for table {}", table.name))?;

        for idx in indexes {
            let index_columns: Vec<IndexColumnInfo> =
                diesel::sql_query(format!("PRAGMA index_info({})", idx.name))
                    .load(conn)
                    .wrap_err(format!("Failed to get index columns for {}", idx.name))?;

            let column_names: Vec<String> = index_columns.into_iter().map(|c| c.name).collect();

            // origin 'u' is a UNIQUE constraint, including sqlite_autoindex_*
            if idx.origin == "u" {
                table_info.unique_constraints.insert(UniqueConstraint {
                    columns: column_names,
                });
            } else if !idx.name.starts_with("sqlite_autoindex_") {
                table_info.indexes.insert(Index {
                    name: idx.name,
                    columns: column_names,
                });
            }
        }

        schema.tables.insert(table.name, table_info);
    }

    Ok(schema)
}

/// Check the tables and unique constraints the permit store depends on
fn check_expected_schema(schema: &Schema) -> Result<()> {
    let mut errors: Vec<String> = Vec::new();

    for table in EXPECTED_TABLES {
        if !schema.tables.contains_key(table) {
            errors.push(format!("Missing table: {table}"));
        }
    }

    for (table, columns) in REQUIRED_UNIQUE_CONSTRAINTS {
        let expected = UniqueConstraint {
            columns: columns.iter().map(|c| (*c).to_string()).collect(),
        };
        let present: bool = schema
            .tables
            .get(table)
            .is_some_and(|t| t.unique_constraints.contains(&expected));
        if !present {
            errors.push(format!(
                "Table '{table}' lacks UNIQUE ({})",
                columns.join(", ")
            ));
        }
    }

    if errors.is_empty() {
        tracing::info!("Expected tables and unique constraints present");
        return Ok(());
    }

    for error in &errors {
        tracing::error!("{error}");
    }
    Err(color_eyre::eyre::eyre!(
        "Schema check failed with {} error(s)",
        errors.len()
    ))
}

/// Compare the schema before and after a revert/reapply round trip
fn compare_schemas(before: &Schema, after: &Schema) -> Result<()> {
    let mut errors: Vec<String> = Vec::new();

    let before_tables: BTreeSet<&String> = before.tables.keys().collect();
    let after_tables: BTreeSet<&String> = after.tables.keys().collect();
    for table in before_tables.symmetric_difference(&after_tables) {
        errors.push(format!("Table '{table}' differs after reapplying migrations"));
    }

    for (name, table) in &before.tables {
        let Some(other) = after.tables.get(name) else {
            continue;
        };
        if table.columns != other.columns {
            errors.push(format!("Table '{name}': columns differ"));
        }
        if table.primary_keys != other.primary_keys {
            errors.push(format!("Table '{name}': primary keys differ"));
        }
        if table.foreign_keys != other.foreign_keys {
            errors.push(format!("Table '{name}': foreign keys differ"));
        }
        if table.unique_constraints != other.unique_constraints {
            errors.push(format!("Table '{name}': unique constraints differ"));
        }
        if table.indexes != other.indexes {
            errors.push(format!("Table '{name}': indexes differ"));
        }
    }

    if errors.is_empty() {
        tracing::info!("Schema identical after reapplying migrations");
        return Ok(());
    }

    for error in &errors {
        tracing::error!("{error}");
    }
    Err(color_eyre::eyre::eyre!(
        "Schema round trip failed with {} difference(s)",
        errors.len()
    ))
}

/// An extension trait for `duct::Expression` that logs the command being run
/// before running it.
trait ExpressionExt {
    /// Run the command and log the command being run
    fn run_with_trace(&self) -> io::Result<Output>;
}

impl ExpressionExt for duct::Expression {
    fn run_with_trace(&self) -> io::Result<Output> {
        tracing::info!("running command: {:?}", self);
        self.run().inspect_err(|_| {
            // The command that was run may have scrolled off the screen, so repeat it here
            tracing::error!("failed to run command: {:?}", self);
        })
    }
}
