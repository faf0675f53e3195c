//! Versioned schema upgrades.
//!
//! The applied version lives under `schema_version` in the metadata table.
//! Opening a database applies every step above that version, each inside its
//! own transaction, so an interrupted upgrade resumes from the last step that
//! committed.

use rusqlite::{Connection, OptionalExtension, Transaction, TransactionBehavior};
use tracing::info;

use crate::error::{Error, Result};

use super::schema;

const VERSION_KEY: &str = "schema_version";

/// One schema step.
#[derive(Debug)]
struct Migration {
    version: i32,
    description: &'static str,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        description: "create entries table",
        sql: schema::ENTRIES_TABLE,
    },
    Migration {
        version: 2,
        description: "index entries by write time",
        sql: schema::ENTRIES_UPDATED_INDEX,
    },
];

/// The schema version this build writes.
pub const CURRENT_VERSION: i32 = 2;

/// Bring the schema at `conn` up to [`CURRENT_VERSION`].
///
/// # Errors
///
/// Returns an error if a step fails, the stored version is unreadable, or
/// the database was written by a newer build.
pub fn initialize_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(schema::METADATA_TABLE)?;

    let applied = schema_version(conn)?;
    if applied > CURRENT_VERSION {
        return Err(Error::DatabaseMigration {
            message: format!(
                "database is at schema version {applied}, this build supports up to {CURRENT_VERSION}"
            ),
        });
    }

    for migration in MIGRATIONS.iter().filter(|m| m.version > applied) {
        apply(conn, migration)?;
    }
    Ok(())
}

fn apply(conn: &Connection, migration: &Migration) -> Result<()> {
    let tx = Transaction::new_unchecked(conn, TransactionBehavior::Immediate)?;
    tx.execute_batch(migration.sql)
        .map_err(|e| Error::DatabaseMigration {
            message: format!("step {} ({}): {e}", migration.version, migration.description),
        })?;
    write_version(&tx, migration.version)?;
    tx.commit()?;

    info!(
        "Applied schema step {}: {}",
        migration.version, migration.description
    );
    Ok(())
}

/// The applied schema version; 0 for a fresh database.
fn schema_version(conn: &Connection) -> Result<i32> {
    let stored: Option<String> = conn
        .query_row(
            "SELECT value FROM metadata WHERE key = ?1",
            [VERSION_KEY],
            |row| row.get(0),
        )
        .optional()?;

    match stored {
        None => Ok(0),
        Some(raw) => raw.trim().parse().map_err(|_| Error::DatabaseMigration {
            message: format!("unreadable schema version '{raw}'"),
        }),
    }
}

fn write_version(conn: &Connection, version: i32) -> Result<()> {
    conn.execute(
        "INSERT INTO metadata (key, value) VALUES (?1, ?2)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value",
        (VERSION_KEY, version.to_string()),
    )?;
    Ok(())
}
