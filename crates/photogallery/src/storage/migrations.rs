//! Schema versioning for the photogallery database.
//!
//! The on-disk version lives in the `metadata` table. A fresh database is
//! stamped with [`CURRENT_VERSION`]; a database stamped by a newer build is
//! refused rather than written with an older layout.

use rusqlite::Connection;

use crate::error::{Error, Result};

use super::schema::SCHEMA_STATEMENTS;

/// The current schema version.
pub const CURRENT_VERSION: i32 = 1;

const VERSION_KEY: &str = "schema_version";

/// Create missing tables and check the stored schema version.
///
/// # Errors
///
/// Returns an error if table creation fails, or if the database carries an
/// unreadable or newer schema version.
pub fn initialize_schema(conn: &Connection) -> Result<()> {
    for statement in SCHEMA_STATEMENTS {
        conn.execute(statement, [])?;
    }

    match get_schema_version(conn)? {
        None => set_schema_version(conn, CURRENT_VERSION),
        Some(version) if version > CURRENT_VERSION => Err(Error::DatabaseMigration {
            message: format!(
                "database schema version {version} is newer than supported version {CURRENT_VERSION}"
            ),
        }),
        Some(_) => Ok(()),
    }
}

fn get_schema_version(conn: &Connection) -> Result<Option<i32>> {
    let result: std::result::Result<String, rusqlite::Error> = conn.query_row(
        "SELECT value FROM metadata WHERE key = ?1",
        [VERSION_KEY],
        |row| row.get(0),
    );

    match result {
        Ok(value) => value
            .parse()
            .map(Some)
            .map_err(|_| Error::DatabaseMigration {
                message: format!("invalid schema version: {value}"),
            }),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

fn set_schema_version(conn: &Connection, version: i32) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO metadata (key, value) VALUES (?1, ?2)",
        (VERSION_KEY, version.to_string()),
    )?;
    Ok(())
}
