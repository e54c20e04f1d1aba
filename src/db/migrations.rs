//! Versioned schema migrations.
//!
//! Each migration is an embedded SQL script applied at most once and recorded
//! in `schema_version`. Running against an up-to-date store applies nothing.

use anyhow::{bail, Context, Result};
use rusqlite::Connection;
use tracing::info;

struct Migration {
    version: i64,
    name: &'static str,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "baseline",
        sql: include_str!("migrations/001_baseline.sql"),
    },
    Migration {
        version: 2,
        name: "browser_tags_and_anomalies",
        sql: include_str!("migrations/002_browser_tags_and_anomalies.sql"),
    },
];

/// Highest schema version this binary knows how to produce.
pub fn latest_version() -> i64 {
    MIGRATIONS.last().map(|m| m.version).unwrap_or(0)
}

fn ensure_schema_version_table(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            applied_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
        );",
    )
    .context("Failed to create schema_version table")
}

/// Highest applied migration, or 0 for a fresh store.
pub fn current_version(conn: &Connection) -> Result<i64> {
    ensure_schema_version_table(conn)?;
    conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |row| row.get(0),
    )
    .context("Failed to read schema version")
}

/// Apply every pending migration, each inside its own transaction.
///
/// Returns how many were applied. A store written by a newer binary is refused
/// rather than silently downgraded.
pub fn run_migrations(conn: &mut Connection) -> Result<usize> {
    let current = current_version(conn)?;
    let latest = latest_version();

    if current > latest {
        bail!(
            "Database schema version ({}) is newer than this build supports ({})",
            current,
            latest
        );
    }

    let mut applied = 0;
    for migration in MIGRATIONS.iter().filter(|m| m.version > current) {
        let tx = conn
            .transaction()
            .context("Failed to begin migration transaction")?;

        tx.execute_batch(migration.sql)
            .with_context(|| format!("Migration v{} ({}) failed", migration.version, migration.name))?;

        tx.execute(
            "INSERT INTO schema_version (version, name) VALUES (?1, ?2)",
            rusqlite::params![migration.version, migration.name],
        )
        .with_context(|| format!("Failed to record migration v{}", migration.version))?;

        tx.commit()
            .with_context(|| format!("Failed to commit migration v{}", migration.version))?;

        info!("Applied migration v{} ({})", migration.version, migration.name);
        applied += 1;
    }

    Ok(applied)
}
