use anyhow::Context;
use rusqlite::Connection;

/// Ordered, append-only. Applied names are recorded in `_migrations` so
/// re-running is a no-op.
const MIGRATIONS: &[(&str, &str)] = &[(
    "001_correction_records",
    "CREATE TABLE IF NOT EXISTS correction_records (
        id TEXT PRIMARY KEY,
        session_id TEXT NOT NULL,
        action TEXT NOT NULL,
        child_name TEXT,
        slot_after TEXT,
        appointment_guid_after TEXT,
        status TEXT NOT NULL,
        message TEXT,
        performed_at TEXT NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_correction_records_session
        ON correction_records (session_id);",
)];

pub fn run_migrations(conn: &Connection) -> anyhow::Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS _migrations (
            name TEXT PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );",
    )
    .context("failed to create migrations table")?;

    for (name, sql) in MIGRATIONS {
        let already_applied: bool = conn
            .query_row(
                "SELECT COUNT(*) > 0 FROM _migrations WHERE name = ?1",
                [name],
                |row| row.get(0),
            )
            .context("failed to check migration status")?;

        if already_applied {
            continue;
        }

        conn.execute_batch(sql)
            .with_context(|| format!("failed to apply migration: {name}"))?;

        conn.execute("INSERT INTO _migrations (name) VALUES (?1)", [name])
            .with_context(|| format!("failed to record migration: {name}"))?;

        tracing::info!("applied migration: {name}");
    }

    Ok(())
}
