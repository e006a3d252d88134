use chrono::NaiveDateTime;
use rusqlite::{params, Connection};

use crate::models::{CorrectionRecord, RecordStatus};

const TS_FMT: &str = "%Y-%m-%d %H:%M:%S";

/// Append-only: records are inserted once per completed corrective attempt
/// and never updated or deleted.
pub fn append_correction_record(conn: &Connection, record: &CorrectionRecord) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO correction_records
            (id, session_id, action, child_name, slot_after, appointment_guid_after, status, message, performed_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            record.id,
            record.session_id,
            record.action,
            record.child_name,
            record.slot_after,
            record.appointment_guid_after,
            record.status.as_str(),
            record.message,
            record.performed_at.format(TS_FMT).to_string(),
        ],
    )?;
    Ok(())
}

pub fn get_correction_history(
    conn: &Connection,
    session_id: &str,
) -> anyhow::Result<Vec<CorrectionRecord>> {
    let mut stmt = conn.prepare(
        "SELECT id, session_id, action, child_name, slot_after, appointment_guid_after, status, message, performed_at
         FROM correction_records WHERE session_id = ?1",
    )?;

    let rows = stmt.query_map([session_id], |row| {
        let status_str: String = row.get(6)?;
        let performed_at_str: String = row.get(8)?;
        Ok(CorrectionRecord {
            id: row.get(0)?,
            session_id: row.get(1)?,
            action: row.get(2)?,
            child_name: row.get(3)?,
            slot_after: row.get(4)?,
            appointment_guid_after: row.get(5)?,
            status: RecordStatus::parse(&status_str),
            message: row.get(7)?,
            performed_at: NaiveDateTime::parse_from_str(&performed_at_str, TS_FMT)
                .unwrap_or_default(),
        })
    })?;

    let mut records = Vec::new();
    for row in rows {
        records.push(row?);
    }
    Ok(records)
}
