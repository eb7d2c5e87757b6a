// SPDX-FileCopyrightText: 2026 CoopMob Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Audit-trail event queries.

use coopmob_core::CoopmobError;
use rusqlite::params;

use crate::database::{Database, map_tr_err};
use crate::models::Event;

/// Append one event row. Returns the event id.
pub async fn append_event(
    db: &Database,
    actor: &str,
    kind: &str,
    lead_id: Option<i64>,
    payload: Option<&str>,
) -> Result<i64, CoopmobError> {
    let actor = actor.to_string();
    let kind = kind.to_string();
    let payload = payload.map(str::to_string);
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO events (actor, kind, lead_id, payload) VALUES (?1, ?2, ?3, ?4)",
                params![actor, kind, lead_id, payload],
            )?;
            Ok(conn.last_insert_rowid())
        })
        .await
        .map_err(map_tr_err)
}

/// All events recorded for one lead, oldest first.
pub async fn events_for_lead(db: &Database, lead_id: i64) -> Result<Vec<Event>, CoopmobError> {
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, ts, actor, kind, lead_id, payload
                 FROM events WHERE lead_id = ?1 ORDER BY id",
            )?;
            let rows = stmt.query_map(params![lead_id], |row| {
                Ok(Event {
                    id: row.get(0)?,
                    ts: row.get(1)?,
                    actor: row.get(2)?,
                    kind: row.get(3)?,
                    lead_id: row.get(4)?,
                    payload: row.get(5)?,
                })
            })?;
            let events = rows.collect::<Result<Vec<Event>, _>>()?;
            Ok(events)
        })
        .await
        .map_err(map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn append_and_read_back_in_order() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("events.db");
        let db = Database::open(db_path.to_str().unwrap()).await.unwrap();

        let first = append_event(&db, "system", "lead_created", Some(7), Some("{}"))
            .await
            .unwrap();
        let second = append_event(&db, "agent", "lead_updated", Some(7), None)
            .await
            .unwrap();
        append_event(&db, "system", "lead_created", Some(8), None)
            .await
            .unwrap();
        assert!(second > first);

        let events = events_for_lead(&db, 7).await.unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].kind, "lead_created");
        assert_eq!(events[0].actor, "system");
        assert_eq!(events[0].payload.as_deref(), Some("{}"));
        assert_eq!(events[1].kind, "lead_updated");
        assert_eq!(events[1].actor, "agent");
        assert!(!events[0].ts.is_empty());

        db.close().await.unwrap();
    }
}
