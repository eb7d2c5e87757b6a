// SPDX-FileCopyrightText: 2026 CoopMob Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Lead upsert and listing queries.

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use coopmob_core::CoopmobError;
use rusqlite::params;

use crate::database::{Database, map_tr_err};
use crate::models::Lead;

const LEAD_COLUMNS: &str =
    "id, created_at, name, phone, email, city, source, step, status, owner, form_token";

/// Fields an upsert may set. `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default)]
pub struct LeadPatch {
    pub name: Option<String>,
    pub email: Option<String>,
    pub city: Option<String>,
    pub source: Option<String>,
}

/// Filter and page window for lead listings.
#[derive(Debug, Clone)]
pub struct LeadFilter {
    pub city: Option<String>,
    pub status: Option<String>,
    pub q: Option<String>,
    pub limit: i64,
    pub offset: i64,
}

impl Default for LeadFilter {
    fn default() -> Self {
        Self {
            city: None,
            status: None,
            q: None,
            limit: 50,
            offset: 0,
        }
    }
}

/// Create or update the lead keyed by `phone`.
///
/// Only the fields present in `patch` are written; a missing `form_token` is
/// issued here and preserved forever after. Returns the stored row and
/// whether it was newly created.
pub async fn upsert_lead(
    db: &Database,
    phone: &str,
    patch: &LeadPatch,
) -> Result<(Lead, bool), CoopmobError> {
    let phone = phone.to_string();
    let patch = patch.clone();
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            let existing = select_by_phone(&tx, &phone)?;
            let created = existing.is_none();
            match existing {
                Some(lead) => {
                    let name = patch.name.or(lead.name);
                    let email = patch.email.or(lead.email);
                    let city = patch.city.or(lead.city);
                    let source = patch.source.or(lead.source);
                    let form_token = lead.form_token.unwrap_or_else(new_form_token);
                    tx.execute(
                        "UPDATE leads
                         SET name = ?1, email = ?2, city = ?3, source = ?4, form_token = ?5
                         WHERE id = ?6",
                        params![name, email, city, source, form_token, lead.id],
                    )?;
                }
                None => {
                    tx.execute(
                        "INSERT INTO leads (phone, name, email, city, source, form_token)
                         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                        params![
                            phone,
                            patch.name,
                            patch.email,
                            patch.city,
                            patch.source,
                            new_form_token(),
                        ],
                    )?;
                }
            }
            let lead =
                select_by_phone(&tx, &phone)?.ok_or(rusqlite::Error::QueryReturnedNoRows)?;
            tx.commit()?;
            Ok((lead, created))
        })
        .await
        .map_err(map_tr_err)
}

/// List leads matching `filter`, returning the page plus the pre-pagination
/// match count.
pub async fn list_leads(
    db: &Database,
    filter: &LeadFilter,
) -> Result<(Vec<Lead>, i64), CoopmobError> {
    let filter = filter.clone();
    db.connection()
        .call(move |conn| {
            let mut clauses: Vec<&str> = Vec::new();
            let mut args: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();
            if let Some(city) = &filter.city {
                clauses.push("city = ?");
                args.push(Box::new(city.clone()));
            }
            if let Some(status) = &filter.status {
                clauses.push("status = ?");
                args.push(Box::new(status.clone()));
            }
            if let Some(q) = &filter.q {
                // SQLite LIKE folds ASCII case by default, matching the
                // panel's case-insensitive free-text search.
                clauses.push("(name LIKE ? OR phone LIKE ? OR email LIKE ?)");
                let needle = format!("%{q}%");
                args.push(Box::new(needle.clone()));
                args.push(Box::new(needle.clone()));
                args.push(Box::new(needle));
            }
            let where_sql = if clauses.is_empty() {
                String::new()
            } else {
                format!(" WHERE {}", clauses.join(" AND "))
            };

            let total: i64 = conn.query_row(
                &format!("SELECT COUNT(*) FROM leads{where_sql}"),
                rusqlite::params_from_iter(args.iter().map(|arg| arg.as_ref())),
                |row| row.get(0),
            )?;

            let mut stmt = conn.prepare(&format!(
                "SELECT {LEAD_COLUMNS} FROM leads{where_sql} ORDER BY id LIMIT ? OFFSET ?"
            ))?;
            args.push(Box::new(filter.limit));
            args.push(Box::new(filter.offset));
            let rows = stmt.query_map(
                rusqlite::params_from_iter(args.iter().map(|arg| arg.as_ref())),
                lead_from_row,
            )?;
            let leads = rows.collect::<Result<Vec<Lead>, _>>()?;
            Ok((leads, total))
        })
        .await
        .map_err(map_tr_err)
}

fn select_by_phone(
    conn: &rusqlite::Connection,
    phone: &str,
) -> Result<Option<Lead>, rusqlite::Error> {
    let mut stmt =
        conn.prepare(&format!("SELECT {LEAD_COLUMNS} FROM leads WHERE phone = ?1"))?;
    let result = stmt.query_row(params![phone], lead_from_row);
    match result {
        Ok(lead) => Ok(Some(lead)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e),
    }
}

fn lead_from_row(row: &rusqlite::Row<'_>) -> Result<Lead, rusqlite::Error> {
    Ok(Lead {
        id: row.get(0)?,
        created_at: row.get(1)?,
        name: row.get(2)?,
        phone: row.get(3)?,
        email: row.get(4)?,
        city: row.get(5)?,
        source: row.get(6)?,
        step: row.get(7)?,
        status: row.get(8)?,
        owner: row.get(9)?,
        form_token: row.get(10)?,
    })
}

/// A fresh form token: 16 random bytes, url-safe base64 without padding.
fn new_form_token() -> String {
    let bytes: [u8; 16] = rand::random();
    URL_SAFE_NO_PAD.encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    async fn setup_db() -> (Database, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("leads.db");
        let db = Database::open(db_path.to_str().unwrap()).await.unwrap();
        (db, dir)
    }

    #[tokio::test]
    async fn upsert_creates_with_schema_defaults() {
        let (db, _dir) = setup_db().await;
        let patch = LeadPatch {
            name: Some("Maria Silva".to_string()),
            ..LeadPatch::default()
        };

        let (lead, created) = upsert_lead(&db, "5511988887777", &patch).await.unwrap();
        assert!(created);
        assert_eq!(lead.phone, "5511988887777");
        assert_eq!(lead.name.as_deref(), Some("Maria Silva"));
        assert_eq!(lead.step, "INTRO");
        assert_eq!(lead.status, "NEW");
        assert!(!lead.created_at.is_empty());
        // 16 url-safe base64 bytes without padding.
        assert_eq!(lead.form_token.as_deref().map(str::len), Some(22));

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn upsert_updates_only_provided_fields() {
        let (db, _dir) = setup_db().await;
        let first = LeadPatch {
            name: Some("Maria".to_string()),
            email: Some("maria@example.com".to_string()),
            ..LeadPatch::default()
        };
        let (lead, _) = upsert_lead(&db, "5511900001111", &first).await.unwrap();
        let token = lead.form_token.clone();

        let second = LeadPatch {
            city: Some("Santos".to_string()),
            ..LeadPatch::default()
        };
        let (updated, created) = upsert_lead(&db, "5511900001111", &second).await.unwrap();
        assert!(!created);
        assert_eq!(updated.id, lead.id);
        assert_eq!(updated.name.as_deref(), Some("Maria"));
        assert_eq!(updated.email.as_deref(), Some("maria@example.com"));
        assert_eq!(updated.city.as_deref(), Some("Santos"));
        assert_eq!(updated.form_token, token);

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn list_filters_by_city_status_and_text() {
        let (db, _dir) = setup_db().await;
        for (phone, name, city) in [
            ("5511900000001", "Maria Silva", "São Paulo"),
            ("5511900000002", "João Souza", "Santos"),
            ("5511900000003", "Ana Marques", "São Paulo"),
        ] {
            let patch = LeadPatch {
                name: Some(name.to_string()),
                city: Some(city.to_string()),
                ..LeadPatch::default()
            };
            upsert_lead(&db, phone, &patch).await.unwrap();
        }

        let (all, total) = list_leads(&db, &LeadFilter::default()).await.unwrap();
        assert_eq!(total, 3);
        assert_eq!(all.len(), 3);

        let by_city = LeadFilter {
            city: Some("Santos".to_string()),
            ..LeadFilter::default()
        };
        let (leads, total) = list_leads(&db, &by_city).await.unwrap();
        assert_eq!(total, 1);
        assert_eq!(leads[0].name.as_deref(), Some("João Souza"));

        // Free text matches name, phone, or email without case.
        let by_text = LeadFilter {
            q: Some("mar".to_string()),
            ..LeadFilter::default()
        };
        let (leads, total) = list_leads(&db, &by_text).await.unwrap();
        assert_eq!(total, 2);
        assert!(leads.iter().all(|lead| {
            lead.name
                .as_deref()
                .is_some_and(|name| name.to_lowercase().contains("mar"))
        }));

        let by_phone = LeadFilter {
            q: Some("0000002".to_string()),
            ..LeadFilter::default()
        };
        let (_, total) = list_leads(&db, &by_phone).await.unwrap();
        assert_eq!(total, 1);

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn list_pages_but_counts_everything() {
        let (db, _dir) = setup_db().await;
        for n in 0..5 {
            upsert_lead(&db, &format!("551190000100{n}"), &LeadPatch::default())
                .await
                .unwrap();
        }

        let page = LeadFilter {
            limit: 2,
            offset: 2,
            ..LeadFilter::default()
        };
        let (leads, total) = list_leads(&db, &page).await.unwrap();
        assert_eq!(total, 5);
        assert_eq!(leads.len(), 2);
        assert_eq!(leads[0].phone, "5511900001002");

        db.close().await.unwrap();
    }

    #[test]
    fn form_tokens_are_unique_and_url_safe() {
        let a = new_form_token();
        let b = new_form_token();
        assert_ne!(a, b);
        assert_eq!(a.len(), 22);
        assert!(a.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }
}
