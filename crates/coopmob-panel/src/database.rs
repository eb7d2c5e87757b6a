// SPDX-FileCopyrightText: 2026 CoopMob Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Database connection management with PRAGMA setup, WAL mode, and lifecycle.
//!
//! All writes are serialized through tokio-rusqlite's single background
//! thread. Do not create additional connections for writes.

use std::path::Path;

use coopmob_core::CoopmobError;
use tokio_rusqlite::Connection;

/// Handle to the panel's SQLite database.
///
/// Opening runs the PRAGMA setup and all pending migrations, so a `Database`
/// is always at the current schema once constructed. The handle is cheap to
/// clone through [`Database::connection`]'s `tokio_rusqlite::Connection`.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open (creating if necessary) the database at `path` and bring the
    /// schema up to date.
    pub async fn open(path: &str) -> Result<Self, CoopmobError> {
        if let Some(parent) = Path::new(path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| CoopmobError::Storage {
                    source: Box::new(e),
                })?;
            }
        }

        let conn = Connection::open(path.to_string())
            .await
            .map_err(|e| map_tr_err(e.into()))?;
        conn.call(|conn| {
            conn.pragma_update(None, "journal_mode", "WAL")?;
            conn.pragma_update(None, "synchronous", "NORMAL")?;
            conn.pragma_update(None, "foreign_keys", true)?;
            conn.pragma_update(None, "busy_timeout", 5000)?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)?;
        conn.call(|conn| crate::migrations::run_migrations(conn))
            .await
            .map_err(|e| CoopmobError::Storage {
                source: Box::new(e),
            })?;

        Ok(Self { conn })
    }

    /// The shared connection handle all query modules go through.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Checkpoint the WAL and close the background connection thread.
    pub async fn close(&self) -> Result<(), CoopmobError> {
        self.conn
            .call(|conn| {
                conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;
        self.conn.clone().close().await.map_err(map_tr_err)?;
        Ok(())
    }
}

pub(crate) fn map_tr_err(err: tokio_rusqlite::Error) -> CoopmobError {
    CoopmobError::Storage {
        source: Box::new(err),
    }
}
