// SPDX-FileCopyrightText: 2026 CoopMob Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Schema migrations embedded at build time.
//!
//! refinery's `embed_migrations!` compiles the SQL files under `migrations/`
//! into the binary; [`Database::open`](crate::database::Database::open)
//! replays them before serving queries.

mod embedded {
    use refinery::embed_migrations;
    embed_migrations!("migrations");
}

/// Apply whatever migrations the database has not seen yet.
///
/// Applied versions live in refinery's own `refinery_schema_history` table,
/// so replaying on every open is a no-op once the schema is current.
pub fn run_migrations(conn: &mut rusqlite::Connection) -> Result<(), refinery::Error> {
    embedded::migrations::runner().run(conn)?;
    Ok(())
}
