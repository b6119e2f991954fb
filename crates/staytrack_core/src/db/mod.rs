//! SQLite storage for trips, segments and visas.
//!
//! Connections handed out here are migrated and have foreign keys enabled;
//! repositories assume both.

pub mod migrations;
mod open;

pub use open::{open_db, open_db_in_memory, DbError, DbResult};
