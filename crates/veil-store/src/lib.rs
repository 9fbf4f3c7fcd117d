//! Veil Store — `PostgreSQL` persistence for players, characters, revealed
//! fields and actions.

mod pg_store;
mod rows;

pub use pg_store::PgStore;
