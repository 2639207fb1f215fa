//! # Relational Storage
//!
//! PostgreSQL backend: one table per entity with generated `UUID` keys and
//! foreign keys between related records. Every DAO operation runs inside a
//! `Session` obtained from the `SessionManager`, so writes are committed or
//! rolled back as a unit.

pub mod connection;
pub mod mappings;
pub mod session;
pub mod store;

pub use connection::DbConnection;
pub use mappings::RelationalMapping;
pub use session::{Session, SessionFuture, SessionManager};
pub use store::PgStore;
