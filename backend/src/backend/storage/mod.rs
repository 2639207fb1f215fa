//! # Storage Module
//!
//! Handles all data persistence for the car-pool application.
//!
//! Every entity is accessed through the same `Dao<R>` contract whatever the
//! backend, so the domain layer never sees which medium it is talking to.
//!
//! ## Backends
//!
//! - **file**: one XML or CSV file per entity collection, rewritten whole
//! - **mongo**: one MongoDB collection per entity
//! - **postgres**: one PostgreSQL table per entity, every write in a transaction
//!
//! ## Units of Work
//!
//! The relational backend runs its primitives inside a `Session` handed out by
//! `SessionManager`. The other backends use `DirectRunner`, which keeps the
//! same calling convention without a transaction.
//!
//! `factory::DaoSet` wires the configured backend once at startup.

pub mod error;
pub mod factory;
pub mod file;
pub mod mongo;
pub mod postgres;
pub mod runner;
pub mod traits;

#[cfg(test)]
pub mod test_utils;

// Re-export the main types that other modules need
pub use error::{BackendInitError, DataAccessError};
pub use factory::{DaoSet, StorageType};
pub use runner::DirectRunner;
pub use traits::{BookingDao, Dao, RatingDao, RouteDao, TripDao, UserDao};
