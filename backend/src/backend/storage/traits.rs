//! # Storage Traits
//!
//! This module defines the data access contract that every storage backend
//! implements, so the domain layer can work with XML files, CSV files,
//! MongoDB or PostgreSQL without modification.

use std::sync::Arc;
use async_trait::async_trait;
use shared::{Booking, Rating, Record, Route, Trip, User};
use super::error::DataAccessError;

/// Data access operations for one record type
///
/// The four operations are uniform across backends. Listing and filtering
/// are deliberately not part of the contract.
#[async_trait]
pub trait Dao<R: Record>: Send + Sync {
    /// Assign a new identifier, persist the record and return the identifier.
    /// Any `id` already present on `record` is ignored.
    async fn create(&self, record: &R) -> Result<String, DataAccessError>;

    /// Retrieve a record by identifier.
    ///
    /// Whether a malformed identifier yields `Ok(None)` or
    /// `Err(MalformedId)` depends on the backend: file stores return `None`,
    /// the document and relational stores fail.
    async fn get_by_id(&self, id: &str) -> Result<Option<R>, DataAccessError>;

    /// Replace the stored record that has `record.id()`.
    /// Fails with `NotFound` when no such record exists.
    async fn update(&self, record: &R) -> Result<(), DataAccessError>;

    /// Remove the record if present. Absent identifiers are a no-op.
    async fn delete(&self, id: &str) -> Result<(), DataAccessError>;
}

pub type UserDao = Arc<dyn Dao<User>>;
pub type TripDao = Arc<dyn Dao<Trip>>;
pub type RouteDao = Arc<dyn Dao<Route>>;
pub type BookingDao = Arc<dyn Dao<Booking>>;
pub type RatingDao = Arc<dyn Dao<Rating>>;
