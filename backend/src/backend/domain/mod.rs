//! # Domain Module
//!
//! Thin services over the storage contract. Each service validates records
//! before they reach a DAO and turns a missing record into an explicit error.
//!
//! ## Module Organization
//!
//! - **user_service**: users, with name and email checks
//! - **trip_service**: trips and their status changes
//! - **route_service**: routes between two distinct points
//! - **booking_service**: seat bookings and cancellation
//! - **rating_service**: trip ratings on a 1 to 5 scale
//!
//! ## Business Rules
//!
//! - Identifiers are assigned by storage; services never invent them
//! - `get` of an absent record is `ServiceError::NotFound`, not `None`
//! - Validation happens before any storage call
//! - Date-times carry whole seconds only, the precision every backend keeps

pub mod booking_service;
pub mod rating_service;
pub mod route_service;
pub mod trip_service;
pub mod user_service;

use std::sync::Arc;
use async_trait::async_trait;
use chrono::{NaiveDateTime, Timelike};
use log::{info, warn};
use thiserror::Error;
use shared::Record;
use crate::backend::storage::{DataAccessError, Dao};

pub use booking_service::BookingService;
pub use rating_service::RatingService;
pub use route_service::RouteService;
pub use trip_service::TripService;
pub use user_service::UserService;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("invalid {entity}: {message}")]
    Validation { entity: &'static str, message: String },

    #[error("{entity} with id '{id}' not found")]
    NotFound { entity: &'static str, id: String },

    #[error(transparent)]
    Storage(#[from] DataAccessError),
}

impl ServiceError {
    pub fn validation(entity: &'static str, message: impl Into<String>) -> Self {
        Self::Validation { entity, message: message.into() }
    }

    /// Lift a storage `NotFound` into the service-level variant
    fn from_storage(error: DataAccessError) -> Self {
        match error {
            DataAccessError::NotFound { entity, id } => Self::NotFound { entity, id },
            other => Self::Storage(other),
        }
    }
}

/// Reject date-times with a fractional second
pub(crate) fn whole_seconds(
    entity: &'static str,
    field: &str,
    value: &NaiveDateTime,
) -> Result<(), ServiceError> {
    if value.nanosecond() != 0 {
        return Err(ServiceError::validation(
            entity,
            format!("{} must not have fractional seconds (got {})", field, value),
        ));
    }
    Ok(())
}

/// Validated CRUD operations shared by every entity service
#[async_trait]
pub trait RecordService<R: Record>: Send + Sync {
    fn dao(&self) -> &Arc<dyn Dao<R>>;

    fn validate(&self, record: &R) -> Result<(), ServiceError>;

    async fn create(&self, record: &R) -> Result<String, ServiceError> {
        self.validate(record)?;
        let id = self.dao().create(record).await?;
        info!("Created {} {}", R::ENTITY, id);
        Ok(id)
    }

    async fn get(&self, id: &str) -> Result<R, ServiceError> {
        match self.dao().get_by_id(id).await? {
            Some(record) => Ok(record),
            None => {
                warn!("{} not found: {}", R::ENTITY, id);
                Err(ServiceError::NotFound { entity: R::ENTITY, id: id.to_string() })
            }
        }
    }

    async fn update(&self, record: &R) -> Result<(), ServiceError> {
        self.validate(record)?;
        self.dao().update(record).await.map_err(ServiceError::from_storage)
    }

    async fn delete(&self, id: &str) -> Result<(), ServiceError> {
        self.dao().delete(id).await?;
        Ok(())
    }
}
