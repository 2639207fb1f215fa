//! # Backend Module
//!
//! Contains all non-UI logic for the car-pool application.
//!
//! This module serves as the orchestration layer that brings together:
//! - **Config**: where settings come from and which backend they select
//! - **Domain**: validation rules for users, trips, routes, bookings and ratings
//! - **Storage**: the four interchangeable persistence backends
//! - **IO**: the command-line surface
//!
//! ## Architecture
//!
//! ```text
//! IO Layer (clap CLI)
//!     ↓
//! Domain Layer (services)
//!     ↓
//! Storage Layer (Dao<R> over XML, CSV, MongoDB or PostgreSQL)
//! ```

pub mod config;
pub mod domain;
pub mod io;
pub mod storage;

use log::info;
use crate::backend::config::BackendConfig;
use crate::backend::domain::{BookingService, RatingService, RouteService, TripService, UserService};
use crate::backend::storage::{BackendInitError, DaoSet, StorageType};

/// Main application state that holds all services
#[derive(Clone)]
pub struct AppState {
    pub storage_type: StorageType,
    pub user_service: UserService,
    pub trip_service: TripService,
    pub route_service: RouteService,
    pub booking_service: BookingService,
    pub rating_service: RatingService,
}

impl AppState {
    pub fn from_daos(daos: DaoSet) -> Self {
        Self {
            storage_type: daos.storage_type,
            user_service: UserService::new(daos.users),
            trip_service: TripService::new(daos.trips),
            route_service: RouteService::new(daos.routes),
            booking_service: BookingService::new(daos.bookings),
            rating_service: RatingService::new(daos.ratings),
        }
    }
}

/// Initialize the backend with all required services
pub async fn initialize_backend(config: &BackendConfig) -> Result<AppState, BackendInitError> {
    info!("Setting up storage");
    let daos = DaoSet::build(config).await?;

    info!("Setting up domain services");
    Ok(AppState::from_daos(daos))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::domain::RecordService;
    use crate::backend::storage::test_utils::{sample_user, TestEnvironment};

    #[tokio::test]
    async fn test_initialize_backend_wires_every_service() {
        let env = TestEnvironment::new().unwrap();
        let config = BackendConfig::Xml { root: env.base_directory().to_path_buf() };

        let state = initialize_backend(&config).await.unwrap();
        assert_eq!(state.storage_type, StorageType::Xml);

        let id = state.user_service.create(&sample_user("carol@example.com")).await.unwrap();
        assert_eq!(state.user_service.get(&id).await.unwrap().email, "carol@example.com");
        assert!(env.base_directory().join("users.xml").exists());
    }
}
