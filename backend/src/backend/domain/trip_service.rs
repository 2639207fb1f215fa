use std::sync::Arc;
use log::info;
use shared::{Trip, TripStatus};
use super::{whole_seconds, RecordService, ServiceError};
use crate::backend::storage::{Dao, TripDao};

/// Service for managing trips
#[derive(Clone)]
pub struct TripService {
    dao: TripDao,
}

impl TripService {
    pub fn new(dao: TripDao) -> Self {
        Self { dao }
    }

    /// Move a trip to `status` and return the stored trip
    pub async fn set_status(&self, id: &str, status: TripStatus) -> Result<Trip, ServiceError> {
        let mut trip = self.get(id).await?;
        let previous = trip.status;
        trip.status = status;
        self.update(&trip).await?;
        info!("Trip {} status {} -> {}", id, previous, status);
        Ok(trip)
    }
}

impl RecordService<Trip> for TripService {
    fn dao(&self) -> &Arc<dyn Dao<Trip>> {
        &self.dao
    }

    fn validate(&self, trip: &Trip) -> Result<(), ServiceError> {
        if trip.max_passengers < 1 {
            return Err(ServiceError::validation("trip", "max_passengers must be at least 1"));
        }
        whole_seconds("trip", "departure_time", &trip.departure_time)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::storage::factory::{DaoSet, StorageType};
    use crate::backend::storage::file::XmlFormat;
    use crate::backend::storage::test_utils::{sample_trip, TestEnvironment};

    #[tokio::test]
    async fn test_set_status_persists() {
        let env = TestEnvironment::new().unwrap();
        let daos = DaoSet::files::<XmlFormat>(StorageType::Xml, &env.connection);
        let service = TripService::new(daos.trips);

        let id = service.create(&sample_trip("user-1", "route-1")).await.unwrap();
        let trip = service.set_status(&id, TripStatus::Active).await.unwrap();
        assert_eq!(trip.status, TripStatus::Active);
        assert_eq!(service.get(&id).await.unwrap().status, TripStatus::Active);

        let missing = service.set_status("nope", TripStatus::Cancelled).await;
        assert!(matches!(missing, Err(ServiceError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_trip_needs_a_seat() {
        let env = TestEnvironment::new().unwrap();
        let daos = DaoSet::files::<XmlFormat>(StorageType::Xml, &env.connection);
        let service = TripService::new(daos.trips);

        let mut trip = sample_trip("user-1", "route-1");
        trip.max_passengers = 0;
        assert!(matches!(service.create(&trip).await, Err(ServiceError::Validation { entity: "trip", .. })));
    }

    #[tokio::test]
    async fn test_departure_with_fractional_seconds_is_rejected() {
        let env = TestEnvironment::new().unwrap();
        let daos = DaoSet::files::<XmlFormat>(StorageType::Xml, &env.connection);
        let service = TripService::new(daos.trips);

        let mut trip = sample_trip("user-1", "route-1");
        trip.departure_time = trip.departure_time.date().and_hms_milli_opt(8, 30, 0, 250).unwrap();
        assert!(matches!(service.create(&trip).await, Err(ServiceError::Validation { entity: "trip", .. })));
        assert!(!env.base_directory().join("trips.xml").exists());

        let id = service.create(&sample_trip("user-1", "route-1")).await.unwrap();
        trip.id = id.clone();
        assert!(matches!(service.update(&trip).await, Err(ServiceError::Validation { .. })));
        assert_eq!(service.get(&id).await.unwrap().departure_time, sample_trip("", "").departure_time);
    }
}
