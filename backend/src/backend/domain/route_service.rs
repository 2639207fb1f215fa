use std::sync::Arc;
use shared::Route;
use super::{RecordService, ServiceError};
use crate::backend::storage::{Dao, RouteDao};

/// Service for managing routes
#[derive(Clone)]
pub struct RouteService {
    dao: RouteDao,
}

impl RouteService {
    pub fn new(dao: RouteDao) -> Self {
        Self { dao }
    }
}

impl RecordService<Route> for RouteService {
    fn dao(&self) -> &Arc<dyn Dao<Route>> {
        &self.dao
    }

    fn validate(&self, route: &Route) -> Result<(), ServiceError> {
        let start = route.start_point.trim();
        let end = route.end_point.trim();
        if start.is_empty() || end.is_empty() {
            return Err(ServiceError::validation("route", "start and end points are required"));
        }
        if start.eq_ignore_ascii_case(end) {
            return Err(ServiceError::validation("route", "start and end points must differ"));
        }
        if route.estimated_duration < 0 {
            return Err(ServiceError::validation("route", "estimated duration cannot be negative"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::storage::factory::{DaoSet, StorageType};
    use crate::backend::storage::file::CsvFormat;
    use crate::backend::storage::test_utils::{sample_route, TestEnvironment};

    #[tokio::test]
    async fn test_route_validation() {
        let env = TestEnvironment::new().unwrap();
        let service = RouteService::new(DaoSet::files::<CsvFormat>(StorageType::Csv, &env.connection).routes);

        let mut looped = sample_route();
        looped.end_point = "lyon part-dieu".to_string();
        assert!(service.create(&looped).await.is_err());

        let mut backwards = sample_route();
        backwards.estimated_duration = -5;
        assert!(service.create(&backwards).await.is_err());

        let id = service.create(&sample_route()).await.unwrap();
        assert_eq!(service.get(&id).await.unwrap().estimated_duration, 270);
    }

    #[tokio::test]
    async fn test_update_of_unknown_route_is_not_found() {
        let env = TestEnvironment::new().unwrap();
        let service = RouteService::new(DaoSet::files::<CsvFormat>(StorageType::Csv, &env.connection).routes);

        let mut route = sample_route();
        route.id = "missing".to_string();
        assert!(matches!(service.update(&route).await, Err(ServiceError::NotFound { entity: "route", .. })));
    }
}
