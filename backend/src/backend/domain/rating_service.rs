use std::sync::Arc;
use shared::Rating;
use super::{RecordService, ServiceError};
use crate::backend::storage::{Dao, RatingDao};

pub const RATING_RANGE: std::ops::RangeInclusive<i32> = 1..=5;

/// Service for managing trip ratings
#[derive(Clone)]
pub struct RatingService {
    dao: RatingDao,
}

impl RatingService {
    pub fn new(dao: RatingDao) -> Self {
        Self { dao }
    }
}

impl RecordService<Rating> for RatingService {
    fn dao(&self) -> &Arc<dyn Dao<Rating>> {
        &self.dao
    }

    fn validate(&self, rating: &Rating) -> Result<(), ServiceError> {
        if !RATING_RANGE.contains(&rating.rating) {
            return Err(ServiceError::validation(
                "rating",
                format!("rating must be between 1 and 5, got {}", rating.rating),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::storage::factory::{DaoSet, StorageType};
    use crate::backend::storage::file::XmlFormat;
    use crate::backend::storage::test_utils::{sample_rating, TestEnvironment};

    #[tokio::test]
    async fn test_rating_bounds() {
        let env = TestEnvironment::new().unwrap();
        let service = RatingService::new(DaoSet::files::<XmlFormat>(StorageType::Xml, &env.connection).ratings);

        for value in [0, 6, -1] {
            let mut rating = sample_rating("trip-1");
            rating.rating = value;
            assert!(service.create(&rating).await.is_err(), "{} accepted", value);
        }

        let mut top = sample_rating("trip-1");
        top.rating = 5;
        let id = service.create(&top).await.unwrap();
        assert_eq!(service.get(&id).await.unwrap().rating, 5);
    }
}
