use std::sync::Arc;
use log::info;
use shared::{Booking, BookingStatus};
use super::{whole_seconds, RecordService, ServiceError};
use crate::backend::storage::{BookingDao, Dao};

/// Service for managing seat bookings
#[derive(Clone)]
pub struct BookingService {
    dao: BookingDao,
}

impl BookingService {
    pub fn new(dao: BookingDao) -> Self {
        Self { dao }
    }

    /// Mark a booking as cancelled. Cancelling twice is harmless.
    pub async fn cancel(&self, id: &str) -> Result<Booking, ServiceError> {
        let mut booking = self.get(id).await?;
        if booking.status == BookingStatus::Cancelled {
            return Ok(booking);
        }
        booking.status = BookingStatus::Cancelled;
        self.update(&booking).await?;
        info!("Cancelled booking {}", id);
        Ok(booking)
    }
}

impl RecordService<Booking> for BookingService {
    fn dao(&self) -> &Arc<dyn Dao<Booking>> {
        &self.dao
    }

    fn validate(&self, booking: &Booking) -> Result<(), ServiceError> {
        if booking.seat_count < 1 {
            return Err(ServiceError::validation("booking", "seat_count must be at least 1"));
        }
        whole_seconds("booking", "booking_date", &booking.booking_date)
    }
}
