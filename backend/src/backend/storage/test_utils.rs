/// Test utilities with automatic cleanup and shared record fixtures
///
/// `TestEnvironment` wraps a temporary directory so file-store data is
/// removed even if a test panics.

use std::path::{Path, PathBuf};
use anyhow::Result;
use chrono::{NaiveDate, NaiveDateTime};
use tempfile::TempDir;
use shared::{Booking, BookingStatus, Rating, Route, Trip, TripStatus, User};
use super::file::FileConnection;

/// RAII test environment that removes its directory on drop
pub struct TestEnvironment {
    /// Kept alive so the directory survives until the environment is dropped
    _temp_dir: TempDir,
    pub connection: FileConnection,
    pub base_path: PathBuf,
}

impl TestEnvironment {
    pub fn new() -> Result<Self> {
        let temp_dir = TempDir::new()?;
        let base_path = temp_dir.path().to_path_buf();
        let connection = FileConnection::new(&base_path)?;

        Ok(TestEnvironment {
            _temp_dir: temp_dir,
            connection,
            base_path,
        })
    }

    pub fn base_directory(&self) -> &Path {
        &self.base_path
    }
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn date_time(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
    date(y, m, d).and_hms_opt(h, min, 0).unwrap()
}

pub fn sample_user(email: &str) -> User {
    User {
        id: String::new(),
        name: "Alice Martin".to_string(),
        email: email.to_string(),
        password: "s3cret".to_string(),
        gender: "F".to_string(),
        phone: "+33 6 12 34 56 78".to_string(),
        birth_date: date(1990, 4, 12),
        address: "12 rue de la Paix, Lyon".to_string(),
        preferences: "no smoking".to_string(),
    }
}

pub fn sample_route() -> Route {
    Route {
        id: String::new(),
        start_point: "Lyon Part-Dieu".to_string(),
        end_point: "Paris Gare de Lyon".to_string(),
        date: date(2024, 6, 1),
        estimated_duration: 270,
    }
}

pub fn sample_trip(user_id: &str, route_id: &str) -> Trip {
    Trip {
        id: String::new(),
        departure_time: date_time(2024, 6, 1, 8, 30),
        max_passengers: 3,
        creation_date: date(2024, 5, 20),
        status: TripStatus::Planned,
        editable: true,
        user_id: user_id.to_string(),
        route_id: route_id.to_string(),
    }
}

pub fn sample_booking(trip_id: &str, user_id: &str) -> Booking {
    Booking {
        id: String::new(),
        seat_count: 2,
        status: BookingStatus::Confirmed,
        booking_date: date_time(2024, 5, 28, 19, 15),
        passport_number: "X1234567".to_string(),
        passport_expiry_date: date(2030, 1, 31),
        trip_id: trip_id.to_string(),
        user_id: user_id.to_string(),
    }
}

pub fn sample_rating(trip_id: &str) -> Rating {
    Rating {
        id: String::new(),
        rating: 4,
        comment: "Friendly driver".to_string(),
        date: date(2024, 6, 2),
        trip_id: trip_id.to_string(),
    }
}
