use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use chrono::{NaiveDate, NaiveDateTime};

/// Common surface of every persisted record.
///
/// Records are flat: relationships are carried as opaque identifier strings
/// (`trip_id`, `user_id`, ...) rather than embedded records, so the same shape
/// fits a file row, a document and a relational row.
pub trait Record: Clone + fmt::Debug + Send + Sync + 'static {
    /// Singular entity name used in logs and error messages ("trip")
    const ENTITY: &'static str;

    /// Identifier assigned by the storage backend, empty before creation
    fn id(&self) -> &str;

    /// Replace the identifier (used by backends after they assign one)
    fn set_id(&mut self, id: String);
}

macro_rules! impl_record {
    ($ty:ty, $entity:literal) => {
        impl Record for $ty {
            const ENTITY: &'static str = $entity;

            fn id(&self) -> &str {
                &self.id
            }

            fn set_id(&mut self, id: String) {
                self.id = id;
            }
        }
    };
}

/// Error returned when a status string does not name a known variant
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownStatus {
    pub kind: &'static str,
    pub value: String,
}

impl fmt::Display for UnknownStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown {} status '{}'", self.kind, self.value)
    }
}

impl std::error::Error for UnknownStatus {}

/// Lifecycle of a trip
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TripStatus {
    Planned,
    Active,
    Completed,
    Cancelled,
}

impl TripStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TripStatus::Planned => "PLANNED",
            TripStatus::Active => "ACTIVE",
            TripStatus::Completed => "COMPLETED",
            TripStatus::Cancelled => "CANCELLED",
        }
    }
}

impl FromStr for TripStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "PLANNED" => Ok(TripStatus::Planned),
            "ACTIVE" => Ok(TripStatus::Active),
            "COMPLETED" => Ok(TripStatus::Completed),
            "CANCELLED" => Ok(TripStatus::Cancelled),
            _ => Err(UnknownStatus { kind: "trip", value: s.to_string() }),
        }
    }
}

impl fmt::Display for TripStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle of a seat booking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Cancelled,
    Completed,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "PENDING",
            BookingStatus::Confirmed => "CONFIRMED",
            BookingStatus::Cancelled => "CANCELLED",
            BookingStatus::Completed => "COMPLETED",
        }
    }
}

impl FromStr for BookingStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "PENDING" => Ok(BookingStatus::Pending),
            "CONFIRMED" => Ok(BookingStatus::Confirmed),
            "CANCELLED" => Ok(BookingStatus::Cancelled),
            "COMPLETED" => Ok(BookingStatus::Completed),
            _ => Err(UnknownStatus { kind: "booking", value: s.to_string() }),
        }
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A registered user of the car-pool service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    #[serde(default)]
    pub id: String,
    pub name: String,
    /// Unique across users (enforced by the relational backend only)
    pub email: String,
    pub password: String,
    pub gender: String,
    pub phone: String,
    pub birth_date: NaiveDate,
    pub address: String,
    /// Free-text travel preferences ("no smoking, pets ok")
    #[serde(default)]
    pub preferences: String,
}

/// A trip offered by a driver
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trip {
    #[serde(default)]
    pub id: String,
    pub departure_time: NaiveDateTime,
    pub max_passengers: i32,
    pub creation_date: NaiveDate,
    pub status: TripStatus,
    /// Whether the driver may still change the trip
    pub editable: bool,
    /// Owning user (driver)
    pub user_id: String,
    pub route_id: String,
}

/// Start and end point of a trip
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    #[serde(default)]
    pub id: String,
    pub start_point: String,
    pub end_point: String,
    pub date: NaiveDate,
    /// Estimated duration in minutes
    pub estimated_duration: i32,
}

/// Seats reserved by a passenger on a trip
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Booking {
    #[serde(default)]
    pub id: String,
    pub seat_count: i32,
    pub status: BookingStatus,
    pub booking_date: NaiveDateTime,
    pub passport_number: String,
    pub passport_expiry_date: NaiveDate,
    pub trip_id: String,
    pub user_id: String,
}

/// Passenger feedback for a completed trip
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rating {
    #[serde(default)]
    pub id: String,
    pub rating: i32,
    #[serde(default)]
    pub comment: String,
    pub date: NaiveDate,
    pub trip_id: String,
}

impl_record!(User, "user");
impl_record!(Trip, "trip");
impl_record!(Route, "route");
impl_record!(Booking, "booking");
impl_record!(Rating, "rating");
