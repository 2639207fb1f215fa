//! Table mappings for each record type.
//!
//! Identifiers are `UUID` columns generated by the database. Foreign keys are
//! nullable so an empty reference is stored as `NULL`.

use sqlx::postgres::{PgArguments, PgRow};
use sqlx::query::Query;
use sqlx::{Postgres, Row};
use uuid::Uuid;
use shared::{Booking, Rating, Record, Route, Trip, User};
use crate::backend::storage::error::DataAccessError;

pub type PgQuery<'q> = Query<'q, Postgres, PgArguments>;

/// Relational mapping for one record type
pub trait RelationalMapping: Record {
    const TABLE: &'static str;
    /// Non-id columns, in the order `bind_columns` binds them
    const COLUMNS: &'static [&'static str];
    const CREATE_TABLE: &'static str;

    fn bind_columns<'q>(&'q self, query: PgQuery<'q>) -> Result<PgQuery<'q>, DataAccessError>;

    fn from_row(row: &PgRow) -> Result<Self, sqlx::Error>;
}

/// Parse a record identifier into the column type
pub fn parse_uuid(entity: &'static str, id: &str) -> Result<Uuid, DataAccessError> {
    Uuid::parse_str(id).map_err(|_| DataAccessError::malformed_id(entity, id))
}

/// Foreign key value; empty means no reference
pub fn foreign_key(entity: &'static str, id: &str) -> Result<Option<Uuid>, DataAccessError> {
    if id.is_empty() {
        Ok(None)
    } else {
        parse_uuid(entity, id).map(Some)
    }
}

fn uuid_column(row: &PgRow, column: &str) -> Result<String, sqlx::Error> {
    let value: Option<Uuid> = row.try_get(column)?;
    Ok(value.map(|id| id.to_string()).unwrap_or_default())
}

fn status_column<T>(row: &PgRow, column: &str) -> Result<T, sqlx::Error>
where
    T: std::str::FromStr<Err = shared::UnknownStatus>,
{
    let raw: String = row.try_get(column)?;
    raw.parse::<T>().map_err(|e| sqlx::Error::Decode(Box::new(e)))
}

impl RelationalMapping for User {
    const TABLE: &'static str = "users";
    const COLUMNS: &'static [&'static str] = &[
        "name", "email", "password", "gender", "phone", "birth_date", "address", "preferences",
    ];
    const CREATE_TABLE: &'static str = r#"
        CREATE TABLE IF NOT EXISTS users (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            name TEXT NOT NULL,
            email TEXT NOT NULL UNIQUE,
            password TEXT NOT NULL,
            gender TEXT NOT NULL,
            phone TEXT NOT NULL,
            birth_date DATE NOT NULL,
            address TEXT NOT NULL,
            preferences TEXT NOT NULL DEFAULT ''
        );
    "#;

    fn bind_columns<'q>(&'q self, query: PgQuery<'q>) -> Result<PgQuery<'q>, DataAccessError> {
        Ok(query
            .bind(&self.name)
            .bind(&self.email)
            .bind(&self.password)
            .bind(&self.gender)
            .bind(&self.phone)
            .bind(self.birth_date)
            .bind(&self.address)
            .bind(&self.preferences))
    }

    fn from_row(row: &PgRow) -> Result<Self, sqlx::Error> {
        Ok(User {
            id: uuid_column(row, "id")?,
            name: row.try_get("name")?,
            email: row.try_get("email")?,
            password: row.try_get("password")?,
            gender: row.try_get("gender")?,
            phone: row.try_get("phone")?,
            birth_date: row.try_get("birth_date")?,
            address: row.try_get("address")?,
            preferences: row.try_get("preferences")?,
        })
    }
}

impl RelationalMapping for Route {
    const TABLE: &'static str = "routes";
    const COLUMNS: &'static [&'static str] = &["start_point", "end_point", "date", "estimated_duration"];
    const CREATE_TABLE: &'static str = r#"
        CREATE TABLE IF NOT EXISTS routes (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            start_point TEXT NOT NULL,
            end_point TEXT NOT NULL,
            date DATE NOT NULL,
            estimated_duration INTEGER NOT NULL
        );
    "#;

    fn bind_columns<'q>(&'q self, query: PgQuery<'q>) -> Result<PgQuery<'q>, DataAccessError> {
        Ok(query
            .bind(&self.start_point)
            .bind(&self.end_point)
            .bind(self.date)
            .bind(self.estimated_duration))
    }

    fn from_row(row: &PgRow) -> Result<Self, sqlx::Error> {
        Ok(Route {
            id: uuid_column(row, "id")?,
            start_point: row.try_get("start_point")?,
            end_point: row.try_get("end_point")?,
            date: row.try_get("date")?,
            estimated_duration: row.try_get("estimated_duration")?,
        })
    }
}

impl RelationalMapping for Trip {
    const TABLE: &'static str = "trips";
    const COLUMNS: &'static [&'static str] = &[
        "departure_time", "max_passengers", "creation_date", "status", "editable", "user_id", "route_id",
    ];
    const CREATE_TABLE: &'static str = r#"
        CREATE TABLE IF NOT EXISTS trips (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            departure_time TIMESTAMP NOT NULL,
            max_passengers INTEGER NOT NULL,
            creation_date DATE NOT NULL,
            status TEXT NOT NULL,
            editable BOOLEAN NOT NULL DEFAULT TRUE,
            user_id UUID REFERENCES users(id) ON DELETE CASCADE,
            route_id UUID REFERENCES routes(id) ON DELETE CASCADE
        );
    "#;

    fn bind_columns<'q>(&'q self, query: PgQuery<'q>) -> Result<PgQuery<'q>, DataAccessError> {
        Ok(query
            .bind(self.departure_time)
            .bind(self.max_passengers)
            .bind(self.creation_date)
            .bind(self.status.as_str())
            .bind(self.editable)
            .bind(foreign_key(Self::ENTITY, &self.user_id)?)
            .bind(foreign_key(Self::ENTITY, &self.route_id)?))
    }

    fn from_row(row: &PgRow) -> Result<Self, sqlx::Error> {
        Ok(Trip {
            id: uuid_column(row, "id")?,
            departure_time: row.try_get("departure_time")?,
            max_passengers: row.try_get("max_passengers")?,
            creation_date: row.try_get("creation_date")?,
            status: status_column(row, "status")?,
            editable: row.try_get("editable")?,
            user_id: uuid_column(row, "user_id")?,
            route_id: uuid_column(row, "route_id")?,
        })
    }
}

impl RelationalMapping for Booking {
    const TABLE: &'static str = "bookings";
    const COLUMNS: &'static [&'static str] = &[
        "seat_count", "status", "booking_date", "passport_number", "passport_expiry_date", "trip_id", "user_id",
    ];
    const CREATE_TABLE: &'static str = r#"
        CREATE TABLE IF NOT EXISTS bookings (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            seat_count INTEGER NOT NULL,
            status TEXT NOT NULL,
            booking_date TIMESTAMP NOT NULL,
            passport_number TEXT NOT NULL,
            passport_expiry_date DATE NOT NULL,
            trip_id UUID REFERENCES trips(id) ON DELETE CASCADE,
            user_id UUID REFERENCES users(id) ON DELETE CASCADE
        );
    "#;

    fn bind_columns<'q>(&'q self, query: PgQuery<'q>) -> Result<PgQuery<'q>, DataAccessError> {
        Ok(query
            .bind(self.seat_count)
            .bind(self.status.as_str())
            .bind(self.booking_date)
            .bind(&self.passport_number)
            .bind(self.passport_expiry_date)
            .bind(foreign_key(Self::ENTITY, &self.trip_id)?)
            .bind(foreign_key(Self::ENTITY, &self.user_id)?))
    }

    fn from_row(row: &PgRow) -> Result<Self, sqlx::Error> {
        Ok(Booking {
            id: uuid_column(row, "id")?,
            seat_count: row.try_get("seat_count")?,
            status: status_column(row, "status")?,
            booking_date: row.try_get("booking_date")?,
            passport_number: row.try_get("passport_number")?,
            passport_expiry_date: row.try_get("passport_expiry_date")?,
            trip_id: uuid_column(row, "trip_id")?,
            user_id: uuid_column(row, "user_id")?,
        })
    }
}

impl RelationalMapping for Rating {
    const TABLE: &'static str = "ratings";
    const COLUMNS: &'static [&'static str] = &["rating", "comment", "date", "trip_id"];
    const CREATE_TABLE: &'static str = r#"
        CREATE TABLE IF NOT EXISTS ratings (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            rating INTEGER NOT NULL,
            comment TEXT NOT NULL DEFAULT '',
            date DATE NOT NULL,
            trip_id UUID REFERENCES trips(id) ON DELETE CASCADE
        );
    "#;

    fn bind_columns<'q>(&'q self, query: PgQuery<'q>) -> Result<PgQuery<'q>, DataAccessError> {
        Ok(query
            .bind(self.rating)
            .bind(&self.comment)
            .bind(self.date)
            .bind(foreign_key(Self::ENTITY, &self.trip_id)?))
    }

    fn from_row(row: &PgRow) -> Result<Self, sqlx::Error> {
        Ok(Rating {
            id: uuid_column(row, "id")?,
            rating: row.try_get("rating")?,
            comment: row.try_get("comment")?,
            date: row.try_get("date")?,
            trip_id: uuid_column(row, "trip_id")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::storage::test_utils::{sample_booking, sample_trip};

    fn column_count(statement: &str) -> usize {
        statement
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with("CREATE") && !line.starts_with(')'))
            .count()
    }

    #[test]
    fn test_create_table_matches_columns() {
        assert_eq!(column_count(User::CREATE_TABLE), User::COLUMNS.len() + 1);
        assert_eq!(column_count(Route::CREATE_TABLE), Route::COLUMNS.len() + 1);
        assert_eq!(column_count(Trip::CREATE_TABLE), Trip::COLUMNS.len() + 1);
        assert_eq!(column_count(Booking::CREATE_TABLE), Booking::COLUMNS.len() + 1);
        assert_eq!(column_count(Rating::CREATE_TABLE), Rating::COLUMNS.len() + 1);

        for column in Trip::COLUMNS {
            assert!(Trip::CREATE_TABLE.contains(column), "missing {}", column);
        }
    }

    #[test]
    fn test_foreign_key_handling() {
        let id = Uuid::new_v4();
        assert_eq!(foreign_key("trip", "").unwrap(), None);
        assert_eq!(foreign_key("trip", &id.to_string()).unwrap(), Some(id));
        assert!(matches!(
            foreign_key("trip", "user-1"),
            Err(DataAccessError::MalformedId { entity: "trip", .. })
        ));
    }

    #[test]
    fn test_binding_rejects_malformed_foreign_keys() {
        let booking = sample_booking(&Uuid::new_v4().to_string(), "passenger-1");
        let result = booking.bind_columns(sqlx::query("SELECT 1"));
        assert!(matches!(result, Err(DataAccessError::MalformedId { entity: "booking", .. })));

        let trip = sample_trip("", "");
        assert!(trip.bind_columns(sqlx::query("SELECT 1")).is_ok());
    }
}
