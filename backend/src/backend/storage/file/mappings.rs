//! Flat field descriptors for the XML and CSV backends.
//!
//! Field names are the wire names: CSV header cells and XML sub-element
//! names. They are listed in domain order.

use shared::{Booking, Rating, Route, Trip, User};
use super::{format_date, format_date_time, FieldMap, FlatRecord};
use crate::backend::storage::error::DataAccessError;

impl FlatRecord for User {
    const COLLECTION: &'static str = "users";
    const ELEMENT: &'static str = "user";
    const FIELDS: &'static [&'static str] = &[
        "id",
        "name",
        "email",
        "password",
        "gender",
        "phone",
        "birthDate",
        "address",
        "preferences",
    ];

    fn to_fields(&self) -> Vec<String> {
        vec![
            self.id.clone(),
            self.name.clone(),
            self.email.clone(),
            self.password.clone(),
            self.gender.clone(),
            self.phone.clone(),
            format_date(&self.birth_date),
            self.address.clone(),
            self.preferences.clone(),
        ]
    }

    fn from_fields(fields: &FieldMap) -> Result<Self, DataAccessError> {
        Ok(User {
            id: fields.text("id")?,
            name: fields.text("name")?,
            email: fields.text("email")?,
            password: fields.text("password")?,
            gender: fields.text("gender")?,
            phone: fields.text("phone")?,
            birth_date: fields.date("birthDate")?,
            address: fields.text("address")?,
            preferences: fields.text("preferences")?,
        })
    }
}

impl FlatRecord for Trip {
    const COLLECTION: &'static str = "trips";
    const ELEMENT: &'static str = "trip";
    const FIELDS: &'static [&'static str] = &[
        "id",
        "departureTime",
        "maxPassengers",
        "creationDate",
        "status",
        "editable",
        "userId",
        "routeId",
    ];

    fn to_fields(&self) -> Vec<String> {
        vec![
            self.id.clone(),
            format_date_time(&self.departure_time),
            self.max_passengers.to_string(),
            format_date(&self.creation_date),
            self.status.as_str().to_string(),
            self.editable.to_string(),
            self.user_id.clone(),
            self.route_id.clone(),
        ]
    }

    fn from_fields(fields: &FieldMap) -> Result<Self, DataAccessError> {
        Ok(Trip {
            id: fields.text("id")?,
            departure_time: fields.date_time("departureTime")?,
            max_passengers: fields.parse("maxPassengers")?,
            creation_date: fields.date("creationDate")?,
            status: fields.parse("status")?,
            editable: fields.parse("editable")?,
            user_id: fields.text("userId")?,
            route_id: fields.text("routeId")?,
        })
    }
}

impl FlatRecord for Route {
    const COLLECTION: &'static str = "routes";
    const ELEMENT: &'static str = "route";
    const FIELDS: &'static [&'static str] =
        &["id", "startPoint", "endPoint", "date", "estimatedDuration"];

    fn to_fields(&self) -> Vec<String> {
        vec![
            self.id.clone(),
            self.start_point.clone(),
            self.end_point.clone(),
            format_date(&self.date),
            self.estimated_duration.to_string(),
        ]
    }

    fn from_fields(fields: &FieldMap) -> Result<Self, DataAccessError> {
        Ok(Route {
            id: fields.text("id")?,
            start_point: fields.text("startPoint")?,
            end_point: fields.text("endPoint")?,
            date: fields.date("date")?,
            estimated_duration: fields.parse("estimatedDuration")?,
        })
    }
}

impl FlatRecord for Booking {
    const COLLECTION: &'static str = "bookings";
    const ELEMENT: &'static str = "booking";
    const FIELDS: &'static [&'static str] = &[
        "id",
        "seatCount",
        "status",
        "bookingDate",
        "passportNumber",
        "passportExpiryDate",
        "tripId",
        "userId",
    ];

    fn to_fields(&self) -> Vec<String> {
        vec![
            self.id.clone(),
            self.seat_count.to_string(),
            self.status.as_str().to_string(),
            format_date_time(&self.booking_date),
            self.passport_number.clone(),
            format_date(&self.passport_expiry_date),
            self.trip_id.clone(),
            self.user_id.clone(),
        ]
    }

    fn from_fields(fields: &FieldMap) -> Result<Self, DataAccessError> {
        Ok(Booking {
            id: fields.text("id")?,
            seat_count: fields.parse("seatCount")?,
            status: fields.parse("status")?,
            booking_date: fields.date_time("bookingDate")?,
            passport_number: fields.text("passportNumber")?,
            passport_expiry_date: fields.date("passportExpiryDate")?,
            trip_id: fields.text("tripId")?,
            user_id: fields.text("userId")?,
        })
    }
}

impl FlatRecord for Rating {
    const COLLECTION: &'static str = "ratings";
    const ELEMENT: &'static str = "rating";
    const FIELDS: &'static [&'static str] = &["id", "rating", "comment", "date", "tripId"];

    fn to_fields(&self) -> Vec<String> {
        vec![
            self.id.clone(),
            self.rating.to_string(),
            self.comment.clone(),
            format_date(&self.date),
            self.trip_id.clone(),
        ]
    }

    fn from_fields(fields: &FieldMap) -> Result<Self, DataAccessError> {
        Ok(Rating {
            id: fields.text("id")?,
            rating: fields.parse("rating")?,
            comment: fields.text("comment")?,
            date: fields.date("date")?,
            trip_id: fields.text("tripId")?,
        })
    }
}
