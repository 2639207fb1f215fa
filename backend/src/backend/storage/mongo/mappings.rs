//! Document mappings for each record type.
//!
//! Foreign identifiers go through `reference` so documents created by this
//! application link to each other with native `ObjectId`s.

use mongodb::bson::{doc, Document};
use shared::{Booking, Rating, Route, Trip, User};
use super::{date_time_value, date_value, reference, DocumentMapping, DocumentReader};
use crate::backend::storage::error::DataAccessError;

impl DocumentMapping for User {
    const COLLECTION: &'static str = "users";

    fn to_document(&self) -> Document {
        doc! {
            "name": &self.name,
            "email": &self.email,
            "password": &self.password,
            "gender": &self.gender,
            "phone": &self.phone,
            "birthDate": date_value(&self.birth_date),
            "address": &self.address,
            "preferences": &self.preferences,
        }
    }

    fn from_document(id: String, document: &Document) -> Result<Self, DataAccessError> {
        let reader = DocumentReader::new("user", document);
        Ok(User {
            id,
            name: reader.text("name")?,
            email: reader.text("email")?,
            password: reader.text("password")?,
            gender: reader.text("gender")?,
            phone: reader.text("phone")?,
            birth_date: reader.date("birthDate")?,
            address: reader.text("address")?,
            preferences: reader.text("preferences")?,
        })
    }
}

impl DocumentMapping for Trip {
    const COLLECTION: &'static str = "trips";

    fn to_document(&self) -> Document {
        doc! {
            "departureTime": date_time_value(&self.departure_time),
            "maxPassengers": self.max_passengers,
            "creationDate": date_value(&self.creation_date),
            "status": self.status.as_str(),
            "editable": self.editable,
            "userId": reference(&self.user_id),
            "routeId": reference(&self.route_id),
        }
    }

    fn from_document(id: String, document: &Document) -> Result<Self, DataAccessError> {
        let reader = DocumentReader::new("trip", document);
        Ok(Trip {
            id,
            departure_time: reader.date_time("departureTime")?,
            max_passengers: reader.int("maxPassengers")?,
            creation_date: reader.date("creationDate")?,
            status: reader.parsed("status")?,
            editable: reader.boolean("editable")?,
            user_id: reader.reference("userId")?,
            route_id: reader.reference("routeId")?,
        })
    }
}

impl DocumentMapping for Route {
    const COLLECTION: &'static str = "routes";

    fn to_document(&self) -> Document {
        doc! {
            "startPoint": &self.start_point,
            "endPoint": &self.end_point,
            "date": date_value(&self.date),
            "estimatedDuration": self.estimated_duration,
        }
    }

    fn from_document(id: String, document: &Document) -> Result<Self, DataAccessError> {
        let reader = DocumentReader::new("route", document);
        Ok(Route {
            id,
            start_point: reader.text("startPoint")?,
            end_point: reader.text("endPoint")?,
            date: reader.date("date")?,
            estimated_duration: reader.int("estimatedDuration")?,
        })
    }
}

impl DocumentMapping for Booking {
    const COLLECTION: &'static str = "bookings";

    fn to_document(&self) -> Document {
        doc! {
            "seatCount": self.seat_count,
            "status": self.status.as_str(),
            "bookingDate": date_time_value(&self.booking_date),
            "passportNumber": &self.passport_number,
            "passportExpiryDate": date_value(&self.passport_expiry_date),
            "tripId": reference(&self.trip_id),
            "userId": reference(&self.user_id),
        }
    }

    fn from_document(id: String, document: &Document) -> Result<Self, DataAccessError> {
        let reader = DocumentReader::new("booking", document);
        Ok(Booking {
            id,
            seat_count: reader.int("seatCount")?,
            status: reader.parsed("status")?,
            booking_date: reader.date_time("bookingDate")?,
            passport_number: reader.text("passportNumber")?,
            passport_expiry_date: reader.date("passportExpiryDate")?,
            trip_id: reader.reference("tripId")?,
            user_id: reader.reference("userId")?,
        })
    }
}

impl DocumentMapping for Rating {
    const COLLECTION: &'static str = "ratings";

    fn to_document(&self) -> Document {
        doc! {
            "rating": self.rating,
            "comment": &self.comment,
            "date": date_value(&self.date),
            "tripId": reference(&self.trip_id),
        }
    }

    fn from_document(id: String, document: &Document) -> Result<Self, DataAccessError> {
        let reader = DocumentReader::new("rating", document);
        Ok(Rating {
            id,
            rating: reader.int("rating")?,
            comment: reader.text("comment")?,
            date: reader.date("date")?,
            trip_id: reader.reference("tripId")?,
        })
    }
}
