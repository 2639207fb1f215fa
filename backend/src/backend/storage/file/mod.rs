//! # File Storage
//!
//! Flat-file backends keep one whole entity collection per file and have no
//! incremental writes: every mutation reads the full collection, changes it
//! in memory and writes the full collection back.
//!
//! ## Components
//!
//! - **connection.rs** - storage root and per-collection file paths
//! - **mappings.rs** - `FlatRecord` field descriptors for each entity
//! - **csv_format.rs** - header row plus one row per record
//! - **xml_format.rs** - `<trips><trip>...</trip></trips>` documents
//!
//! ## Limitations
//!
//! There is no locking. Two processes writing the same file race and the
//! last writer wins. Writes go to a sibling `.tmp` file that is renamed over
//! the target, so readers observe either the previous or the new collection,
//! but nothing is fsync'd and a crash mid-write may lose the update.

pub mod connection;
pub mod csv_format;
pub mod mappings;
pub mod xml_format;

use std::collections::HashMap;
use std::fmt::Display;
use std::fs;
use std::io::ErrorKind;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use log::{debug, info};
use uuid::Uuid;
use shared::Record;
use super::error::DataAccessError;
use super::runner::DirectRunner;
use super::traits::Dao;

pub use connection::FileConnection;
pub use csv_format::CsvFormat;
pub use xml_format::XmlFormat;

pub const DATE_FORMAT: &str = "%Y-%m-%d";
pub const DATE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub fn format_date(date: &NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

pub fn format_date_time(date_time: &NaiveDateTime) -> String {
    date_time.format(DATE_TIME_FORMAT).to_string()
}

/// Field descriptor shared by the XML and CSV backends
///
/// `FIELDS` lists field names in wire order and `to_fields` must return the
/// values in that same order.
pub trait FlatRecord: Record {
    /// File and XML root element name ("trips")
    const COLLECTION: &'static str;
    /// XML element name of a single record ("trip")
    const ELEMENT: &'static str;
    const FIELDS: &'static [&'static str];

    fn to_fields(&self) -> Vec<String>;

    fn from_fields(fields: &FieldMap) -> Result<Self, DataAccessError>;
}

/// Named string values of one decoded record
#[derive(Debug, Clone)]
pub struct FieldMap {
    entity: &'static str,
    values: HashMap<String, String>,
}

impl FieldMap {
    pub fn new(entity: &'static str) -> Self {
        Self { entity, values: HashMap::new() }
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.values.insert(name.into(), value.into());
    }

    pub fn text(&self, name: &str) -> Result<String, DataAccessError> {
        self.values
            .get(name)
            .cloned()
            .ok_or_else(|| DataAccessError::serialization(self.entity, format!("missing field '{}'", name)))
    }

    pub fn parse<T>(&self, name: &str) -> Result<T, DataAccessError>
    where
        T: FromStr,
        T::Err: Display,
    {
        let raw = self.text(name)?;
        raw.trim().parse::<T>().map_err(|e| {
            DataAccessError::serialization(self.entity, format!("field '{}' value '{}': {}", name, raw, e))
        })
    }

    pub fn date(&self, name: &str) -> Result<NaiveDate, DataAccessError> {
        let raw = self.text(name)?;
        NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT).map_err(|e| {
            DataAccessError::serialization(self.entity, format!("field '{}' value '{}': {}", name, raw, e))
        })
    }

    pub fn date_time(&self, name: &str) -> Result<NaiveDateTime, DataAccessError> {
        let raw = self.text(name)?;
        NaiveDateTime::parse_from_str(raw.trim(), DATE_TIME_FORMAT).map_err(|e| {
            DataAccessError::serialization(self.entity, format!("field '{}' value '{}': {}", name, raw, e))
        })
    }
}

/// Whole-collection serializer for one file format
pub trait FileFormat: Send + Sync + 'static {
    const EXTENSION: &'static str;

    fn decode<R: FlatRecord>(content: &str) -> Result<Vec<R>, DataAccessError>;

    fn encode<R: FlatRecord>(records: &[R]) -> Result<String, DataAccessError>;
}

/// Read-modify-write-whole-file store for one entity collection
pub struct FileStore<R, F> {
    path: PathBuf,
    runner: DirectRunner,
    _marker: PhantomData<fn() -> (R, F)>,
}

impl<R, F> Clone for FileStore<R, F> {
    fn clone(&self) -> Self {
        Self {
            path: self.path.clone(),
            runner: self.runner,
            _marker: PhantomData,
        }
    }
}

impl<R: FlatRecord, F: FileFormat> FileStore<R, F> {
    pub fn new(connection: &FileConnection) -> Self {
        Self {
            path: connection.collection_path(R::COLLECTION, F::EXTENSION),
            runner: DirectRunner::new(),
            _marker: PhantomData,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read every record in file order. A missing or blank file is empty.
    pub fn read_all(&self) -> Result<Vec<R>, DataAccessError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(DataAccessError::io(&self.path, e)),
        };

        if content.trim().is_empty() {
            return Ok(Vec::new());
        }

        let records = F::decode::<R>(&content)?;
        debug!("Read {} {} records from {}", records.len(), R::ENTITY, self.path.display());
        Ok(records)
    }

    /// Replace the file with the given collection
    fn write_all(&self, records: &[R]) -> Result<(), DataAccessError> {
        let content = F::encode(records)?;

        let temp_path = self.path.with_extension(format!("{}.tmp", F::EXTENSION));
        fs::write(&temp_path, content).map_err(|e| DataAccessError::io(&temp_path, e))?;
        fs::rename(&temp_path, &self.path).map_err(|e| DataAccessError::io(&self.path, e))?;

        debug!("Wrote {} {} records to {}", records.len(), R::ENTITY, self.path.display());
        Ok(())
    }
}

#[async_trait]
impl<R: FlatRecord, F: FileFormat> Dao<R> for FileStore<R, F> {
    async fn create(&self, record: &R) -> Result<String, DataAccessError> {
        self.runner
            .run(|| async move {
                let mut records = self.read_all()?;

                let id = Uuid::new_v4().to_string();
                let mut record = record.clone();
                record.set_id(id.clone());
                records.push(record);

                self.write_all(&records)?;
                info!("Created {} {}", R::ENTITY, id);
                Ok(id)
            })
            .await
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<R>, DataAccessError> {
        self.runner
            .run(|| async move {
                let records = self.read_all()?;
                Ok(records.into_iter().find(|r| r.id() == id))
            })
            .await
    }

    async fn update(&self, record: &R) -> Result<(), DataAccessError> {
        self.runner
            .run(|| async move {
                let mut records = self.read_all()?;

                let slot = records
                    .iter_mut()
                    .find(|r| r.id() == record.id())
                    .ok_or_else(|| DataAccessError::not_found(R::ENTITY, record.id()))?;
                *slot = record.clone();

                self.write_all(&records)?;
                info!("Updated {} {}", R::ENTITY, record.id());
                Ok(())
            })
            .await
    }

    async fn delete(&self, id: &str) -> Result<(), DataAccessError> {
        self.runner
            .run(|| async move {
                let mut records = self.read_all()?;

                match records.iter().position(|r| r.id() == id) {
                    Some(index) => {
                        records.remove(index);
                        self.write_all(&records)?;
                        info!("Deleted {} {}", R::ENTITY, id);
                    }
                    None => debug!("Delete of absent {} {} is a no-op", R::ENTITY, id),
                }
                Ok(())
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::storage::test_utils::{
        sample_booking, sample_rating, sample_route, sample_trip, sample_user, TestEnvironment,
    };
    use shared::{Booking, BookingStatus, Rating, Route, Trip, TripStatus, User};

    fn stores<F: FileFormat>(env: &TestEnvironment) -> (FileStore<Trip, F>, FileStore<Booking, F>) {
        (FileStore::new(&env.connection), FileStore::new(&env.connection))
    }

    async fn round_trip<R, F>(env: &TestEnvironment, record: R)
    where
        R: FlatRecord + PartialEq,
        F: FileFormat,
    {
        let store: FileStore<R, F> = FileStore::new(&env.connection);

        let id = store.create(&record).await.unwrap();
        assert!(Uuid::parse_str(&id).is_ok());

        let loaded = store.get_by_id(&id).await.unwrap().expect("record should exist");
        let mut expected = record;
        expected.set_id(id);
        assert_eq!(loaded, expected);
    }

    /// Every entity with the awkward values a flat file has to carry
    async fn round_trip_all_entities<F: FileFormat>() {
        let env = TestEnvironment::new().unwrap();

        let mut user = sample_user("alice@example.com");
        user.preferences = String::new();
        user.address = "12, rue \"des Lilas\"\nBâtiment B".to_string();
        round_trip::<User, F>(&env, user).await;

        round_trip::<Route, F>(&env, sample_route()).await;

        let mut trip = sample_trip("driver-1", "route-1");
        trip.editable = false;
        trip.status = TripStatus::Cancelled;
        round_trip::<Trip, F>(&env, trip).await;

        let mut booking = sample_booking("trip-1", "passenger-1");
        booking.status = BookingStatus::Cancelled;
        round_trip::<Booking, F>(&env, booking).await;

        let mut rating = sample_rating("trip-1");
        rating.comment = "Late, but \"fine\",\nwould ride again".to_string();
        round_trip::<Rating, F>(&env, rating).await;

        let mut silent = sample_rating("trip-2");
        silent.comment = String::new();
        round_trip::<Rating, F>(&env, silent).await;
    }

    #[tokio::test]
    async fn test_round_trip_csv() {
        round_trip_all_entities::<CsvFormat>().await;
    }

    #[tokio::test]
    async fn test_round_trip_xml() {
        round_trip_all_entities::<XmlFormat>().await;
    }

    async fn surrounding_whitespace_is_kept<F: FileFormat>() {
        let env = TestEnvironment::new().unwrap();

        let mut padded = sample_rating("trip-1");
        padded.comment = "  padded comment \n".to_string();
        round_trip::<Rating, F>(&env, padded).await;

        let mut blank = sample_rating("trip-1");
        blank.comment = "   ".to_string();
        round_trip::<Rating, F>(&env, blank).await;

        let mut user = sample_user("  spaced@example.com ");
        user.name = "\tAlice ".to_string();
        round_trip::<User, F>(&env, user).await;
    }

    #[tokio::test]
    async fn test_surrounding_whitespace_is_kept_csv() {
        surrounding_whitespace_is_kept::<CsvFormat>().await;
    }

    #[tokio::test]
    async fn test_surrounding_whitespace_is_kept_xml() {
        surrounding_whitespace_is_kept::<XmlFormat>().await;
    }

    async fn trip_and_booking_scenario<F: FileFormat>() {
        let env = TestEnvironment::new().unwrap();
        let (trips, bookings) = stores::<F>(&env);

        let mut trip = sample_trip("driver-1", "route-1");
        trip.status = TripStatus::Planned;
        trip.max_passengers = 4;
        let trip_id = trips.create(&trip).await.unwrap();

        let mut booking = sample_booking(&trip_id, "passenger-1");
        booking.seat_count = 2;
        booking.status = BookingStatus::Confirmed;
        let booking_id = bookings.create(&booking).await.unwrap();

        let mut loaded = bookings.get_by_id(&booking_id).await.unwrap().unwrap();
        assert_eq!(loaded.seat_count, 2);
        assert_eq!(loaded.status, BookingStatus::Confirmed);
        assert_eq!(loaded.trip_id, trip_id);

        loaded.status = BookingStatus::Cancelled;
        bookings.update(&loaded).await.unwrap();

        let reloaded = bookings.get_by_id(&booking_id).await.unwrap().unwrap();
        assert_eq!(reloaded.status, BookingStatus::Cancelled);
        assert_eq!(reloaded.seat_count, 2);
    }

    #[tokio::test]
    async fn test_trip_and_booking_scenario_csv() {
        trip_and_booking_scenario::<CsvFormat>().await;
    }

    #[tokio::test]
    async fn test_trip_and_booking_scenario_xml() {
        trip_and_booking_scenario::<XmlFormat>().await;
    }

    async fn delete_semantics<F: FileFormat>() {
        let env = TestEnvironment::new().unwrap();
        let (trips, _) = stores::<F>(&env);

        let id = trips.create(&sample_trip("driver-1", "route-1")).await.unwrap();
        trips.delete(&id).await.unwrap();
        assert!(trips.get_by_id(&id).await.unwrap().is_none());

        // Second delete of the same id and a delete of an unknown id are no-ops
        trips.delete(&id).await.unwrap();
        trips.delete(&Uuid::new_v4().to_string()).await.unwrap();
        assert!(trips.read_all().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_is_idempotent_csv() {
        delete_semantics::<CsvFormat>().await;
    }

    #[tokio::test]
    async fn test_delete_is_idempotent_xml() {
        delete_semantics::<XmlFormat>().await;
    }

    async fn update_missing_fails<F: FileFormat>() {
        let env = TestEnvironment::new().unwrap();
        let (trips, _) = stores::<F>(&env);
        trips.create(&sample_trip("driver-1", "route-1")).await.unwrap();

        let mut ghost = sample_trip("driver-1", "route-1");
        ghost.id = Uuid::new_v4().to_string();
        let result = trips.update(&ghost).await;
        assert!(matches!(result, Err(DataAccessError::NotFound { entity: "trip", .. })));
        assert_eq!(trips.read_all().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_update_missing_fails_csv() {
        update_missing_fails::<CsvFormat>().await;
    }

    #[tokio::test]
    async fn test_update_missing_fails_xml() {
        update_missing_fails::<XmlFormat>().await;
    }

    async fn sequential_creates<F: FileFormat>() {
        let env = TestEnvironment::new().unwrap();
        let (trips, _) = stores::<F>(&env);

        let mut ids = Vec::new();
        for i in 0..7 {
            let mut trip = sample_trip("driver-1", "route-1");
            trip.max_passengers = i + 1;
            ids.push(trips.create(&trip).await.unwrap());
        }

        let all = trips.read_all().unwrap();
        assert_eq!(all.len(), 7);
        for (i, id) in ids.iter().enumerate() {
            let trip = trips.get_by_id(id).await.unwrap().unwrap();
            assert_eq!(trip.max_passengers, i as i32 + 1);
            assert_eq!(&all[i].id, id);
        }
    }

    #[tokio::test]
    async fn test_sequential_creates_are_all_retrievable_csv() {
        sequential_creates::<CsvFormat>().await;
    }

    #[tokio::test]
    async fn test_sequential_creates_are_all_retrievable_xml() {
        sequential_creates::<XmlFormat>().await;
    }

    #[tokio::test]
    async fn test_missing_and_blank_files_read_as_empty() {
        let env = TestEnvironment::new().unwrap();
        let (trips, _) = stores::<CsvFormat>(&env);
        assert!(!trips.path().exists());
        assert!(trips.read_all().unwrap().is_empty());

        fs::write(trips.path(), "  \n").unwrap();
        assert!(trips.read_all().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_malformed_id_reads_as_absent() {
        let env = TestEnvironment::new().unwrap();
        let (_, bookings) = stores::<XmlFormat>(&env);
        bookings.create(&sample_booking("trip-1", "user-1")).await.unwrap();
        assert!(bookings.get_by_id("not-a-valid-id").await.unwrap().is_none());
        bookings.delete("not-a-valid-id").await.unwrap();
    }

    #[tokio::test]
    async fn test_create_ignores_incoming_id() {
        let env = TestEnvironment::new().unwrap();
        let (trips, _) = stores::<CsvFormat>(&env);
        let mut trip = sample_trip("driver-1", "route-1");
        trip.id = "chosen-by-caller".to_string();
        let id = trips.create(&trip).await.unwrap();
        assert_ne!(id, "chosen-by-caller");
        assert!(trips.get_by_id("chosen-by-caller").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_corrupt_file_surfaces_serialization_error() {
        let env = TestEnvironment::new().unwrap();
        let (trips, _) = stores::<XmlFormat>(&env);
        fs::write(trips.path(), "<trips><trip><id>1</id>").unwrap();
        let result = trips.get_by_id("1").await;
        assert!(matches!(result, Err(DataAccessError::Serialization { .. })));
    }

    #[tokio::test]
    async fn test_write_leaves_no_temp_file() {
        let env = TestEnvironment::new().unwrap();
        let (trips, _) = stores::<CsvFormat>(&env);
        trips.create(&sample_trip("driver-1", "route-1")).await.unwrap();
        let leftovers: Vec<_> = fs::read_dir(env.base_directory())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.path().to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }
}
