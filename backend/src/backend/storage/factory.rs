use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use log::info;
use shared::{Booking, Rating, Route, Trip, User};
use super::error::BackendInitError;
use super::file::{CsvFormat, FileConnection, FileFormat, FileStore, XmlFormat};
use super::mongo::{MongoConnection, MongoStore};
use super::postgres::{DbConnection, PgStore, SessionManager};
use super::traits::{BookingDao, RatingDao, RouteDao, TripDao, UserDao};
use crate::backend::config::BackendConfig;

/// Which medium the application persists to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageType {
    Xml,
    Csv,
    Mongo,
    Postgres,
}

impl StorageType {
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageType::Xml => "xml",
            StorageType::Csv => "csv",
            StorageType::Mongo => "mongo",
            StorageType::Postgres => "postgres",
        }
    }
}

impl fmt::Display for StorageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StorageType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "xml" => Ok(StorageType::Xml),
            "csv" => Ok(StorageType::Csv),
            "mongo" | "mongodb" => Ok(StorageType::Mongo),
            "postgres" | "postgresql" => Ok(StorageType::Postgres),
            other => Err(format!(
                "unknown storage type '{}' (expected xml, csv, mongo or postgres)",
                other
            )),
        }
    }
}

/// The five entity DAOs for one configured backend
#[derive(Clone)]
pub struct DaoSet {
    pub storage_type: StorageType,
    pub users: UserDao,
    pub trips: TripDao,
    pub routes: RouteDao,
    pub bookings: BookingDao,
    pub ratings: RatingDao,
}

impl DaoSet {
    /// Connect the configured backend and wire its DAOs
    pub async fn build(config: &BackendConfig) -> Result<Self, BackendInitError> {
        info!("Initializing {} storage at {}", config.storage_type(), config.location());

        let set = match config {
            BackendConfig::Xml { root } => Self::files::<XmlFormat>(StorageType::Xml, &FileConnection::new(root)?),
            BackendConfig::Csv { root } => Self::files::<CsvFormat>(StorageType::Csv, &FileConnection::new(root)?),
            BackendConfig::Mongo { uri, database } => {
                Self::documents(&MongoConnection::connect(uri, database).await?)
            }
            BackendConfig::Postgres { url, max_connections } => {
                Self::relational(DbConnection::new(url, *max_connections).await?.sessions())
            }
        };

        Ok(set)
    }

    pub fn files<F: FileFormat>(storage_type: StorageType, connection: &FileConnection) -> Self {
        Self {
            storage_type,
            users: Arc::new(FileStore::<User, F>::new(connection)),
            trips: Arc::new(FileStore::<Trip, F>::new(connection)),
            routes: Arc::new(FileStore::<Route, F>::new(connection)),
            bookings: Arc::new(FileStore::<Booking, F>::new(connection)),
            ratings: Arc::new(FileStore::<Rating, F>::new(connection)),
        }
    }

    pub fn documents(connection: &MongoConnection) -> Self {
        Self {
            storage_type: StorageType::Mongo,
            users: Arc::new(MongoStore::<User>::new(connection)),
            trips: Arc::new(MongoStore::<Trip>::new(connection)),
            routes: Arc::new(MongoStore::<Route>::new(connection)),
            bookings: Arc::new(MongoStore::<Booking>::new(connection)),
            ratings: Arc::new(MongoStore::<Rating>::new(connection)),
        }
    }

    pub fn relational(sessions: SessionManager) -> Self {
        Self {
            storage_type: StorageType::Postgres,
            users: Arc::new(PgStore::<User>::new(sessions.clone())),
            trips: Arc::new(PgStore::<Trip>::new(sessions.clone())),
            routes: Arc::new(PgStore::<Route>::new(sessions.clone())),
            bookings: Arc::new(PgStore::<Booking>::new(sessions.clone())),
            ratings: Arc::new(PgStore::<Rating>::new(sessions)),
        }
    }
}
