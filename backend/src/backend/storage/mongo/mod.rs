//! # Document Storage
//!
//! MongoDB backend: one collection per entity, one document per record.
//! The store assigns `_id` as a BSON `ObjectId`; at the DAO boundary it is
//! exchanged as its 24-character hex string. Every operation is a single
//! document operation, so atomicity is per document.

pub mod mappings;

use std::marker::PhantomData;
use async_trait::async_trait;
use chrono::{DateTime as ChronoDateTime, NaiveDate, NaiveDateTime};
use log::{debug, info};
use mongodb::bson::{doc, oid::ObjectId, Bson, DateTime, Document};
use mongodb::{Client, Collection, Database};
use shared::Record;
use super::error::{BackendInitError, DataAccessError};
use super::file::DATE_FORMAT;
use super::runner::DirectRunner;
use super::traits::Dao;

/// Document mapping for one record type. `to_document` never writes `id`.
pub trait DocumentMapping: Record {
    const COLLECTION: &'static str;

    fn to_document(&self) -> Document;

    /// Rebuild a record from the store identifier and the remaining fields
    fn from_document(id: String, document: &Document) -> Result<Self, DataAccessError>;
}

/// Handle on the database holding the entity collections
#[derive(Debug, Clone)]
pub struct MongoConnection {
    database: Database,
}

impl MongoConnection {
    /// Connect and ping the database so an unreachable server fails at startup
    pub async fn connect(uri: &str, database: &str) -> Result<Self, BackendInitError> {
        let connection = Self::connect_lazy(uri, database).await?;
        connection
            .database
            .run_command(doc! { "ping": 1 }, None)
            .await?;
        info!("Connected to MongoDB database '{}'", database);
        Ok(connection)
    }

    /// Build the client without contacting the server
    pub async fn connect_lazy(uri: &str, database: &str) -> Result<Self, BackendInitError> {
        let client = Client::with_uri_str(uri).await?;
        Ok(Self { database: client.database(database) })
    }

    pub fn collection(&self, name: &str) -> Collection<Document> {
        self.database.collection::<Document>(name)
    }
}

/// Identifier field in stored documents
pub const ID_FIELD: &str = "_id";

/// Store a foreign identifier as an `ObjectId` when it is one
pub fn reference(id: &str) -> Bson {
    match ObjectId::parse_str(id) {
        Ok(oid) => Bson::ObjectId(oid),
        Err(_) => Bson::String(id.to_string()),
    }
}

pub fn date_value(date: &NaiveDate) -> Bson {
    Bson::String(date.format(DATE_FORMAT).to_string())
}

pub fn date_time_value(date_time: &NaiveDateTime) -> Bson {
    Bson::DateTime(DateTime::from_millis(date_time.and_utc().timestamp_millis()))
}

/// Typed field access over a stored document
pub struct DocumentReader<'a> {
    entity: &'static str,
    document: &'a Document,
}

impl<'a> DocumentReader<'a> {
    pub fn new(entity: &'static str, document: &'a Document) -> Self {
        Self { entity, document }
    }

    fn field_error(&self, key: &str, message: impl std::fmt::Display) -> DataAccessError {
        DataAccessError::serialization(self.entity, format!("field '{}': {}", key, message))
    }

    pub fn text(&self, key: &str) -> Result<String, DataAccessError> {
        self.document
            .get_str(key)
            .map(str::to_string)
            .map_err(|e| self.field_error(key, e))
    }

    pub fn int(&self, key: &str) -> Result<i32, DataAccessError> {
        match self.document.get(key) {
            Some(Bson::Int32(value)) => Ok(*value),
            Some(Bson::Int64(value)) => {
                i32::try_from(*value).map_err(|e| self.field_error(key, e))
            }
            Some(other) => Err(self.field_error(key, format!("expected integer, found {:?}", other.element_type()))),
            None => Err(self.field_error(key, "missing")),
        }
    }

    pub fn boolean(&self, key: &str) -> Result<bool, DataAccessError> {
        self.document.get_bool(key).map_err(|e| self.field_error(key, e))
    }

    pub fn parsed<T>(&self, key: &str) -> Result<T, DataAccessError>
    where
        T: std::str::FromStr,
        T::Err: std::fmt::Display,
    {
        let raw = self.text(key)?;
        raw.parse::<T>().map_err(|e| self.field_error(key, e))
    }

    pub fn date(&self, key: &str) -> Result<NaiveDate, DataAccessError> {
        let raw = self.text(key)?;
        NaiveDate::parse_from_str(&raw, DATE_FORMAT).map_err(|e| self.field_error(key, e))
    }

    pub fn date_time(&self, key: &str) -> Result<NaiveDateTime, DataAccessError> {
        let millis = self
            .document
            .get_datetime(key)
            .map_err(|e| self.field_error(key, e))?
            .timestamp_millis();
        ChronoDateTime::from_timestamp_millis(millis)
            .map(|dt| dt.naive_utc())
            .ok_or_else(|| self.field_error(key, "timestamp out of range"))
    }

    /// Foreign identifier stored either as an `ObjectId` or a plain string
    pub fn reference(&self, key: &str) -> Result<String, DataAccessError> {
        match self.document.get(key) {
            Some(Bson::ObjectId(oid)) => Ok(oid.to_hex()),
            Some(Bson::String(value)) => Ok(value.clone()),
            Some(Bson::Null) | None => Ok(String::new()),
            Some(other) => Err(self.field_error(key, format!("expected reference, found {:?}", other.element_type()))),
        }
    }
}

/// Per-entity MongoDB collection store
pub struct MongoStore<R> {
    collection: Collection<Document>,
    runner: DirectRunner,
    _marker: PhantomData<fn() -> R>,
}

impl<R: DocumentMapping> MongoStore<R> {
    pub fn new(connection: &MongoConnection) -> Self {
        Self {
            collection: connection.collection(R::COLLECTION),
            runner: DirectRunner::new(),
            _marker: PhantomData,
        }
    }

    /// Convert the application identifier into the native one
    pub fn parse_id(id: &str) -> Result<ObjectId, DataAccessError> {
        ObjectId::parse_str(id).map_err(|_| DataAccessError::malformed_id(R::ENTITY, id))
    }

    fn read_document(document: &Document) -> Result<R, DataAccessError> {
        let id = document
            .get_object_id(ID_FIELD)
            .map_err(|e| DataAccessError::serialization(R::ENTITY, format!("field '{}': {}", ID_FIELD, e)))?;
        R::from_document(id.to_hex(), document)
    }
}

#[async_trait]
impl<R: DocumentMapping> Dao<R> for MongoStore<R> {
    async fn create(&self, record: &R) -> Result<String, DataAccessError> {
        self.runner
            .run(|| async move {
                let result = self.collection.insert_one(record.to_document(), None).await?;
                let id = result
                    .inserted_id
                    .as_object_id()
                    .map(|oid| oid.to_hex())
                    .ok_or_else(|| {
                        DataAccessError::Unexpected(format!(
                            "store returned non-ObjectId identifier {}",
                            result.inserted_id
                        ))
                    })?;
                info!("Created {} {}", R::ENTITY, id);
                Ok(id)
            })
            .await
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<R>, DataAccessError> {
        let oid = Self::parse_id(id)?;
        self.runner
            .run(|| async move {
                let found = self.collection.find_one(doc! { "_id": oid }, None).await?;
                found.as_ref().map(Self::read_document).transpose()
            })
            .await
    }

    async fn update(&self, record: &R) -> Result<(), DataAccessError> {
        let oid = Self::parse_id(record.id())?;
        self.runner
            .run(|| async move {
                let result = self
                    .collection
                    .update_one(doc! { "_id": oid }, doc! { "$set": record.to_document() }, None)
                    .await?;
                if result.matched_count == 0 {
                    return Err(DataAccessError::not_found(R::ENTITY, record.id()));
                }
                info!("Updated {} {}", R::ENTITY, record.id());
                Ok(())
            })
            .await
    }

    async fn delete(&self, id: &str) -> Result<(), DataAccessError> {
        let oid = Self::parse_id(id)?;
        self.runner
            .run(|| async move {
                let result = self.collection.delete_one(doc! { "_id": oid }, None).await?;
                if result.deleted_count == 0 {
                    debug!("Delete of absent {} {} is a no-op", R::ENTITY, id);
                } else {
                    info!("Deleted {} {}", R::ENTITY, id);
                }
                Ok(())
            })
            .await
    }
}
