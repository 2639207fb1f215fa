use log::info;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use shared::{Booking, Rating, Route, Trip, User};
use super::mappings::RelationalMapping;
use super::session::SessionManager;
use crate::backend::storage::error::BackendInitError;

/// DbConnection owns the shared PostgreSQL pool
#[derive(Debug, Clone)]
pub struct DbConnection {
    pool: PgPool,
}

impl DbConnection {
    /// Connect to the database and create any missing tables
    pub async fn new(url: &str, max_connections: u32) -> Result<Self, BackendInitError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await?;

        Self::setup_schema(&pool).await?;
        info!("Connected to PostgreSQL with up to {} connections", max_connections);

        Ok(Self { pool })
    }

    /// Build the pool without opening a connection
    pub fn connect_lazy(url: &str) -> Result<Self, BackendInitError> {
        let pool = PgPoolOptions::new().connect_lazy(url)?;
        Ok(Self { pool })
    }

    /// Create tables in foreign-key order
    async fn setup_schema(pool: &PgPool) -> Result<(), BackendInitError> {
        let statements = [
            User::CREATE_TABLE,
            Route::CREATE_TABLE,
            Trip::CREATE_TABLE,
            Booking::CREATE_TABLE,
            Rating::CREATE_TABLE,
        ];
        for statement in statements {
            sqlx::query(statement).execute(pool).await?;
        }
        Ok(())
    }

    pub fn sessions(&self) -> SessionManager {
        SessionManager::new(self.pool.clone())
    }
}
