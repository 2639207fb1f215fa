use std::marker::PhantomData;
use async_trait::async_trait;
use log::{debug, info};
use uuid::Uuid;
use super::mappings::{parse_uuid, RelationalMapping};
use super::session::{Session, SessionManager};
use crate::backend::storage::error::DataAccessError;
use crate::backend::storage::traits::Dao;

/// Per-entity PostgreSQL table store
///
/// The `*_in` primitives take a `Session`, which only `SessionManager` can
/// provide. The `Dao` impl wraps each of them in its own session.
pub struct PgStore<R> {
    sessions: SessionManager,
    _marker: PhantomData<fn() -> R>,
}

impl<R> Clone for PgStore<R> {
    fn clone(&self) -> Self {
        Self {
            sessions: self.sessions.clone(),
            _marker: PhantomData,
        }
    }
}

fn placeholders(start: usize, count: usize) -> impl Iterator<Item = String> {
    (start..start + count).map(|index| format!("${}", index))
}

impl<R: RelationalMapping> PgStore<R> {
    pub fn new(sessions: SessionManager) -> Self {
        Self {
            sessions,
            _marker: PhantomData,
        }
    }

    pub fn insert_sql() -> String {
        let values: Vec<String> = placeholders(1, R::COLUMNS.len()).collect();
        format!(
            "INSERT INTO {} ({}) VALUES ({}) RETURNING id",
            R::TABLE,
            R::COLUMNS.join(", "),
            values.join(", ")
        )
    }

    pub fn select_sql() -> String {
        format!("SELECT id, {} FROM {} WHERE id = $1", R::COLUMNS.join(", "), R::TABLE)
    }

    pub fn update_sql() -> String {
        let assignments: Vec<String> = R::COLUMNS
            .iter()
            .zip(placeholders(2, R::COLUMNS.len()))
            .map(|(column, placeholder)| format!("{} = {}", column, placeholder))
            .collect();
        format!("UPDATE {} SET {} WHERE id = $1", R::TABLE, assignments.join(", "))
    }

    pub fn delete_sql() -> String {
        format!("DELETE FROM {} WHERE id = $1", R::TABLE)
    }

    /// Insert `record` and return the generated identifier
    pub async fn insert_in(session: &mut Session, record: &R) -> Result<String, DataAccessError> {
        let sql = Self::insert_sql();
        let query = record.bind_columns(sqlx::query(&sql))?;
        let row = query.fetch_one(session.connection()).await?;
        let id: Uuid = sqlx::Row::try_get(&row, "id")?;
        Ok(id.to_string())
    }

    pub async fn find_in(session: &mut Session, id: Uuid) -> Result<Option<R>, DataAccessError> {
        let sql = Self::select_sql();
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(session.connection())
            .await?;
        Ok(row.as_ref().map(R::from_row).transpose()?)
    }

    /// Overwrite every column of the row with `id`; fails if the row is absent
    pub async fn replace_in(session: &mut Session, id: Uuid, record: &R) -> Result<(), DataAccessError> {
        let sql = Self::update_sql();
        let query = record.bind_columns(sqlx::query(&sql).bind(id))?;
        let result = query.execute(session.connection()).await?;
        if result.rows_affected() == 0 {
            return Err(DataAccessError::not_found(R::ENTITY, id.to_string()));
        }
        Ok(())
    }

    /// Returns whether a row was removed
    pub async fn remove_in(session: &mut Session, id: Uuid) -> Result<bool, DataAccessError> {
        let sql = Self::delete_sql();
        let result = sqlx::query(&sql).bind(id).execute(session.connection()).await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl<R: RelationalMapping> Dao<R> for PgStore<R> {
    async fn create(&self, record: &R) -> Result<String, DataAccessError> {
        let record = record.clone();
        let id = self
            .sessions
            .run_in_transaction(move |session| Box::pin(async move { Self::insert_in(session, &record).await }))
            .await?;
        info!("Created {} {}", R::ENTITY, id);
        Ok(id)
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<R>, DataAccessError> {
        let id = parse_uuid(R::ENTITY, id)?;
        self.sessions
            .run_read_only(move |session| Box::pin(async move { Self::find_in(session, id).await }))
            .await
    }

    async fn update(&self, record: &R) -> Result<(), DataAccessError> {
        let id = parse_uuid(R::ENTITY, record.id())?;
        let record = record.clone();
        self.sessions
            .run_in_transaction(move |session| Box::pin(async move { Self::replace_in(session, id, &record).await }))
            .await?;
        info!("Updated {} {}", R::ENTITY, id);
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<(), DataAccessError> {
        let id = parse_uuid(R::ENTITY, id)?;
        let removed = self
            .sessions
            .run_in_transaction(move |session| Box::pin(async move { Self::remove_in(session, id).await }))
            .await?;
        if removed {
            info!("Deleted {} {}", R::ENTITY, id);
        } else {
            debug!("Delete of absent {} {} is a no-op", R::ENTITY, id);
        }
        Ok(())
    }
}
