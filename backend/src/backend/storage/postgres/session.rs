//! Unit-of-work management for the relational backend.
//!
//! A `Session` is only ever handed out by `SessionManager` to a scoped action,
//! so relational DAO primitives cannot run without one. The manager owns the
//! whole lifecycle: acquire, begin, commit or roll back, release.

use std::panic::AssertUnwindSafe;
use futures::future::BoxFuture;
use futures::FutureExt;
use log::{debug, error, warn};
use sqlx::pool::PoolConnection;
use sqlx::{PgConnection, PgPool, Postgres, Transaction};
use crate::backend::storage::error::DataAccessError;

/// Future returned by a scoped session action
pub type SessionFuture<'s, T> = BoxFuture<'s, Result<T, DataAccessError>>;

enum SessionKind {
    Transactional(Transaction<'static, Postgres>),
    ReadOnly(PoolConnection<Postgres>),
}

/// Database session yielded to actions run by `SessionManager`
pub struct Session {
    kind: SessionKind,
}

impl Session {
    /// Connection to run queries on, inside the transaction when there is one
    pub fn connection(&mut self) -> &mut PgConnection {
        match &mut self.kind {
            SessionKind::Transactional(transaction) => &mut **transaction,
            SessionKind::ReadOnly(connection) => &mut **connection,
        }
    }

    pub fn is_transactional(&self) -> bool {
        matches!(self.kind, SessionKind::Transactional(_))
    }

    fn into_transaction(self) -> Option<Transaction<'static, Postgres>> {
        match self.kind {
            SessionKind::Transactional(transaction) => Some(transaction),
            SessionKind::ReadOnly(_) => None,
        }
    }
}

/// Hands out sessions from the shared pool and guarantees their cleanup
#[derive(Debug, Clone)]
pub struct SessionManager {
    pool: PgPool,
}

impl SessionManager {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Run `action` inside a transaction.
    ///
    /// Commits when the action returns `Ok`, rolls back when it returns `Err`
    /// or panics. If the rollback itself fails the original error is returned
    /// wrapped in `RollbackFailed`.
    pub async fn run_in_transaction<T, F>(&self, action: F) -> Result<T, DataAccessError>
    where
        T: Send,
        F: for<'s> FnOnce(&'s mut Session) -> SessionFuture<'s, T> + Send,
    {
        let transaction = self.pool.begin().await?;
        let mut session = Session {
            kind: SessionKind::Transactional(transaction),
        };
        debug!("Opened transactional session");

        let outcome = match AssertUnwindSafe(async { action(&mut session).await }).catch_unwind().await {
            Ok(result) => result,
            Err(payload) => Err(DataAccessError::from_panic(payload)),
        };

        let transaction = session.into_transaction().ok_or_else(|| {
            DataAccessError::Unexpected("transactional session lost its transaction".to_string())
        })?;

        Self::finish(transaction, outcome).await
    }

    /// Run `action` on a pooled connection without opening a transaction
    pub async fn run_read_only<T, F>(&self, action: F) -> Result<T, DataAccessError>
    where
        T: Send,
        F: for<'s> FnOnce(&'s mut Session) -> SessionFuture<'s, T> + Send,
    {
        let connection = self.pool.acquire().await?;
        let mut session = Session {
            kind: SessionKind::ReadOnly(connection),
        };
        debug!("Opened read-only session");

        let outcome = match AssertUnwindSafe(async { action(&mut session).await }).catch_unwind().await {
            Ok(result) => result,
            Err(payload) => {
                let error = DataAccessError::from_panic(payload);
                error!("Read-only session action panicked: {}", error);
                Err(error)
            }
        };

        // Dropping the session returns the connection to the pool
        drop(session);
        outcome
    }

    async fn finish<T>(
        transaction: Transaction<'static, Postgres>,
        outcome: Result<T, DataAccessError>,
    ) -> Result<T, DataAccessError> {
        match outcome {
            Ok(value) => {
                transaction.commit().await?;
                debug!("Committed transaction");
                Ok(value)
            }
            Err(original) => match transaction.rollback().await {
                Ok(()) => {
                    warn!("Rolled back transaction: {}", original);
                    Err(original)
                }
                Err(rollback) => {
                    error!("Rollback failed after '{}': {}", original, rollback);
                    Err(DataAccessError::RollbackFailed {
                        original: Box::new(original),
                        rollback,
                    })
                }
            },
        }
    }
}
