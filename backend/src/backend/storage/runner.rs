//! No-op unit-of-work runner for backends without transactions.
//!
//! File and document backends go through the same calling convention as the
//! relational `SessionManager`, minus the session: the action runs directly
//! and a panic inside it is reported as `DataAccessError::Unexpected`.

use std::future::Future;
use std::panic::AssertUnwindSafe;
use futures::FutureExt;
use log::error;
use super::error::DataAccessError;

#[derive(Debug, Clone, Copy, Default)]
pub struct DirectRunner;

impl DirectRunner {
    pub fn new() -> Self {
        Self
    }

    /// Run `action` to completion, converting panics into errors
    pub async fn run<T, F, Fut>(&self, action: F) -> Result<T, DataAccessError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, DataAccessError>>,
    {
        // Panics in the closure body count too, not only in the future it returns
        match AssertUnwindSafe(async move { action().await }).catch_unwind().await {
            Ok(result) => result,
            Err(payload) => {
                let error = DataAccessError::from_panic(payload);
                error!("Storage action panicked: {}", error);
                Err(error)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_run_passes_results_through() {
        let runner = DirectRunner::new();
        let value = runner.run(|| async { Ok::<_, DataAccessError>(42) }).await.unwrap();
        assert_eq!(value, 42);

        let failure = runner
            .run(|| async { Err::<(), _>(DataAccessError::not_found("user", "u1")) })
            .await;
        assert!(failure.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_run_converts_panics() {
        let runner = DirectRunner::new();
        let result: Result<(), DataAccessError> = runner
            .run(|| async {
                let fail = true;
                if fail {
                    panic!("disk on fire");
                }
                Ok(())
            })
            .await;
        assert!(matches!(result, Err(DataAccessError::Unexpected(ref m)) if m == "disk on fire"));
    }

    #[tokio::test]
    async fn test_run_converts_panics_before_the_future_exists() {
        let runner = DirectRunner::new();
        let result = runner
            .run(|| -> std::future::Ready<Result<(), DataAccessError>> {
                panic!("bad arguments");
            })
            .await;
        assert!(matches!(result, Err(DataAccessError::Unexpected(ref m)) if m == "bad arguments"));
    }
}
