use std::sync::Arc;
use shared::User;
use super::{RecordService, ServiceError};
use crate::backend::storage::{Dao, UserDao};

/// Service for managing users
#[derive(Clone)]
pub struct UserService {
    dao: UserDao,
}

impl UserService {
    pub fn new(dao: UserDao) -> Self {
        Self { dao }
    }
}

impl RecordService<User> for UserService {
    fn dao(&self) -> &Arc<dyn Dao<User>> {
        &self.dao
    }

    fn validate(&self, user: &User) -> Result<(), ServiceError> {
        if user.name.trim().is_empty() {
            return Err(ServiceError::validation("user", "name cannot be empty"));
        }
        if !user.email.contains('@') {
            return Err(ServiceError::validation("user", format!("'{}' is not an email address", user.email)));
        }
        Ok(())
    }
}
