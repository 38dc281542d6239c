use async_trait::async_trait;

use super::domain::UserRecord;
use super::errors::UserError;

/// Repository abstraction for user persistence.
///
/// Keys are normalized emails; implementations normalize on every call.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert unless the normalized email is already taken. Returns whether it was inserted.
    /// The existence check and the insert are one atomic step.
    async fn insert_if_absent(&self, record: UserRecord) -> Result<bool, UserError>;
    async fn find(&self, email: &str) -> Result<Option<UserRecord>, UserError>;
    async fn list(&self) -> Result<Vec<UserRecord>, UserError>;
    /// Make the current state durable.
    async fn flush(&self) -> Result<(), UserError>;
}

/// Simple in-memory repository for tests
pub mod mock {
    use super::*;
    use std::collections::HashMap;
    use tokio::sync::Mutex;

    use crate::users::domain::normalize_email;

    #[derive(Default)]
    pub struct MemoryUserRepository {
        users: Mutex<HashMap<String, UserRecord>>,
    }

    #[async_trait]
    impl UserRepository for MemoryUserRepository {
        async fn insert_if_absent(&self, mut record: UserRecord) -> Result<bool, UserError> {
            let mut users = self.users.lock().await;
            record.email = normalize_email(&record.email);
            if users.contains_key(&record.email) {
                return Ok(false);
            }
            users.insert(record.email.clone(), record);
            Ok(true)
        }

        async fn find(&self, email: &str) -> Result<Option<UserRecord>, UserError> {
            let users = self.users.lock().await;
            Ok(users.get(&normalize_email(email)).cloned())
        }

        async fn list(&self) -> Result<Vec<UserRecord>, UserError> {
            let users = self.users.lock().await;
            Ok(users.values().cloned().collect())
        }

        async fn flush(&self) -> Result<(), UserError> {
            Ok(())
        }
    }
}
