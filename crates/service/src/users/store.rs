use std::{collections::HashMap, path::{Path, PathBuf}, sync::Arc};

use async_trait::async_trait;
use configs::LoadPolicy;
use tokio::sync::RwLock;
use tracing::{error, info, warn};

use super::domain::{normalize_email, UserRecord, UsersDocument};
use super::errors::UserError;
use super::repository::UserRepository;
use crate::storage::json_document::JsonDocument;

/// File-backed user store.
///
/// Holds every account in memory keyed by normalized email and rewrites the
/// whole backing file after each successful insert. The file is only read in
/// [`UserStore::open`].
pub struct UserStore {
    inner: RwLock<HashMap<String, UserRecord>>,
    document: JsonDocument<UsersDocument>,
}

impl UserStore {
    /// Open the store at `path`, creating `{"users": []}` if the file is missing.
    ///
    /// A file that exists but cannot be read or parsed is handled per `policy`:
    /// `FailOpen` logs and starts empty, `FailClosed` returns the error.
    pub async fn open<P: Into<PathBuf>>(path: P, policy: LoadPolicy) -> Result<Arc<Self>, UserError> {
        let document = JsonDocument::<UsersDocument>::new(path);
        let map = match document.load_or_init().await {
            Ok(doc) => Self::index(doc),
            Err(e) => match policy {
                LoadPolicy::FailOpen => {
                    error!(path = %document.path().display(), error = %e, "failed to load users file; starting with an empty store");
                    HashMap::new()
                }
                LoadPolicy::FailClosed => return Err(e.into()),
            },
        };
        info!(path = %document.path().display(), users = map.len(), "user store opened");
        Ok(Arc::new(Self { inner: RwLock::new(map), document }))
    }

    fn index(doc: UsersDocument) -> HashMap<String, UserRecord> {
        let mut map = HashMap::with_capacity(doc.users.len());
        for mut user in doc.users {
            user.email = normalize_email(&user.email);
            if let Some(prev) = map.insert(user.email.clone(), user) {
                warn!(email = %prev.email, "duplicate email in users file; keeping the later record");
            }
        }
        map
    }

    async fn save(&self, map: &HashMap<String, UserRecord>) -> Result<(), UserError> {
        let doc = UsersDocument { users: map.values().cloned().collect() };
        self.document.save(&doc).await?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        self.document.path()
    }

    /// Insert unless the email is taken, then persist.
    ///
    /// The write guard is held across check, insert and save. A failed save is
    /// logged and the insert stands; the in-memory map stays authoritative.
    pub async fn insert_if_absent(&self, mut record: UserRecord) -> bool {
        record.email = normalize_email(&record.email);
        let mut map = self.inner.write().await;
        if map.contains_key(&record.email) {
            return false;
        }
        map.insert(record.email.clone(), record);
        if let Err(e) = self.save(&map).await {
            error!(path = %self.path().display(), error = %e, "failed to save users file");
        }
        true
    }

    /// Get record by email (normalized before lookup).
    pub async fn get(&self, email: &str) -> Option<UserRecord> {
        let map = self.inner.read().await;
        map.get(&normalize_email(email)).cloned()
    }

    /// List all records, in map iteration order.
    pub async fn list(&self) -> Vec<UserRecord> {
        let map = self.inner.read().await;
        map.values().cloned().collect()
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }

    /// Rewrite the backing file from memory.
    pub async fn flush(&self) -> Result<(), UserError> {
        let map = self.inner.write().await;
        self.save(&map).await
    }
}

#[async_trait]
impl UserRepository for UserStore {
    async fn insert_if_absent(&self, record: UserRecord) -> Result<bool, UserError> {
        Ok(self.insert_if_absent(record).await)
    }
    async fn find(&self, email: &str) -> Result<Option<UserRecord>, UserError> { Ok(self.get(email).await) }
    async fn list(&self) -> Result<Vec<UserRecord>, UserError> { Ok(self.list().await) }
    async fn flush(&self) -> Result<(), UserError> { self.flush().await }
}
