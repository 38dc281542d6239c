use std::{
    io::ErrorKind,
    marker::PhantomData,
    path::{Path, PathBuf},
};

use serde::{de::DeserializeOwned, Serialize};
use tokio::fs;

use crate::errors::ServiceError;

/// A single JSON document persisted at a fixed path.
///
/// Reads create the file with `D::default()` when it is missing. Writes are
/// pretty-printed and go through a sibling temp file followed by a rename, so
/// a failed write never leaves a truncated document behind.
///
/// The helper holds no lock; callers serialize writes to the same path.
pub struct JsonDocument<D> {
    path: PathBuf,
    _doc: PhantomData<fn() -> D>,
}

impl<D> JsonDocument<D>
where
    D: Serialize + DeserializeOwned + Default,
{
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into(), _doc: PhantomData }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn tmp_path(&self) -> PathBuf {
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        PathBuf::from(tmp)
    }

    async fn ensure_parent(&self) -> Result<(), ServiceError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await.map_err(|e| ServiceError::io(parent, e))?;
            }
        }
        Ok(())
    }

    /// Read and decode the document, writing `D::default()` first if the file does not exist.
    pub async fn load_or_init(&self) -> Result<D, ServiceError> {
        self.ensure_parent().await?;
        match fs::read(&self.path).await {
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|e| ServiceError::codec(&self.path, e)),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                let empty = D::default();
                self.save(&empty).await?;
                Ok(empty)
            }
            Err(e) => Err(ServiceError::io(&self.path, e)),
        }
    }

    /// Replace the on-disk document.
    pub async fn save(&self, doc: &D) -> Result<(), ServiceError> {
        self.ensure_parent().await?;
        let data = serde_json::to_vec_pretty(doc).map_err(|e| ServiceError::codec(&self.path, e))?;
        let tmp = self.tmp_path();
        fs::write(&tmp, data).await.map_err(|e| ServiceError::io(&tmp, e))?;
        if let Err(e) = fs::rename(&tmp, &self.path).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(ServiceError::io(&self.path, e));
        }
        Ok(())
    }
}
