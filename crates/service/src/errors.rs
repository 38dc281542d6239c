use thiserror::Error;

/// Low-level persistence failures raised by the storage helpers.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("io error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("json error on {path}: {source}")]
    Codec {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

impl ServiceError {
    pub fn io(path: &std::path::Path, source: std::io::Error) -> Self {
        Self::Io { path: path.display().to_string(), source }
    }

    pub fn codec(path: &std::path::Path, source: serde_json::Error) -> Self {
        Self::Codec { path: path.display().to_string(), source }
    }
}
