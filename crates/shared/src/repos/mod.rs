use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

use crate::config::StoreBackend;

mod conversations;
mod firebase;
mod locks;
mod memory;
mod oauth_states;
mod redis_store;
mod tokens;
mod tracks;

pub use firebase::FirebaseStore;
pub use memory::MemoryStore;
pub use redis_store::RedisStore;
pub use tracks::{DEFAULT_PLAYLIST_URL, default_tracks};

use locks::KeyedLocks;

pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + Send + 'a>>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("document store request failed: {0}")]
    Backend(String),
    #[error("document store returned status {status} for {path}")]
    UnexpectedStatus { status: u16, path: String },
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),
    #[error("invalid persisted data at {path}: {message}")]
    InvalidData { path: String, message: String },
    #[error("invalid document path segment: {0:?}")]
    InvalidPath(String),
}

/// Flat path-keyed JSON documents. `get` of a missing path yields `None`.
pub trait DocumentStore: Send + Sync {
    fn get<'a>(&'a self, path: &'a str) -> StoreFuture<'a, Option<Value>>;
    fn put<'a>(&'a self, path: &'a str, value: &'a Value) -> StoreFuture<'a, ()>;
    fn delete<'a>(&'a self, path: &'a str) -> StoreFuture<'a, ()>;
}

#[derive(Debug, Clone, Copy)]
pub struct StoreLimits {
    pub conversation_max_turns: usize,
    pub listening_history_max: usize,
}

impl Default for StoreLimits {
    fn default() -> Self {
        Self {
            conversation_max_turns: 40,
            listening_history_max: 20,
        }
    }
}

#[derive(Clone)]
pub struct Store {
    backend: Arc<dyn DocumentStore>,
    locks: KeyedLocks,
    limits: StoreLimits,
}

impl Store {
    pub fn new(backend: Arc<dyn DocumentStore>, limits: StoreLimits) -> Self {
        Self {
            backend,
            locks: KeyedLocks::default(),
            limits,
        }
    }

    pub async fn connect(
        backend: &StoreBackend,
        http_client: reqwest::Client,
        limits: StoreLimits,
    ) -> Result<Self, StoreError> {
        let backend: Arc<dyn DocumentStore> = match backend {
            StoreBackend::Firebase { base_url, auth } => Arc::new(FirebaseStore::new(
                base_url.clone(),
                auth.clone(),
                http_client,
            )),
            StoreBackend::Redis { url, key_prefix } => {
                Arc::new(RedisStore::connect(url, key_prefix).await?)
            }
            StoreBackend::Memory => Arc::new(MemoryStore::default()),
        };

        Ok(Self::new(backend, limits))
    }

    pub fn in_memory(limits: StoreLimits) -> Self {
        Self::new(Arc::new(MemoryStore::default()), limits)
    }

    pub fn backend(&self) -> &Arc<dyn DocumentStore> {
        &self.backend
    }

    pub async fn ping(&self) -> Result<(), StoreError> {
        self.backend.get("health").await.map(|_| ())
    }

    async fn get_typed<T: DeserializeOwned>(&self, path: &str) -> Result<Option<T>, StoreError> {
        let Some(value) = self.backend.get(path).await? else {
            return Ok(None);
        };

        serde_json::from_value(value)
            .map(Some)
            .map_err(|err| StoreError::InvalidData {
                path: path.to_string(),
                message: err.to_string(),
            })
    }

    async fn put_typed<T: Serialize>(&self, path: &str, value: &T) -> Result<(), StoreError> {
        let value = serde_json::to_value(value).map_err(|err| StoreError::InvalidData {
            path: path.to_string(),
            message: err.to_string(),
        })?;
        self.backend.put(path, &value).await
    }
}

/// Joins a collection name and a key into a store path. Keys come straight
/// from platform identifiers, so reject anything that would address a
/// different node.
pub(crate) fn document_path(collection: &str, key: &str) -> Result<String, StoreError> {
    let valid = !key.is_empty()
        && key.len() <= 256
        && !key
            .chars()
            .any(|ch| matches!(ch, '/' | '.' | '#' | '$' | '[' | ']') || ch.is_control());
    if !valid {
        return Err(StoreError::InvalidPath(key.to_string()));
    }

    Ok(format!("{collection}/{key}"))
}
