use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::Value;
use tokio::sync::RwLock;

use super::{DocumentStore, StoreFuture};

/// Process-local document store for tests and local development.
#[derive(Clone, Default)]
pub struct MemoryStore {
    documents: Arc<RwLock<BTreeMap<String, Value>>>,
}

impl MemoryStore {
    pub async fn paths(&self) -> Vec<String> {
        self.documents.read().await.keys().cloned().collect()
    }
}

impl DocumentStore for MemoryStore {
    fn get<'a>(&'a self, path: &'a str) -> StoreFuture<'a, Option<Value>> {
        Box::pin(async move { Ok(self.documents.read().await.get(path).cloned()) })
    }

    fn put<'a>(&'a self, path: &'a str, value: &'a Value) -> StoreFuture<'a, ()> {
        Box::pin(async move {
            let mut documents = self.documents.write().await;
            if value.is_null() {
                documents.remove(path);
            } else {
                documents.insert(path.to_string(), value.clone());
            }
            Ok(())
        })
    }

    fn delete<'a>(&'a self, path: &'a str) -> StoreFuture<'a, ()> {
        Box::pin(async move {
            self.documents.write().await.remove(path);
            Ok(())
        })
    }
}
