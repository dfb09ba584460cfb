use redis::AsyncCommands;
use redis::aio::ConnectionManager;
use serde_json::Value;

use super::{DocumentStore, StoreError, StoreFuture};

/// Documents stored as JSON strings under `{key_prefix}:{path}`.
#[derive(Clone)]
pub struct RedisStore {
    connection: ConnectionManager,
    key_prefix: String,
}

impl RedisStore {
    pub async fn connect(redis_url: &str, key_prefix: &str) -> Result<Self, StoreError> {
        let client = redis::Client::open(redis_url)?;
        let connection = ConnectionManager::new(client).await?;

        let mut health_connection = connection.clone();
        redis::cmd("PING")
            .query_async::<String>(&mut health_connection)
            .await?;

        Ok(Self {
            connection,
            key_prefix: key_prefix.trim_end_matches(':').to_string(),
        })
    }

    fn key(&self, path: &str) -> String {
        format!("{}:{}", self.key_prefix, path.trim_matches('/'))
    }
}

impl DocumentStore for RedisStore {
    fn get<'a>(&'a self, path: &'a str) -> StoreFuture<'a, Option<Value>> {
        Box::pin(async move {
            let mut connection = self.connection.clone();
            let raw: Option<String> = connection.get(self.key(path)).await?;
            raw.map(|raw| {
                serde_json::from_str::<Value>(&raw).map_err(|err| StoreError::InvalidData {
                    path: path.to_string(),
                    message: err.to_string(),
                })
            })
            .transpose()
        })
    }

    fn put<'a>(&'a self, path: &'a str, value: &'a Value) -> StoreFuture<'a, ()> {
        Box::pin(async move {
            let mut connection = self.connection.clone();
            if value.is_null() {
                let _: i64 = connection.del(self.key(path)).await?;
                return Ok(());
            }
            let () = connection.set(self.key(path), value.to_string()).await?;
            Ok(())
        })
    }

    fn delete<'a>(&'a self, path: &'a str) -> StoreFuture<'a, ()> {
        Box::pin(async move {
            let mut connection = self.connection.clone();
            let _: i64 = connection.del(self.key(path)).await?;
            Ok(())
        })
    }
}
