use serde_json::Value;
use tracing::warn;

use super::{DocumentStore, StoreError, StoreFuture};

/// Firebase Realtime Database over its REST surface: every path maps to
/// `{base_url}/{path}.json`, and a `null` body means the node is absent.
#[derive(Clone)]
pub struct FirebaseStore {
    base_url: String,
    auth: Option<String>,
    client: reqwest::Client,
}

impl FirebaseStore {
    pub fn new(base_url: String, auth: Option<String>, client: reqwest::Client) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            auth,
            client,
        }
    }

    fn node_url(&self, path: &str) -> String {
        format!("{}/{}.json", self.base_url, path.trim_matches('/'))
    }

    fn with_auth(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.auth.as_deref() {
            Some(auth) => request.query(&[("auth", auth)]),
            None => request,
        }
    }
}

impl DocumentStore for FirebaseStore {
    fn get<'a>(&'a self, path: &'a str) -> StoreFuture<'a, Option<Value>> {
        Box::pin(async move {
            let response = self
                .with_auth(self.client.get(self.node_url(path)))
                .send()
                .await
                .map_err(|err| StoreError::Backend(err.to_string()))?;

            let status = response.status();
            if !status.is_success() {
                warn!(path, status = status.as_u16(), "firebase read failed");
                return Err(StoreError::UnexpectedStatus {
                    status: status.as_u16(),
                    path: path.to_string(),
                });
            }

            let value = response
                .json::<Value>()
                .await
                .map_err(|err| StoreError::InvalidData {
                    path: path.to_string(),
                    message: err.to_string(),
                })?;

            Ok((!value.is_null()).then_some(value))
        })
    }

    fn put<'a>(&'a self, path: &'a str, value: &'a Value) -> StoreFuture<'a, ()> {
        Box::pin(async move {
            let response = self
                .with_auth(self.client.put(self.node_url(path)))
                .json(value)
                .send()
                .await
                .map_err(|err| StoreError::Backend(err.to_string()))?;

            let status = response.status();
            if !status.is_success() {
                warn!(path, status = status.as_u16(), "firebase write failed");
                return Err(StoreError::UnexpectedStatus {
                    status: status.as_u16(),
                    path: path.to_string(),
                });
            }

            Ok(())
        })
    }

    fn delete<'a>(&'a self, path: &'a str) -> StoreFuture<'a, ()> {
        Box::pin(async move {
            let response = self
                .with_auth(self.client.delete(self.node_url(path)))
                .send()
                .await
                .map_err(|err| StoreError::Backend(err.to_string()))?;

            let status = response.status();
            if !status.is_success() {
                warn!(path, status = status.as_u16(), "firebase delete failed");
                return Err(StoreError::UnexpectedStatus {
                    status: status.as_u16(),
                    path: path.to_string(),
                });
            }

            Ok(())
        })
    }
}
