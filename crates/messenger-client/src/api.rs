//! Typed client for the messenger REST API.
//!
//! Reads of messages and users go through the [`ResponseCache`]: a hit is
//! answered from the cache at once while a background task refetches, and
//! subscribers of the [`ReloadNotifier`] are told when that refetch brought
//! something new.

use std::sync::Arc;

use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};
use uuid::Uuid;

use messenger_types::api::{CreateUserRequest, ErrorResponse, NewMessage, UserParams};
use messenger_types::models::{Message, User};
use messenger_types::validation::FieldErrors;

use crate::cache::ResponseCache;
use crate::error::ClientError;
use crate::notifier::ReloadNotifier;

/// Extra attempts after a failed GET. Retries are immediate.
pub const DEFAULT_RETRIES: u32 = 2;

#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    http: Client,
    base_url: String,
    cache: Arc<ResponseCache>,
    notifier: ReloadNotifier,
    retries: u32,
}

impl ApiClient {
    pub fn new(base_url: &str, cache: Arc<ResponseCache>, notifier: ReloadNotifier) -> Self {
        Self::with_retries(base_url, cache, notifier, DEFAULT_RETRIES)
    }

    pub fn with_retries(
        base_url: &str,
        cache: Arc<ResponseCache>,
        notifier: ReloadNotifier,
        retries: u32,
    ) -> Self {
        Self {
            inner: Arc::new(ApiClientInner {
                http: Client::new(),
                base_url: base_url.trim_end_matches('/').to_string(),
                cache,
                notifier,
                retries,
            }),
        }
    }

    pub fn cache(&self) -> &Arc<ResponseCache> {
        &self.inner.cache
    }

    pub fn notifier(&self) -> &ReloadNotifier {
        &self.inner.notifier
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.inner.base_url, path)
    }

    // -- Users --

    pub async fn create_user(&self, user: &User) -> Result<User, ClientError> {
        let params = UserParams {
            username_hash: Some(user.username_hash.clone()),
        };
        let req = self
            .inner
            .http
            .post(self.url("/createUser"))
            .json(&CreateUserRequest { user: &params });
        decode(self.send(req).await?).await
    }

    pub async fn read_users(&self) -> Result<Vec<User>, ClientError> {
        let value = self.fetch_json(&self.url("/readUsers")).await?;
        Ok(serde_json::from_value(value)?)
    }

    pub async fn read_user(&self, username_hash: &str) -> Result<User, ClientError> {
        self.cached_get(&format!("/readUser/{}", username_hash)).await
    }

    pub async fn update_user(&self, username_hash: &str, user: &User) -> Result<User, ClientError> {
        let req = self
            .inner
            .http
            .put(self.url(&format!("/updateUser/{}", username_hash)))
            .json(user);
        decode(self.send(req).await?).await
    }

    pub async fn delete_user(&self, username_hash: &str) -> Result<(), ClientError> {
        let req = self
            .inner
            .http
            .delete(self.url(&format!("/deleteUser/{}", username_hash)));
        self.send(req).await?;
        Ok(())
    }

    // -- Messages --

    pub async fn create_message(&self, message: &NewMessage) -> Result<Message, ClientError> {
        let req = self.inner.http.post(self.url("/createMessage")).json(message);
        decode(self.send(req).await?).await
    }

    pub async fn read_messages(&self) -> Result<Vec<Message>, ClientError> {
        self.cached_get("/readMessages").await
    }

    pub async fn read_messages_by_hash(&self, username_hash: &str) -> Result<Vec<Message>, ClientError> {
        self.cached_get(&format!("/readMessages/{}", username_hash)).await
    }

    pub async fn delete_messages_by_hash(&self, username_hash: &str) -> Result<(), ClientError> {
        let req = self
            .inner
            .http
            .delete(self.url(&format!("/deleteMessages/{}", username_hash)));
        self.send(req).await?;
        Ok(())
    }

    pub async fn delete_message(&self, id: Uuid) -> Result<(), ClientError> {
        let req = self.inner.http.delete(self.url(&format!("/deleteMessage/{}", id)));
        self.send(req).await?;
        Ok(())
    }

    // -- Caching --

    async fn cached_get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        let url = self.url(path);
        let key = format!("GET:{}", url);

        if let Some(cached) = self.inner.cache.get(&key) {
            self.spawn_refresh(url, key);
            return Ok(serde_json::from_value(cached)?);
        }

        let fresh = self.fetch_json(&url).await?;
        if let Err(e) = self.inner.cache.set(&key, fresh.clone()) {
            warn!("Could not cache {}: {}", key, e);
        }
        Ok(serde_json::from_value(fresh)?)
    }

    fn spawn_refresh(&self, url: String, key: String) {
        let client = self.clone();
        tokio::spawn(async move {
            match client.fetch_json(&url).await {
                Ok(fresh) => {
                    client.apply_refresh(&key, fresh);
                }
                Err(e) => warn!("Background refresh of {} failed: {}", url, e),
            }
        });
    }

    /// Store a refetched value. Subscribers are notified only when it differs
    /// from what was cached. Returns whether anything changed.
    pub fn apply_refresh(&self, key: &str, fresh: Value) -> bool {
        let cached = self.inner.cache.get(key);
        if cached.is_some_and(|c| same_json(&c, &fresh)) {
            return false;
        }

        if let Err(e) = self.inner.cache.set(key, fresh) {
            warn!("Could not cache {}: {}", key, e);
        }
        debug!("Cached response for {} changed, reloading", key);
        self.inner.notifier.reload();
        true
    }

    // -- Transport --

    /// GET with up to `retries` immediate retries on transport errors and
    /// 5xx responses. Client errors are final.
    async fn fetch_json(&self, url: &str) -> Result<Value, ClientError> {
        let mut attempt = 0;
        loop {
            let result = match self.inner.http.get(url).send().await {
                Ok(res) => check(res).await,
                Err(e) => Err(ClientError::from(e)),
            };

            match result {
                Ok(res) => return Ok(res.json().await?),
                Err(e) if attempt < self.inner.retries && is_retryable(&e) => {
                    attempt += 1;
                    debug!("GET {} failed ({}), retry {}/{}", url, e, attempt, self.inner.retries);
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn send(&self, req: RequestBuilder) -> Result<Response, ClientError> {
        check(req.send().await?).await
    }
}

fn is_retryable(e: &ClientError) -> bool {
    match e {
        ClientError::Http(_) => true,
        ClientError::Status { status, .. } => status.is_server_error(),
        _ => false,
    }
}

fn same_json(a: &Value, b: &Value) -> bool {
    match (serde_json::to_string(a), serde_json::to_string(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

async fn decode<T: DeserializeOwned>(res: Response) -> Result<T, ClientError> {
    Ok(res.json().await?)
}

/// Turn non-2xx responses into [`ClientError::Status`], keeping the server's
/// field errors or error message.
async fn check(res: Response) -> Result<Response, ClientError> {
    let status = res.status();
    if status.is_success() {
        return Ok(res);
    }

    let body = res.text().await.unwrap_or_default();
    let (message, field_errors) = if let Ok(err) = serde_json::from_str::<ErrorResponse>(&body) {
        (err.error, None)
    } else if let Ok(errors) = serde_json::from_str::<FieldErrors>(&body) {
        (errors.to_string(), Some(errors))
    } else {
        (body, None)
    };

    Err(ClientError::Status {
        status,
        message,
        field_errors,
    })
}
