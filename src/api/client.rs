use crate::error::{AppError, AppResult};
use crate::storage::local_store::LocalStore;
use reqwest::{Method, RequestBuilder};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Local store keys checked for the bearer token, in order.
pub const TOKEN_KEYS: &[&str] = &["access_token", "token", "jwt"];

/// Authenticated JSON client for the CRM backend. No retries: each call is
/// sent once and its failure is returned to the caller.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    store: Arc<LocalStore>,
    token_override: Option<String>,
    cancel: CancellationToken,
}

impl ApiClient {
    pub fn new(
        base_url: &str,
        timeout: Duration,
        store: Arc<LocalStore>,
        cancel: CancellationToken,
    ) -> AppResult<Self> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            store,
            token_override: None,
            cancel,
        })
    }

    /// Copy of this client that authenticates with `token` instead of the stored one.
    pub fn with_token(&self, token: Option<String>) -> Self {
        let mut client = self.clone();
        if let Some(token) = token.filter(|t| !t.trim().is_empty()) {
            client.token_override = Some(token);
        }
        client
    }

    pub async fn token(&self) -> Option<String> {
        if let Some(token) = &self.token_override {
            return Some(token.clone());
        }
        for key in TOKEN_KEYS {
            if let Some(token) = self.store.get(key).await {
                let token = token.trim().trim_matches('"').to_string();
                if !token.is_empty() && token != "null" && token != "undefined" {
                    return Some(token);
                }
            }
        }
        None
    }

    pub async fn get(&self, path: &str, query: &[(&str, String)]) -> AppResult<Value> {
        let builder = self.request(Method::GET, path).query(query);
        self.send(path, builder).await
    }

    pub async fn post<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> AppResult<Value> {
        let builder = self.request(Method::POST, path).json(body);
        self.send(path, builder).await
    }

    pub async fn put<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> AppResult<Value> {
        let builder = self.request(Method::PUT, path).json(body);
        self.send(path, builder).await
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}/{}", self.base_url, path.trim_start_matches('/'));
        self.http.request(method, url)
    }

    async fn send(&self, path: &str, builder: RequestBuilder) -> AppResult<Value> {
        if self.cancel.is_cancelled() {
            return Err(AppError::Cancelled);
        }
        let token = self.token().await.ok_or(AppError::MissingToken)?;
        let builder = builder.bearer_auth(token);

        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => {
                tracing::debug!("Call to {} cancelled", path);
                Err(AppError::Cancelled)
            }
            result = Self::execute(builder) => {
                if let Err(e) = &result {
                    tracing::warn!("Backend call to {} failed: {}", path, e);
                }
                result
            }
        }
    }

    async fn execute(builder: RequestBuilder) -> AppResult<Value> {
        let response = builder.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Status {
                status: status.as_u16(),
                body: body.chars().take(500).collect(),
            });
        }

        let bytes = response.bytes().await?;
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Value::Null);
        }
        serde_json::from_slice(&bytes).map_err(|e| AppError::Decode(e.to_string()))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use serde_json::json;

    pub(crate) async fn client_for(url: &str) -> ApiClient {
        let store = Arc::new(LocalStore::in_memory());
        store.set("access_token", "secret".into()).await.unwrap();
        ApiClient::new(url, Duration::from_secs(5), store, CancellationToken::new()).unwrap()
    }

    #[tokio::test]
    async fn test_token_fallback_order() {
        let store = Arc::new(LocalStore::in_memory());
        let client = ApiClient::new("http://localhost", Duration::from_secs(1), store.clone(), CancellationToken::new()).unwrap();
        assert_eq!(client.token().await, None);

        store.set("jwt", "from-jwt".into()).await.unwrap();
        assert_eq!(client.token().await.as_deref(), Some("from-jwt"));

        store.set("token", "\"from-token\"".into()).await.unwrap();
        assert_eq!(client.token().await.as_deref(), Some("from-token"));

        store.set("access_token", "null".into()).await.unwrap();
        assert_eq!(client.token().await.as_deref(), Some("from-token"));

        store.set("access_token", "primary".into()).await.unwrap();
        assert_eq!(client.token().await.as_deref(), Some("primary"));

        let scoped = client.with_token(Some("header-token".into()));
        assert_eq!(scoped.token().await.as_deref(), Some("header-token"));
        assert_eq!(client.with_token(Some(" ".into())).token().await.as_deref(), Some("primary"));
    }

    #[tokio::test]
    async fn test_sends_bearer_token() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/api/roles/")
            .match_header("authorization", "Bearer secret")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"data": []}"#)
            .create_async()
            .await;

        let client = client_for(&server.url()).await;
        let body = client.get("/api/roles/", &[]).await.unwrap();
        assert_eq!(body, json!({ "data": [] }));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_error_status_and_empty_body() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/lead/assignments")
            .with_status(500)
            .with_body("boom")
            .create_async()
            .await;
        server
            .mock("PUT", "/api/tasks/1/status")
            .with_status(204)
            .create_async()
            .await;

        let client = client_for(&server.url()).await;
        let err = client.post("/api/lead/assignments", &json!({})).await.unwrap_err();
        assert!(matches!(err, AppError::Status { status: 500, ref body } if body == "boom"));

        let empty = client.put("/api/tasks/1/status", &json!({ "status": "done" })).await.unwrap();
        assert_eq!(empty, Value::Null);
    }

    #[tokio::test]
    async fn test_missing_token_and_cancellation() {
        let store = Arc::new(LocalStore::in_memory());
        let cancel = CancellationToken::new();
        let client = ApiClient::new("http://127.0.0.1:9", Duration::from_secs(1), store, cancel.clone()).unwrap();
        assert!(matches!(client.get("/x", &[]).await, Err(AppError::MissingToken)));

        cancel.cancel();
        let client = client.with_token(Some("t".into()));
        assert!(matches!(client.get("/x", &[]).await, Err(AppError::Cancelled)));
    }

    #[tokio::test]
    async fn test_invalid_json_is_decode_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/lead/leads")
            .with_status(200)
            .with_body("<html>login</html>")
            .create_async()
            .await;

        let client = client_for(&server.url()).await;
        assert!(matches!(client.get("/api/lead/leads", &[]).await, Err(AppError::Decode(_))));
    }
}
