use crate::api::client::{ApiClient, TOKEN_KEYS};
use crate::error::AppError;
use crate::state::AppState;
use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{request::Parts, HeaderMap},
};

/// Bearer token from the `Authorization` header, else from one of the token
/// cookies.
pub fn extract_token(headers: &HeaderMap) -> Option<String> {
    if let Some(auth) = headers.get(axum::http::header::AUTHORIZATION) {
        if let Ok(val) = auth.to_str() {
            if let Some(bearer) = val.strip_prefix("Bearer ") {
                let bearer = bearer.trim();
                if !bearer.is_empty() {
                    return Some(bearer.to_string());
                }
            }
        }
    }
    let cookie = headers.get(axum::http::header::COOKIE)?.to_str().ok()?;
    TOKEN_KEYS.iter().find_map(|key| {
        cookie.split(';').find_map(|pair| {
            pair.trim()
                .strip_prefix(key)
                .and_then(|rest| rest.strip_prefix('='))
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .map(str::to_string)
        })
    })
}

/// Token the caller supplied for the backend. Requests without one are
/// rejected with 401; the stored token is only used by background jobs.
///
/// ```rust,ignore
/// async fn handler(State(state): State<SharedState>, token: BackendToken) -> ... {
///     let api = token.client(&state);
/// }
/// ```
pub struct BackendToken(pub String);

impl BackendToken {
    pub fn client(self, state: &AppState) -> ApiClient {
        state.api.with_token(Some(self.0))
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for BackendToken
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let token = extract_token(&parts.headers).ok_or(AppError::MissingToken)?;
        Ok(BackendToken(token))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_header_beats_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert("authorization", HeaderValue::from_static("Bearer abc"));
        headers.insert("cookie", HeaderValue::from_static("access_token=xyz"));
        assert_eq!(extract_token(&headers).as_deref(), Some("abc"));
    }

    #[test]
    fn test_cookie_order_follows_token_keys() {
        let mut headers = HeaderMap::new();
        headers.insert("cookie", HeaderValue::from_static("theme=dark; jwt=j1; token=t1"));
        assert_eq!(extract_token(&headers).as_deref(), Some("t1"));

        headers.insert("cookie", HeaderValue::from_static("access_token=; jwt=j1"));
        assert_eq!(extract_token(&headers).as_deref(), Some("j1"));

        headers.insert("cookie", HeaderValue::from_static("session=s1; tokenish=x"));
        assert_eq!(extract_token(&headers), None);
    }

    #[test]
    fn test_no_token() {
        let mut headers = HeaderMap::new();
        headers.insert("authorization", HeaderValue::from_static("Basic Zm9v"));
        assert_eq!(extract_token(&headers), None);
    }
}
