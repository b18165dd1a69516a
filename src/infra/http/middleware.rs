use std::time::Instant;

use axum::body::Body;
use axum::extract::State;
use axum::http::Request;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use subtle::ConstantTimeEq;
use tracing::{error, warn};

use crate::application::error::ErrorReport;

use super::error::ApiError;
use super::state::ApiState;

/// The configured API token set.
///
/// Token issuance belongs to the external auth service; this side only
/// verifies presented tokens, in constant time per candidate.
pub struct ApiTokens {
    tokens: Vec<String>,
}

impl ApiTokens {
    pub fn new(tokens: Vec<String>) -> Self {
        Self { tokens }
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn verify(&self, presented: &str) -> bool {
        let presented = presented.as_bytes();
        let mut matched = false;
        for token in &self.tokens {
            matched |= bool::from(token.as_bytes().ct_eq(presented));
        }
        matched
    }
}

pub async fn api_auth(
    State(state): State<ApiState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let token =
        extract_token(request.headers().get(axum::http::header::AUTHORIZATION)).or_else(|| {
            request
                .headers()
                .get("x-api-key")
                .and_then(|v| v.to_str().ok().map(|s| s.to_string()))
        });

    let token = match token {
        Some(value) => value,
        None => return ApiError::unauthorized().into_response(),
    };

    if !state.tokens.verify(&token) {
        return ApiError::unauthorized().into_response();
    }

    next.run(request).await
}

pub async fn log_responses(request: Request<Body>, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let start = Instant::now();

    let mut response = next.run(request).await;
    let status = response.status();

    if status.is_client_error() || status.is_server_error() {
        let elapsed_ms = start.elapsed().as_millis();
        let report = response.extensions_mut().remove::<ErrorReport>();
        let (source, messages) = match report {
            Some(report) => (report.source, report.messages),
            None => ("unknown", Vec::new()),
        };
        let detail = messages
            .first()
            .cloned()
            .unwrap_or_else(|| "no diagnostic available".to_string());

        if status.is_server_error() {
            error!(
                target = "mercato::http::response",
                status = status.as_u16(),
                method = %method,
                path = %uri.path(),
                query = uri.query().unwrap_or(""),
                elapsed_ms = elapsed_ms,
                source = source,
                detail = %detail,
                chain = ?messages,
                "request failed",
            );
        } else {
            warn!(
                target = "mercato::http::response",
                status = status.as_u16(),
                method = %method,
                path = %uri.path(),
                query = uri.query().unwrap_or(""),
                elapsed_ms = elapsed_ms,
                source = source,
                detail = %detail,
                "client request error",
            );
        }
    }

    response
}

fn extract_token(header: Option<&axum::http::HeaderValue>) -> Option<String> {
    let raw = header?.to_str().ok()?;
    let bearer = raw.strip_prefix("Bearer ")?;
    Some(bearer.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verifies_any_configured_token() {
        let tokens = ApiTokens::new(vec!["alpha".to_string(), "beta".to_string()]);
        assert!(tokens.verify("alpha"));
        assert!(tokens.verify("beta"));
        assert!(!tokens.verify("gamma"));
        assert!(!tokens.verify(""));
        assert!(!tokens.verify("alph"));
    }

    #[test]
    fn empty_token_set_rejects_everything() {
        let tokens = ApiTokens::new(Vec::new());
        assert!(tokens.is_empty());
        assert!(!tokens.verify("anything"));
    }

    #[test]
    fn extracts_bearer_tokens_only() {
        let value = axum::http::HeaderValue::from_static("Bearer secret");
        assert_eq!(extract_token(Some(&value)), Some("secret".to_string()));

        let value = axum::http::HeaderValue::from_static("Basic secret");
        assert_eq!(extract_token(Some(&value)), None);
        assert_eq!(extract_token(None), None);
    }
}
