//! Authentication middleware
//!
//! Every protected route sits behind this gate. A request presents either
//! Basic credentials (checked against the configured account, minting a
//! session token returned in the `x-zemer-session` response header) or a
//! previously-minted Bearer token (validated against the session table,
//! refreshing its expiry). The extraction core never sees any of this.

use crate::AppState;
use axum::extract::{Request, State};
use axum::http::{header, HeaderValue, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde_json::json;
use tracing::debug;

/// Response header carrying a freshly-minted session token
pub const SESSION_HEADER: &str = "x-zemer-session";

pub async fn require_auth(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let authorization = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);

    match authorization.as_deref() {
        Some(value) if value.starts_with("Basic ") => {
            let (username, password) =
                decode_basic(&value["Basic ".len()..]).ok_or(AuthError::Malformed)?;
            let token = state
                .sessions
                .authenticate(&username, &password)
                .ok_or(AuthError::BadCredentials)?;

            let mut response = next.run(request).await;
            if let Ok(value) = HeaderValue::from_str(&token) {
                response.headers_mut().insert(SESSION_HEADER, value);
            }
            Ok(response)
        }
        Some(value) if value.starts_with("Bearer ") => {
            let token = value["Bearer ".len()..].trim();
            if state.sessions.validate(token) {
                Ok(next.run(request).await)
            } else {
                debug!("Rejected expired or unknown session token");
                Err(AuthError::SessionExpired)
            }
        }
        _ => Err(AuthError::MissingCredentials),
    }
}

fn decode_basic(encoded: &str) -> Option<(String, String)> {
    let decoded = BASE64.decode(encoded.trim()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (username, password) = decoded.split_once(':')?;
    Some((username.to_string(), password.to_string()))
}

/// Authentication failures for HTTP responses
#[derive(Debug)]
pub enum AuthError {
    MissingCredentials,
    Malformed,
    BadCredentials,
    SessionExpired,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AuthError::MissingCredentials => {
                (StatusCode::UNAUTHORIZED, "Authentication required")
            }
            AuthError::Malformed => (StatusCode::BAD_REQUEST, "Malformed Authorization header"),
            AuthError::BadCredentials => (StatusCode::UNAUTHORIZED, "Invalid credentials"),
            AuthError::SessionExpired => (StatusCode::UNAUTHORIZED, "Session expired"),
        };

        let mut response = (status, Json(json!({ "error": message }))).into_response();
        if status == StatusCode::UNAUTHORIZED {
            response.headers_mut().insert(
                header::WWW_AUTHENTICATE,
                HeaderValue::from_static(r#"Basic realm="Zemer Downloader""#),
            );
        }
        response
    }
}
