use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use base64::Engine;
use sha2::{Digest, Sha256};

use crate::state::AppState;

/// Authentication middleware that validates HTTP Basic credentials
///
/// Credentials come from configuration. When no dashboard user or
/// password is configured, every request is rejected. Credentials are
/// compared through fixed-length digests, so the check takes the same
/// time wherever a candidate diverges from the configured value.
#[tracing::instrument(skip(state, req, next))]
pub async fn auth_middleware(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Response {
    if check_credentials(&state, req.headers()) {
        next.run(req).await
    } else {
        unauthorized()
    }
}

fn check_credentials(state: &AppState, headers: &HeaderMap) -> bool {
    let (Some(expected_user), Some(expected_pass)) = (
        state.config.auth.dashboard_user.as_deref(),
        state.config.auth.dashboard_pass.as_deref(),
    ) else {
        tracing::warn!("Dashboard credentials are not configured, rejecting request");
        return false;
    };

    let Some(encoded) = headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Basic "))
    else {
        return false;
    };

    let Some((user, pass)) = base64::engine::general_purpose::STANDARD
        .decode(encoded)
        .ok()
        .and_then(|bytes| String::from_utf8(bytes).ok())
        .and_then(|decoded| {
            decoded
                .split_once(':')
                .map(|(u, p)| (u.to_string(), p.to_string()))
        })
    else {
        tracing::warn!("Malformed Basic authorization header");
        return false;
    };

    digest_eq(&user, expected_user) & digest_eq(&pass, expected_pass)
}

fn digest_eq(candidate: &str, expected: &str) -> bool {
    Sha256::digest(candidate.as_bytes()) == Sha256::digest(expected.as_bytes())
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        [(header::WWW_AUTHENTICATE, "Basic realm=\"dashboard\"")],
        "Unauthorized",
    )
        .into_response()
}
