use axum::extract::Request;
use axum::extract::State;
use axum::http::header::AUTHORIZATION;
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::Response;
use axum_extra::extract::cookie::CookieJar;

use super::cookies;
use super::handlers::ApiError;
use crate::account::models::SanitizedUser;
use crate::inbound::http::router::AppState;

/// User resolved from the access token, stored in request extensions.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub SanitizedUser);

/// Middleware that resolves the access token to a user.
///
/// The token comes from the `accessToken` cookie or, failing that, an
/// `Authorization: Bearer` header. Every failure is a 401.
pub async fn authenticate(
    State(state): State<AppState>,
    jar: CookieJar,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = access_token(&jar, req.headers()).ok_or_else(|| {
        tracing::warn!(uri = %req.uri(), "Request without access token");
        ApiError::Unauthorized("Unauthorized request".to_string())
    })?;

    let user = state
        .account_service
        .authenticate(&token)
        .await
        .map_err(|e| {
            tracing::warn!(error = %e, "Access token rejected");
            ApiError::Unauthorized(e.to_string())
        })?;

    req.extensions_mut().insert(AuthenticatedUser(user));

    Ok(next.run(req).await)
}

fn access_token(jar: &CookieJar, headers: &HeaderMap) -> Option<String> {
    cookies::value(jar, cookies::ACCESS_TOKEN_COOKIE).or_else(|| bearer_token(headers))
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
}
