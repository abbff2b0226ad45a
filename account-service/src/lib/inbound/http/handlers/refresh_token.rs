use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;
use serde::Serialize;

use super::ApiError;
use super::ApiSuccess;
use crate::inbound::http::cookies;
use crate::inbound::http::router::AppState;

/// Rotate the session tokens.
///
/// The refresh token is read from the `refreshToken` cookie, falling back to
/// the JSON body for clients that do not keep cookies.
pub async fn refresh_token(
    State(state): State<AppState>,
    jar: CookieJar,
    body: Option<Json<RefreshTokenRequestBody>>,
) -> Result<(CookieJar, ApiSuccess<RefreshTokenResponseData>), ApiError> {
    let presented = cookies::value(&jar, cookies::REFRESH_TOKEN_COOKIE)
        .or_else(|| body.and_then(|Json(body)| body.refresh_token));

    let tokens = state.account_service.refresh(presented).await?;
    let jar = cookies::with_tokens(jar, &tokens, &state.cookies);

    Ok((
        jar,
        ApiSuccess::new(
            StatusCode::OK,
            RefreshTokenResponseData {
                access_token: tokens.access_token,
                refresh_token: tokens.refresh_token,
            },
        ),
    ))
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshTokenRequestBody {
    refresh_token: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshTokenResponseData {
    pub access_token: String,
    pub refresh_token: String,
}
