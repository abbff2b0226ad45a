use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;
use serde::Serialize;

use super::ApiError;
use super::ApiSuccess;
use super::UserData;
use crate::account::models::LoginCommand;
use crate::inbound::http::cookies;
use crate::inbound::http::router::AppState;

pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(body): Json<LoginRequestBody>,
) -> Result<(CookieJar, ApiSuccess<LoginResponseData>), ApiError> {
    let command = LoginCommand::new(body.user_name, body.email, body.password)?;
    let outcome = state.account_service.login(command).await?;

    let jar = cookies::with_tokens(jar, &outcome.tokens, &state.cookies);

    Ok((
        jar,
        ApiSuccess::new(
            StatusCode::OK,
            LoginResponseData {
                user: (&outcome.user).into(),
                access_token: outcome.tokens.access_token,
                refresh_token: outcome.tokens.refresh_token,
            },
        ),
    ))
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequestBody {
    user_name: Option<String>,
    email: Option<String>,
    #[serde(default)]
    password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponseData {
    pub user: UserData,
    pub access_token: String,
    pub refresh_token: String,
}
