use axum::extract::State;
use axum::http::StatusCode;
use axum::Extension;
use axum_extra::extract::cookie::CookieJar;

use super::ApiError;
use super::ApiSuccess;
use super::EmptyData;
use crate::inbound::http::cookies;
use crate::inbound::http::middleware::AuthenticatedUser;
use crate::inbound::http::router::AppState;

pub async fn logout(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(user)): Extension<AuthenticatedUser>,
    jar: CookieJar,
) -> Result<(CookieJar, ApiSuccess<EmptyData>), ApiError> {
    state.account_service.logout(&user.id).await?;

    Ok((
        cookies::cleared(jar, &state.cookies),
        ApiSuccess::new(StatusCode::OK, EmptyData {}),
    ))
}
