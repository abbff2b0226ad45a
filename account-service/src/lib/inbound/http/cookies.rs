use auth::TokenPair;
use axum_extra::extract::cookie::Cookie;
use axum_extra::extract::cookie::CookieJar;

use crate::config::CookieConfig;

pub const ACCESS_TOKEN_COOKIE: &str = "accessToken";
pub const REFRESH_TOKEN_COOKIE: &str = "refreshToken";

fn session_cookie(name: &'static str, value: String, config: &CookieConfig) -> Cookie<'static> {
    Cookie::build((name, value))
        .http_only(config.http_only)
        .secure(config.secure)
        .path(config.path.clone())
        .build()
}

/// Set both session cookies from a freshly issued token pair.
pub fn with_tokens(jar: CookieJar, tokens: &TokenPair, config: &CookieConfig) -> CookieJar {
    jar.add(session_cookie(
        ACCESS_TOKEN_COOKIE,
        tokens.access_token.clone(),
        config,
    ))
    .add(session_cookie(
        REFRESH_TOKEN_COOKIE,
        tokens.refresh_token.clone(),
        config,
    ))
}

/// Expire both session cookies.
///
/// Removal cookies are emitted even when the request carried none.
pub fn cleared(jar: CookieJar, config: &CookieConfig) -> CookieJar {
    [ACCESS_TOKEN_COOKIE, REFRESH_TOKEN_COOKIE]
        .into_iter()
        .fold(jar, |jar, name| {
            let mut cookie = session_cookie(name, String::new(), config);
            cookie.make_removal();
            jar.add(cookie)
        })
}

/// Non-empty value of cookie `name`, if present.
pub fn value(jar: &CookieJar, name: &str) -> Option<String> {
    jar.get(name)
        .map(|cookie| cookie.value().to_string())
        .filter(|value| !value.trim().is_empty())
}
