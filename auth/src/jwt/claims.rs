use std::fmt;

use chrono::Duration;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;
use uuid::Uuid;

/// Which of the two session tokens a set of claims belongs to.
///
/// Serialized into the `typ` claim so an access token can never be replayed
/// as a refresh token (or the other way round), even if both secrets were
/// configured to the same value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Access => f.write_str("access"),
            TokenKind::Refresh => f.write_str("refresh"),
        }
    }
}

/// Claims carried by both session tokens.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    /// Subject (user identifier)
    pub sub: String,

    /// Token kind
    pub typ: TokenKind,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration time (Unix timestamp)
    pub exp: i64,

    /// Unique token identifier, makes two tokens minted in the same second differ
    pub jti: String,
}

impl Claims {
    /// Create claims for `subject` that expire `lifetime` from now.
    ///
    /// # Arguments
    /// * `subject` - User identifier stored in `sub`
    /// * `kind` - Access or refresh
    /// * `lifetime` - Time until the token expires
    ///
    /// # Returns
    /// Claims with sub, typ, iat, exp and a random jti set
    pub fn new(subject: impl ToString, kind: TokenKind, lifetime: Duration) -> Self {
        let now = Utc::now();
        let expiration = now + lifetime;

        Self {
            sub: subject.to_string(),
            typ: kind,
            iat: now.timestamp(),
            exp: expiration.timestamp(),
            jti: Uuid::new_v4().to_string(),
        }
    }

    /// Override the expiration (Unix timestamp).
    pub fn with_expiration(mut self, exp: i64) -> Self {
        self.exp = exp;
        self
    }
}
