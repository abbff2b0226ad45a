use chrono::Duration;

use crate::jwt::Claims;
use crate::jwt::JwtError;
use crate::jwt::JwtHandler;
use crate::jwt::TokenKind;

/// Access and refresh token minted together for one user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Claims of a token that passed signature, expiry and kind checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedToken {
    pub user_id: String,
    pub kind: TokenKind,
    /// Expiration (Unix timestamp)
    pub expires_at: i64,
}

/// Issues and verifies the two session tokens.
///
/// Access and refresh tokens are signed with separate secrets and carry
/// separate lifetimes.
pub struct TokenService {
    access: JwtHandler,
    refresh: JwtHandler,
    access_lifetime: Duration,
    refresh_lifetime: Duration,
}

impl TokenService {
    pub const DEFAULT_ACCESS_LIFETIME_MINUTES: i64 = 15;
    pub const DEFAULT_REFRESH_LIFETIME_DAYS: i64 = 10;

    /// Create a token service with default lifetimes.
    ///
    /// # Arguments
    /// * `access_secret` - Signing secret for access tokens
    /// * `refresh_secret` - Signing secret for refresh tokens
    pub fn new(access_secret: &[u8], refresh_secret: &[u8]) -> Self {
        Self {
            access: JwtHandler::new(access_secret),
            refresh: JwtHandler::new(refresh_secret),
            access_lifetime: Duration::minutes(Self::DEFAULT_ACCESS_LIFETIME_MINUTES),
            refresh_lifetime: Duration::days(Self::DEFAULT_REFRESH_LIFETIME_DAYS),
        }
    }

    pub fn with_access_lifetime(mut self, lifetime: Duration) -> Self {
        self.access_lifetime = lifetime;
        self
    }

    pub fn with_refresh_lifetime(mut self, lifetime: Duration) -> Self {
        self.refresh_lifetime = lifetime;
        self
    }

    /// Sign a short-lived access token for `user_id`.
    ///
    /// # Errors
    /// * `EncodingFailed` - Signing key is unusable
    pub fn issue_access_token(&self, user_id: impl ToString) -> Result<String, JwtError> {
        let claims = Claims::new(user_id, TokenKind::Access, self.access_lifetime);
        self.access.encode(&claims)
    }

    /// Sign a long-lived refresh token for `user_id`.
    ///
    /// # Errors
    /// * `EncodingFailed` - Signing key is unusable
    pub fn issue_refresh_token(&self, user_id: impl ToString) -> Result<String, JwtError> {
        let claims = Claims::new(user_id, TokenKind::Refresh, self.refresh_lifetime);
        self.refresh.encode(&claims)
    }

    /// Sign a fresh access/refresh pair for `user_id`.
    pub fn issue_pair(&self, user_id: impl ToString) -> Result<TokenPair, JwtError> {
        let user_id = user_id.to_string();

        Ok(TokenPair {
            access_token: self.issue_access_token(&user_id)?,
            refresh_token: self.issue_refresh_token(&user_id)?,
        })
    }

    /// Verify `token` as a token of `expected` kind.
    ///
    /// # Errors
    /// * `InvalidToken` - Bad signature or malformed token
    /// * `TokenExpired` - Token is past its expiration
    /// * `UnexpectedKind` - Token verified but belongs to the other kind
    pub fn verify(&self, token: &str, expected: TokenKind) -> Result<VerifiedToken, JwtError> {
        let handler = match expected {
            TokenKind::Access => &self.access,
            TokenKind::Refresh => &self.refresh,
        };

        let claims: Claims = handler.decode(token)?;

        if claims.typ != expected {
            return Err(JwtError::UnexpectedKind {
                expected,
                actual: claims.typ,
            });
        }

        Ok(VerifiedToken {
            user_id: claims.sub,
            kind: claims.typ,
            expires_at: claims.exp,
        })
    }

    /// Sign arbitrary claims with the secret of their kind.
    pub fn encode_claims(&self, claims: &Claims) -> Result<String, JwtError> {
        match claims.typ {
            TokenKind::Access => self.access.encode(claims),
            TokenKind::Refresh => self.refresh.encode(claims),
        }
    }
}
