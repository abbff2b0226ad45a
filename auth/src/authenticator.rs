use crate::jwt::JwtError;
use crate::jwt::TokenKind;
use crate::password::PasswordError;
use crate::password::PasswordHasher;
use crate::tokens::TokenPair;
use crate::tokens::TokenService;
use crate::tokens::VerifiedToken;

/// Authentication coordinator combining password verification and token issuance.
pub struct Authenticator {
    password_hasher: PasswordHasher,
    tokens: TokenService,
}

/// Authentication operation errors.
#[derive(Debug, thiserror::Error)]
pub enum AuthenticationError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Password error: {0}")]
    PasswordError(#[from] PasswordError),

    #[error("JWT error: {0}")]
    JwtError(#[from] JwtError),
}

impl Authenticator {
    /// Create a new authenticator around a configured token service.
    pub fn new(tokens: TokenService) -> Self {
        Self {
            password_hasher: PasswordHasher::new(),
            tokens,
        }
    }

    /// Hash a password for storage.
    ///
    /// # Errors
    /// * `PasswordError` - Hashing operation failed
    pub fn hash_password(&self, password: &str) -> Result<String, PasswordError> {
        self.password_hasher.hash(password)
    }

    /// Verify credentials and mint a token pair for `user_id`.
    ///
    /// # Arguments
    /// * `password` - Plaintext password to verify
    /// * `stored_hash` - Stored password hash
    /// * `user_id` - Subject of the issued tokens
    ///
    /// # Errors
    /// * `InvalidCredentials` - Password does not match
    /// * `PasswordError` - Stored hash could not be parsed
    /// * `JwtError` - Token generation failed
    pub fn authenticate(
        &self,
        password: &str,
        stored_hash: &str,
        user_id: impl ToString,
    ) -> Result<TokenPair, AuthenticationError> {
        let is_valid = self.password_hasher.verify(password, stored_hash)?;

        if !is_valid {
            return Err(AuthenticationError::InvalidCredentials);
        }

        Ok(self.tokens.issue_pair(user_id)?)
    }

    /// Mint a token pair without password verification.
    ///
    /// Used by the refresh flow, where possession of the current refresh
    /// token stands in for the password.
    pub fn issue_tokens(&self, user_id: impl ToString) -> Result<TokenPair, JwtError> {
        self.tokens.issue_pair(user_id)
    }

    /// Verify a token of the expected kind.
    pub fn verify_token(&self, token: &str, kind: TokenKind) -> Result<VerifiedToken, JwtError> {
        self.tokens.verify(token, kind)
    }
}
