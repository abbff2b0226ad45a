//! Credential and session-token primitives
//!
//! - Password hashing (Argon2id)
//! - Access / refresh JWT issuance and verification, each kind signed with
//!   its own secret and lifetime
//! - An `Authenticator` that ties password checks to token issuance
//!
//! # Examples
//!
//! ## Password Hashing
//! ```
//! use auth::PasswordHasher;
//!
//! let hasher = PasswordHasher::new();
//! let hash = hasher.hash("my_password").unwrap();
//! assert!(hasher.verify("my_password", &hash).unwrap());
//! ```
//!
//! ## Session Tokens
//! ```
//! use auth::{TokenKind, TokenService};
//!
//! let tokens = TokenService::new(
//!     b"access_secret_at_least_32_bytes_long!",
//!     b"refresh_secret_at_least_32_bytes_long",
//! );
//! let pair = tokens.issue_pair("user123").unwrap();
//! let verified = tokens.verify(&pair.refresh_token, TokenKind::Refresh).unwrap();
//! assert_eq!(verified.user_id, "user123");
//! ```
//!
//! ## Login
//! ```
//! use auth::{Authenticator, TokenService};
//!
//! let auth = Authenticator::new(TokenService::new(
//!     b"access_secret_at_least_32_bytes_long!",
//!     b"refresh_secret_at_least_32_bytes_long",
//! ));
//!
//! let hash = auth.hash_password("password123").unwrap();
//! let pair = auth.authenticate("password123", &hash, "user123").unwrap();
//! assert_ne!(pair.access_token, pair.refresh_token);
//! ```

pub mod authenticator;
pub mod jwt;
pub mod password;
pub mod tokens;

pub use authenticator::AuthenticationError;
pub use authenticator::Authenticator;
pub use jwt::Claims;
pub use jwt::JwtError;
pub use jwt::JwtHandler;
pub use jwt::TokenKind;
pub use password::PasswordError;
pub use password::PasswordHasher;
pub use tokens::TokenPair;
pub use tokens::TokenService;
pub use tokens::VerifiedToken;
