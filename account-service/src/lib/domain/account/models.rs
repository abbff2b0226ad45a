use std::fmt;
use std::str::FromStr;

use auth::TokenPair;
use chrono::DateTime;
use chrono::Utc;
use uuid::Uuid;

use crate::account::errors::AccountError;
use crate::account::errors::EmailError;
use crate::account::errors::UserIdError;
use crate::account::errors::UsernameError;

/// User aggregate entity.
///
/// Holds credentials and the single active refresh token. Never leaves the
/// domain as is; see [`SanitizedUser`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub username: Username,
    pub email: EmailAddress,
    pub full_name: String,
    pub avatar_url: String,
    pub cover_image_url: Option<String>,
    pub password_hash: String,
    pub refresh_token: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Copy of the user without password hash and refresh token.
    pub fn sanitized(&self) -> SanitizedUser {
        SanitizedUser {
            id: self.id,
            username: self.username.clone(),
            email: self.email.clone(),
            full_name: self.full_name.clone(),
            avatar_url: self.avatar_url.clone(),
            cover_image_url: self.cover_image_url.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// User record safe for external exposure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SanitizedUser {
    pub id: UserId,
    pub username: Username,
    pub email: EmailAddress,
    pub full_name: String,
    pub avatar_url: String,
    pub cover_image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// User unique identifier type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UserId(pub Uuid);

impl UserId {
    /// Generate a new random user ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse a user ID from string.
    ///
    /// # Errors
    /// * `InvalidFormat` - String is not a valid UUID
    pub fn from_string(s: &str) -> Result<Self, UserIdError> {
        Uuid::parse_str(s)
            .map(UserId)
            .map_err(|e| UserIdError::InvalidFormat(e.to_string()))
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Username value type
///
/// Stored lower-cased; 3-32 characters of alphanumerics, underscore and hyphen.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Username(String);

impl Username {
    const MIN_LENGTH: usize = 3;
    const MAX_LENGTH: usize = 32;

    /// Create a new valid username, trimmed and lower-cased.
    ///
    /// # Errors
    /// * `TooShort` - Username shorter than 3 characters
    /// * `TooLong` - Username longer than 32 characters
    /// * `InvalidCharacters` - Contains non-alphanumeric characters (except _ and -)
    pub fn new(username: String) -> Result<Self, UsernameError> {
        let username = username.trim().to_lowercase();
        let username = Self::with_valid_length(username)?;
        let username = Self::with_valid_chars(username)?;
        Ok(Self(username))
    }

    fn with_valid_length(username: String) -> Result<String, UsernameError> {
        let length = username.chars().count();
        if length < Self::MIN_LENGTH {
            Err(UsernameError::TooShort {
                min: Self::MIN_LENGTH,
                actual: length,
            })
        } else if length > Self::MAX_LENGTH {
            Err(UsernameError::TooLong {
                max: Self::MAX_LENGTH,
                actual: length,
            })
        } else {
            Ok(username)
        }
    }

    fn with_valid_chars(username: String) -> Result<String, UsernameError> {
        if username
            .chars()
            .all(|c| c.is_alphanumeric() || c == '_' || c == '-')
        {
            Ok(username)
        } else {
            Err(UsernameError::InvalidCharacters)
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Email address type
///
/// Validates email format using RFC 5322 compliant parser.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EmailAddress(String);

impl EmailAddress {
    /// Create a new validated, trimmed email address.
    ///
    /// # Errors
    /// * `InvalidFormat` - Email does not conform to RFC 5322
    pub fn new(email: String) -> Result<Self, EmailError> {
        let email = email.trim().to_string();
        email_address::EmailAddress::from_str(&email)
            .map(|_| EmailAddress(email))
            .map_err(|e| EmailError::InvalidFormat(e.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// An uploaded file as received from the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaFile {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl MediaFile {
    pub fn new(file_name: impl Into<String>, content_type: Option<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            content_type,
            bytes,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Username and/or email used to look a user up.
///
/// A user matches when either present field matches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserIdentifier {
    pub username: Option<String>,
    pub email: Option<String>,
}

impl UserIdentifier {
    /// Build an identifier, dropping blank parts.
    ///
    /// # Errors
    /// * `MissingIdentifier` - Neither a username nor an email was supplied
    pub fn new(username: Option<String>, email: Option<String>) -> Result<Self, AccountError> {
        let username = username
            .map(|u| u.trim().to_lowercase())
            .filter(|u| !u.is_empty());
        let email = email
            .map(|e| e.trim().to_string())
            .filter(|e| !e.is_empty());

        if username.is_none() && email.is_none() {
            return Err(AccountError::MissingIdentifier);
        }

        Ok(Self { username, email })
    }
}

impl From<(&Username, &EmailAddress)> for UserIdentifier {
    fn from((username, email): (&Username, &EmailAddress)) -> Self {
        Self {
            username: Some(username.as_str().to_string()),
            email: Some(email.as_str().to_string()),
        }
    }
}

impl fmt::Display for UserIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.username, &self.email) {
            (Some(username), Some(email)) => write!(f, "{} / {}", username, email),
            (Some(username), None) => username.fmt(f),
            (None, Some(email)) => email.fmt(f),
            (None, None) => Ok(()),
        }
    }
}

/// Command to register a new user with validated fields.
#[derive(Debug)]
pub struct RegisterUserCommand {
    pub full_name: String,
    pub username: Username,
    pub email: EmailAddress,
    pub password: String,
    pub avatar: Option<MediaFile>,
    pub cover_image: Option<MediaFile>,
}

impl RegisterUserCommand {
    /// Validate raw registration fields.
    ///
    /// Blank checks run first, in form order, so the caller learns which
    /// required field is missing before any format error.
    ///
    /// # Errors
    /// * `MissingField` - A required field is empty after trimming
    /// * `InvalidUsername` / `InvalidEmail` - Field present but malformed
    pub fn new(
        full_name: String,
        username: String,
        email: String,
        password: String,
    ) -> Result<Self, AccountError> {
        let required = [
            ("fullName", &full_name),
            ("userName", &username),
            ("email", &email),
            ("password", &password),
        ];
        if let Some((field, _)) = required.iter().find(|(_, value)| value.trim().is_empty()) {
            return Err(AccountError::MissingField(*field));
        }

        Ok(Self {
            full_name: full_name.trim().to_string(),
            username: Username::new(username)?,
            email: EmailAddress::new(email)?,
            password,
            avatar: None,
            cover_image: None,
        })
    }

    /// Attach the avatar; empty uploads count as absent.
    pub fn with_avatar(mut self, avatar: Option<MediaFile>) -> Self {
        self.avatar = avatar.filter(|file| !file.is_empty());
        self
    }

    /// Attach the optional cover image; empty uploads count as absent.
    pub fn with_cover_image(mut self, cover_image: Option<MediaFile>) -> Self {
        self.cover_image = cover_image.filter(|file| !file.is_empty());
        self
    }
}

/// Command to log in with username or email plus password.
#[derive(Debug)]
pub struct LoginCommand {
    pub identifier: UserIdentifier,
    pub password: String,
}

impl LoginCommand {
    /// # Errors
    /// * `MissingIdentifier` - Neither a username nor an email was supplied
    pub fn new(
        username: Option<String>,
        email: Option<String>,
        password: String,
    ) -> Result<Self, AccountError> {
        Ok(Self {
            identifier: UserIdentifier::new(username, email)?,
            password,
        })
    }
}

/// Result of a successful login.
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub user: SanitizedUser,
    pub tokens: TokenPair,
}
