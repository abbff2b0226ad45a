use thiserror::Error;

/// Error for UserId parsing failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum UserIdError {
    #[error("Invalid UUID format: {0}")]
    InvalidFormat(String),
}

/// Error for Username validation failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum UsernameError {
    #[error("Username too short: minimum {min} characters, got {actual}")]
    TooShort { min: usize, actual: usize },

    #[error("Username too long: maximum {max} characters, got {actual}")]
    TooLong { max: usize, actual: usize },

    #[error(
        "Username contains invalid characters (only alphanumeric, underscore, and hyphen allowed)"
    )]
    InvalidCharacters,
}

/// Error for EmailAddress validation failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EmailError {
    #[error("Invalid email format: {0}")]
    InvalidFormat(String),
}

/// Error for media upload operations
#[derive(Debug, Clone, Error)]
pub enum MediaError {
    #[error("Failed to store media file: {0}")]
    StorageFailed(String),
}

/// Transport-independent classification of account errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Unauthorized,
    NotFound,
    Conflict,
    Internal,
}

/// Top-level error for all account operations
#[derive(Debug, Clone, Error)]
pub enum AccountError {
    // Input validation
    #[error("Invalid username: {0}")]
    InvalidUsername(#[from] UsernameError),

    #[error("Invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    #[error("All fields are required: {0} is blank")]
    MissingField(&'static str),

    #[error("Username or email is required")]
    MissingIdentifier,

    #[error("Avatar file is required")]
    AvatarRequired,

    // Domain-level errors
    #[error("User with this username or email already exists")]
    AlreadyExists,

    #[error("User not found: {0}")]
    NotFound(String),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Unauthorized request")]
    MissingRefreshToken,

    #[error("Refresh token is expired or invalid")]
    InvalidRefreshToken,

    #[error("Access token is expired or invalid")]
    InvalidAccessToken,

    // Infrastructure errors
    #[error("Error while generating access and refresh token: {0}")]
    TokenGeneration(String),

    #[error("Password hashing failed: {0}")]
    Password(String),

    #[error("Media error: {0}")]
    Media(#[from] MediaError),

    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl AccountError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AccountError::InvalidUsername(_)
            | AccountError::InvalidEmail(_)
            | AccountError::MissingField(_)
            | AccountError::MissingIdentifier
            | AccountError::AvatarRequired => ErrorKind::Validation,
            AccountError::InvalidCredentials
            | AccountError::MissingRefreshToken
            | AccountError::InvalidRefreshToken
            | AccountError::InvalidAccessToken => ErrorKind::Unauthorized,
            AccountError::NotFound(_) => ErrorKind::NotFound,
            AccountError::AlreadyExists => ErrorKind::Conflict,
            AccountError::TokenGeneration(_)
            | AccountError::Password(_)
            | AccountError::Media(_)
            | AccountError::DatabaseError(_) => ErrorKind::Internal,
        }
    }
}
