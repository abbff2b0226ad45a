use async_trait::async_trait;
use auth::TokenPair;

use crate::account::errors::AccountError;
use crate::account::errors::MediaError;
use crate::account::models::LoginCommand;
use crate::account::models::LoginOutcome;
use crate::account::models::MediaFile;
use crate::account::models::RegisterUserCommand;
use crate::account::models::SanitizedUser;
use crate::account::models::User;
use crate::account::models::UserId;
use crate::account::models::UserIdentifier;

/// Port for the session lifecycle: registration, login, logout and refresh.
#[async_trait]
pub trait AccountServicePort: Send + Sync + 'static {
    /// Register a new user.
    ///
    /// # Arguments
    /// * `command` - Validated registration fields plus uploaded images
    ///
    /// # Returns
    /// The created user without password hash or refresh token
    ///
    /// # Errors
    /// * `AlreadyExists` - Username or email is already taken
    /// * `AvatarRequired` - No avatar was uploaded
    /// * `Media` - Avatar upload failed
    /// * `DatabaseError` - Database operation failed
    async fn register(&self, command: RegisterUserCommand) -> Result<SanitizedUser, AccountError>;

    /// Verify credentials and start a session.
    ///
    /// # Returns
    /// Sanitized user plus a fresh token pair whose refresh token is now the
    /// one stored on the user
    ///
    /// # Errors
    /// * `NotFound` - No user matches the username or email
    /// * `InvalidCredentials` - Password does not match
    /// * `TokenGeneration` - Tokens could not be signed
    async fn login(&self, command: LoginCommand) -> Result<LoginOutcome, AccountError>;

    /// End the session of `user_id` by clearing its stored refresh token.
    ///
    /// A failure to persist the clear is logged and otherwise ignored.
    async fn logout(&self, user_id: &UserId) -> Result<(), AccountError>;

    /// Exchange the current refresh token for a new token pair.
    ///
    /// # Errors
    /// * `MissingRefreshToken` - No token presented
    /// * `InvalidRefreshToken` - Token is invalid, expired, or no longer the
    ///   one stored on the user
    /// * `TokenGeneration` - Tokens could not be signed
    async fn refresh(&self, presented: Option<String>) -> Result<TokenPair, AccountError>;

    /// Resolve the user behind an access token.
    ///
    /// # Errors
    /// * `InvalidAccessToken` - Token is invalid or expired, or its user is gone
    async fn authenticate(&self, access_token: &str) -> Result<SanitizedUser, AccountError>;

    /// Retrieve the sanitized record of `user_id`.
    ///
    /// # Errors
    /// * `NotFound` - User does not exist
    async fn current_user(&self, user_id: &UserId) -> Result<SanitizedUser, AccountError>;
}

/// Persistence operations for the user aggregate.
#[async_trait]
pub trait UserRepository: Send + Sync + 'static {
    /// Persist new user to storage.
    ///
    /// # Errors
    /// * `AlreadyExists` - Username or email is already taken
    /// * `DatabaseError` - Database operation failed
    async fn create(&self, user: User) -> Result<User, AccountError>;

    /// Retrieve user by identifier.
    ///
    /// # Errors
    /// * `DatabaseError` - Database operation failed
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, AccountError>;

    /// Retrieve the first user whose username or email matches.
    ///
    /// # Errors
    /// * `DatabaseError` - Database operation failed
    async fn find_by_username_or_email(
        &self,
        identifier: &UserIdentifier,
    ) -> Result<Option<User>, AccountError>;

    /// Replace the stored refresh token; `None` clears it.
    ///
    /// # Errors
    /// * `NotFound` - User does not exist
    /// * `DatabaseError` - Database operation failed
    async fn update_refresh_token(
        &self,
        id: &UserId,
        refresh_token: Option<String>,
    ) -> Result<(), AccountError>;
}

/// Remote storage for avatar and cover images.
#[async_trait]
pub trait MediaStore: Send + Sync + 'static {
    /// Store `file` and return the URL it is reachable at.
    ///
    /// # Errors
    /// * `StorageFailed` - The file could not be written
    async fn upload(&self, file: MediaFile) -> Result<String, MediaError>;
}
