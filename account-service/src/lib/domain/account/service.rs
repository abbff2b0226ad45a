use std::sync::Arc;

use async_trait::async_trait;
use auth::AuthenticationError;
use auth::Authenticator;
use auth::TokenKind;
use auth::TokenPair;
use chrono::Utc;

use crate::account::errors::AccountError;
use crate::account::models::LoginCommand;
use crate::account::models::LoginOutcome;
use crate::account::models::RegisterUserCommand;
use crate::account::models::SanitizedUser;
use crate::account::models::User;
use crate::account::models::UserId;
use crate::account::models::UserIdentifier;
use crate::account::ports::AccountServicePort;
use crate::account::ports::MediaStore;
use crate::account::ports::UserRepository;

/// Domain service implementing the session lifecycle.
///
/// Stateless apart from its collaborators: every call runs against the
/// repository, and concurrent logins or refreshes for one user are not
/// coordinated (the last refresh-token write wins).
pub struct AccountService<UR, MS>
where
    UR: UserRepository,
    MS: MediaStore,
{
    repository: Arc<UR>,
    media_store: Arc<MS>,
    authenticator: Arc<Authenticator>,
}

impl<UR, MS> AccountService<UR, MS>
where
    UR: UserRepository,
    MS: MediaStore,
{
    /// Create a new account service with injected dependencies.
    ///
    /// # Arguments
    /// * `repository` - User persistence implementation
    /// * `media_store` - Avatar and cover image storage
    /// * `authenticator` - Password hashing and token issuance
    pub fn new(
        repository: Arc<UR>,
        media_store: Arc<MS>,
        authenticator: Arc<Authenticator>,
    ) -> Self {
        Self {
            repository,
            media_store,
            authenticator,
        }
    }

    /// Mint a token pair for `user_id` and make its refresh token the stored one.
    async fn rotate_tokens(&self, user_id: &UserId) -> Result<TokenPair, AccountError> {
        let tokens = self
            .authenticator
            .issue_tokens(user_id)
            .map_err(|e| AccountError::TokenGeneration(e.to_string()))?;

        self.repository
            .update_refresh_token(user_id, Some(tokens.refresh_token.clone()))
            .await?;

        Ok(tokens)
    }
}

#[async_trait]
impl<UR, MS> AccountServicePort for AccountService<UR, MS>
where
    UR: UserRepository,
    MS: MediaStore,
{
    async fn register(&self, command: RegisterUserCommand) -> Result<SanitizedUser, AccountError> {
        let identifier = UserIdentifier::from((&command.username, &command.email));
        if self
            .repository
            .find_by_username_or_email(&identifier)
            .await?
            .is_some()
        {
            return Err(AccountError::AlreadyExists);
        }

        let avatar = command.avatar.ok_or(AccountError::AvatarRequired)?;
        let avatar_url = self.media_store.upload(avatar).await?;

        let cover_image_url = match command.cover_image {
            Some(cover_image) => match self.media_store.upload(cover_image).await {
                Ok(url) => Some(url),
                Err(e) => {
                    tracing::warn!(
                        username = %command.username,
                        error = %e,
                        "Cover image upload failed, registering without it"
                    );
                    None
                }
            },
            None => None,
        };

        let password_hash = self
            .authenticator
            .hash_password(&command.password)
            .map_err(|e| AccountError::Password(e.to_string()))?;

        let now = Utc::now();
        let user = User {
            id: UserId::new(),
            username: command.username,
            email: command.email,
            full_name: command.full_name,
            avatar_url,
            cover_image_url,
            password_hash,
            refresh_token: None,
            created_at: now,
            updated_at: now,
        };

        let created_user = self.repository.create(user).await?;
        tracing::info!(
            user_id = %created_user.id,
            username = %created_user.username,
            "User registered"
        );

        Ok(created_user.sanitized())
    }

    async fn login(&self, command: LoginCommand) -> Result<LoginOutcome, AccountError> {
        let user = self
            .repository
            .find_by_username_or_email(&command.identifier)
            .await?
            .ok_or_else(|| AccountError::NotFound(command.identifier.to_string()))?;

        let tokens = self
            .authenticator
            .authenticate(&command.password, &user.password_hash, user.id)
            .map_err(|e| match e {
                AuthenticationError::InvalidCredentials => AccountError::InvalidCredentials,
                AuthenticationError::PasswordError(err) => {
                    AccountError::Password(err.to_string())
                }
                AuthenticationError::JwtError(err) => {
                    AccountError::TokenGeneration(err.to_string())
                }
            })?;

        self.repository
            .update_refresh_token(&user.id, Some(tokens.refresh_token.clone()))
            .await?;

        tracing::info!(user_id = %user.id, "User logged in");

        Ok(LoginOutcome {
            user: user.sanitized(),
            tokens,
        })
    }

    async fn logout(&self, user_id: &UserId) -> Result<(), AccountError> {
        // Known soft failure: the session is reported closed even if the
        // stored refresh token survives.
        if let Err(e) = self.repository.update_refresh_token(user_id, None).await {
            tracing::warn!(
                user_id = %user_id,
                error = %e,
                "Failed to clear stored refresh token on logout"
            );
        }

        tracing::info!(user_id = %user_id, "User logged out");
        Ok(())
    }

    async fn refresh(&self, presented: Option<String>) -> Result<TokenPair, AccountError> {
        let presented = presented
            .filter(|token| !token.trim().is_empty())
            .ok_or(AccountError::MissingRefreshToken)?;

        let verified = self
            .authenticator
            .verify_token(&presented, TokenKind::Refresh)
            .map_err(|e| {
                tracing::debug!(error = %e, "Refresh token rejected");
                AccountError::InvalidRefreshToken
            })?;

        let user_id = UserId::from_string(&verified.user_id)
            .map_err(|_| AccountError::InvalidRefreshToken)?;

        let user = self
            .repository
            .find_by_id(&user_id)
            .await?
            .ok_or(AccountError::InvalidRefreshToken)?;

        if user.refresh_token.as_deref() != Some(presented.as_str()) {
            tracing::warn!(
                user_id = %user.id,
                "Presented refresh token is not the stored one, possible reuse"
            );
            return Err(AccountError::InvalidRefreshToken);
        }

        let tokens = self.rotate_tokens(&user.id).await?;
        tracing::debug!(user_id = %user.id, "Token pair rotated");

        Ok(tokens)
    }

    async fn authenticate(&self, access_token: &str) -> Result<SanitizedUser, AccountError> {
        let verified = self
            .authenticator
            .verify_token(access_token, TokenKind::Access)
            .map_err(|e| {
                tracing::debug!(error = %e, "Access token rejected");
                AccountError::InvalidAccessToken
            })?;

        let user_id = UserId::from_string(&verified.user_id)
            .map_err(|_| AccountError::InvalidAccessToken)?;

        self.repository
            .find_by_id(&user_id)
            .await?
            .map(|user| user.sanitized())
            .ok_or(AccountError::InvalidAccessToken)
    }

    async fn current_user(&self, user_id: &UserId) -> Result<SanitizedUser, AccountError> {
        self.repository
            .find_by_id(user_id)
            .await?
            .map(|user| user.sanitized())
            .ok_or_else(|| AccountError::NotFound(user_id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use auth::Claims;
    use auth::TokenService;
    use chrono::Duration;
    use mockall::mock;

    use super::*;
    use crate::account::errors::MediaError;
    use crate::account::models::EmailAddress;
    use crate::account::models::MediaFile;
    use crate::account::models::Username;
    use crate::outbound::repositories::memory::InMemoryUserRepository;

    mock! {
        pub TestUserRepository {}

        #[async_trait]
        impl UserRepository for TestUserRepository {
            async fn create(&self, user: User) -> Result<User, AccountError>;
            async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, AccountError>;
            async fn find_by_username_or_email(&self, identifier: &UserIdentifier) -> Result<Option<User>, AccountError>;
            async fn update_refresh_token(&self, id: &UserId, refresh_token: Option<String>) -> Result<(), AccountError>;
        }
    }

    mock! {
        pub TestMediaStore {}

        #[async_trait]
        impl MediaStore for TestMediaStore {
            async fn upload(&self, file: MediaFile) -> Result<String, MediaError>;
        }
    }

    const ACCESS_SECRET: &[u8] = b"test_access_secret_at_least_32_bytes!";
    const REFRESH_SECRET: &[u8] = b"test_refresh_secret_at_least_32_byte!";

    fn authenticator() -> Arc<Authenticator> {
        Arc::new(Authenticator::new(TokenService::new(
            ACCESS_SECRET,
            REFRESH_SECRET,
        )))
    }

    /// Token of `kind` for `user_id` that expired a minute ago.
    fn expired_token(user_id: UserId, kind: TokenKind) -> String {
        let claims = Claims::new(user_id, kind, Duration::minutes(15))
            .with_expiration(Utc::now().timestamp() - 60);

        TokenService::new(ACCESS_SECRET, REFRESH_SECRET)
            .encode_claims(&claims)
            .unwrap()
    }

    fn media_store() -> MockTestMediaStore {
        let mut media_store = MockTestMediaStore::new();
        media_store
            .expect_upload()
            .returning(|file| Ok(format!("http://media.test/{}", file.file_name)));
        media_store
    }

    fn service_with(
        repository: MockTestUserRepository,
        media_store: MockTestMediaStore,
    ) -> AccountService<MockTestUserRepository, MockTestMediaStore> {
        AccountService::new(Arc::new(repository), Arc::new(media_store), authenticator())
    }

    fn avatar() -> Option<MediaFile> {
        Some(MediaFile::new(
            "avatar.png",
            Some("image/png".to_string()),
            vec![0x89, 0x50, 0x4e, 0x47],
        ))
    }

    fn register_command() -> RegisterUserCommand {
        RegisterUserCommand::new(
            "Alice Liddell".to_string(),
            "alice".to_string(),
            "a@x.com".to_string(),
            "p1".to_string(),
        )
        .unwrap()
        .with_avatar(avatar())
    }

    fn stored_user(authenticator: &Authenticator, password: &str) -> User {
        let now = Utc::now();
        User {
            id: UserId::new(),
            username: Username::new("alice".to_string()).unwrap(),
            email: EmailAddress::new("a@x.com".to_string()).unwrap(),
            full_name: "Alice Liddell".to_string(),
            avatar_url: "http://media.test/avatar.png".to_string(),
            cover_image_url: None,
            password_hash: authenticator.hash_password(password).unwrap(),
            refresh_token: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_register_success() {
        let mut repository = MockTestUserRepository::new();

        repository
            .expect_find_by_username_or_email()
            .withf(|identifier| {
                identifier.username.as_deref() == Some("alice")
                    && identifier.email.as_deref() == Some("a@x.com")
            })
            .times(1)
            .returning(|_| Ok(None));
        repository
            .expect_create()
            .withf(|user| {
                user.password_hash.starts_with("$argon2")
                    && user.password_hash != "p1"
                    && user.refresh_token.is_none()
            })
            .times(1)
            .returning(|user| Ok(user));

        let service = service_with(repository, media_store());

        let user = service.register(register_command()).await.unwrap();

        assert_eq!(user.username.as_str(), "alice");
        assert_eq!(user.full_name, "Alice Liddell");
        assert_eq!(user.avatar_url, "http://media.test/avatar.png");
        assert!(user.cover_image_url.is_none());
    }

    #[tokio::test]
    async fn test_register_conflict_creates_nothing() {
        let auth = authenticator();
        let existing = stored_user(&auth, "other");

        let mut repository = MockTestUserRepository::new();
        repository
            .expect_find_by_username_or_email()
            .times(1)
            .returning(move |_| Ok(Some(existing.clone())));
        repository.expect_create().times(0);

        let mut media_store = MockTestMediaStore::new();
        media_store.expect_upload().times(0);

        let service = AccountService::new(Arc::new(repository), Arc::new(media_store), auth);

        let result = service.register(register_command()).await;
        assert!(matches!(result, Err(AccountError::AlreadyExists)));
    }

    #[tokio::test]
    async fn test_register_requires_avatar() {
        let mut repository = MockTestUserRepository::new();
        repository
            .expect_find_by_username_or_email()
            .times(1)
            .returning(|_| Ok(None));
        repository.expect_create().times(0);

        let service = service_with(repository, media_store());

        let command = register_command().with_avatar(None);
        let result = service.register(command).await;

        assert!(matches!(result, Err(AccountError::AvatarRequired)));
    }

    #[tokio::test]
    async fn test_register_avatar_upload_failure_is_internal() {
        let mut repository = MockTestUserRepository::new();
        repository
            .expect_find_by_username_or_email()
            .returning(|_| Ok(None));
        repository.expect_create().times(0);

        let mut media_store = MockTestMediaStore::new();
        media_store
            .expect_upload()
            .times(1)
            .returning(|_| Err(MediaError::StorageFailed("disk full".to_string())));

        let service = service_with(repository, media_store);

        let result = service.register(register_command()).await;
        assert!(matches!(result, Err(AccountError::Media(_))));
    }

    #[tokio::test]
    async fn test_register_cover_upload_failure_is_tolerated() {
        let mut repository = MockTestUserRepository::new();
        repository
            .expect_find_by_username_or_email()
            .returning(|_| Ok(None));
        repository
            .expect_create()
            .times(1)
            .returning(|user| Ok(user));

        let mut media_store = MockTestMediaStore::new();
        media_store.expect_upload().times(2).returning(|file| {
            if file.file_name == "cover.png" {
                Err(MediaError::StorageFailed("disk full".to_string()))
            } else {
                Ok(format!("http://media.test/{}", file.file_name))
            }
        });

        let service = service_with(repository, media_store);

        let command = register_command()
            .with_cover_image(Some(MediaFile::new("cover.png", None, vec![1, 2, 3])));
        let user = service.register(command).await.unwrap();

        assert!(user.cover_image_url.is_none());
    }

    #[tokio::test]
    async fn test_login_success_stores_refresh_token() {
        let auth = authenticator();
        let user = stored_user(&auth, "p1");
        let user_id = user.id;

        let mut repository = MockTestUserRepository::new();
        repository
            .expect_find_by_username_or_email()
            .withf(|identifier| identifier.username.as_deref() == Some("alice"))
            .times(1)
            .returning(move |_| Ok(Some(user.clone())));
        repository
            .expect_update_refresh_token()
            .withf(move |id, token| *id == user_id && token.is_some())
            .times(1)
            .returning(|_, _| Ok(()));

        let service =
            AccountService::new(Arc::new(repository), Arc::new(media_store()), auth.clone());

        let command = LoginCommand::new(Some("Alice".to_string()), None, "p1".to_string()).unwrap();
        let outcome = service.login(command).await.unwrap();

        assert_eq!(outcome.user.id, user_id);
        let access = auth
            .verify_token(&outcome.tokens.access_token, TokenKind::Access)
            .unwrap();
        assert_eq!(access.user_id, user_id.to_string());
    }

    #[tokio::test]
    async fn test_login_unknown_user() {
        let mut repository = MockTestUserRepository::new();
        repository
            .expect_find_by_username_or_email()
            .times(1)
            .returning(|_| Ok(None));

        let service = service_with(repository, media_store());

        let command =
            LoginCommand::new(None, Some("nobody@x.com".to_string()), "p1".to_string()).unwrap();
        let result = service.login(command).await;

        assert!(matches!(result, Err(AccountError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_login_wrong_password() {
        let auth = authenticator();
        let user = stored_user(&auth, "p1");

        let mut repository = MockTestUserRepository::new();
        repository
            .expect_find_by_username_or_email()
            .returning(move |_| Ok(Some(user.clone())));
        repository.expect_update_refresh_token().times(0);

        let service = AccountService::new(Arc::new(repository), Arc::new(media_store()), auth);

        let command = LoginCommand::new(Some("alice".to_string()), None, "p2".to_string()).unwrap();
        let result = service.login(command).await;

        assert!(matches!(result, Err(AccountError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn test_logout_clears_refresh_token() {
        let user_id = UserId::new();

        let mut repository = MockTestUserRepository::new();
        repository
            .expect_update_refresh_token()
            .withf(move |id, token| *id == user_id && token.is_none())
            .times(1)
            .returning(|_, _| Ok(()));

        let service = service_with(repository, media_store());

        assert!(service.logout(&user_id).await.is_ok());
    }

    #[tokio::test]
    async fn test_logout_succeeds_when_store_fails() {
        let mut repository = MockTestUserRepository::new();
        repository
            .expect_update_refresh_token()
            .times(1)
            .returning(|_, _| Err(AccountError::DatabaseError("connection reset".to_string())));

        let service = service_with(repository, media_store());

        assert!(service.logout(&UserId::new()).await.is_ok());
    }

    #[tokio::test]
    async fn test_refresh_without_token() {
        let service = AccountService::new(
            Arc::new(MockTestUserRepository::new()),
            Arc::new(media_store()),
            authenticator(),
        );

        let result = service.refresh(None).await;
        assert!(matches!(result, Err(AccountError::MissingRefreshToken)));

        let result = service.refresh(Some("  ".to_string())).await;
        assert!(matches!(result, Err(AccountError::MissingRefreshToken)));
    }

    #[tokio::test]
    async fn test_refresh_with_garbage_token() {
        let mut repository = MockTestUserRepository::new();
        repository.expect_find_by_id().times(0);

        let service = service_with(repository, media_store());

        let result = service.refresh(Some("not.a.token".to_string())).await;
        assert!(matches!(result, Err(AccountError::InvalidRefreshToken)));
    }

    #[tokio::test]
    async fn test_refresh_rejects_access_token() {
        let auth = authenticator();
        let user_id = UserId::new();
        let pair = auth.issue_tokens(user_id).unwrap();

        let service = AccountService::new(
            Arc::new(MockTestUserRepository::new()),
            Arc::new(media_store()),
            auth,
        );

        let result = service.refresh(Some(pair.access_token)).await;
        assert!(matches!(result, Err(AccountError::InvalidRefreshToken)));
    }

    #[tokio::test]
    async fn test_refresh_for_missing_user() {
        let auth = authenticator();
        let pair = auth.issue_tokens(UserId::new()).unwrap();

        let mut repository = MockTestUserRepository::new();
        repository
            .expect_find_by_id()
            .times(1)
            .returning(|_| Ok(None));

        let service = AccountService::new(Arc::new(repository), Arc::new(media_store()), auth);

        let result = service.refresh(Some(pair.refresh_token)).await;
        assert!(matches!(result, Err(AccountError::InvalidRefreshToken)));
    }

    #[tokio::test]
    async fn test_refresh_detects_superseded_token() {
        let auth = authenticator();
        let mut user = stored_user(&auth, "p1");
        let stale = auth.issue_tokens(user.id).unwrap();
        let current = auth.issue_tokens(user.id).unwrap();
        user.refresh_token = Some(current.refresh_token);

        let mut repository = MockTestUserRepository::new();
        repository
            .expect_find_by_id()
            .times(1)
            .returning(move |_| Ok(Some(user.clone())));
        repository.expect_update_refresh_token().times(0);

        let service = AccountService::new(Arc::new(repository), Arc::new(media_store()), auth);

        let result = service.refresh(Some(stale.refresh_token)).await;
        assert!(matches!(result, Err(AccountError::InvalidRefreshToken)));
    }

    #[tokio::test]
    async fn test_refresh_with_expired_token() {
        let auth = authenticator();
        let mut user = stored_user(&auth, "p1");
        let expired = expired_token(user.id, TokenKind::Refresh);
        // Still the stored token: only the expiry can reject it
        user.refresh_token = Some(expired.clone());

        let mut repository = MockTestUserRepository::new();
        repository
            .expect_find_by_id()
            .returning(move |_| Ok(Some(user.clone())));
        repository.expect_update_refresh_token().times(0);

        let service = AccountService::new(Arc::new(repository), Arc::new(media_store()), auth);

        let result = service.refresh(Some(expired)).await;
        assert!(matches!(result, Err(AccountError::InvalidRefreshToken)));
    }

    #[tokio::test]
    async fn test_refresh_after_logout() {
        let auth = authenticator();
        let user = stored_user(&auth, "p1");
        let pair = auth.issue_tokens(user.id).unwrap();

        let mut repository = MockTestUserRepository::new();
        repository
            .expect_find_by_id()
            .returning(move |_| Ok(Some(user.clone())));

        let service = AccountService::new(Arc::new(repository), Arc::new(media_store()), auth);

        let result = service.refresh(Some(pair.refresh_token)).await;
        assert!(matches!(result, Err(AccountError::InvalidRefreshToken)));
    }

    #[tokio::test]
    async fn test_authenticate_access_token() {
        let auth = authenticator();
        let user = stored_user(&auth, "p1");
        let user_id = user.id;
        let pair = auth.issue_tokens(user_id).unwrap();

        let mut repository = MockTestUserRepository::new();
        repository
            .expect_find_by_id()
            .withf(move |id| *id == user_id)
            .returning(move |_| Ok(Some(user.clone())));

        let service = AccountService::new(Arc::new(repository), Arc::new(media_store()), auth);

        let resolved = service.authenticate(&pair.access_token).await.unwrap();
        assert_eq!(resolved.id, user_id);

        let result = service.authenticate(&pair.refresh_token).await;
        assert!(matches!(result, Err(AccountError::InvalidAccessToken)));
    }

    #[tokio::test]
    async fn test_authenticate_expired_access_token() {
        let auth = authenticator();
        let user = stored_user(&auth, "p1");
        let expired = expired_token(user.id, TokenKind::Access);

        let mut repository = MockTestUserRepository::new();
        repository
            .expect_find_by_id()
            .returning(move |_| Ok(Some(user.clone())));

        let service = AccountService::new(Arc::new(repository), Arc::new(media_store()), auth);

        let result = service.authenticate(&expired).await;
        assert!(matches!(result, Err(AccountError::InvalidAccessToken)));
    }

    #[tokio::test]
    async fn test_current_user_not_found() {
        let mut repository = MockTestUserRepository::new();
        repository.expect_find_by_id().returning(|_| Ok(None));

        let service = service_with(repository, media_store());

        let result = service.current_user(&UserId::new()).await;
        assert!(matches!(result, Err(AccountError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_register_login_refresh_rotation_scenario() {
        let repository = Arc::new(InMemoryUserRepository::new());
        let service =
            AccountService::new(repository.clone(), Arc::new(media_store()), authenticator());

        let registered = service.register(register_command()).await.unwrap();
        let stored = repository.find_by_id(&registered.id).await.unwrap().unwrap();
        assert_ne!(stored.password_hash, "p1");

        let login = LoginCommand::new(Some("alice".to_string()), None, "p1".to_string()).unwrap();
        let t1 = service.login(login).await.unwrap().tokens;

        let t2 = service.refresh(Some(t1.refresh_token.clone())).await.unwrap();
        assert_ne!(t2.refresh_token, t1.refresh_token);

        let reuse = service.refresh(Some(t1.refresh_token)).await;
        assert!(matches!(reuse, Err(AccountError::InvalidRefreshToken)));

        let t3 = service.refresh(Some(t2.refresh_token)).await;
        assert!(t3.is_ok());
    }

    #[tokio::test]
    async fn test_duplicate_email_scenario() {
        let repository = Arc::new(InMemoryUserRepository::new());
        let service = AccountService::new(repository, Arc::new(media_store()), authenticator());

        service.register(register_command()).await.unwrap();

        let command = RegisterUserCommand::new(
            "Alice Again".to_string(),
            "alice2".to_string(),
            "a@x.com".to_string(),
            "p2".to_string(),
        )
        .unwrap()
        .with_avatar(avatar());

        let result = service.register(command).await;
        assert!(matches!(result, Err(AccountError::AlreadyExists)));
    }
}
