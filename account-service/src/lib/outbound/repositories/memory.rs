use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::account::errors::AccountError;
use crate::account::models::User;
use crate::account::models::UserId;
use crate::account::models::UserIdentifier;
use crate::account::ports::UserRepository;

/// Process-local user store.
///
/// Enforces the same username / email uniqueness as the Postgres schema.
#[derive(Default)]
pub struct InMemoryUserRepository {
    users: RwLock<HashMap<UserId, User>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.users.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.users.read().await.is_empty()
    }
}

fn identifies(user: &User, identifier: &UserIdentifier) -> bool {
    identifier.username.as_deref() == Some(user.username.as_str())
        || identifier.email.as_deref() == Some(user.email.as_str())
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn create(&self, user: User) -> Result<User, AccountError> {
        let mut users = self.users.write().await;

        let identifier = UserIdentifier::from((&user.username, &user.email));
        if users.values().any(|existing| identifies(existing, &identifier)) {
            return Err(AccountError::AlreadyExists);
        }

        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, AccountError> {
        Ok(self.users.read().await.get(id).cloned())
    }

    async fn find_by_username_or_email(
        &self,
        identifier: &UserIdentifier,
    ) -> Result<Option<User>, AccountError> {
        let users = self.users.read().await;

        Ok(users
            .values()
            .filter(|user| identifies(user, identifier))
            .min_by_key(|user| user.created_at)
            .cloned())
    }

    async fn update_refresh_token(
        &self,
        id: &UserId,
        refresh_token: Option<String>,
    ) -> Result<(), AccountError> {
        let mut users = self.users.write().await;

        let user = users
            .get_mut(id)
            .ok_or_else(|| AccountError::NotFound(id.to_string()))?;
        user.refresh_token = refresh_token;
        user.updated_at = Utc::now();

        Ok(())
    }
}
