//! Local accounts backing identity-provider sign-ins.

use std::sync::Arc;

use chrono::Utc;

use crate::domain::{Actor, User, normalize_email};
use crate::error::{DomainError, FieldError, RepoError};
use crate::ports::UserRepository;

use super::{char_len, require_user};

const NAME_MAX_CHARS: usize = 100;

/// Profile asserted by the identity provider after a successful OAuth login.
#[derive(Debug, Clone)]
pub struct SignInProfile {
    pub email: String,
    pub name: String,
    pub image: Option<String>,
}

pub struct AccountService {
    users: Arc<dyn UserRepository>,
}

impl AccountService {
    pub fn new(users: Arc<dyn UserRepository>) -> Self {
        Self { users }
    }

    /// Create the account on first sign-in, otherwise refresh `last_login`.
    pub async fn sign_in(&self, profile: SignInProfile) -> Result<User, DomainError> {
        let email = normalize_email(&profile.email);
        let name = profile.name.trim().to_string();

        let mut errors = Vec::new();
        if email.is_empty() || !email.contains('@') {
            errors.push(FieldError::new("email", "Invalid email address"));
        }
        if name.is_empty() || char_len(&name) > NAME_MAX_CHARS {
            errors.push(FieldError::new(
                "name",
                format!("Name must be between 1 and {NAME_MAX_CHARS} characters"),
            ));
        }
        if !errors.is_empty() {
            return Err(DomainError::Validation(errors));
        }

        if let Some(user) = self.refresh_existing(&email).await? {
            return Ok(user);
        }

        match self.users.insert(User::new(&email, name, profile.image)).await {
            Ok(user) => {
                tracing::info!(user_id = %user.id, "Account created on first sign-in");
                Ok(user)
            }
            // Two first sign-ins raced; the other one created the account.
            Err(RepoError::Constraint(_)) => self
                .refresh_existing(&email)
                .await?
                .ok_or_else(|| DomainError::Internal("account vanished during sign-in".into())),
            Err(e) => Err(e.into()),
        }
    }

    /// The caller's stored account.
    pub async fn profile(&self, actor: Option<&Actor>) -> Result<User, DomainError> {
        let actor = require_user(actor)?;
        self.users
            .find_by_id(actor.user_id)
            .await?
            .ok_or_else(|| DomainError::not_found("user", actor.user_id))
    }

    async fn refresh_existing(&self, email: &str) -> Result<Option<User>, DomainError> {
        let Some(mut user) = self.users.find_by_email(email).await? else {
            return Ok(None);
        };

        let now = Utc::now();
        self.users.touch_last_login(user.id, now).await?;
        user.last_login = now;
        tracing::debug!(user_id = %user.id, "Returning user signed in");
        Ok(Some(user))
    }
}
