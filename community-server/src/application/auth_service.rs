use std::sync::Arc;

use tracing::instrument;

use crate::data::user_repository::UserRepository;
use crate::domain::form::{FormErrors, REQUIRED};
use crate::domain::{error::DomainError, user::User};
use crate::infrastructure::security::{JwtKeys, hash_password, verify_password};

pub const USERNAME_MAX_LEN: usize = 150;
pub const PASSWORD_MIN_LEN: usize = 8;

/// Session provider: accounts, credentials and session tokens.
#[derive(Clone)]
pub struct AuthService {
    repo: Arc<dyn UserRepository>,
    keys: JwtKeys,
}

impl AuthService {
    pub fn new(repo: Arc<dyn UserRepository>, keys: JwtKeys) -> Self {
        Self { repo, keys }
    }

    pub fn keys(&self) -> &JwtKeys {
        &self.keys
    }

    /// Resolves a session token to its user. Any failure means "anonymous".
    pub async fn session_user(&self, token: &str) -> Option<User> {
        let user_id = self.keys.verify_token(token).ok()?.user_id()?;
        self.repo.find_by_id(user_id).await.ok().flatten()
    }

    #[instrument(skip(self, password))]
    pub async fn register(
        &self,
        username: String,
        email: String,
        password: String,
    ) -> Result<User, DomainError> {
        validate_signup(&username, &password).map_err(DomainError::Validation)?;

        let hash =
            hash_password(&password).map_err(|err| DomainError::Internal(err.to_string()))?;
        let user = User::new(username, email.trim().to_lowercase(), hash);
        self.repo.create(user).await
    }

    /// Checks credentials and opens a session, returning the user and token.
    #[instrument(skip(self, password))]
    pub async fn login(
        &self,
        username: &str,
        password: &str,
    ) -> Result<(User, String), DomainError> {
        let user = self
            .repo
            .find_by_username(username)
            .await?
            .ok_or(DomainError::Unauthorized)?;

        let valid = verify_password(password, &user.password_hash)
            .map_err(|_| DomainError::Unauthorized)?;
        if !valid {
            return Err(DomainError::Unauthorized);
        }

        let token = self
            .keys
            .generate_token(user.id)
            .map_err(|err| DomainError::Internal(err.to_string()))?;
        Ok((user, token))
    }
}

fn validate_signup(username: &str, password: &str) -> Result<(), FormErrors> {
    let mut errors = FormErrors::default();

    if username.is_empty() {
        errors.add("username", REQUIRED);
    } else if username.chars().count() > USERNAME_MAX_LEN
        || !username
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '.' | '@' | '+' | '-' | '_'))
    {
        errors.add(
            "username",
            "Enter a valid username. It may contain letters, numbers and @/./+/-/_ only.",
        );
    }

    if password.chars().count() < PASSWORD_MIN_LEN {
        errors.add(
            "password",
            format!("Password must contain at least {PASSWORD_MIN_LEN} characters."),
        );
    }

    errors.into_result()
}
