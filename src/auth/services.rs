use std::sync::Arc;

use lazy_static::lazy_static;
use regex::Regex;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::auth::{
    claims::Identity,
    error::AuthError,
    jwt::{TokenError, TokenService},
    password::{hash_password, verify_password, DUMMY_HASH},
    repo::UserRepository,
    repo_types::{RepoError, User},
};

pub const MIN_PASSWORD_LEN: usize = 8;

lazy_static! {
    static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
}

pub(crate) fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Signup, login and token resolution over a credential store.
#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserRepository>,
    tokens: TokenService,
}

impl AuthService {
    pub fn new(users: Arc<dyn UserRepository>, tokens: TokenService) -> Self {
        Self { users, tokens }
    }

    pub async fn signup(&self, email: &str, password: &str) -> Result<User, AuthError> {
        let email = normalize_email(email);
        if !is_valid_email(&email) {
            warn!(email = %email, "signup invalid email");
            return Err(AuthError::Validation("invalid email".into()));
        }
        if password.chars().count() < MIN_PASSWORD_LEN {
            warn!("signup password too short");
            return Err(AuthError::Validation(format!(
                "password must be at least {} characters",
                MIN_PASSWORD_LEN
            )));
        }

        let hash = hash_password(password)?;
        let user = self.users.create(&email, &hash).await.map_err(|e| match e {
            RepoError::DuplicateEmail => {
                warn!(email = %email, "email already registered");
                AuthError::DuplicateEmail
            }
            RepoError::Database(e) => AuthError::Internal(e.context("create user")),
        })?;

        info!(user_id = %user.id, email = %user.email, "user registered");
        Ok(user)
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<String, AuthError> {
        let email = normalize_email(email);
        if email.is_empty() || password.is_empty() {
            return Err(AuthError::Validation("email and password are required".into()));
        }

        let user = match self.users.find_by_email(&email).await {
            Ok(user) => user,
            Err(e) => return Err(AuthError::Internal(anyhow::Error::new(e).context("find user"))),
        };

        let Some(user) = user else {
            // Same argon2 cost as a wrong password; the outcome is always a rejection.
            if let Err(e) = verify_password(password, DUMMY_HASH) {
                error!(error = %e, "dummy hash verify failed");
            }
            warn!(email = %email, "login unknown email");
            return Err(AuthError::InvalidCredentials);
        };

        if !verify_password(password, &user.password_hash)? {
            warn!(user_id = %user.id, "login invalid password");
            return Err(AuthError::InvalidCredentials);
        }

        let token = self
            .tokens
            .issue(user.id, &user.email)
            .map_err(|e| AuthError::Internal(anyhow::Error::new(e)))?;
        info!(user_id = %user.id, "user logged in");
        Ok(token)
    }

    pub fn resolve_identity(&self, token: &str) -> Result<Identity, TokenError> {
        self.tokens.verify(token)
    }

    pub async fn find_user(&self, id: Uuid) -> Result<Option<User>, AuthError> {
        self.users
            .find_by_id(id)
            .await
            .map_err(|e| AuthError::Internal(anyhow::Error::new(e).context("find user by id")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::repo::MemoryUserRepository;
    use crate::config::JwtConfig;

    fn service() -> (AuthService, Arc<MemoryUserRepository>) {
        let repo = Arc::new(MemoryUserRepository::new());
        let tokens = TokenService::new(&JwtConfig {
            secret: "test-secret-test-secret-test-secret".into(),
            issuer: "test".into(),
            audience: "test".into(),
            ttl_minutes: 60,
        });
        (AuthService::new(repo.clone(), tokens), repo)
    }

    #[test]
    fn email_validation() {
        assert!(is_valid_email("a@example.com"));
        assert!(!is_valid_email("not-an-email"));
        assert!(!is_valid_email("a b@example.com"));
        assert_eq!(normalize_email("  A@Example.COM "), "a@example.com");
    }

    #[tokio::test]
    async fn signup_then_login_resolves_identity() {
        let (auth, _) = service();
        let user = auth.signup("a@example.com", "longenough1").await.expect("signup");
        assert_ne!(user.password_hash, "longenough1");

        let token = auth.login("a@example.com", "longenough1").await.expect("login");
        let identity = auth.resolve_identity(&token).expect("resolve");
        assert_eq!(identity.user_id, user.id);
        assert_eq!(identity.email, "a@example.com");
    }

    #[tokio::test]
    async fn short_password_creates_nothing() {
        let (auth, repo) = service();
        let err = auth.signup("a@example.com", "1234567").await.unwrap_err();
        assert!(matches!(err, AuthError::Validation(_)));
        assert_eq!(repo.len().await, 0);
    }

    #[tokio::test]
    async fn duplicate_signup_keeps_one_user() {
        let (auth, repo) = service();
        auth.signup("a@example.com", "longenough1").await.expect("first signup");
        let err = auth.signup("A@example.com", "longenough2").await.unwrap_err();
        assert!(matches!(err, AuthError::DuplicateEmail));
        assert_eq!(repo.len().await, 1);
    }

    #[tokio::test]
    async fn login_failures_are_indistinguishable() {
        let (auth, _) = service();
        auth.signup("a@example.com", "longenough1").await.expect("signup");

        let wrong_password = auth.login("a@example.com", "wrongpass1").await.unwrap_err();
        let unknown_email = auth.login("nobody@example.com", "longenough1").await.unwrap_err();

        assert!(matches!(wrong_password, AuthError::InvalidCredentials));
        assert!(matches!(unknown_email, AuthError::InvalidCredentials));
        assert_eq!(wrong_password.to_string(), unknown_email.to_string());
        assert_eq!(wrong_password.status(), unknown_email.status());
    }

    #[tokio::test]
    async fn corrupt_stored_hash_is_internal() {
        let (auth, repo) = service();
        repo.create("a@example.com", "not-a-phc-string")
            .await
            .expect("create");
        let err = auth.login("a@example.com", "longenough1").await.unwrap_err();
        assert!(matches!(err, AuthError::Internal(_)));
    }

    #[tokio::test]
    async fn resolve_identity_rejects_garbage() {
        let (auth, _) = service();
        assert!(matches!(
            auth.resolve_identity("garbage"),
            Err(TokenError::Malformed)
        ));
    }
}
