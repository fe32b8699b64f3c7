use std::sync::Arc;

use crate::domain::{PublicUser, User};
use crate::error::{Error, Result};
use crate::store::UserStore;

use super::jwt::JwtKeys;
use super::password::{hash_password, verify_password};

const MIN_LOGIN_LEN: usize = 3;
const MAX_LOGIN_LEN: usize = 20;
const MIN_PASSWORD_LEN: usize = 6;
const MAX_PASSWORD_LEN: usize = 40;

// Identical message for unknown login and wrong password, so the response
// reveals nothing about which logins exist.
const BAD_CREDENTIALS: &str = "invalid login or password";

/// Registration, login and token validation over a pluggable user store.
#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserStore>,
    keys: JwtKeys,
}

impl AuthService {
    pub fn new(users: Arc<dyn UserStore>, keys: JwtKeys) -> Self {
        Self { users, keys }
    }

    /// Validates credentials, hashes the password and persists the user.
    /// Input validation happens before any store call.
    pub async fn register(&self, login: &str, password: &str) -> Result<User> {
        if login.len() < MIN_LOGIN_LEN || login.len() > MAX_LOGIN_LEN {
            return Err(Error::Validation(format!(
                "login must be between {MIN_LOGIN_LEN} and {MAX_LOGIN_LEN} characters"
            )));
        }
        if password.len() < MIN_PASSWORD_LEN || password.len() > MAX_PASSWORD_LEN {
            return Err(Error::Validation(format!(
                "password must be between {MIN_PASSWORD_LEN} and {MAX_PASSWORD_LEN} characters"
            )));
        }

        match self.users.get_by_login(login).await {
            Ok(_) => {
                return Err(Error::Conflict(
                    "user with this login already exists".into(),
                ))
            }
            Err(Error::NotFound(_)) => {}
            Err(e) => return Err(e),
        }

        let hash = hash_password(password)?;
        // The store's unique constraint backstops the race between the
        // pre-check above and this insert.
        self.users.create(login, &hash).await
    }

    /// Issues a session token for valid credentials.
    pub async fn login(&self, login: &str, password: &str) -> Result<(String, User)> {
        let user = self.users.get_by_login(login).await.map_err(|e| match e {
            Error::NotFound(_) => Error::Auth(BAD_CREDENTIALS.into()),
            other => other,
        })?;

        if !verify_password(password, &user.password_hash)? {
            return Err(Error::Auth(BAD_CREDENTIALS.into()));
        }

        let token = self.keys.sign(user.id, &user.login)?;
        Ok((token, user))
    }

    /// Verifies the token and confirms the user still exists.
    pub async fn validate_token(&self, token: &str) -> Result<PublicUser> {
        let claims = self.keys.verify(token)?;
        let user = self.users.get_by_id(claims.sub).await.map_err(|e| match e {
            Error::NotFound(_) => Error::Auth("user not found".into()),
            other => other,
        })?;
        Ok(user.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::JwtConfig;
    use crate::store::MemoryUserStore;

    fn make_service() -> (AuthService, Arc<MemoryUserStore>) {
        let users = Arc::new(MemoryUserStore::new());
        let keys = JwtKeys::from_config(&JwtConfig::for_tests());
        (AuthService::new(users.clone(), keys), users)
    }

    #[tokio::test]
    async fn register_rejects_bad_login_without_touching_the_store() {
        let (service, users) = make_service();
        for login in ["ab", "", "this-login-is-way-too-long"] {
            let err = service.register(login, "secret123").await.unwrap_err();
            assert!(matches!(err, Error::Validation(_)), "login {login:?}");
        }
        assert!(users.is_empty());
    }

    #[tokio::test]
    async fn register_rejects_bad_password_without_touching_the_store() {
        let (service, users) = make_service();
        let too_long = "x".repeat(41);
        for password in ["short", "", too_long.as_str()] {
            let err = service.register("alice", password).await.unwrap_err();
            assert!(matches!(err, Error::Validation(_)));
        }
        assert!(users.is_empty());
    }

    #[tokio::test]
    async fn register_stores_a_hash_not_the_plaintext() {
        let (service, users) = make_service();
        let user = service.register("alice", "secret123").await.unwrap();
        assert_eq!(user.login, "alice");

        let stored = users.get_by_login("alice").await.unwrap();
        assert_ne!(stored.password_hash, "secret123");
        assert!(verify_password("secret123", &stored.password_hash).unwrap());
    }

    #[tokio::test]
    async fn registering_the_same_login_twice_conflicts() {
        let (service, _) = make_service();
        service.register("alice", "secret123").await.unwrap();
        let err = service.register("alice", "other-secret").await.unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));
    }

    #[tokio::test]
    async fn login_issues_a_token_that_validates_to_the_same_user() {
        let (service, _) = make_service();
        let registered = service.register("alice", "secret123").await.unwrap();

        let (token, user) = service.login("alice", "secret123").await.unwrap();
        assert_eq!(user.id, registered.id);

        let validated = service.validate_token(&token).await.unwrap();
        assert_eq!(validated.id, registered.id);
        assert_eq!(validated.login, "alice");
    }

    #[tokio::test]
    async fn wrong_password_and_unknown_login_are_indistinguishable() {
        let (service, _) = make_service();
        service.register("alice", "secret123").await.unwrap();

        let wrong_password = service.login("alice", "wrong").await.unwrap_err();
        let unknown_login = service.login("nobody", "secret123").await.unwrap_err();
        assert!(matches!(wrong_password, Error::Auth(_)));
        assert!(matches!(unknown_login, Error::Auth(_)));
        assert_eq!(wrong_password.to_string(), unknown_login.to_string());
    }

    #[tokio::test]
    async fn validate_token_rejects_tokens_for_missing_users() {
        let (service, _) = make_service();
        // Signed with the right key but for an id nothing resolves.
        let keys = JwtKeys::from_config(&JwtConfig::for_tests());
        let token = keys.sign(999, "ghost").unwrap();

        let err = service.validate_token(&token).await.unwrap_err();
        assert!(matches!(err, Error::Auth(_)));
        assert_eq!(err.to_string(), "user not found");
    }

    #[tokio::test]
    async fn validate_token_rejects_garbage() {
        let (service, _) = make_service();
        let err = service.validate_token("garbage").await.unwrap_err();
        assert!(matches!(err, Error::Auth(_)));
    }
}
