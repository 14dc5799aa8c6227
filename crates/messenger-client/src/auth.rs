use sha2::{Digest, Sha256};

use messenger_types::models::User;
use messenger_types::validation::{FieldErrors, BLANK, MIN_PASSWORD_LEN};

use crate::api::ApiClient;
use crate::cache::ResponseCache;
use crate::error::{AuthError, ClientError};
use crate::session::{Session, SessionStore};

/// The account identity: hex SHA-256 of the lowercased username followed by
/// the password. Usernames are therefore case-insensitive, passwords are not.
pub fn hash_credentials(username: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(username.to_lowercase().as_bytes());
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}

#[derive(Debug, Clone, Default)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

impl LoginForm {
    pub fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        if self.username.trim().is_empty() {
            errors.add("username", BLANK);
        }
        if self.password.is_empty() {
            errors.add("password", BLANK);
        }
        errors.into_result()
    }
}

#[derive(Debug, Clone, Default)]
pub struct SignupForm {
    pub username: String,
    pub password: String,
    pub confirm_password: String,
}

impl SignupForm {
    pub fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        if self.username.trim().is_empty() {
            errors.add("username", BLANK);
        }
        if self.password.is_empty() {
            errors.add("password", BLANK);
        } else if self.password.chars().count() < MIN_PASSWORD_LEN {
            errors.add(
                "password",
                format!("is too short (minimum is {} characters)", MIN_PASSWORD_LEN),
            );
        }
        if self.confirm_password.is_empty() {
            errors.add("confirmPassword", BLANK);
        } else if self.confirm_password != self.password {
            errors.add("confirmPassword", "doesn't match password");
        }
        errors.into_result()
    }
}

/// Look the hash up and, if the account exists, start a session.
pub async fn login(
    api: &ApiClient,
    sessions: &SessionStore,
    form: &LoginForm,
) -> Result<Session, AuthError> {
    form.validate().map_err(AuthError::Invalid)?;
    let username_hash = hash_credentials(&form.username, &form.password);

    match api.read_user(&username_hash).await {
        Ok(user) => {
            let session = Session {
                username_hash: user.username_hash,
            };
            sessions.set(&session)?;
            Ok(session)
        }
        Err(e) if e.is_not_found() => Err(AuthError::IncorrectCredentials),
        Err(e) => Err(AuthError::Failed(e)),
    }
}

/// Register the hash and start a session from the server's answer.
pub async fn signup(
    api: &ApiClient,
    sessions: &SessionStore,
    form: &SignupForm,
) -> Result<Session, AuthError> {
    form.validate().map_err(AuthError::Invalid)?;
    let username_hash = hash_credentials(&form.username, &form.password);

    let created = api
        .create_user(&User { username_hash })
        .await
        .map_err(|e| match e.status() {
            Some(reqwest::StatusCode::CONFLICT) => AuthError::AlreadyRegistered,
            _ => AuthError::Failed(e),
        })?;

    let session = Session {
        username_hash: created.username_hash,
    };
    sessions.set(&session)?;
    Ok(session)
}

/// End the session and forget every cached response.
pub fn logout(sessions: &SessionStore, cache: &ResponseCache) -> Result<(), ClientError> {
    sessions.clear()?;
    cache.clear()?;
    Ok(())
}

/// Remove the signed-in user's messages, then the user, then sign out.
pub async fn delete_account(api: &ApiClient, sessions: &SessionStore) -> Result<(), ClientError> {
    let session = sessions.get().ok_or(ClientError::NoSession)?;
    api.delete_messages_by_hash(&session.username_hash).await?;
    api.delete_user(&session.username_hash).await?;
    logout(sessions, api.cache())
}
