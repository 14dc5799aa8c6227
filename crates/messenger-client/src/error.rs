use reqwest::StatusCode;
use thiserror::Error;

use messenger_types::validation::FieldErrors;

use crate::storage::StorageError;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Server responded {status}: {message}")]
    Status {
        status: StatusCode,
        message: String,
        field_errors: Option<FieldErrors>,
    },

    #[error("Invalid response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Invalid input: {0}")]
    Validation(FieldErrors),

    #[error("No user session found")]
    NoSession,
}

impl ClientError {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ClientError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(StatusCode::NOT_FOUND)
    }
}

/// Login/signup failures, worded for display next to the form.
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Please fill out all required fields correctly.")]
    Invalid(FieldErrors),

    #[error("Username or password is incorrect.")]
    IncorrectCredentials,

    #[error("An account with that username already exists.")]
    AlreadyRegistered,

    #[error("An error occurred. Please try again.")]
    Failed(#[from] ClientError),
}

impl From<StorageError> for AuthError {
    fn from(e: StorageError) -> Self {
        AuthError::Failed(ClientError::Storage(e))
    }
}
