//! Defines the app level error type and its conversion to JSON error responses.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The user provided an incorrect password at log-in.
    #[error("incorrect password")]
    InvalidCredentials,

    /// The requested resource was not found.
    ///
    /// For HTTP request handlers, the client should check that the parameters
    /// (e.g., ID) are correct and that the resource has been created.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// A withdrawal was requested for more money than the piggy bank holds.
    ///
    /// The balance is left unchanged.
    #[error("insufficient funds")]
    InsufficientFunds,

    /// A deposit or withdrawal was requested for a zero, negative, or
    /// non-finite amount.
    #[error("invalid amount")]
    InvalidAmount,

    /// The username used at registration is already taken.
    #[error("the username is already taken")]
    DuplicateUsername,

    /// The email used at registration is already in use.
    #[error("the email is already in use")]
    DuplicateEmail,

    /// An unexpected error occurred with the underlying hashing library.
    ///
    /// The error string should only be logged for debugging on the server.
    /// When communicating with the application client this error should be
    /// replaced with a general error type indicating an internal server error.
    #[error("hashing failed: {0}")]
    HashingError(String),

    /// A session token could not be signed.
    #[error("could not create session token: {0}")]
    TokenCreation(String),

    /// A session token was missing, malformed, or expired.
    #[error("invalid session token")]
    InvalidToken,

    /// An image could not be stored by the image store.
    ///
    /// Callers that treat uploads as optional should log this error and carry
    /// on without a picture.
    #[error("could not store image: {0}")]
    ImageUpload(String),

    /// Could not acquire the database lock.
    #[error("could not acquire the database lock")]
    DatabaseLock,

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            // Code 2067 occurs when a UNIQUE constraint failed.
            rusqlite::Error::SqliteFailure(sql_error, Some(ref desc))
                if sql_error.extended_code == 2067 && desc.contains("username") =>
            {
                Error::DuplicateUsername
            }
            rusqlite::Error::SqliteFailure(sql_error, Some(ref desc))
                if sql_error.extended_code == 2067 && desc.contains("email") =>
            {
                Error::DuplicateEmail
            }
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status_code, message) = match self {
            Error::InvalidCredentials => (StatusCode::UNAUTHORIZED, "Incorrect password"),
            Error::InvalidToken => (StatusCode::UNAUTHORIZED, "Unauthorized"),
            Error::NotFound => (StatusCode::NOT_FOUND, "Not found"),
            Error::InsufficientFunds => (StatusCode::BAD_REQUEST, "Insufficient funds"),
            Error::InvalidAmount => (StatusCode::BAD_REQUEST, "Invalid amount"),
            Error::DuplicateUsername => (StatusCode::CONFLICT, "Username is already taken"),
            Error::DuplicateEmail => (StatusCode::CONFLICT, "Email is already in use"),
            // Any errors that are not handled above are not intended to be shown to the client.
            error => {
                tracing::error!("An unexpected error occurred: {}", error);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
        };

        (status_code, Json(json!({ "error": message }))).into_response()
    }
}
