//! This file defines the route for registering a new user.
use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::CookieJar;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use serde_json::json;
use time::Duration;

use crate::{
    AppState, Error,
    app_state::JwtKeys,
    auth::{encode_token, set_session_cookie},
    password::PasswordHash,
    user::{find_conflicting_user_fields, insert_user},
};

/// The state needed for creating a new user.
#[derive(Clone)]
pub struct RegistrationState {
    /// The database connection for managing users.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The keys for signing session tokens.
    pub jwt_keys: JwtKeys,
    /// The duration for which session tokens and cookies are valid.
    pub session_duration: Duration,
}

impl FromRef<AppState> for RegistrationState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            jwt_keys: state.jwt_keys.clone(),
            session_duration: state.session_duration,
        }
    }
}

/// The request body for registering a new user.
#[derive(Debug, Deserialize)]
pub struct RegisterForm {
    /// The name the user will sign in with.
    pub username: String,
    /// The user's email address.
    pub email: String,
    /// The user's password in plaintext. It is hashed before it is stored.
    pub password: String,
}

/// Per-field error messages for a rejected registration.
///
/// Every failing field is reported at once so the client can show all
/// problems in a single round trip.
#[derive(Debug, Default, PartialEq, Serialize)]
pub struct RegisterErrors {
    /// The error message for the username, if it was rejected.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// The error message for the email, if it was rejected.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// The error message for the password, if it was rejected.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

impl RegisterErrors {
    fn is_empty(&self) -> bool {
        self.username.is_none() && self.email.is_none() && self.password.is_none()
    }
}

/// Check the registration fields against the account rules: username 3-30
/// alphanumeric characters, email 5-50 characters, password 12-50 characters.
///
/// `username` and `email` should already be trimmed.
fn validate_registration(username: &str, email: &str, password: &str) -> RegisterErrors {
    let mut errors = RegisterErrors::default();

    if username.is_empty() {
        errors.username = Some("You must provide a username".to_owned());
    } else if username.len() < 3 {
        errors.username = Some("Username must be at least 3 characters long".to_owned());
    } else if username.len() > 30 {
        errors.username = Some("Username cannot exceed 30 characters".to_owned());
    } else if !username.chars().all(|c| c.is_ascii_alphanumeric()) {
        errors.username = Some("Username can only contain letters and numbers".to_owned());
    }

    if email.is_empty() {
        errors.email = Some("You must provide an email".to_owned());
    } else if email.len() < 5 {
        errors.email = Some("Email must be at least 5 characters long".to_owned());
    } else if email.len() > 50 {
        errors.email = Some("Email cannot exceed 50 characters".to_owned());
    }

    if password.is_empty() {
        errors.password = Some("You must provide a password".to_owned());
    } else if password.len() < 12 {
        errors.password = Some("Password must be at least 12 characters long".to_owned());
    } else if password.len() > 50 {
        errors.password = Some("Password cannot exceed 50 characters".to_owned());
    }

    errors
}

fn conflict_response(username_taken: bool, email_taken: bool) -> Response {
    let errors = RegisterErrors {
        username: username_taken.then(|| "Username is already taken".to_owned()),
        email: email_taken.then(|| "Email is already in use".to_owned()),
        password: None,
    };

    (StatusCode::CONFLICT, Json(json!({ "errors": errors }))).into_response()
}

/// A route handler for registering a new user.
///
/// On success the response carries the session cookie, so a freshly
/// registered user is already logged in.
pub async fn register_user(
    State(state): State<RegistrationState>,
    jar: CookieJar,
    Json(form): Json<RegisterForm>,
) -> Response {
    let username = form.username.trim();
    let email = form.email.trim();

    let errors = validate_registration(username, email, &form.password);
    if !errors.is_empty() {
        return (StatusCode::BAD_REQUEST, Json(json!({ "errors": errors }))).into_response();
    }

    // Hashing bcrypt is slow on purpose; the database lock is not held for
    // it.
    let password_hash = match PasswordHash::from_raw_password(&form.password, PasswordHash::DEFAULT_COST)
    {
        Ok(password_hash) => password_hash,
        Err(error) => return error.into_response(),
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("Could not acquire database lock: {error}");
            return Error::DatabaseLock.into_response();
        }
    };

    match find_conflicting_user_fields(&connection, username, email) {
        Ok((false, false)) => {}
        Ok((username_taken, email_taken)) => {
            return conflict_response(username_taken, email_taken);
        }
        Err(error) => return error.into_response(),
    }

    // The unique constraints back up the conflict probe in case another
    // registration slipped in between the two statements.
    let user = match insert_user(&connection, username, email, &password_hash) {
        Ok(user) => user,
        Err(Error::DuplicateUsername) => return conflict_response(true, false),
        Err(Error::DuplicateEmail) => return conflict_response(false, true),
        Err(error) => return error.into_response(),
    };

    let token = match encode_token(user.id, &state.jwt_keys.encoding_key) {
        Ok(token) => token,
        Err(error) => return error.into_response(),
    };
    let jar = set_session_cookie(jar, token, state.session_duration);

    (
        jar,
        (StatusCode::CREATED, Json(json!({ "userId": user.id }))),
    )
        .into_response()
}
