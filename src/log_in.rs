//! This file defines the route for logging in an existing user.
use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::CookieJar;
use rusqlite::Connection;
use serde::Deserialize;
use serde_json::json;
use time::Duration;

use crate::{
    AppState, Error,
    app_state::JwtKeys,
    auth::{encode_token, set_session_cookie},
    user::get_user_by_username_or_email,
};

/// The state needed for logging in a user.
#[derive(Clone)]
pub struct LogInState {
    /// The database connection for managing users.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The keys for signing session tokens.
    pub jwt_keys: JwtKeys,
    /// The duration for which session tokens and cookies are valid.
    pub session_duration: Duration,
}

impl FromRef<AppState> for LogInState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            jwt_keys: state.jwt_keys.clone(),
            session_duration: state.session_duration,
        }
    }
}

/// The credentials entered at sign-in.
#[derive(Debug, Deserialize)]
pub struct Credentials {
    /// The username or email address the user registered with.
    pub username: String,
    /// The password entered during sign-in.
    pub password: String,
}

/// A route handler for logging in a user with their username (or email) and
/// password.
///
/// Whether the password matches is only checked after the user is found, so
/// an unknown name and a wrong password produce distinct responses. On
/// success the response carries the session cookie.
pub async fn post_log_in(
    State(state): State<LogInState>,
    jar: CookieJar,
    Json(credentials): Json<Credentials>,
) -> Response {
    let user = {
        let connection = match state.db_connection.lock() {
            Ok(connection) => connection,
            Err(error) => {
                tracing::error!("Could not acquire database lock: {error}");
                return Error::DatabaseLock.into_response();
            }
        };

        match get_user_by_username_or_email(&connection, credentials.username.trim()) {
            Ok(user) => user,
            Err(Error::NotFound) => {
                return (
                    StatusCode::NOT_FOUND,
                    Json(json!({ "errors": { "username": "User not found" } })),
                )
                    .into_response();
            }
            Err(error) => return error.into_response(),
        }
    };

    // Verifying bcrypt is slow on purpose; the database lock is not held for
    // it.
    match user.password_hash.verify(&credentials.password) {
        Ok(true) => {}
        Ok(false) => {
            return (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "errors": { "password": "Incorrect password" } })),
            )
                .into_response();
        }
        Err(error) => return error.into_response(),
    }

    let token = match encode_token(user.id, &state.jwt_keys.encoding_key) {
        Ok(token) => token,
        Err(error) => return error.into_response(),
    };
    let jar = set_session_cookie(jar, token, state.session_duration);

    (jar, Json(json!({ "userId": user.id }))).into_response()
}
