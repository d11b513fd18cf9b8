//! Defines the endpoint for fetching the authenticated user's piggy bank and
//! goal.
use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use rusqlite::Connection;
use serde_json::json;

use crate::{
    AppState, Error, piggy_bank::get_piggy_bank_with_goal_for_user, user::UserId,
};

/// The state needed to fetch a user's piggy bank.
#[derive(Clone)]
pub struct UserPiggyBankState {
    /// The database connection for managing piggy banks.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for UserPiggyBankState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler for fetching the authenticated user's most recently
/// created piggy bank along with its goal.
///
/// The caller is identified by their session; there is no way to request
/// another user's piggy bank. Returns a 404 if the user has not created a
/// piggy bank yet.
pub async fn get_user_piggy_bank_endpoint(
    State(state): State<UserPiggyBankState>,
    Extension(user_id): Extension<UserId>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("Could not acquire database lock: {error}");
            return Error::DatabaseLock.into_response();
        }
    };

    match get_piggy_bank_with_goal_for_user(&connection, user_id) {
        Ok((piggy_bank, goal)) => {
            Json(json!({ "piggyBank": piggy_bank, "goal": goal })).into_response()
        }
        Err(Error::NotFound) => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "Piggy bank not found" })),
        )
            .into_response(),
        Err(error) => error.into_response(),
    }
}
