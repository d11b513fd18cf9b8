//! Defines the endpoint for creating a new piggy bank.
use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use rusqlite::Connection;
use serde::Deserialize;

use crate::{AppState, Error, piggy_bank::create_piggy_bank, user::UserId};

/// The state needed to create a piggy bank.
#[derive(Clone)]
pub struct CreatePiggyBankState {
    /// The database connection for managing piggy banks.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CreatePiggyBankState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The request body for creating a piggy bank.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePiggyBankRequest {
    /// The amount of money the piggy bank starts with. Must not be negative.
    pub initial_amount: f64,
}

/// A route handler for creating a new piggy bank for the authenticated user.
///
/// The piggy bank starts with the requested initial amount and a placeholder
/// goal that the user fills in through the goal endpoint.
pub async fn create_piggy_bank_endpoint(
    State(state): State<CreatePiggyBankState>,
    Extension(user_id): Extension<UserId>,
    Json(request): Json<CreatePiggyBankRequest>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("Could not acquire database lock: {error}");
            return Error::DatabaseLock.into_response();
        }
    };

    match create_piggy_bank(&connection, user_id, request.initial_amount) {
        Ok(piggy_bank) => (StatusCode::CREATED, Json(piggy_bank)).into_response(),
        Err(error) => error.into_response(),
    }
}
