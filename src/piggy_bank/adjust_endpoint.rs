//! Defines the endpoint for depositing money into and withdrawing money from
//! a piggy bank.
use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use rusqlite::Connection;
use serde::Deserialize;
use serde_json::json;

use crate::{
    AppState, Error,
    database_id::DatabaseId,
    piggy_bank::{deposit, get_piggy_bank, withdraw},
    user::UserId,
};

/// The state needed to adjust a piggy bank balance.
#[derive(Clone)]
pub struct AdjustBalanceState {
    /// The database connection for managing piggy banks.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for AdjustBalanceState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The request body for adjusting a piggy bank balance.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdjustBalanceRequest {
    /// How much to deposit or withdraw. Must be greater than zero.
    pub amount: f64,
    /// The direction of the adjustment: "add" or "remove".
    ///
    /// Kept as a string rather than an enum so that an unknown value gets the
    /// same error body as the other validation failures instead of a
    /// deserialization rejection.
    #[serde(rename = "type")]
    pub operation: String,
    /// The piggy bank to adjust.
    pub piggy_bank_id: DatabaseId,
}

/// A route handler for depositing into or withdrawing from a piggy bank.
///
/// The funds check and the balance write happen in a single conditional
/// update, so concurrent withdrawals can never drive the balance negative;
/// the losers of the race receive `Insufficient funds`.
pub async fn adjust_balance_endpoint(
    State(state): State<AdjustBalanceState>,
    Extension(user_id): Extension<UserId>,
    Json(request): Json<AdjustBalanceRequest>,
) -> Response {
    if request.operation != "add" && request.operation != "remove" {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "Invalid operation type" })),
        )
            .into_response();
    }

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("Could not acquire database lock: {error}");
            return Error::DatabaseLock.into_response();
        }
    };

    // A piggy bank the caller does not own is reported the same as one that
    // does not exist.
    match get_piggy_bank(&connection, request.piggy_bank_id) {
        Ok(piggy_bank) if piggy_bank.user_id == user_id => {}
        Ok(_) | Err(Error::NotFound) => {
            return (
                StatusCode::NOT_FOUND,
                Json(json!({ "error": "Piggy bank not found" })),
            )
                .into_response();
        }
        Err(error) => return error.into_response(),
    }

    let result = if request.operation == "add" {
        deposit(&connection, request.piggy_bank_id, request.amount)
    } else {
        withdraw(&connection, request.piggy_bank_id, request.amount)
    };

    match result {
        Ok(updated_balance) => Json(json!({ "updatedBalance": updated_balance })).into_response(),
        Err(error) => error.into_response(),
    }
}
