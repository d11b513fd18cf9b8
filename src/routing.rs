//! Application router configuration with protected and unprotected route
//! definitions.

use axum::{
    Json, Router,
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde_json::json;
use tower_http::services::ServeDir;

use crate::{
    AppState,
    auth::auth_guard,
    endpoints,
    goal::set_goal_endpoint,
    log_in::post_log_in,
    log_out::post_log_out,
    piggy_bank::{
        adjust_balance_endpoint, create_piggy_bank_endpoint, get_user_piggy_bank_endpoint,
    },
    register::register_user,
};

/// Return a router with all the app's routes.
pub fn build_router(state: AppState) -> Router {
    let unprotected_routes = Router::new()
        .route(endpoints::USERS, post(register_user))
        .route(endpoints::LOG_IN, post(post_log_in));

    let protected_routes = Router::new()
        .route(endpoints::LOG_OUT, post(post_log_out))
        .route(
            endpoints::PIGGY_BANK,
            post(create_piggy_bank_endpoint).patch(adjust_balance_endpoint),
        )
        .route(endpoints::PIGGY_BANK_USER, get(get_user_piggy_bank_endpoint))
        .route(endpoints::GOAL, post(set_goal_endpoint))
        .layer(middleware::from_fn_with_state(state.clone(), auth_guard));

    protected_routes
        .merge(unprotected_routes)
        .nest_service(endpoints::MEDIA, ServeDir::new(state.media_dir.clone()))
        .fallback(get_404_not_found)
        .with_state(state)
}

/// The JSON response for requests that match no route.
async fn get_404_not_found() -> Response {
    (StatusCode::NOT_FOUND, Json(json!({ "error": "Not found" }))).into_response()
}
