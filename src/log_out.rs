//! This file defines the route for logging out the current user.
use axum::{http::StatusCode, response::IntoResponse};
use axum_extra::extract::CookieJar;

use crate::auth::remove_session_cookie;

/// A route handler for logging out the current user.
///
/// Logging out deletes the client-held cookie. The token inside it stays
/// valid until it expires; there is no server-side revocation list.
pub async fn post_log_out(jar: CookieJar) -> impl IntoResponse {
    (remove_session_cookie(jar), StatusCode::NO_CONTENT)
}
