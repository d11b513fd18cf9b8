//! Authentication middleware that validates the session cookie on protected
//! routes.

use axum::{
    extract::{FromRef, Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::CookieJar;
use jsonwebtoken::DecodingKey;

use crate::{
    AppState, Error,
    auth::{SESSION_COOKIE, decode_token},
};

/// The state needed for the auth middleware.
#[derive(Clone)]
pub struct AuthState {
    /// The key for verifying session token signatures.
    pub decoding_key: DecodingKey,
}

impl FromRef<AppState> for AuthState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            decoding_key: state.jwt_keys.decoding_key.clone(),
        }
    }
}

/// Middleware function that checks for a valid session cookie.
/// The user ID is placed into the request and the request executed normally
/// if the cookie holds a valid token, otherwise a 401 JSON response is
/// returned. A missing, malformed, or expired token never panics or leaks
/// detail; the client simply gets `Unauthorized`.
///
/// **Note**: Route handlers can use the function argument
/// `Extension(user_id): Extension<UserId>` to receive the user ID.
pub async fn auth_guard(
    State(state): State<AuthState>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    let token = match jar.get(SESSION_COOKIE) {
        Some(cookie) => cookie.value().to_owned(),
        None => return Error::InvalidToken.into_response(),
    };

    let user_id = match decode_token(&token, &state.decoding_key) {
        Ok(user_id) => user_id,
        Err(error) => return error.into_response(),
    };

    request.extensions_mut().insert(user_id);

    next.run(request).await
}
