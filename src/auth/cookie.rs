//! Defines functions for storing the session token in a cookie.

use axum_extra::extract::{
    CookieJar,
    cookie::{Cookie, SameSite},
};
use time::{Duration, OffsetDateTime};

/// The name of the cookie that holds the session token.
pub const SESSION_COOKIE: &str = "session_token";

/// Add the session cookie to the cookie jar, indicating that a user is logged
/// in and authenticated.
///
/// The cookie's max age is set to `duration` so that the client drops it
/// around the time the token inside expires.
///
/// Returns the cookie jar with the cookie added.
pub fn set_session_cookie(jar: CookieJar, token: String, duration: Duration) -> CookieJar {
    jar.add(
        Cookie::build((SESSION_COOKIE, token))
            .path("/")
            .max_age(duration)
            .http_only(true)
            .same_site(SameSite::Strict)
            .secure(true),
    )
}

/// Set the session cookie to an invalid value and set its max age to zero,
/// which should delete the cookie on the client side.
///
/// The token itself remains valid until it expires; invalidation is the
/// removal of the client-held reference.
pub fn remove_session_cookie(jar: CookieJar) -> CookieJar {
    jar.add(
        Cookie::build((SESSION_COOKIE, "deleted"))
            .path("/")
            .expires(OffsetDateTime::UNIX_EPOCH)
            .max_age(Duration::ZERO)
            .http_only(true)
            .same_site(SameSite::Strict)
            .secure(true),
    )
}
