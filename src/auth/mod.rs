//! Session authentication: signed tokens, the session cookie, and the
//! middleware that guards protected routes.

pub mod cookie;
pub mod middleware;
pub mod token;

pub use cookie::{SESSION_COOKIE, remove_session_cookie, set_session_cookie};
pub use middleware::{AuthState, auth_guard};
pub use token::{SESSION_DURATION, decode_token, encode_token};
