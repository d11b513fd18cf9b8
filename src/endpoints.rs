//! The API endpoint URIs.

/// The route for registering a new user.
pub const USERS: &str = "/api/users";
/// The route for logging in a user.
pub const LOG_IN: &str = "/api/log_in";
/// The route for the client to log out the current user.
pub const LOG_OUT: &str = "/api/log_out";
/// The route for creating a piggy bank (POST) and adjusting its balance (PATCH).
pub const PIGGY_BANK: &str = "/api/piggybank";
/// The route for fetching the authenticated user's piggy bank and goal.
pub const PIGGY_BANK_USER: &str = "/api/piggybank/user";
/// The route for setting the details of a savings goal.
pub const GOAL: &str = "/api/goal";
/// The route for serving uploaded goal images.
pub const MEDIA: &str = "/media";
