//! This file defines a user of the application and the queries for storing
//! and retrieving them.

use std::fmt::Display;

use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};

use crate::{Error, password::PasswordHash};

/// A newtype wrapper for integer user IDs.
/// This helps disambiguate user IDs from other types of IDs, leading to better
/// compile time errors.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct UserId(i64);

impl UserId {
    /// Create a user ID from an integer.
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// The underlying integer ID.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// A user of the application.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    /// The user's ID in the database.
    pub id: UserId,
    /// The unique name the user signs in with.
    pub username: String,
    /// The unique email address associated with the user.
    pub email: String,
    /// The user's salted and hashed password.
    pub password_hash: PasswordHash,
}

pub fn create_user_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS user (
            id INTEGER PRIMARY KEY,
            username TEXT NOT NULL UNIQUE,
            email TEXT NOT NULL UNIQUE,
            password TEXT NOT NULL
        )",
        (),
    )?;

    Ok(())
}

pub fn map_row_to_user(row: &Row) -> Result<User, rusqlite::Error> {
    let id = row.get(0)?;
    let username = row.get(1)?;
    let email = row.get(2)?;
    let password: String = row.get(3)?;

    Ok(User {
        id: UserId::new(id),
        username,
        email,
        password_hash: PasswordHash::new_unchecked(password),
    })
}

/// Create and insert a new user into the database.
///
/// # Errors
///
/// Returns [Error::DuplicateUsername] or [Error::DuplicateEmail] if the
/// username or email is already taken, otherwise an [Error::SqlError] for
/// unexpected SQL errors.
pub fn insert_user(
    connection: &Connection,
    username: &str,
    email: &str,
    password_hash: &PasswordHash,
) -> Result<User, Error> {
    connection.execute(
        "INSERT INTO user (username, email, password) VALUES (?1, ?2, ?3)",
        (username, email, password_hash.to_string()),
    )?;

    let id = connection.last_insert_rowid();

    Ok(User {
        id: UserId::new(id),
        username: username.to_owned(),
        email: email.to_owned(),
        password_hash: password_hash.clone(),
    })
}

/// Get the user whose username or email matches `username_or_email`.
///
/// Usernames are alphanumeric and emails contain an '@', so a single value
/// can never match one user by name and another by email.
///
/// # Errors
///
/// Returns [Error::NotFound] if no such user exists.
pub fn get_user_by_username_or_email(
    connection: &Connection,
    username_or_email: &str,
) -> Result<User, Error> {
    let user = connection
        .prepare("SELECT id, username, email, password FROM user WHERE username = ?1 OR email = ?1")?
        .query_row([username_or_email], map_row_to_user)?;

    Ok(user)
}

/// Check whether `username` or `email` are already taken by an existing user.
///
/// Returns a pair of flags `(username_taken, email_taken)`. Both fields are
/// probed in one query so that registration can report every conflicting
/// field at once.
pub fn find_conflicting_user_fields(
    connection: &Connection,
    username: &str,
    email: &str,
) -> Result<(bool, bool), Error> {
    let conflicts = connection
        .prepare(
            "SELECT
                EXISTS (SELECT 1 FROM user WHERE username = ?1),
                EXISTS (SELECT 1 FROM user WHERE email = ?2)",
        )?
        .query_row((username, email), |row| {
            Ok((row.get::<_, bool>(0)?, row.get::<_, bool>(1)?))
        })?;

    Ok(conflicts)
}
