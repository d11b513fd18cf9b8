//! Implements a struct that holds the state of the REST server.

use std::{
    path::PathBuf,
    sync::{Arc, Mutex},
};

use jsonwebtoken::{DecodingKey, EncodingKey};
use rusqlite::Connection;
use time::Duration;

use crate::{
    Error,
    auth::SESSION_DURATION,
    db::initialize,
    image_store::{ImageStore, LocalImageStore},
};

/// The keys for signing and verifying session tokens.
#[derive(Clone)]
pub struct JwtKeys {
    /// The key for signing new session tokens.
    pub encoding_key: EncodingKey,
    /// The key for verifying session token signatures.
    pub decoding_key: DecodingKey,
}

impl JwtKeys {
    /// Derive the signing and verification keys from a `secret` string.
    pub fn from_secret(secret: &str) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_ref()),
            decoding_key: DecodingKey::from_secret(secret.as_ref()),
        }
    }
}

/// The state of the REST server.
#[derive(Clone)]
pub struct AppState {
    /// The database connection.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The keys for signing and verifying session tokens.
    pub jwt_keys: JwtKeys,
    /// The duration for which session tokens and cookies are valid.
    pub session_duration: Duration,
    /// The store that turns uploaded goal images into public URLs.
    pub image_store: Arc<dyn ImageStore + Send + Sync>,
    /// The directory that uploaded images are served from.
    pub media_dir: PathBuf,
}

impl AppState {
    /// Create a new [AppState] with a SQLite database connection.
    ///
    /// This function will initialize the database by adding the tables for
    /// the domain models. Uploaded images are written beneath `media_dir`.
    ///
    /// # Errors
    /// Returns an error if the database cannot be initialized.
    pub fn new(
        db_connection: Connection,
        jwt_secret: &str,
        media_dir: PathBuf,
    ) -> Result<Self, Error> {
        initialize(&db_connection)?;

        Ok(Self {
            db_connection: Arc::new(Mutex::new(db_connection)),
            jwt_keys: JwtKeys::from_secret(jwt_secret),
            session_duration: SESSION_DURATION,
            image_store: Arc::new(LocalImageStore::new(media_dir.clone())),
            media_dir,
        })
    }
}
