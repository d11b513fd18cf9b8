//! PiggyBank is a web app for saving money toward a goal: users register,
//! create a piggy bank with an initial balance, describe the goal they are
//! saving for, and deposit or withdraw funds as they go.
//!
//! This library provides the JSON REST API that backs the app. Pages are
//! rendered by a separate front end; everything here speaks JSON (plus one
//! multipart form for goal image uploads).

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum_server::Handle;
use tokio::signal;

mod app_state;
mod auth;
mod database_id;
mod db;
mod endpoints;
mod error;
mod goal;
mod image_store;
mod log_in;
mod log_out;
mod logging;
mod password;
mod piggy_bank;
mod register;
mod routing;
mod user;

pub use app_state::{AppState, JwtKeys};
pub use db::initialize as initialize_db;
pub use error::Error;
pub use image_store::{ImageStore, LocalImageStore};
pub use logging::{LOG_BODY_LENGTH_LIMIT, logging_middleware};
pub use password::PasswordHash;
pub use routing::build_router;
pub use user::{User, UserId};

/// An async task that waits for either the ctrl+c or terminate signal,
/// whichever comes first, and then signals the server to shut down
/// gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}
