//! ipakit-server – HTTP front end for the ZIP → IPA pipeline.
//!
//! The binary in `main.rs` only wires configuration, tracing and the
//! listener; everything reachable over HTTP is built by [`build_router`].

pub mod config;
pub mod download;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod state;
pub mod upload;

pub use config::Config;
pub use routes::build as build_router;
pub use state::AppState;
