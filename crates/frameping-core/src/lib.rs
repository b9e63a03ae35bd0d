//! Core infrastructure for Frameping.
//!
//! Shared building blocks used by the push and webhook crates: the
//! application state, the per-user credential store, the task scheduler,
//! the outbound HTTP client and the dispatch rate limiter.

#![deny(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![forbid(unsafe_code)]

pub mod app;
pub mod credential_store;
pub mod extensions;
pub mod prelude;
pub mod request;
pub mod scheduler;
pub mod throttle;

pub use app::{App, AppBuilder, AppBuilderOpts, AppState};
pub use credential_store::CredentialStore;

// vim: ts=4
