//! Frameping is a push-notification service for frame-style social apps.
//!
//! # Features
//!
//! - Signed lifecycle webhooks
//!		- Ed25519 envelope verification
//!		- app key check against the hub
//! - Per-user notification credentials on the filesystem
//! - Push delivery with rate-aware outcome handling
//! - Daily reminder batch on an in-process cron scheduler

#![deny(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![forbid(unsafe_code)]

// Re-export shared types and feature crates
pub use frameping_core::scheduler;
pub use frameping_push as push;
pub use frameping_types::credential_adapter;
pub use frameping_types::error;
pub use frameping_types::types;
pub use frameping_webhook as webhook;

pub mod app;
pub mod config;
pub mod handler;
pub mod prelude;
pub mod routes;

pub use crate::app::{build_app, run};
pub use frameping_core::{App, AppBuilder, AppBuilderOpts, AppState};

// vim: ts=4
