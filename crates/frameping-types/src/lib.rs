//! Shared types, adapter traits, and core utilities for Frameping.
//!
//! This crate contains the foundational types that are shared between the
//! feature crates and the storage adapter implementations.

#![forbid(unsafe_code)]

pub mod credential_adapter;
pub mod error;
pub mod prelude;
pub mod types;
pub mod utils;

// vim: ts=4
