//! Vidshelf - browse and play a local video library over HTTP
//!
//! This library crate exposes the core functionality for integration testing.

pub mod config;
pub mod delivery;
pub mod manifest;
pub mod scanner;
pub mod server;
