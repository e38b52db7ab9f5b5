//! # Zemer Common Library
//!
//! Shared code for the zemer downloader service:
//! - Error taxonomy
//! - Progress event types for the SSE push channel
//! - Configuration loading
//! - Credential store and session table

pub mod config;
pub mod error;
pub mod events;
pub mod session;

pub use error::{Error, Result};
