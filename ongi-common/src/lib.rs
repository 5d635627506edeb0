//! # Ongi Common Library
//!
//! Shared code for all ongi services including:
//! - Common error type
//! - Bootstrap configuration discovery
//! - SQLite pool setup
//! - Timestamp helpers

pub mod config;
pub mod db;
pub mod error;
pub mod time;

pub use error::{Error, Result};
