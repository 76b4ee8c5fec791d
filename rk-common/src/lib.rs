//! # RecordKeeper Common Library
//!
//! Shared code for the RecordKeeper web service and admin CLI:
//! - Error taxonomy shared by the store and configuration layers
//! - Configuration loading (TOML + environment) and root folder resolution
//! - Database initialization and schema

pub mod config;
pub mod db;
pub mod error;

pub use error::{Error, Result};
