//! Core shared library for labelbot.
//!
//! This crate exposes the primitives the rule engine and the command line
//! binary depend on: common errors, environment configuration and logging
//! setup.

pub mod config;
pub mod errors;
pub mod logging;

pub use config::{Environment, LabelbotConfig};
pub use errors::{ConfigError, LabelbotError, Result as CoreResult};
