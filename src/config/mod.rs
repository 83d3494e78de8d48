//! Configuration management.
//!
//! This module handles loading the service's network configuration.

pub mod network;

pub use network::{Config, ConfigError};
