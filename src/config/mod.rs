//! Configuration management for vrec.
//!
//! This module handles loading and saving application configuration from a
//! TOML file in the user's config directory.

pub mod file;

pub use file::{AudioConfig, RecorderConfig, StorageConfig, VrecConfig};
