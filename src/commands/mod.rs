//! Application command handlers for vrec.
//!
//! This module organizes command handling into separate submodules, each
//! responsible for a specific application command.
//!
//! # Commands
//! - `record`: The recorder screen (default command)
//! - `replay`: Play back a saved take with the system audio player
//! - `config`: Open configuration file in user's preferred editor
//! - `list_devices`: List available audio input devices
//! - `logs`: Display recent log entries

pub mod config;
pub mod list_devices;
pub mod logs;
pub mod record;
pub mod replay;

pub use config::handle_config;
pub use list_devices::handle_list_devices;
pub use logs::handle_logs;
pub use record::handle_record;
pub use replay::handle_replay;
