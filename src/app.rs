//! Application orchestration and command routing.
//!
//! Handles command-line argument parsing and delegates to appropriate command handlers.

use crate::commands;
use crate::logging;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use std::io;
use std::path::PathBuf;
use std::process;

/// A terminal voice recorder with real-time waveform visualization
#[derive(Parser)]
#[command(name = "vrec")]
#[command(version)]
#[command(about = "Terminal voice recorder with real-time waveform visualization")]
#[command(
    long_about = "A terminal voice recorder with a live waveform display.\n\nDEFAULT COMMAND:\n    If no command is specified, 'record' is used by default.\n    The record option (-d) can be used without explicitly saying 'record'.\n\nKEYS (record screen):\n    Space       record / pause / resume\n    Enter, s    finish the take and name it\n    d           finish the take and discard it\n    p           play back the last saved take\n    q, Esc      save the current take and quit\n\nEXAMPLES:\n    # Open the recorder\n    $ vrec\n\n    # Record from a specific input device\n    $ vrec -d 1\n    $ vrec record -d \"USB Microphone\"\n\n    # Play back the most recent take\n    $ vrec replay\n\n    # Edit configuration file\n    $ vrec config"
)]
#[command(
    after_help = "CONFIGURATION:\n    Config file:        ~/.config/vrec/vrec.toml\n    Takes:              ~/.local/share/vrec/takes\n    Logs:               ~/.local/state/vrec/vrec.log.*\n\nSending SIGUSR1 to a running recorder finalizes the current take."
)]
struct Cli {
    /// Audio input device to record from (record default command)
    #[arg(short, long, global = true, value_name = "DEVICE")]
    device: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Open the recorder screen (default)
    ///
    /// Space starts, pauses, and resumes a take. Enter finishes it and
    /// prompts for a name; 'd' finishes and discards it.
    #[command(visible_alias = "r")]
    Record {
        /// Audio input device: "default", a numeric index, or a device name
        #[arg(short, long, value_name = "DEVICE")]
        device: Option<String>,
    },

    /// Play back a saved take
    ///
    /// Plays the given file, or the most recent take when no file is given.
    /// Uses the system audio player.
    #[command(visible_alias = "rp")]
    Replay {
        /// Path to the take to play
        #[arg(value_name = "FILE")]
        file: Option<PathBuf>,
    },

    /// Open configuration file in your preferred editor
    ///
    /// Edit audio, recorder, and storage settings.
    /// Uses $VISUAL or $EDITOR, falling back to common terminal editors.
    #[command(visible_alias = "c")]
    Config,

    /// List available audio input devices
    ///
    /// Shows device IDs, names, and configurations to help configure
    /// the correct input device in vrec.toml.
    #[command(name = "list-devices")]
    ListDevices,

    /// Show recent log entries from the application
    ///
    /// Display the last 50 lines of the most recent log file.
    /// Useful for troubleshooting issues.
    Logs,

    /// Generate shell completion script
    ///
    /// Generate completion script for your shell. Save the output to your
    /// shell's completion directory or source it directly.
    ///
    /// Examples:
    ///   vrec completions bash > vrec.bash
    ///   vrec completions zsh > _vrec
    ///   vrec completions fish > vrec.fish
    Completions {
        /// The shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Runs the main application based on command-line arguments.
///
/// # Exit Codes
/// - 0: Success
/// - 1: General error
/// - 2: Usage error (invalid arguments)
///
/// # Errors
/// - If logging initialization fails
/// - If command execution fails
pub fn run() -> Result<(), anyhow::Error> {
    let cli = Cli::parse();

    // Handle commands that don't need logging setup
    match &cli.command {
        Some(Commands::Completions { shell }) => {
            generate(*shell, &mut Cli::command(), "vrec", &mut io::stdout());
            return Ok(());
        }
        Some(Commands::ListDevices) => {
            return match commands::handle_list_devices() {
                Ok(()) => Ok(()),
                Err(e) => {
                    eprintln!("Error: {e}");
                    process::exit(1);
                }
            };
        }
        Some(Commands::Logs) => {
            return match commands::handle_logs() {
                Ok(()) => Ok(()),
                Err(e) => {
                    eprintln!("Error: {e}");
                    process::exit(1);
                }
            };
        }
        _ => {}
    }

    // Initialize logging for all other commands. The guard flushes the
    // appender when `run` returns.
    let _guard = logging::init_logging()?;

    match cli.command {
        None | Some(Commands::Record { .. }) => {
            // Default command is record. Merge the top-level device option
            // with the explicit record command option; the explicit one wins.
            let device = match cli.command {
                Some(Commands::Record { device }) => device.or(cli.device),
                None => cli.device,
                _ => unreachable!(),
            };
            commands::handle_record(device)?;
        }
        Some(Commands::Replay { file }) => {
            commands::handle_replay(file)?;
        }
        Some(Commands::Config) => {
            commands::handle_config()?;
        }
        Some(Commands::Completions { .. }) | Some(Commands::ListDevices) | Some(Commands::Logs) => {
            unreachable!("These commands are handled earlier")
        }
    }

    Ok(())
}
