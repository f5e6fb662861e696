//! Playback of saved takes through a system audio player.
//!
//! Independent of the recording session; only ever pointed at files of
//! finished takes.

use anyhow::anyhow;
use std::path::Path;
use std::process::{Child, Command};

#[cfg(target_os = "macos")]
const PLAYERS: &[&str] = &["afplay"];
#[cfg(not(target_os = "macos"))]
const PLAYERS: &[&str] = &["paplay", "aplay", "mpv", "ffplay"];

/// Plays takes by spawning a system audio player.
///
/// At most one playback runs at a time; starting a new one stops the
/// previous player first.
#[derive(Default)]
pub struct SystemPlayer {
    child: Option<Child>,
}

impl SystemPlayer {
    pub fn new() -> Self {
        SystemPlayer { child: None }
    }

    /// Starts playing the given file in the background.
    ///
    /// # Errors
    /// - If the file does not exist
    /// - If no known audio player can be spawned
    pub fn play(&mut self, path: &Path) -> Result<(), anyhow::Error> {
        self.stop();
        self.child = Some(spawn_player(path)?);
        Ok(())
    }

    /// Plays the given file and blocks until playback finishes.
    ///
    /// # Errors
    /// - If the file does not exist
    /// - If no known audio player can be spawned
    pub fn play_blocking(path: &Path) -> Result<(), anyhow::Error> {
        let mut child = spawn_player(path)?;
        child
            .wait()
            .map_err(|e| anyhow!("Audio player error: {e}"))?;
        Ok(())
    }

    /// Stops the current playback, if any.
    pub fn stop(&mut self) {
        if let Some(mut child) = self.child.take() {
            // The player may already have finished on its own.
            if matches!(child.try_wait(), Ok(None)) {
                let _ = child.kill();
                let _ = child.wait();
                tracing::debug!("Playback stopped");
            }
        }
    }

    /// Whether a spawned player is still running.
    pub fn is_playing(&mut self) -> bool {
        match self.child.as_mut() {
            Some(child) => matches!(child.try_wait(), Ok(None)),
            None => false,
        }
    }
}

impl Drop for SystemPlayer {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Spawns the first available system audio player for the given file.
fn spawn_player(path: &Path) -> Result<Child, anyhow::Error> {
    if !path.exists() {
        return Err(anyhow!("Audio file not found: {}", path.display()));
    }

    for player in PLAYERS {
        match Command::new(player).arg(path).spawn() {
            Ok(child) => {
                tracing::info!("Playing {} with {}", path.display(), player);
                return Ok(child);
            }
            Err(e) => {
                tracing::debug!("Player {} unavailable: {}", player, e);
            }
        }
    }

    Err(anyhow!(
        "No audio player found. Install one of: {}",
        PLAYERS.join(", ")
    ))
}
