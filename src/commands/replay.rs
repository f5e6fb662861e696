//! Play back a saved take using the system audio player.

use crate::config::VrecConfig;
use crate::playback::SystemPlayer;
use std::fs;
use std::path::PathBuf;

/// Plays a saved take and waits for playback to finish.
///
/// With no argument, plays the most recently modified take in the takes
/// directory.
///
/// # Errors
/// - If no takes exist
/// - If the file cannot be found or no audio player is available
pub fn handle_replay(file: Option<PathBuf>) -> Result<(), anyhow::Error> {
    let config = VrecConfig::load()?;

    let path = match file {
        Some(path) => path,
        None => latest_take(&config)?,
    };

    tracing::info!("Replaying {}", path.display());
    println!("Playing {}", path.display());
    SystemPlayer::play_blocking(&path)?;
    Ok(())
}

/// Finds the most recently modified take in the takes directory.
fn latest_take(config: &VrecConfig) -> Result<PathBuf, anyhow::Error> {
    let takes_dir = config.takes_dir()?;
    if !takes_dir.exists() {
        return Err(anyhow::anyhow!(
            "No takes recorded yet ({})",
            takes_dir.display()
        ));
    }

    let mut latest: Option<(PathBuf, std::time::SystemTime)> = None;
    for entry in fs::read_dir(&takes_dir)? {
        let path = entry?.path();
        if path.extension().and_then(|e| e.to_str()) != Some(crate::store::TAKE_EXT) {
            continue;
        }
        let modified = fs::metadata(&path)?.modified()?;
        if latest.as_ref().is_none_or(|(_, m)| modified > *m) {
            latest = Some((path, modified));
        }
    }

    latest
        .map(|(path, _)| path)
        .ok_or_else(|| anyhow::anyhow!("No takes found in {}", takes_dir.display()))
}
