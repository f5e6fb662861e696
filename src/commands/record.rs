//! The recorder screen (default command).
//!
//! Wires the recording session to the microphone, the take store, and the
//! TUI, and runs the cooperative event loop: poll input, pump the session
//! ticker, render. SIGUSR1 finalizes the current take under its default
//! name, for external triggers.

use crate::capture::MicCapture;
use crate::config::VrecConfig;
use crate::playback::SystemPlayer;
use crate::session::{
    format_elapsed, FinishedTake, RecordingSession, SessionError, SessionState, WaveformLayout,
};
use crate::store::LocalStore;
use crate::ui::{ErrorScreen, RecorderCommand, RecorderTui};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Runs the recorder screen until the user quits.
///
/// # Errors
/// - If configuration or the takes directory cannot be set up
/// - If the terminal UI cannot be initialized
/// - If the event loop fails
pub fn handle_record(device_override: Option<String>) -> Result<(), anyhow::Error> {
    tracing::info!("=== vrec recorder started ===");

    let config = match VrecConfig::load() {
        Ok(config) => config,
        Err(err) => {
            tracing::error!("Failed to load configuration: {err}");
            let mut error_screen = ErrorScreen::new()?;
            error_screen.show_error(
                "configuration error",
                &format!("{err}\n\nPlease check your ~/.config/vrec/vrec.toml file and try again."),
            )?;
            error_screen.cleanup()?;
            return Err(anyhow::anyhow!("Configuration error: {err}"));
        }
    };

    let device = device_override.unwrap_or_else(|| config.audio.device.clone());
    tracing::info!(
        "Configuration loaded: device={}, sample_rate={}Hz, tick={}ms",
        device,
        config.audio.sample_rate,
        config.recorder.tick_interval_ms
    );

    let store = LocalStore::new(config.takes_dir()?)?;
    let capture = MicCapture::new(config.audio.sample_rate, device);

    let mut tui = RecorderTui::new(config.recorder.wave_height)?;
    let bar_step = config.recorder.bar_width + config.recorder.bar_gap;
    // One waveform bar per terminal column.
    let layout = WaveformLayout::new(
        tui.width() as f32 * bar_step,
        config.recorder.wave_height,
        config.recorder.bar_width,
        config.recorder.bar_gap,
    )?;
    let mut session = RecordingSession::new(
        capture,
        layout,
        config.tick_interval(),
        config.recorder.name_format.clone(),
    );
    let mut player = SystemPlayer::new();
    let mut last_saved: Option<PathBuf> = None;

    let finalize_signal = Arc::new(AtomicBool::new(false));
    signal_hook::flag::register(signal_hook::consts::SIGUSR1, Arc::clone(&finalize_signal))
        .map_err(|e| anyhow::anyhow!("Failed to register signal handler: {e}"))?;

    loop {
        if finalize_signal.swap(false, Ordering::Relaxed) {
            tracing::info!("Received SIGUSR1: finalizing current take");
            match finalize_with_default_name(&mut session, &store, &mut tui) {
                Ok(Some(path)) => last_saved = Some(path),
                Ok(None) => {}
                Err(err) => {
                    tracing::error!("Finalizing take failed: {err}");
                    tui.notice(format!("{err}"));
                }
            }
        }

        if let Some(cols) = tui.check_resize()? {
            session.set_display_width(cols as f32 * bar_step, &mut tui);
        }

        match tui.handle_input()? {
            RecorderCommand::Continue => {}
            RecorderCommand::Primary => match session.primary_action(&store, &mut tui) {
                Ok(state) => tracing::debug!("Primary action -> {state}"),
                Err(err @ SessionError::CaptureStart(_)) => {
                    tracing::error!("{err}");
                    tui.notice(format!("{err}"));
                }
                Err(err) => {
                    tracing::warn!("Primary action rejected: {err}");
                    tui.notice(format!("{err}"));
                }
            },
            RecorderCommand::Stop => {
                if take_in_progress(&session) {
                    match session.stop(&mut tui) {
                        Ok(take) => {
                            log_take(&take);
                            let default_name = session.take_name().unwrap_or("take").to_string();
                            tui.open_save_prompt(&default_name);
                        }
                        // The take is Stopped regardless; surface the failure
                        // and keep the recorder up so it can be discarded.
                        Err(err) => {
                            tracing::error!("Finalizing take failed: {err}");
                            tui.notice(format!("{err}"));
                        }
                    }
                } else if session.state() == SessionState::Stopped {
                    // A take whose finalize or save failed can still be named.
                    if let Some(name) = session.take_name() {
                        let name = name.to_string();
                        tui.open_save_prompt(&name);
                    }
                } else {
                    tui.notice("nothing to save");
                }
            }
            RecorderCommand::Delete => {
                if take_in_progress(&session) {
                    match session.stop(&mut tui) {
                        Ok(take) => log_take(&take),
                        Err(err) => {
                            tracing::error!("Finalizing take failed: {err}");
                            tui.notice(format!("{err}"));
                        }
                    }
                    discard_take(&mut session, &store, &mut tui);
                } else if session.state() == SessionState::Stopped {
                    discard_take(&mut session, &store, &mut tui);
                } else {
                    tui.notice("nothing to discard");
                }
            }
            RecorderCommand::Play => {
                if player.is_playing() {
                    player.stop();
                } else if let Some(path) = &last_saved {
                    if let Err(err) = player.play(path) {
                        tracing::error!("Playback failed: {err}");
                        tui.notice(format!("playback failed: {err}"));
                    }
                } else {
                    tui.notice("no take saved yet");
                }
            }
            RecorderCommand::Quit => {
                if let Some(path) = finalize_with_default_name(&mut session, &store, &mut tui)? {
                    last_saved = Some(path);
                }
                break;
            }
            RecorderCommand::SaveConfirm(name) => {
                match session.save(&store, &mut tui, &name) {
                    Ok(path) => {
                        tui.notice(format!("saved {}", path.display()));
                        last_saved = Some(path);
                    }
                    Err(err @ SessionError::Store(_)) => {
                        // Stay Stopped: reopen the prompt so the user can
                        // pick another name.
                        tracing::warn!("Save failed: {err}");
                        tui.notice(format!("{err}"));
                        tui.open_save_prompt(&name);
                    }
                    Err(err) => return Err(err.into()),
                }
            }
            RecorderCommand::SaveCancel => {
                discard_take(&mut session, &store, &mut tui);
            }
        }

        session.pump(&mut tui);
        tui.render()?;
    }

    player.stop();
    tui.cleanup()?;
    tracing::info!("=== vrec recorder exited ===");
    Ok(())
}

/// Deletes the finished take. Storage failures become a transient notice so
/// the recorder keeps running and the delete can be retried.
fn discard_take(
    session: &mut RecordingSession<MicCapture>,
    store: &LocalStore,
    tui: &mut RecorderTui,
) {
    match session.delete(store, tui) {
        Ok(()) => tui.notice("take discarded"),
        Err(err) => {
            tracing::error!("Discard failed: {err}");
            tui.notice(format!("{err}"));
        }
    }
}

fn take_in_progress(session: &RecordingSession<MicCapture>) -> bool {
    matches!(
        session.state(),
        SessionState::Recording | SessionState::Paused
    )
}

/// Stops and saves the current take under its timestamp-derived name.
/// Used for SIGUSR1 and quit, where no rename prompt is shown.
fn finalize_with_default_name(
    session: &mut RecordingSession<MicCapture>,
    store: &LocalStore,
    tui: &mut RecorderTui,
) -> Result<Option<PathBuf>, anyhow::Error> {
    if !take_in_progress(session) {
        return Ok(None);
    }
    let take = session.stop(tui)?;
    log_take(&take);
    let name = match session.take_name() {
        Some(name) => name.to_string(),
        None => return Ok(None),
    };
    let saved = session.save(store, tui, &name)?;
    tracing::info!("Take saved: {}", saved.display());
    Ok(Some(saved))
}

fn log_take(take: &FinishedTake) {
    let peak = take.samples.iter().copied().max().unwrap_or(0);
    tracing::info!(
        "Take finished: {} at {} ({} amplitude samples, peak {})",
        format_elapsed(take.duration),
        take.path.display(),
        take.samples.len(),
        peak
    );
}
