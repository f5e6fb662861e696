//! Recording session core.
//!
//! One [`RecordingSession`] governs one take at a time: it owns the capture
//! device and the amplitude buffer, drives the ticker, and mediates between
//! them. On each tick it pulls the current peak amplitude from the device,
//! appends it to the buffer, and forwards the elapsed-time text and waveform
//! geometry to the display collaborator. Neither leaf component knows about
//! the other.

pub mod ticker;
pub mod waveform;

use crate::capture::{CaptureDevice, CaptureError};
use crate::store::{FileStore, StoreError, TAKE_EXT};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub use ticker::{format_elapsed, Ticker, ZERO_ELAPSED};
pub use waveform::{AmplitudeBuffer, Spike, WaveformLayout};

/// Lifecycle state of the current take.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No take in progress; the primary action starts one.
    Idle,
    /// Capture device and ticker are running.
    Recording,
    /// Take in progress but frozen; the primary action resumes it.
    Paused,
    /// Take finished; awaiting save or delete.
    Stopped,
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionState::Idle => write!(f, "idle"),
            SessionState::Recording => write!(f, "recording"),
            SessionState::Paused => write!(f, "paused"),
            SessionState::Stopped => write!(f, "stopped"),
        }
    }
}

/// Errors surfaced by session transitions.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The take never started; capture device and buffer are untouched.
    #[error("capture start failed: {0}")]
    CaptureStart(#[source] CaptureError),
    #[error(transparent)]
    Capture(#[from] CaptureError),
    /// A transition was requested from a state that does not support it.
    /// The session state is unchanged.
    #[error("cannot {event} while {state}")]
    InvalidTransition {
        state: SessionState,
        event: &'static str,
    },
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// A finished take, produced by [`RecordingSession::stop`].
pub struct FinishedTake {
    /// Output file the capture device wrote.
    pub path: PathBuf,
    /// Full normalized amplitude history drained from the buffer.
    pub samples: Vec<u32>,
    /// Recorded duration, paused intervals excluded.
    pub duration: Duration,
}

/// Display collaborator: drives the timer readout, the waveform, and any
/// state-dependent chrome. Not part of the session's correctness.
pub trait SessionDisplay {
    fn show_elapsed(&mut self, text: &str);
    fn show_waveform(&mut self, spikes: &[Spike]);
    fn session_state_changed(&mut self, state: SessionState);
}

/// State machine for a recording take.
///
/// Invariants: the capture device is producing samples iff the state is
/// `Recording`, and the ticker is running iff the state is `Recording`.
/// The capture handle is acquired at `Recording` entry and released exactly
/// once per take, either by `stop` or inside the failed-start path.
pub struct RecordingSession<C: CaptureDevice> {
    state: SessionState,
    capture: C,
    ticker: Ticker,
    waveform: AmplitudeBuffer,
    /// chrono format string the take name is derived from.
    name_format: String,
    /// Output file for the current take; set at `Recording` entry, cleared
    /// when the take is saved or deleted.
    output_path: Option<PathBuf>,
}

impl<C: CaptureDevice> RecordingSession<C> {
    pub fn new(
        capture: C,
        layout: WaveformLayout,
        tick_interval: Duration,
        name_format: String,
    ) -> Self {
        RecordingSession {
            state: SessionState::Idle,
            capture,
            ticker: Ticker::new(tick_interval),
            waveform: AmplitudeBuffer::new(layout),
            name_format,
            output_path: None,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Output file of the take in progress (or finished, before save/delete).
    pub fn output_path(&self) -> Option<&Path> {
        self.output_path.as_deref()
    }

    /// File stem of the current take, used to prefill the rename prompt.
    pub fn take_name(&self) -> Option<&str> {
        self.output_path
            .as_deref()
            .and_then(|p| p.file_stem())
            .and_then(|s| s.to_str())
    }

    /// The single record/pause/resume button: starts a take from `Idle`,
    /// pauses from `Recording`, resumes from `Paused`. Returns the new state.
    pub fn primary_action(
        &mut self,
        store: &impl FileStore,
        display: &mut impl SessionDisplay,
    ) -> Result<SessionState, SessionError> {
        match self.state {
            SessionState::Idle => {
                let name = chrono::Local::now().format(&self.name_format).to_string();
                let path = store.take_dir().join(format!("{name}.{TAKE_EXT}"));

                // Start the device first: on failure the session stays Idle
                // with ticker and buffer untouched.
                self.capture
                    .prepare_and_start(&path)
                    .map_err(SessionError::CaptureStart)?;

                tracing::info!("Take started: {}", path.display());
                self.output_path = Some(path);
                let _ = self.waveform.clear();
                display.show_waveform(self.waveform.spikes());
                self.ticker.start();
                self.transition(SessionState::Recording, display);
            }
            SessionState::Recording => {
                self.capture.pause()?;
                self.ticker.pause();
                self.transition(SessionState::Paused, display);
            }
            SessionState::Paused => {
                self.capture.resume()?;
                self.ticker.start();
                self.transition(SessionState::Recording, display);
            }
            SessionState::Stopped => {
                return Err(self.rejected("start a new take"));
            }
        }
        Ok(self.state)
    }

    /// Finishes the take: stops the ticker, releases the capture device, and
    /// drains the amplitude buffer.
    pub fn stop(&mut self, display: &mut impl SessionDisplay) -> Result<FinishedTake, SessionError> {
        if !matches!(self.state, SessionState::Recording | SessionState::Paused) {
            return Err(self.rejected("stop"));
        }
        let path = match self.output_path.clone() {
            Some(path) => path,
            None => return Err(self.rejected("stop")),
        };

        let duration = self.ticker.elapsed();
        self.ticker.stop();
        let released = self.capture.stop_and_release();

        // The take is over even if finalizing the file failed; the handle is
        // gone either way and the buffer must not leak into the next take.
        let samples = self.waveform.clear();
        self.transition(SessionState::Stopped, display);
        display.show_waveform(&[]);
        display.show_elapsed(ZERO_ELAPSED);
        released?;

        tracing::info!(
            "Take stopped after {}: {} samples",
            format_elapsed(duration),
            samples.len()
        );
        Ok(FinishedTake {
            path,
            samples,
            duration,
        })
    }

    /// Discards the finished take's output file and returns to `Idle`.
    pub fn delete(
        &mut self,
        store: &impl FileStore,
        display: &mut impl SessionDisplay,
    ) -> Result<(), SessionError> {
        if self.state != SessionState::Stopped {
            return Err(self.rejected("delete"));
        }
        if let Some(path) = self.output_path.as_deref() {
            match store.delete_take(path) {
                Ok(()) => {}
                // Nothing left to discard; still a clean reset.
                Err(StoreError::NotFound(_)) => {
                    tracing::warn!("Take file already gone: {}", path.display());
                }
                Err(e) => return Err(e.into()),
            }
        }
        self.output_path = None;
        self.transition(SessionState::Idle, display);
        Ok(())
    }

    /// Finalizes the finished take under the given name and returns to
    /// `Idle`. On failure (name collision, storage error) the session stays
    /// `Stopped` so the caller can retry with another name.
    pub fn save(
        &mut self,
        store: &impl FileStore,
        display: &mut impl SessionDisplay,
        name: &str,
    ) -> Result<PathBuf, SessionError> {
        if self.state != SessionState::Stopped {
            return Err(self.rejected("save"));
        }
        let path = match self.output_path.as_deref() {
            Some(path) => path,
            None => return Err(self.rejected("save")),
        };

        let saved = store.rename_take(path, name)?;
        self.output_path = None;
        self.transition(SessionState::Idle, display);
        Ok(saved)
    }

    /// Pumps the cooperative timer. On a tick while `Recording`, pulls the
    /// device's peak amplitude into the buffer and refreshes the display.
    /// A no-op in every other state.
    pub fn pump(&mut self, display: &mut impl SessionDisplay) {
        if self.state != SessionState::Recording {
            return;
        }
        if let Some(elapsed_text) = self.ticker.poll() {
            let amplitude = self.capture.current_peak_amplitude();
            let spikes = self.waveform.append(amplitude);
            display.show_waveform(spikes);
            display.show_elapsed(&elapsed_text);
        }
    }

    /// Reconfigures the waveform display width (e.g. on terminal resize) and
    /// repaints the rebuilt window right away, without waiting for a tick.
    pub fn set_display_width(&mut self, display_width: f32, display: &mut impl SessionDisplay) {
        self.waveform.set_display_width(display_width);
        display.show_waveform(self.waveform.spikes());
    }

    fn transition(&mut self, next: SessionState, display: &mut impl SessionDisplay) {
        tracing::debug!("Session: {} -> {}", self.state, next);
        self.state = next;
        display.session_state_changed(next);
    }

    fn rejected(&self, event: &'static str) -> SessionError {
        SessionError::InvalidTransition {
            state: self.state,
            event,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::VecDeque;

    #[derive(Default)]
    struct FakeCapture {
        fail_start: bool,
        active: bool,
        paused: bool,
        starts: usize,
        releases: usize,
        amplitudes: VecDeque<u32>,
    }

    impl CaptureDevice for FakeCapture {
        fn prepare_and_start(&mut self, _output_path: &Path) -> Result<(), CaptureError> {
            if self.fail_start {
                return Err(CaptureError::NoDevice);
            }
            assert!(!self.active, "capture handle leaked across takes");
            self.active = true;
            self.paused = false;
            self.starts += 1;
            Ok(())
        }

        fn pause(&mut self) -> Result<(), CaptureError> {
            if !self.active {
                return Err(CaptureError::Transition("pause before start"));
            }
            self.paused = true;
            Ok(())
        }

        fn resume(&mut self) -> Result<(), CaptureError> {
            if !self.active {
                return Err(CaptureError::Transition("resume before start"));
            }
            self.paused = false;
            Ok(())
        }

        fn stop_and_release(&mut self) -> Result<(), CaptureError> {
            if !self.active {
                return Err(CaptureError::Transition("stop before start"));
            }
            self.active = false;
            self.releases += 1;
            Ok(())
        }

        fn current_peak_amplitude(&mut self) -> u32 {
            self.amplitudes.pop_front().unwrap_or(70)
        }
    }

    struct FakeStore {
        dir: PathBuf,
        deleted: RefCell<Vec<PathBuf>>,
        renamed: RefCell<Vec<(PathBuf, String)>>,
        fail_rename: bool,
        fail_delete: bool,
    }

    impl FakeStore {
        fn new() -> Self {
            FakeStore {
                dir: PathBuf::from("/takes"),
                deleted: RefCell::new(Vec::new()),
                renamed: RefCell::new(Vec::new()),
                fail_rename: false,
                fail_delete: false,
            }
        }
    }

    impl FileStore for FakeStore {
        fn take_dir(&self) -> &Path {
            &self.dir
        }

        fn delete_take(&self, path: &Path) -> Result<(), StoreError> {
            if self.fail_delete {
                return Err(StoreError::Io(std::io::Error::new(
                    std::io::ErrorKind::PermissionDenied,
                    "takes directory unwritable",
                )));
            }
            self.deleted.borrow_mut().push(path.to_path_buf());
            Ok(())
        }

        fn rename_take(&self, path: &Path, new_name: &str) -> Result<PathBuf, StoreError> {
            if self.fail_rename {
                return Err(StoreError::AlreadyExists(new_name.to_string()));
            }
            self.renamed
                .borrow_mut()
                .push((path.to_path_buf(), new_name.to_string()));
            Ok(path.with_file_name(format!("{new_name}.{TAKE_EXT}")))
        }
    }

    #[derive(Default)]
    struct FakeDisplay {
        states: Vec<SessionState>,
        elapsed: Vec<String>,
        waveform_updates: usize,
        last_window: usize,
    }

    impl SessionDisplay for FakeDisplay {
        fn show_elapsed(&mut self, text: &str) {
            self.elapsed.push(text.to_string());
        }

        fn show_waveform(&mut self, spikes: &[Spike]) {
            self.waveform_updates += 1;
            self.last_window = spikes.len();
        }

        fn session_state_changed(&mut self, state: SessionState) {
            self.states.push(state);
        }
    }

    // Zero tick interval: every pump while Recording delivers one tick.
    fn session(capture: FakeCapture) -> RecordingSession<FakeCapture> {
        RecordingSession::new(
            capture,
            WaveformLayout::new(90.0, 400.0, 9.0, 6.0).unwrap(),
            Duration::ZERO,
            "take_%Y%m%d_%H%M%S".to_string(),
        )
    }

    #[test]
    fn test_primary_action_starts_a_take() {
        let store = FakeStore::new();
        let mut display = FakeDisplay::default();
        let mut s = session(FakeCapture::default());

        assert_eq!(
            s.primary_action(&store, &mut display).unwrap(),
            SessionState::Recording
        );
        assert_eq!(s.state(), SessionState::Recording);
        assert!(s.capture.active);
        assert!(s.ticker.is_running());
        let path = s.output_path().unwrap();
        assert!(path.starts_with("/takes"));
        assert_eq!(path.extension().unwrap(), "wav");
        assert_eq!(display.states, vec![SessionState::Recording]);
    }

    #[test]
    fn test_failed_start_leaves_session_untouched() {
        let store = FakeStore::new();
        let mut display = FakeDisplay::default();
        let mut s = session(FakeCapture {
            fail_start: true,
            ..FakeCapture::default()
        });

        let err = s.primary_action(&store, &mut display).unwrap_err();
        assert!(matches!(err, SessionError::CaptureStart(_)));
        assert_eq!(s.state(), SessionState::Idle);
        assert!(!s.ticker.is_running());
        assert!(s.waveform.is_empty());
        assert!(s.output_path().is_none());
        assert!(display.states.is_empty());
    }

    #[test]
    fn test_tick_pulls_amplitude_into_buffer() {
        let store = FakeStore::new();
        let mut display = FakeDisplay::default();
        let mut s = session(FakeCapture {
            amplitudes: VecDeque::from([2800, 700]),
            ..FakeCapture::default()
        });

        s.primary_action(&store, &mut display).unwrap();
        s.pump(&mut display);
        s.pump(&mut display);

        assert_eq!(s.waveform.sample_count(), 2);
        // One render for the cleared buffer at take start plus one per tick.
        assert_eq!(display.waveform_updates, 3);
        assert_eq!(display.last_window, 2);
        assert_eq!(display.elapsed.len(), 2);

        let take = s.stop(&mut display).unwrap();
        assert_eq!(take.samples, vec![400, 100]);
    }

    #[test]
    fn test_pause_resume_stop_cycle() {
        let store = FakeStore::new();
        let mut display = FakeDisplay::default();
        let mut s = session(FakeCapture::default());

        s.primary_action(&store, &mut display).unwrap();
        s.pump(&mut display);

        assert_eq!(
            s.primary_action(&store, &mut display).unwrap(),
            SessionState::Paused
        );
        assert!(s.capture.paused);
        assert!(!s.ticker.is_running());

        // Paused: pumping delivers no ticks and appends nothing.
        let appended = s.waveform.sample_count();
        s.pump(&mut display);
        assert_eq!(s.waveform.sample_count(), appended);

        assert_eq!(
            s.primary_action(&store, &mut display).unwrap(),
            SessionState::Recording
        );
        assert!(!s.capture.paused);
        s.pump(&mut display);

        let take = s.stop(&mut display).unwrap();
        assert_eq!(take.samples.len(), 2);
        assert_eq!(s.state(), SessionState::Stopped);
        assert_eq!(s.capture.releases, 1);
        assert!(!s.ticker.is_running());
        // Timer readout reset for the next take.
        assert_eq!(display.elapsed.last().unwrap(), ZERO_ELAPSED);
        assert_eq!(display.last_window, 0);
    }

    #[test]
    fn test_invalid_transitions_rejected() {
        let store = FakeStore::new();
        let mut display = FakeDisplay::default();
        let mut s = session(FakeCapture::default());

        assert!(matches!(
            s.stop(&mut display),
            Err(SessionError::InvalidTransition { .. })
        ));
        assert!(matches!(
            s.delete(&store, &mut display),
            Err(SessionError::InvalidTransition { .. })
        ));
        assert_eq!(s.state(), SessionState::Idle);

        s.primary_action(&store, &mut display).unwrap();
        assert!(matches!(
            s.save(&store, &mut display, "notes"),
            Err(SessionError::InvalidTransition { .. })
        ));
        assert_eq!(s.state(), SessionState::Recording);

        s.stop(&mut display).unwrap();
        assert!(matches!(
            s.stop(&mut display),
            Err(SessionError::InvalidTransition { .. })
        ));
        assert!(matches!(
            s.primary_action(&store, &mut display),
            Err(SessionError::InvalidTransition { .. })
        ));
        assert_eq!(s.capture.releases, 1);
    }

    #[test]
    fn test_delete_discards_and_returns_to_idle() {
        let store = FakeStore::new();
        let mut display = FakeDisplay::default();
        let mut s = session(FakeCapture::default());

        s.primary_action(&store, &mut display).unwrap();
        let take = s.stop(&mut display).unwrap();
        s.delete(&store, &mut display).unwrap();

        assert_eq!(s.state(), SessionState::Idle);
        assert!(s.output_path().is_none());
        assert_eq!(store.deleted.borrow().as_slice(), &[take.path]);

        // A fresh take starts cleanly after the reset.
        s.primary_action(&store, &mut display).unwrap();
        assert_eq!(s.capture.starts, 2);
        assert!(s.waveform.is_empty());
    }

    #[test]
    fn test_save_renames_and_returns_to_idle() {
        let store = FakeStore::new();
        let mut display = FakeDisplay::default();
        let mut s = session(FakeCapture::default());

        s.primary_action(&store, &mut display).unwrap();
        s.stop(&mut display).unwrap();
        let saved = s.save(&store, &mut display, "standup").unwrap();

        assert_eq!(saved.file_name().unwrap(), "standup.wav");
        assert_eq!(s.state(), SessionState::Idle);
        assert_eq!(store.renamed.borrow().len(), 1);
    }

    #[test]
    fn test_failed_save_stays_stopped_for_retry() {
        let mut store = FakeStore::new();
        store.fail_rename = true;
        let mut display = FakeDisplay::default();
        let mut s = session(FakeCapture::default());

        s.primary_action(&store, &mut display).unwrap();
        s.stop(&mut display).unwrap();
        assert!(matches!(
            s.save(&store, &mut display, "clash"),
            Err(SessionError::Store(StoreError::AlreadyExists(_)))
        ));
        assert_eq!(s.state(), SessionState::Stopped);
        assert!(s.output_path().is_some());

        store.fail_rename = false;
        s.save(&store, &mut display, "clash2").unwrap();
        assert_eq!(s.state(), SessionState::Idle);
    }

    #[test]
    fn test_failed_delete_stays_stopped_for_retry() {
        let mut store = FakeStore::new();
        store.fail_delete = true;
        let mut display = FakeDisplay::default();
        let mut s = session(FakeCapture::default());

        s.primary_action(&store, &mut display).unwrap();
        s.stop(&mut display).unwrap();
        assert!(matches!(
            s.delete(&store, &mut display),
            Err(SessionError::Store(StoreError::Io(_)))
        ));
        assert_eq!(s.state(), SessionState::Stopped);
        assert!(s.output_path().is_some());

        store.fail_delete = false;
        s.delete(&store, &mut display).unwrap();
        assert_eq!(s.state(), SessionState::Idle);
    }

    #[test]
    fn test_resize_repaints_without_waiting_for_a_tick() {
        let store = FakeStore::new();
        let mut display = FakeDisplay::default();
        let mut s = session(FakeCapture::default());

        s.primary_action(&store, &mut display).unwrap();
        for _ in 0..10 {
            s.pump(&mut display);
        }
        assert_eq!(display.last_window, 6);

        // Pause first so the repaint cannot come from a tick.
        s.primary_action(&store, &mut display).unwrap();
        let updates = display.waveform_updates;
        s.set_display_width(45.0, &mut display);
        assert_eq!(display.waveform_updates, updates + 1);
        // 45 / (9 + 6) = 3 visible bars after shrinking.
        assert_eq!(display.last_window, 3);
    }

    #[test]
    fn test_visible_window_stays_bounded_over_long_takes() {
        let store = FakeStore::new();
        let mut display = FakeDisplay::default();
        let mut s = session(FakeCapture::default());

        s.primary_action(&store, &mut display).unwrap();
        for _ in 0..40 {
            s.pump(&mut display);
        }
        // 90 / (9 + 6) = 6 visible bars no matter how long the take runs.
        assert_eq!(display.last_window, 6);
        assert_eq!(s.stop(&mut display).unwrap().samples.len(), 40);
    }
}
