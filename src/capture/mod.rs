//! Audio capture for vrec.
//!
//! Defines the capture seam the recording session drives, plus the cpal-based
//! microphone implementation and device enumeration helpers.

pub mod mic;

use std::path::Path;

pub use mic::MicCapture;

/// Errors produced by a capture device.
#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    #[error("no audio input device available")]
    NoDevice,
    #[error("audio input device '{0}' not found, run 'vrec list-devices' to see available devices")]
    DeviceNotFound(String),
    #[error("failed to configure input device: {0}")]
    Configure(String),
    #[error("failed to start audio stream: {0}")]
    Stream(String),
    /// A lifecycle call arrived while the device was not in a state that
    /// supports it (e.g. pause before start). Caller contract violation.
    #[error("invalid capture transition: {0}")]
    Transition(&'static str),
    #[error("failed to write take audio: {0}")]
    Write(#[from] hound::Error),
}

/// Microphone handle driven by the recording session.
///
/// The handle is exclusively owned for the duration of a take: opened by
/// `prepare_and_start`, released exactly once by `stop_and_release` (or never
/// acquired if the start fails). Amplitude is pulled, not pushed; the session
/// polls `current_peak_amplitude` once per tick.
pub trait CaptureDevice {
    /// Opens the device and begins capturing toward the given output path.
    fn prepare_and_start(&mut self, output_path: &Path) -> Result<(), CaptureError>;

    /// Suspends sample capture without releasing the device.
    fn pause(&mut self) -> Result<(), CaptureError>;

    /// Resumes sample capture after a pause.
    fn resume(&mut self) -> Result<(), CaptureError>;

    /// Stops capturing, writes the take to the output path, and releases the
    /// device handle.
    fn stop_and_release(&mut self) -> Result<(), CaptureError>;

    /// Peak amplitude observed since the previous poll (0..=32767).
    fn current_peak_amplitude(&mut self) -> u32;
}
