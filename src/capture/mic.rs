//! cpal-based microphone capture.
//!
//! Captures i16 PCM from the system's default (or a named) input device,
//! averages multi-channel audio down to mono, tracks the peak amplitude for
//! the waveform display, and writes the finished take as a WAV file.

use super::{CaptureDevice, CaptureError};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use hound::WavWriter;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

#[cfg(target_os = "linux")]
use std::fs::OpenOptions;
#[cfg(target_os = "linux")]
use std::os::unix::io::AsRawFd;

/// Microphone capture device backed by cpal.
///
/// One `MicCapture` serves one take at a time: `prepare_and_start` opens the
/// stream, `stop_and_release` closes it and writes the WAV. The stream
/// callback keeps appending while unpaused; the pause flag is checked inside
/// the callback so pause takes effect without tearing the stream down.
pub struct MicCapture {
    /// Device name, numeric index, or "default".
    device_name: String,
    /// Actual sample rate, updated from the device at start.
    sample_rate: u32,
    /// Captured mono samples for the current take.
    samples: Arc<Mutex<Vec<i16>>>,
    /// Peak amplitude since the last poll, reset on read.
    peak: Arc<Mutex<u32>>,
    is_paused: Arc<Mutex<bool>>,
    /// Active input stream; `Some` exactly while a take is being captured.
    stream: Option<cpal::Stream>,
    output_path: Option<PathBuf>,
}

impl MicCapture {
    /// Creates a capture handle for the requested sample rate and device.
    /// The actual rate may differ based on device capabilities.
    pub fn new(requested_sample_rate: u32, device_name: String) -> Self {
        MicCapture {
            device_name,
            sample_rate: requested_sample_rate,
            samples: Arc::new(Mutex::new(Vec::new())),
            peak: Arc::new(Mutex::new(0)),
            is_paused: Arc::new(Mutex::new(false)),
            stream: None,
            output_path: None,
        }
    }

    /// Folds an input buffer down to mono and tracks the peak amplitude.
    fn handle_audio_callback(
        data: &[i16],
        samples_arc: &Arc<Mutex<Vec<i16>>>,
        peak_arc: &Arc<Mutex<u32>>,
        num_channels: usize,
    ) {
        let mut samples = samples_arc.lock().unwrap();
        let mut peak = peak_arc.lock().unwrap();

        match num_channels {
            1 => {
                for &sample in data {
                    *peak = (*peak).max(sample.unsigned_abs() as u32);
                }
                samples.extend_from_slice(data);
            }
            _ => {
                // Average all channels per frame.
                for chunk in data.chunks_exact(num_channels) {
                    let sum: i32 = chunk.iter().map(|&s| s as i32).sum();
                    let mono = (sum / num_channels as i32) as i16;
                    *peak = (*peak).max(mono.unsigned_abs() as u32);
                    samples.push(mono);
                }
            }
        }
    }

    /// Writes the captured samples as a 16-bit mono WAV file.
    fn save_wav(&self, samples: &[i16], path: &Path) -> Result<(), CaptureError> {
        let wav_spec = hound::WavSpec {
            channels: 1,
            sample_rate: self.sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };

        let mut writer = WavWriter::create(path, wav_spec)?;
        for &sample in samples {
            writer.write_sample(sample)?;
        }
        writer.finalize()?;

        tracing::debug!("Take written: {}", path.display());
        Ok(())
    }
}

impl CaptureDevice for MicCapture {
    fn prepare_and_start(&mut self, output_path: &Path) -> Result<(), CaptureError> {
        if self.stream.is_some() {
            return Err(CaptureError::Transition("already capturing"));
        }

        // Get device while suppressing ALSA library warnings
        let device = suppress_alsa_warnings(|| {
            let host = cpal::default_host();
            if self.device_name == "default" {
                host.default_input_device().ok_or(CaptureError::NoDevice)
            } else {
                find_device_by_name(&host, &self.device_name)
            }
        })?;

        let device_name = device
            .name()
            .unwrap_or_else(|_| "Unknown device".to_string());
        tracing::info!("Recording device: {}", device_name);

        let device_config = device
            .default_input_config()
            .map_err(|e| CaptureError::Configure(e.to_string()))?;
        let device_sample_rate = device_config.sample_rate().0;
        let num_channels = device_config.channels() as usize;

        if device_sample_rate != self.sample_rate {
            tracing::warn!(
                "Requested sample rate {}Hz but device uses {}Hz. Recording at device rate.",
                self.sample_rate,
                device_sample_rate
            );
        }
        self.sample_rate = device_sample_rate;

        self.samples.lock().unwrap().clear();
        *self.peak.lock().unwrap() = 0;
        *self.is_paused.lock().unwrap() = false;

        let samples_arc = Arc::clone(&self.samples);
        let peak_arc = Arc::clone(&self.peak);
        let pause_arc = Arc::clone(&self.is_paused);

        let stream = device
            .build_input_stream(
                &device_config.into(),
                move |data: &[i16], _: &cpal::InputCallbackInfo| {
                    let is_paused = *pause_arc.lock().unwrap();
                    if !is_paused {
                        Self::handle_audio_callback(data, &samples_arc, &peak_arc, num_channels);
                    }
                },
                |err| {
                    tracing::error!("Audio stream error: {}", err);
                },
                None,
            )
            .map_err(|e| CaptureError::Stream(e.to_string()))?;

        stream
            .play()
            .map_err(|e| CaptureError::Stream(e.to_string()))?;
        self.stream = Some(stream);
        self.output_path = Some(output_path.to_path_buf());

        tracing::debug!(
            "Audio stream started: {}Hz, {} channels -> {}",
            device_sample_rate,
            num_channels,
            output_path.display()
        );
        Ok(())
    }

    fn pause(&mut self) -> Result<(), CaptureError> {
        if self.stream.is_none() {
            return Err(CaptureError::Transition("pause before start"));
        }
        *self.is_paused.lock().unwrap() = true;
        tracing::debug!("Capture paused");
        Ok(())
    }

    fn resume(&mut self) -> Result<(), CaptureError> {
        if self.stream.is_none() {
            return Err(CaptureError::Transition("resume before start"));
        }
        *self.is_paused.lock().unwrap() = false;
        tracing::debug!("Capture resumed");
        Ok(())
    }

    fn stop_and_release(&mut self) -> Result<(), CaptureError> {
        if self.stream.take().is_none() {
            return Err(CaptureError::Transition("stop before start"));
        }
        let output_path = self
            .output_path
            .take()
            .ok_or(CaptureError::Transition("no output path for take"))?;

        let samples = std::mem::take(&mut *self.samples.lock().unwrap());
        let duration_secs = samples.len() as f32 / self.sample_rate as f32;
        tracing::info!(
            "Capture stopped: {:.2}s ({} samples at {}Hz)",
            duration_secs,
            samples.len(),
            self.sample_rate
        );

        self.save_wav(&samples, &output_path)
    }

    fn current_peak_amplitude(&mut self) -> u32 {
        // Read-and-reset, so each tick sees the peak of its own interval.
        std::mem::take(&mut *self.peak.lock().unwrap())
    }
}

/// Finds an audio input device by name or numeric index.
fn find_device_by_name(host: &cpal::Host, device_spec: &str) -> Result<cpal::Device, CaptureError> {
    let devices: Vec<cpal::Device> = host
        .input_devices()
        .map_err(|e| CaptureError::Configure(format!("failed to enumerate devices: {e}")))?
        .collect();

    if let Ok(index) = device_spec.parse::<usize>() {
        return devices
            .into_iter()
            .nth(index)
            .ok_or_else(|| CaptureError::DeviceNotFound(device_spec.to_string()));
    }

    devices
        .into_iter()
        .find(|d| d.name().is_ok_and(|name| name == device_spec))
        .ok_or_else(|| CaptureError::DeviceNotFound(device_spec.to_string()))
}

/// Temporarily redirects stderr to /dev/null to suppress ALSA library warnings on Linux.
/// On non-Linux platforms, this is a no-op since ALSA doesn't exist.
#[cfg(target_os = "linux")]
pub fn suppress_alsa_warnings<F, T>(f: F) -> Result<T, CaptureError>
where
    F: FnOnce() -> Result<T, CaptureError>,
{
    let dev_null = OpenOptions::new()
        .write(true)
        .open("/dev/null")
        .map_err(|e| CaptureError::Configure(format!("failed to open /dev/null: {e}")))?;

    let dev_null_fd = dev_null.as_raw_fd();

    let old_stderr = unsafe { libc::dup(libc::STDERR_FILENO) };
    if old_stderr == -1 {
        return Err(CaptureError::Configure(
            "failed to duplicate stderr".to_string(),
        ));
    }

    let redirect_result = unsafe { libc::dup2(dev_null_fd, libc::STDERR_FILENO) };
    if redirect_result == -1 {
        unsafe { libc::close(old_stderr) };
        return Err(CaptureError::Configure(
            "failed to redirect stderr".to_string(),
        ));
    }

    let result = f();

    unsafe {
        libc::dup2(old_stderr, libc::STDERR_FILENO);
        libc::close(old_stderr);
    }

    result
}

/// On non-Linux platforms, no stderr suppression is needed since ALSA doesn't exist.
#[cfg(not(target_os = "linux"))]
pub fn suppress_alsa_warnings<F, T>(f: F) -> Result<T, CaptureError>
where
    F: FnOnce() -> Result<T, CaptureError>,
{
    f()
}
