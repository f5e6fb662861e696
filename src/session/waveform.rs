//! Bounded amplitude buffer and waveform geometry.
//!
//! Raw device amplitudes are normalized on append and the visible bar
//! geometry is recomputed from the most recent samples only, so the cost per
//! append is bounded by the display width regardless of take length.

use anyhow::{anyhow, Result};

/// Raw amplitudes are compressed by this divisor before storage.
const AMPLITUDE_DIVISOR: u32 = 7;
/// Normalized amplitudes are clamped to this ceiling.
const AMPLITUDE_CEILING: u32 = 400;

/// One rendered waveform bar, in display coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Spike {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl Spike {
    pub fn height(&self) -> f32 {
        self.bottom - self.top
    }
}

/// Display geometry the visible window is computed against.
#[derive(Debug, Clone, Copy)]
pub struct WaveformLayout {
    display_width: f32,
    display_height: f32,
    bar_width: f32,
    gap: f32,
}

impl WaveformLayout {
    /// # Errors
    /// - If `bar_width + gap` is not positive (the window size would be
    ///   undefined)
    pub fn new(display_width: f32, display_height: f32, bar_width: f32, gap: f32) -> Result<Self> {
        if bar_width + gap <= 0.0 {
            return Err(anyhow!(
                "waveform bar width plus gap must be positive (got {bar_width} + {gap})"
            ));
        }
        Ok(WaveformLayout {
            display_width,
            display_height,
            bar_width,
            gap,
        })
    }

    /// Number of bars that fit the display width. Zero when the width is
    /// unknown or non-positive, in which case nothing is drawn.
    pub fn max_spikes(&self) -> usize {
        if self.display_width <= 0.0 {
            return 0;
        }
        (self.display_width / (self.bar_width + self.gap)) as usize
    }
}

/// Append-only amplitude history with a display-width-bounded visible window.
///
/// The full normalized history is retained until [`AmplitudeBuffer::clear`]
/// drains it; only the most recent `max_spikes` samples carry geometry.
pub struct AmplitudeBuffer {
    layout: WaveformLayout,
    samples: Vec<u32>,
    spikes: Vec<Spike>,
}

impl AmplitudeBuffer {
    pub fn new(layout: WaveformLayout) -> Self {
        AmplitudeBuffer {
            layout,
            samples: Vec::new(),
            spikes: Vec::new(),
        }
    }

    /// Normalizes and appends one raw amplitude, then recomputes the visible
    /// window. Returns the window so the owner can trigger a render.
    pub fn append(&mut self, raw_amplitude: u32) -> &[Spike] {
        let value = (raw_amplitude / AMPLITUDE_DIVISOR).min(AMPLITUDE_CEILING);
        self.samples.push(value);
        self.rebuild_spikes();
        &self.spikes
    }

    /// Drains the buffer, returning the full normalized history in append
    /// order. The buffer and its visible window are empty afterwards.
    pub fn clear(&mut self) -> Vec<u32> {
        self.spikes.clear();
        std::mem::take(&mut self.samples)
    }

    /// Visible window geometry, most recent sample first.
    pub fn spikes(&self) -> &[Spike] {
        &self.spikes
    }

    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Reconfigures the display width (e.g. after a terminal resize) and
    /// recomputes the visible window against it.
    pub fn set_display_width(&mut self, display_width: f32) {
        self.layout.display_width = display_width;
        self.rebuild_spikes();
    }

    fn rebuild_spikes(&mut self) {
        let layout = &self.layout;
        let step = layout.bar_width + layout.gap;
        self.spikes.clear();
        for (i, &value) in self
            .samples
            .iter()
            .rev()
            .take(layout.max_spikes())
            .enumerate()
        {
            let height = (value as f32).min(layout.display_height);
            let left = layout.display_width - i as f32 * step;
            let top = layout.display_height / 2.0 - height / 2.0;
            self.spikes.push(Spike {
                left,
                top,
                right: left + layout.bar_width,
                bottom: top + height,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn buffer(width: f32) -> AmplitudeBuffer {
        AmplitudeBuffer::new(WaveformLayout::new(width, 400.0, 9.0, 6.0).unwrap())
    }

    #[test]
    fn test_normalization_boundaries() {
        let mut buf = buffer(90.0);
        buf.append(2800);
        buf.append(700);
        buf.append(0);
        assert_eq!(buf.clear(), vec![400, 100, 0]);
    }

    #[test]
    fn test_window_bounded_by_display_width() {
        // 90 / (9 + 6) = 6 bars.
        let mut buf = buffer(90.0);
        for _ in 0..8 {
            buf.append(70);
        }
        assert_eq!(buf.spikes().len(), 6);
        assert_eq!(buf.sample_count(), 8);
    }

    #[test]
    fn test_window_smaller_than_capacity() {
        let mut buf = buffer(90.0);
        buf.append(70);
        buf.append(70);
        assert_eq!(buf.spikes().len(), 2);
    }

    #[test]
    fn test_geometry_of_most_recent_spike() {
        let mut buf = buffer(90.0);
        for _ in 0..8 {
            buf.append(700); // normalizes to 100
        }
        let newest = buf.spikes()[0];
        assert_eq!(newest.left, 90.0);
        assert_eq!(newest.right, 99.0);
        assert_eq!(newest.top, 150.0);
        assert_eq!(newest.bottom, 250.0);
        // Older bars step left by bar width plus gap.
        assert_eq!(buf.spikes()[1].left, 75.0);
        assert_eq!(buf.spikes()[5].left, 15.0);
    }

    #[test]
    fn test_height_clamped_to_display_height() {
        let mut buf =
            AmplitudeBuffer::new(WaveformLayout::new(90.0, 80.0, 9.0, 6.0).unwrap());
        buf.append(2800); // normalizes to 400, taller than the display
        let spike = buf.spikes()[0];
        assert_eq!(spike.height(), 80.0);
        assert_eq!(spike.top, 0.0);
        assert_eq!(spike.bottom, 80.0);
    }

    #[test]
    fn test_clear_round_trip_and_reset() {
        let mut buf = buffer(90.0);
        buf.append(70);
        buf.append(140);
        assert_eq!(buf.clear(), vec![10, 20]);
        assert!(buf.is_empty());
        assert!(buf.spikes().is_empty());
    }

    #[test]
    fn test_zero_width_draws_nothing() {
        let mut buf = buffer(0.0);
        buf.append(700);
        assert!(buf.spikes().is_empty());
        assert_eq!(buf.sample_count(), 1);
    }

    #[test]
    fn test_reconfigure_width() {
        let mut buf = buffer(0.0);
        for _ in 0..4 {
            buf.append(700);
        }
        assert!(buf.spikes().is_empty());
        buf.set_display_width(45.0); // 3 bars
        assert_eq!(buf.spikes().len(), 3);
    }

    #[test]
    fn test_invalid_layout_rejected() {
        assert!(WaveformLayout::new(90.0, 400.0, 0.0, 0.0).is_err());
        assert!(WaveformLayout::new(90.0, 400.0, 3.0, -3.0).is_err());
    }
}
