//! Cooperative recording timer.
//!
//! The ticker is polled from the UI loop rather than driven by a timer thread.
//! Each tick carries the elapsed recording time formatted as `MM:SS.hh`,
//! excluding any time spent paused.

use std::time::{Duration, Instant};

/// Timer text shown when no take is in progress.
pub const ZERO_ELAPSED: &str = "00:00.00";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TickerState {
    Stopped,
    Running,
    Paused,
}

/// Periodic elapsed-time source for a recording take.
///
/// `start` begins or resumes delivery, `pause` freezes the elapsed time,
/// `stop` resets it to zero. Ticks are observed by calling [`Ticker::poll`]
/// from the event loop; no tick is ever produced while paused or stopped,
/// so pause/stop take effect before the next tick by construction.
pub struct Ticker {
    interval: Duration,
    state: TickerState,
    /// Elapsed time accumulated over earlier running intervals.
    accumulated: Duration,
    /// When the current running interval began.
    resumed_at: Option<Instant>,
    /// When the next tick is due.
    next_tick: Option<Instant>,
}

impl Ticker {
    pub fn new(interval: Duration) -> Self {
        Ticker {
            interval,
            state: TickerState::Stopped,
            accumulated: Duration::ZERO,
            resumed_at: None,
            next_tick: None,
        }
    }

    /// Begins or resumes tick delivery. Idempotent while already running.
    pub fn start(&mut self) {
        self.start_at(Instant::now());
    }

    /// Freezes the elapsed time and halts tick delivery.
    pub fn pause(&mut self) {
        self.pause_at(Instant::now());
    }

    /// Halts tick delivery and resets the elapsed time to zero.
    pub fn stop(&mut self) {
        self.state = TickerState::Stopped;
        self.accumulated = Duration::ZERO;
        self.resumed_at = None;
        self.next_tick = None;
    }

    /// Returns the formatted elapsed time if a tick is due, `None` otherwise.
    pub fn poll(&mut self) -> Option<String> {
        self.poll_at(Instant::now())
    }

    /// Elapsed recording time, excluding paused intervals.
    pub fn elapsed(&self) -> Duration {
        self.elapsed_at(Instant::now())
    }

    pub fn is_running(&self) -> bool {
        self.state == TickerState::Running
    }

    fn start_at(&mut self, now: Instant) {
        if self.state == TickerState::Running {
            return;
        }
        self.resumed_at = Some(now);
        self.next_tick = Some(now + self.interval);
        self.state = TickerState::Running;
    }

    fn pause_at(&mut self, now: Instant) {
        if self.state != TickerState::Running {
            return;
        }
        self.accumulated = self.elapsed_at(now);
        self.resumed_at = None;
        self.next_tick = None;
        self.state = TickerState::Paused;
    }

    fn poll_at(&mut self, now: Instant) -> Option<String> {
        let due = self.next_tick?;
        if now < due {
            return None;
        }
        // Schedule relative to now so a stalled loop does not burst-deliver
        // a backlog of ticks.
        self.next_tick = Some(now + self.interval);
        Some(format_elapsed(self.elapsed_at(now)))
    }

    fn elapsed_at(&self, now: Instant) -> Duration {
        match self.resumed_at {
            Some(resumed) => self.accumulated + now.saturating_duration_since(resumed),
            None => self.accumulated,
        }
    }
}

/// Formats a duration as `MM:SS.hh` (minutes, seconds, hundredths).
pub fn format_elapsed(elapsed: Duration) -> String {
    let hundredths = elapsed.as_millis() / 10;
    let minutes = hundredths / 6000;
    let seconds = (hundredths / 100) % 60;
    let rest = hundredths % 100;
    format!("{minutes:02}:{seconds:02}.{rest:02}")
}
