//! Recorder screen: elapsed time, live waveform, and key handling.
//!
//! Implements the session's display seam. The session pushes elapsed-time
//! text and waveform geometry into this screen; the screen turns key presses
//! into [`RecorderCommand`]s for the command loop to apply.

use crossterm::{
    event::{self, Event, KeyCode, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Paragraph, Sparkline},
};
use std::io::{stdout, Stdout};
use std::time::{Duration, Instant};
use tui_input::backend::crossterm::EventHandler;
use tui_input::Input;

use crate::session::{SessionDisplay, SessionState, Spike, ZERO_ELAPSED};

/// Accent color for the waveform and the recording indicator.
const ACCENT: Color = Color::Rgb(224, 81, 30);
/// How long a transient notice stays on screen.
const NOTICE_TTL: Duration = Duration::from_secs(4);

/// User input translated for the command loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecorderCommand {
    /// No actionable key pressed
    Continue,
    /// Record / pause / resume (Space)
    Primary,
    /// Finish the take and open the save prompt (Enter or 's')
    Stop,
    /// Finish the take and discard it ('d')
    Delete,
    /// Play back the last saved take ('p')
    Play,
    /// Leave the recorder ('q', Escape, Ctrl+C)
    Quit,
    /// Save prompt confirmed with the entered name
    SaveConfirm(String),
    /// Save prompt dismissed; the take is discarded
    SaveCancel,
}

/// Full-screen recorder TUI.
///
/// Holds only presentation state; all recording state lives in the session.
pub struct RecorderTui {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    /// Amplitude column per terminal cell, 0-100, oldest first.
    wave_columns: Vec<u64>,
    elapsed_text: String,
    state: SessionState,
    /// Full-scale spike height that maps to a maxed-out bar.
    wave_height: f32,
    terminal_width: u16,
    notice: Option<(String, Instant)>,
    /// Rename prompt shown after a take is stopped.
    save_prompt: Option<Input>,
}

impl RecorderTui {
    /// Creates the recorder screen and enters alternate screen mode.
    ///
    /// # Errors
    /// - If terminal cannot be initialized
    /// - If raw mode cannot be enabled
    /// - If alternate screen cannot be entered
    pub fn new(wave_height: f32) -> anyhow::Result<Self> {
        enable_raw_mode()?;
        let mut stdout = stdout();
        execute!(stdout, EnterAlternateScreen)?;

        let backend = CrosstermBackend::new(stdout);
        let terminal = Terminal::new(backend)?;
        let terminal_width = terminal.size()?.width;

        Ok(RecorderTui {
            terminal,
            wave_columns: vec![0; terminal_width as usize],
            elapsed_text: ZERO_ELAPSED.to_string(),
            state: SessionState::Idle,
            wave_height,
            terminal_width,
            notice: None,
            save_prompt: None,
        })
    }

    /// Terminal width in columns.
    pub fn width(&self) -> u16 {
        self.terminal_width
    }

    /// Detects a terminal resize. Returns the new width so the caller can
    /// reconfigure the waveform buffer.
    pub fn check_resize(&mut self) -> anyhow::Result<Option<u16>> {
        let width = self.terminal.size()?.width;
        if width == self.terminal_width {
            return Ok(None);
        }
        self.terminal_width = width;
        self.wave_columns = vec![0; width as usize];
        Ok(Some(width))
    }

    /// Shows a transient notice line (errors, confirmations).
    pub fn notice(&mut self, message: impl Into<String>) {
        self.notice = Some((message.into(), Instant::now()));
    }

    /// Opens the save prompt prefilled with the take's current name.
    pub fn open_save_prompt(&mut self, default_name: &str) {
        self.save_prompt = Some(Input::new(default_name.to_string()));
    }

    /// Polls for one key event and translates it.
    ///
    /// While the save prompt is open, printable keys edit the name; Enter
    /// confirms and Escape cancels. Otherwise keys map directly to commands.
    ///
    /// # Errors
    /// - If event polling fails
    pub fn handle_input(&mut self) -> anyhow::Result<RecorderCommand> {
        if !event::poll(Duration::from_millis(50))? {
            return Ok(RecorderCommand::Continue);
        }
        let Event::Key(key) = event::read()? else {
            return Ok(RecorderCommand::Continue);
        };

        if let Some(input) = self.save_prompt.as_mut() {
            return Ok(match key.code {
                KeyCode::Enter => {
                    let name = input.value().to_string();
                    self.save_prompt = None;
                    RecorderCommand::SaveConfirm(name)
                }
                KeyCode::Esc => {
                    self.save_prompt = None;
                    RecorderCommand::SaveCancel
                }
                _ => {
                    input.handle_event(&Event::Key(key));
                    RecorderCommand::Continue
                }
            });
        }

        Ok(match key.code {
            KeyCode::Char(' ') => RecorderCommand::Primary,
            KeyCode::Enter | KeyCode::Char('s') => RecorderCommand::Stop,
            KeyCode::Char('d') => RecorderCommand::Delete,
            // Playback is only offered between takes, as the legend says.
            KeyCode::Char('p') if self.state == SessionState::Idle => RecorderCommand::Play,
            KeyCode::Char('q') | KeyCode::Esc => RecorderCommand::Quit,
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                RecorderCommand::Quit
            }
            _ => RecorderCommand::Continue,
        })
    }

    /// Renders one frame: mirrored waveform, status footer, and the save
    /// prompt when open.
    ///
    /// # Errors
    /// - If terminal rendering fails
    pub fn render(&mut self) -> anyhow::Result<()> {
        if self
            .notice
            .as_ref()
            .is_some_and(|(_, since)| since.elapsed() >= NOTICE_TTL)
        {
            self.notice = None;
        }

        let wave_columns = &self.wave_columns;
        let mirror_columns: Vec<u64> = wave_columns.iter().map(|&v| 100 - v.min(100)).collect();
        let state = self.state;
        let elapsed_text = self.elapsed_text.clone();
        let notice = self.notice.as_ref().map(|(text, _)| text.clone());
        let save_prompt = self.save_prompt.as_ref().map(|i| i.value().to_string());

        self.terminal.draw(|frame| {
            let area = frame.area();
            let footer_height = 2;

            let content_area = Rect {
                x: area.x,
                y: area.y,
                width: area.width,
                height: area.height.saturating_sub(footer_height),
            };

            // Bars grow up from the midline in the top half; the bottom half
            // draws the inverted data with swapped colors so the accent shows
            // through as the mirror image.
            let top_height = content_area.height / 2;
            let top_area = Rect {
                height: top_height,
                ..content_area
            };
            let bottom_area = Rect {
                y: content_area.y + top_height,
                height: content_area.height.saturating_sub(top_height),
                ..content_area
            };

            let top = Sparkline::default()
                .data(wave_columns)
                .max(100)
                .style(Style::default().bg(Color::Black).fg(ACCENT));
            frame.render_widget(top, top_area);

            let bottom = Sparkline::default()
                .data(&mirror_columns)
                .max(100)
                .style(Style::default().bg(ACCENT).fg(Color::Black));
            frame.render_widget(bottom, bottom_area);

            let (indicator, indicator_style) = match state {
                SessionState::Recording => ("● ", Style::default().fg(ACCENT)),
                SessionState::Paused => ("⏸ ", Style::default().fg(Color::Yellow)),
                SessionState::Idle | SessionState::Stopped => {
                    ("■ ", Style::default().fg(Color::DarkGray))
                }
            };
            let legend = if save_prompt.is_some() {
                "enter save · esc discard"
            } else {
                match state {
                    SessionState::Idle => "space record · p play last · q quit",
                    SessionState::Recording => "space pause · enter save · d discard · q quit",
                    SessionState::Paused => "space resume · enter save · d discard · q quit",
                    SessionState::Stopped => "enter name it · d discard · q quit",
                }
            };

            let status = Line::from(vec![
                Span::styled(indicator, indicator_style),
                Span::raw(elapsed_text),
                Span::raw("  "),
                Span::styled(legend, Style::default().fg(Color::DarkGray)),
            ]);
            let status_area = Rect {
                x: area.x,
                y: area.y + area.height.saturating_sub(2),
                width: area.width,
                height: 1,
            };
            frame.render_widget(
                Paragraph::new(status).style(Style::default().bg(Color::Black)),
                status_area,
            );

            let notice_line = match &notice {
                Some(text) => Line::styled(text.as_str(), Style::default().fg(Color::Yellow)),
                None => Line::raw(""),
            };
            let notice_area = Rect {
                x: area.x,
                y: area.y + area.height.saturating_sub(1),
                width: area.width,
                height: 1,
            };
            frame.render_widget(
                Paragraph::new(notice_line).style(Style::default().bg(Color::Black)),
                notice_area,
            );

            if let Some(value) = &save_prompt {
                let prompt_width = (area.width * 60 / 100).max(24).min(area.width);
                let prompt = Rect {
                    x: area.x + (area.width - prompt_width) / 2,
                    y: area.y + area.height / 2,
                    width: prompt_width,
                    height: 3,
                };
                let block = Block::default()
                    .borders(Borders::ALL)
                    .title(" save take as ")
                    .border_style(Style::default().fg(ACCENT));
                frame.render_widget(
                    Paragraph::new(value.as_str())
                        .style(Style::default().fg(Color::White).bg(Color::Black))
                        .block(block),
                    prompt,
                );
                frame.set_cursor_position((
                    prompt.x + 1 + value.chars().count() as u16,
                    prompt.y + 1,
                ));
            }
        })?;

        Ok(())
    }

    /// Cleans up terminal state and exits alternate screen mode.
    ///
    /// # Errors
    /// - If terminal mode cannot be disabled
    /// - If cursor cannot be shown
    pub fn cleanup(&mut self) -> anyhow::Result<()> {
        disable_raw_mode()?;
        execute!(self.terminal.backend_mut(), LeaveAlternateScreen)?;
        self.terminal.show_cursor()?;
        Ok(())
    }
}

impl Drop for RecorderTui {
    fn drop(&mut self) {
        let _ = self.cleanup();
    }
}

impl SessionDisplay for RecorderTui {
    fn show_elapsed(&mut self, text: &str) {
        self.elapsed_text = text.to_string();
    }

    fn show_waveform(&mut self, spikes: &[Spike]) {
        // Spike 0 is the most recent and belongs at the right edge.
        let width = self.terminal_width as usize;
        self.wave_columns = vec![0; width];
        for (i, spike) in spikes.iter().take(width).enumerate() {
            let scaled = (spike.height() / self.wave_height * 100.0).round() as u64;
            self.wave_columns[width - 1 - i] = scaled.min(100);
        }
    }

    fn session_state_changed(&mut self, state: SessionState) {
        self.state = state;
    }
}
