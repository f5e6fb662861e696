//! Full-screen error display for failures that abort the recorder.
//!
//! Used for startup problems (bad configuration, capture device failures)
//! where the normal recorder screen never comes up.

use crossterm::{
    event::{self, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Paragraph, Wrap},
};
use std::io::{self, Stdout};

/// Centered error dialog on its own alternate screen.
///
/// Any key press dismisses it.
pub struct ErrorScreen {
    terminal: Terminal<CrosstermBackend<Stdout>>,
}

impl ErrorScreen {
    /// Creates a new error screen and enters alternate screen mode.
    ///
    /// # Errors
    /// - If terminal cannot be initialized
    /// - If raw mode cannot be enabled
    /// - If alternate screen cannot be entered
    pub fn new() -> anyhow::Result<Self> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;

        let backend = CrosstermBackend::new(stdout);
        let terminal = Terminal::new(backend)?;

        Ok(ErrorScreen { terminal })
    }

    /// Displays a titled error message and waits for a key press.
    ///
    /// # Errors
    /// - If terminal rendering fails
    pub fn show_error(&mut self, title: &str, error_message: &str) -> anyhow::Result<()> {
        loop {
            self.terminal.draw(|frame| {
                let area = frame.area();

                let dialog_width = (area.width * 80 / 100).max(20).min(area.width);
                let dialog_height = (area.height / 2).max(5);
                let dialog = Rect {
                    x: area.x + (area.width - dialog_width) / 2,
                    y: area.y + (area.height - dialog_height) / 2,
                    width: dialog_width,
                    height: dialog_height,
                };

                let block = Block::default()
                    .borders(Borders::ALL)
                    .title(format!(" {title} "))
                    .border_style(Style::default().fg(Color::Red))
                    .title_style(
                        Style::default()
                            .fg(Color::Red)
                            .add_modifier(Modifier::BOLD),
                    );

                let body = Text::from(vec![
                    Line::raw(""),
                    Line::raw(error_message),
                    Line::raw(""),
                    Line::styled("press any key to close", Style::default().fg(Color::DarkGray)),
                ]);

                let paragraph = Paragraph::new(body)
                    .block(block)
                    .alignment(Alignment::Center)
                    .wrap(Wrap { trim: true });

                frame.render_widget(paragraph, dialog);
            })?;

            if event::poll(std::time::Duration::from_millis(100))? {
                if let Event::Key(_) = event::read()? {
                    break;
                }
            }
        }

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

impl Drop for ErrorScreen {
    fn drop(&mut self) {
        let _ = self.cleanup();
    }
}
