use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io;
use std::time::Duration;
use tracing::info;

use tokentrack_core::config::Settings;
use tokentrack_core::refresh::{RefreshHandle, Refresher, UsageDisplay};

use super::components::UsagePanel;
use super::layout;

/// How long to wait for input before redrawing
const INPUT_POLL: Duration = Duration::from_millis(50);

/// Main application
pub struct App {
    settings: Settings,
    display: UsageDisplay,
    running: bool,
}

impl App {
    /// Create a new application
    pub fn new(settings: Settings) -> Self {
        let display = UsageDisplay::for_source(settings.source);
        Self {
            settings,
            display,
            running: true,
        }
    }

    /// Run the application
    pub async fn run(&mut self) -> Result<()> {
        let refresher =
            Refresher::from_settings(&self.settings).context("Failed to set up refresher")?;

        // Setup terminal
        crossterm::terminal::enable_raw_mode()?;
        let mut stdout = io::stdout();
        crossterm::execute!(stdout, crossterm::terminal::EnterAlternateScreen)?;

        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        let mut handle = refresher.start();

        let result = self.main_loop(&mut terminal, &mut handle).await;

        // Stop sampling before the view goes away
        handle.shutdown();
        info!("Shutting down");

        // Restore terminal
        crossterm::terminal::disable_raw_mode()?;
        crossterm::execute!(
            terminal.backend_mut(),
            crossterm::terminal::LeaveAlternateScreen
        )?;
        terminal.show_cursor()?;

        result
    }

    async fn main_loop(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
        handle: &mut RefreshHandle,
    ) -> Result<()> {
        while self.running {
            // Process refresh events
            while let Some(event) = handle.try_recv() {
                self.display.apply(event);
            }

            terminal.draw(|frame| {
                let area = layout::panel_area(frame.area(), UsagePanel::height());
                UsagePanel::render(frame, area, &self.display, &self.settings.ui);
            })?;

            // Handle events with timeout
            if event::poll(INPUT_POLL)? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        self.handle_key(key.code, key.modifiers);
                    }
                }
            }
        }

        Ok(())
    }

    fn handle_key(&mut self, code: KeyCode, modifiers: KeyModifiers) {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => self.quit(),
            KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => self.quit(),
            _ => {}
        }
    }

    fn quit(&mut self) {
        self.running = false;
    }

    /// Current view model
    pub fn display(&self) -> &UsageDisplay {
        &self.display
    }
}
