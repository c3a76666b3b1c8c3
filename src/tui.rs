//! Terminal session for the MedX dashboards.

use anyhow::Result;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture},
    terminal::{self, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::{io, time::Duration};
use tracing::debug;

#[derive(Debug, Clone)]
pub enum Event {
    Input(event::Event),
    /// No input arrived within one tick interval.
    Tick,
}

pub type Frame<'a> = ratatui::Frame<'a>;

/// Time between ticks at `rate_hz` ticks per second; a zero rate is treated as 1.
pub fn tick_interval(rate_hz: u32) -> Duration {
    Duration::from_secs(1) / rate_hz.max(1)
}

pub struct Tui {
    terminal: Terminal<CrosstermBackend<io::Stdout>>,
    tick: Duration,
}

impl Tui {
    pub fn new(terminal: Terminal<CrosstermBackend<io::Stdout>>, tick_rate_hz: u32) -> Self {
        Self {
            terminal,
            tick: tick_interval(tick_rate_hz),
        }
    }

    pub fn init(&mut self) -> Result<()> {
        terminal::enable_raw_mode()?;
        crossterm::execute!(io::stdout(), EnterAlternateScreen, EnableMouseCapture)?;
        self.terminal.hide_cursor()?;
        self.terminal.clear()?;
        debug!(tick_ms = self.tick.as_millis() as u64, "terminal initialised");
        Ok(())
    }

    pub fn exit(&mut self) -> Result<()> {
        self.terminal.show_cursor()?;
        terminal::disable_raw_mode()?;
        crossterm::execute!(io::stdout(), LeaveAlternateScreen, DisableMouseCapture)?;
        debug!("terminal restored");
        Ok(())
    }

    pub fn draw(&mut self, render: impl FnOnce(&mut Frame)) -> Result<()> {
        self.terminal.draw(render)?;
        Ok(())
    }

    /// Waits up to one tick for input.
    pub fn next_event(&self) -> Result<Event> {
        if event::poll(self.tick)? {
            return Ok(Event::Input(event::read()?));
        }
        Ok(Event::Tick)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tick_interval_follows_the_rate() {
        assert_eq!(tick_interval(1), Duration::from_secs(1));
        assert_eq!(tick_interval(40), Duration::from_millis(25));
        assert_eq!(tick_interval(0), Duration::from_secs(1));
    }
}
