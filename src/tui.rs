use std::io::{self, Stdout};

use anyhow::{Context, Result};
use crossterm::ExecutableCommand;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;

pub type Tui = Terminal<CrosstermBackend<Stdout>>;

/// Switch the terminal to raw mode on the alternate screen.
pub fn init() -> Result<Tui> {
    enable_raw_mode().context("failed to enable raw mode")?;
    io::stdout()
        .execute(EnterAlternateScreen)
        .context("failed to enter alternate screen")?;
    let mut terminal =
        Terminal::new(CrosstermBackend::new(io::stdout())).context("failed to create terminal")?;
    terminal.clear().context("failed to clear terminal")?;
    Ok(terminal)
}

/// Undo [`init`] so the shell is usable again.
pub fn restore() -> Result<()> {
    disable_raw_mode().context("failed to disable raw mode")?;
    io::stdout()
        .execute(LeaveAlternateScreen)
        .context("failed to leave alternate screen")?;
    Ok(())
}
