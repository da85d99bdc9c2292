//! Terminal-backed prompter.
//!
//! Each question gets its own alternate-screen session, so progress output
//! printed between questions stays in the normal scrollback.

use std::io;

use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{prelude::CrosstermBackend, Terminal};
use tracing::error;

use crate::session::Prompter;
use crate::tui::menu::{PickerApp, PromptApp, PromptOutcome};

/// Run `f` inside a raw-mode alternate screen, restoring the terminal after.
pub fn with_terminal<T>(
    f: impl FnOnce(&mut Terminal<CrosstermBackend<io::Stdout>>) -> io::Result<T>,
) -> io::Result<T> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = f(&mut terminal);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

/// Asks questions with ratatui dialogs. A terminal failure is logged and
/// treated as the operator backing out.
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalPrompter;

impl Prompter for TerminalPrompter {
    fn select(&mut self, title: &str, items: &[String]) -> Option<usize> {
        let mut app = PickerApp::new(title, items);
        with_terminal(|terminal| app.run(terminal)).unwrap_or_else(|e| {
            error!("UI error: {e}");
            None
        })
    }

    fn input(&mut self, prompt: &str) -> Option<String> {
        let mut app = PromptApp::text(prompt);
        match with_terminal(|terminal| app.run(terminal)) {
            Ok(PromptOutcome::Text(text)) => Some(text),
            Ok(_) => None,
            Err(e) => {
                error!("UI error: {e}");
                None
            }
        }
    }

    fn confirm(&mut self, question: &str) -> bool {
        let mut app = PromptApp::confirm(question);
        match with_terminal(|terminal| app.run(terminal)) {
            Ok(outcome) => outcome == PromptOutcome::Yes,
            Err(e) => {
                error!("UI error: {e}");
                false
            }
        }
    }
}
