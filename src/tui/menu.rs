//! Retro-style list picker and prompt dialogs.
//!
//! Each dialog owns its state, turns key presses into state changes in
//! `handle_key`, and renders itself; `run` loops until the operator has
//! answered or backed out.

use std::io;
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use ratatui::{
    backend::Backend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
    Frame, Terminal,
};

use crate::tui::input::InputField;
use crate::tui::utils::centered_rect;

const HEADER: &str = "TASK TEMPLATES";

/// Scrollable list of choices.
pub struct PickerApp {
    title: String,
    items: Vec<String>,
    list_state: ListState,
    outcome: Option<Option<usize>>,
}

impl PickerApp {
    pub fn new(title: &str, items: &[String]) -> Self {
        let mut list_state = ListState::default();
        if !items.is_empty() {
            list_state.select(Some(0));
        }
        PickerApp {
            title: title.to_string(),
            items: items.to_vec(),
            list_state,
            outcome: None,
        }
    }

    /// `Some(Some(i))` once an item was chosen, `Some(None)` once cancelled.
    pub fn outcome(&self) -> Option<Option<usize>> {
        self.outcome
    }

    pub fn handle_key(&mut self, key: KeyCode) {
        match key {
            KeyCode::Up | KeyCode::Char('k') => {
                if let Some(selected) = self.list_state.selected() {
                    if selected > 0 {
                        self.list_state.select(Some(selected - 1));
                    }
                }
            },
            KeyCode::Down | KeyCode::Char('j') => {
                if let Some(selected) = self.list_state.selected() {
                    if selected + 1 < self.items.len() {
                        self.list_state.select(Some(selected + 1));
                    }
                }
            },
            KeyCode::Home => {
                if !self.items.is_empty() {
                    self.list_state.select(Some(0));
                }
            },
            KeyCode::End => {
                if !self.items.is_empty() {
                    self.list_state.select(Some(self.items.len() - 1));
                }
            },
            // Number keys jump straight to an entry, like the numbered menus.
            KeyCode::Char(c @ '1'..='9') => {
                let index = c as usize - '1' as usize;
                if index < self.items.len() {
                    self.list_state.select(Some(index));
                    self.outcome = Some(Some(index));
                }
            },
            KeyCode::Enter => {
                if let Some(selected) = self.list_state.selected() {
                    self.outcome = Some(Some(selected));
                }
            },
            KeyCode::Esc | KeyCode::Char('q') => {
                self.outcome = Some(None);
            },
            _ => {}
        }
    }

    fn render(&mut self, f: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(3), Constraint::Min(0), Constraint::Length(1)])
            .split(f.area());

        render_header(f, chunks[0]);

        let items: Vec<ListItem> = self.items
            .iter()
            .enumerate()
            .map(|(i, item)| ListItem::new(Line::from(format!("  {}. {}", i + 1, item))))
            .collect();

        let list = List::new(items)
            .block(Block::default()
                .borders(Borders::ALL)
                .title(self.title.as_str()))
            .highlight_style(Style::default().bg(Color::Gray).fg(Color::Black))
            .highlight_symbol("► ");

        f.render_stateful_widget(list, chunks[1], &mut self.list_state);

        render_status_bar(f, chunks[2], "Use ↑↓ or 1-9 to navigate, Enter to select, Esc to go back");
    }

    /// Event loop; returns the chosen index, or `None` if cancelled.
    pub fn run<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> io::Result<Option<usize>> {
        loop {
            terminal.draw(|f| self.render(f))?;
            if let Some(key) = next_key()? {
                self.handle_key(key);
            }
            if let Some(outcome) = self.outcome {
                return Ok(outcome);
            }
        }
    }
}

/// What a prompt dialog asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptKind {
    Text,
    Confirm,
}

/// Answer from a prompt dialog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptOutcome {
    Text(String),
    Yes,
    No,
    Cancelled,
}

/// Centred dialog asking for a line of text or a yes/no answer.
pub struct PromptApp {
    question: String,
    kind: PromptKind,
    field: InputField,
    outcome: Option<PromptOutcome>,
}

impl PromptApp {
    pub fn text(question: &str) -> Self {
        PromptApp {
            question: question.to_string(),
            kind: PromptKind::Text,
            field: InputField::new(),
            outcome: None,
        }
    }

    pub fn confirm(question: &str) -> Self {
        PromptApp {
            question: question.to_string(),
            kind: PromptKind::Confirm,
            field: InputField::new(),
            outcome: None,
        }
    }

    pub fn outcome(&self) -> Option<&PromptOutcome> {
        self.outcome.as_ref()
    }

    pub fn handle_key(&mut self, key: KeyCode) {
        match self.kind {
            PromptKind::Text => match key {
                KeyCode::Enter => {
                    self.outcome = Some(PromptOutcome::Text(self.field.value.clone()));
                },
                KeyCode::Esc => {
                    self.outcome = Some(PromptOutcome::Cancelled);
                },
                KeyCode::Backspace => self.field.handle_backspace(),
                KeyCode::Delete => self.field.handle_delete(),
                KeyCode::Left => self.field.move_cursor_left(),
                KeyCode::Right => self.field.move_cursor_right(),
                KeyCode::Char(c) => self.field.handle_char(c),
                _ => {}
            },
            PromptKind::Confirm => match key {
                KeyCode::Char('y') | KeyCode::Char('Y') => {
                    self.outcome = Some(PromptOutcome::Yes);
                },
                KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Enter | KeyCode::Esc => {
                    self.outcome = Some(PromptOutcome::No);
                },
                _ => {}
            },
        }
    }

    fn render(&mut self, f: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(3), Constraint::Min(0), Constraint::Length(1)])
            .split(f.area());

        render_header(f, chunks[0]);

        let area = centered_rect(70, 40, chunks[1]);
        f.render_widget(Clear, area);

        match self.kind {
            PromptKind::Text => {
                let parts = Layout::default()
                    .direction(Direction::Vertical)
                    .constraints([Constraint::Length(4), Constraint::Length(3), Constraint::Min(0)])
                    .split(area);

                let question = Paragraph::new(self.question.as_str())
                    .block(Block::default().borders(Borders::ALL).title("Input"))
                    .wrap(Wrap { trim: true });
                f.render_widget(question, parts[0]);

                let input = Paragraph::new(self.field.value.as_str())
                    .block(Block::default()
                        .borders(Borders::ALL)
                        .border_style(Style::default().fg(Color::Yellow)));
                f.render_widget(input, parts[1]);

                f.set_cursor_position((parts[1].x + self.field.cursor as u16 + 1, parts[1].y + 1));
                render_status_bar(f, chunks[2], "Type your answer, Enter to confirm, Esc to skip");
            },
            PromptKind::Confirm => {
                let text = vec![
                    Line::from(""),
                    Line::from(Span::styled(self.question.as_str(), Style::default().add_modifier(Modifier::BOLD))),
                    Line::from(""),
                    Line::from("Press Y for yes, N or Esc for no"),
                ];
                let dialog = Paragraph::new(text)
                    .block(Block::default().borders(Borders::ALL).title("Confirm"))
                    .alignment(Alignment::Center)
                    .wrap(Wrap { trim: true });
                f.render_widget(dialog, area);
                render_status_bar(f, chunks[2], "Y/N");
            },
        }
    }

    /// Event loop; returns the operator's answer.
    pub fn run<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> io::Result<PromptOutcome> {
        loop {
            terminal.draw(|f| self.render(f))?;
            if let Some(key) = next_key()? {
                self.handle_key(key);
            }
            if let Some(outcome) = self.outcome.take() {
                return Ok(outcome);
            }
        }
    }
}

fn next_key() -> io::Result<Option<KeyCode>> {
    if event::poll(Duration::from_millis(50))? {
        if let Event::Key(key) = event::read()? {
            if key.kind == KeyEventKind::Press {
                return Ok(Some(key.code));
            }
        }
    }
    Ok(None)
}

fn render_header(f: &mut Frame, area: Rect) {
    let header = Paragraph::new(Line::from(Span::styled(
        HEADER,
        Style::default().add_modifier(Modifier::BOLD),
    )))
    .block(Block::default().borders(Borders::ALL))
    .alignment(Alignment::Center)
    .style(Style::default().fg(Color::White));
    f.render_widget(header, area);
}

fn render_status_bar(f: &mut Frame, area: Rect, text: &str) {
    let status = Paragraph::new(text)
        .style(Style::default().bg(Color::Blue).fg(Color::White))
        .alignment(Alignment::Left);
    f.render_widget(status, area);
}
