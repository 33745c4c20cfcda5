use crate::ui::conversation::commands::{parse_slash_command, ParsedCommand};
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Widget},
};

/// Result returned when the user interacts with the composer
#[derive(Debug, PartialEq)]
pub enum ComposerResult {
    Submitted(String),
    Command(ParsedCommand),
    None,
}

/// Cursor bookkeeping for the pending-input editor.
///
/// The text itself lives in the chat session; the composer only tracks where
/// the cursor sits, counted in chars.
#[derive(Debug, Clone, Default)]
pub struct ConversationComposer {
    cursor: usize,
    placeholder: String,
}

impl ConversationComposer {
    pub fn new(placeholder: impl Into<String>) -> Self {
        Self {
            cursor: 0,
            placeholder: placeholder.into(),
        }
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Handle key input against the pending text
    pub fn handle_key(&mut self, key: KeyEvent, input: &mut String) -> ComposerResult {
        if key.kind != KeyEventKind::Press {
            return ComposerResult::None;
        }
        self.clamp(input);

        match key.code {
            KeyCode::Enter => {
                if key.modifiers.intersects(KeyModifiers::SHIFT | KeyModifiers::ALT) {
                    self.insert_char(input, '\n');
                } else if !input.trim().is_empty() {
                    if let Some(command) = parse_slash_command(input) {
                        return ComposerResult::Command(command);
                    }
                    return ComposerResult::Submitted(input.clone());
                }
            }
            KeyCode::Char(c) => {
                if key.modifiers.contains(KeyModifiers::CONTROL) {
                    if c == 'u' {
                        input.clear();
                        self.cursor = 0;
                    }
                } else {
                    self.insert_char(input, c);
                }
            }
            KeyCode::Backspace => {
                if self.cursor > 0 {
                    self.cursor -= 1;
                    let at = byte_index(input, self.cursor);
                    input.remove(at);
                }
            }
            KeyCode::Delete => {
                if self.cursor < input.chars().count() {
                    let at = byte_index(input, self.cursor);
                    input.remove(at);
                }
            }
            KeyCode::Left => {
                self.cursor = self.cursor.saturating_sub(1);
            }
            KeyCode::Right => {
                self.cursor = (self.cursor + 1).min(input.chars().count());
            }
            KeyCode::Home => {
                self.cursor = 0;
            }
            KeyCode::End => {
                self.cursor = input.chars().count();
            }
            _ => {}
        }

        ComposerResult::None
    }

    /// Insert pasted text at the cursor
    pub fn paste(&mut self, input: &mut String, text: &str) {
        self.clamp(input);
        let at = byte_index(input, self.cursor);
        input.insert_str(at, text);
        self.cursor += text.chars().count();
    }

    /// Put the cursor back at the start after the text was consumed
    pub fn reset(&mut self) {
        self.cursor = 0;
    }

    fn insert_char(&mut self, input: &mut String, c: char) {
        let at = byte_index(input, self.cursor);
        input.insert(at, c);
        self.cursor += 1;
    }

    fn clamp(&mut self, input: &str) {
        self.cursor = self.cursor.min(input.chars().count());
    }

    pub fn widget<'a>(&'a self, input: &'a str, status: ComposerStatus) -> ComposerWidget<'a> {
        ComposerWidget {
            composer: self,
            input,
            status,
        }
    }
}

fn byte_index(s: &str, char_index: usize) -> usize {
    s.char_indices()
        .nth(char_index)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

/// What the composer's title reports
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComposerStatus {
    Idle,
    /// Awaiting a reply; the frame drives the dots animation
    Awaiting { frame: u64 },
}

pub struct ComposerWidget<'a> {
    composer: &'a ConversationComposer,
    input: &'a str,
    status: ComposerStatus,
}

impl ComposerWidget<'_> {
    fn title(&self) -> Line<'static> {
        match self.status {
            ComposerStatus::Idle => Line::from(vec![Span::styled(
                " 💬 Ask a question ",
                Style::default().fg(Color::Green),
            )]),
            ComposerStatus::Awaiting { frame } => {
                let dots = match frame % 4 {
                    0 => ".  ",
                    1 => ".. ",
                    2 => "...",
                    _ => "   ",
                };
                Line::from(vec![
                    Span::styled(" 🤖 AI is thinking", Style::default().fg(Color::Green)),
                    Span::styled(format!("{dots} "), Style::default().fg(Color::Yellow)),
                ])
            }
        }
    }
}

impl Widget for ComposerWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let border = match self.status {
            ComposerStatus::Idle => Style::default().fg(Color::Green),
            ComposerStatus::Awaiting { .. } => Style::default().fg(Color::Gray),
        };
        let block = Block::default()
            .borders(Borders::ALL)
            .title(self.title())
            .border_style(border);

        let inner = block.inner(area);
        block.render(area, buf);

        if inner.height == 0 {
            return;
        }

        if self.input.is_empty() {
            let placeholder = Line::from(vec![
                Span::raw("▌"),
                Span::styled(
                    self.composer.placeholder.as_str(),
                    Style::default().fg(Color::DarkGray),
                ),
            ]);
            buf.set_line(inner.x, inner.y, &placeholder, inner.width);
            return;
        }

        let mut content = self.input.to_string();
        let at = byte_index(&content, self.composer.cursor);
        content.insert(at, '▌');

        // Keep the tail visible when the draft grows past the box
        let lines: Vec<&str> = content.split('\n').collect();
        let start = lines.len().saturating_sub(inner.height as usize);
        for (i, text) in lines[start..].iter().enumerate() {
            let line = Line::from(vec![Span::raw(*text)]);
            buf.set_line(inner.x, inner.y + i as u16, &line, inner.width);
        }
    }
}
