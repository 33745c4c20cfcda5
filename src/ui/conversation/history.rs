//! Transcript display component

use crate::events::{ChatRole, TranscriptEntry};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget, Wrap},
};
use std::cell::Cell;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Scroll state of the transcript view, measured in lines up from the bottom
#[derive(Debug, Clone, Default)]
pub struct ConversationHistory {
    scroll_from_bottom: usize,
    max_scroll: Cell<usize>,
}

impl ConversationHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn scroll_up(&mut self, lines: usize) {
        self.scroll_from_bottom = (self.scroll_from_bottom + lines).min(self.max_scroll.get());
    }

    pub fn scroll_down(&mut self, lines: usize) {
        self.scroll_from_bottom = self.scroll_from_bottom.saturating_sub(lines);
    }

    /// Follow the most recent entry
    pub fn scroll_to_bottom(&mut self) {
        self.scroll_from_bottom = 0;
    }

    pub fn is_at_bottom(&self) -> bool {
        self.scroll_from_bottom == 0
    }

    pub fn widget<'a, I>(&'a self, entries: I, show_welcome: bool) -> HistoryWidget<'a>
    where
        I: IntoIterator<Item = &'a TranscriptEntry>,
    {
        HistoryWidget {
            history: self,
            entries: entries.into_iter().collect(),
            show_welcome,
        }
    }
}

pub struct HistoryWidget<'a> {
    history: &'a ConversationHistory,
    entries: Vec<&'a TranscriptEntry>,
    show_welcome: bool,
}

impl Widget for HistoryWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .borders(Borders::ALL)
            .title(" 🤖 AI Customer Support ");

        let inner = block.inner(area);
        block.render(area, buf);

        if self.entries.is_empty() {
            if self.show_welcome {
                let welcome = [
                    Line::from(Span::styled(
                        "Hi! Ask anything about our platform.",
                        Style::default().fg(Color::Green),
                    )),
                    Line::from(""),
                    Line::from(Span::styled(
                        "Enter sends, Shift+Enter adds a line, /help lists commands.",
                        Style::default().fg(Color::DarkGray),
                    )),
                ];
                for (i, line) in welcome.iter().enumerate().take(inner.height as usize) {
                    buf.set_line(inner.x, inner.y + i as u16, line, inner.width);
                }
            }
            self.history.max_scroll.set(0);
            return;
        }

        let mut all_lines: Vec<Line> = Vec::new();
        for entry in &self.entries {
            all_lines.extend(render_entry(entry, inner.width));
            all_lines.push(Line::from(""));
        }
        all_lines.pop();

        let height = inner.height as usize;
        let max_scroll = all_lines.len().saturating_sub(height);
        self.history.max_scroll.set(max_scroll);

        let offset = self.history.scroll_from_bottom.min(max_scroll);
        let start = max_scroll - offset;
        let end = (start + height).min(all_lines.len());

        for (i, line) in all_lines[start..end].iter().enumerate() {
            buf.set_line(inner.x, inner.y + i as u16, line, inner.width);
        }
    }
}

/// Label line followed by the wrapped content
fn render_entry(entry: &TranscriptEntry, width: u16) -> Vec<Line<'static>> {
    let style = role_style(entry.role);
    let mut lines = vec![Line::from(Span::styled(
        format!("{}:", entry.role.display_label()),
        style.add_modifier(Modifier::BOLD),
    ))];

    for text in wrap_text(&entry.content, width.saturating_sub(2) as usize) {
        lines.push(Line::from(vec![Span::raw("  "), Span::raw(text)]));
    }
    lines
}

fn role_style(role: ChatRole) -> Style {
    match role {
        ChatRole::User => Style::default().fg(Color::Blue),
        ChatRole::Assistant => Style::default().fg(Color::Magenta),
        ChatRole::System => Style::default().fg(Color::Yellow),
    }
}

/// Word-wrap to `width` terminal columns, keeping explicit line breaks
pub fn wrap_text(text: &str, width: usize) -> Vec<String> {
    if width == 0 {
        return text.lines().map(str::to_string).collect();
    }

    let mut lines = Vec::new();
    for paragraph in text.trim_end().split('\n') {
        let paragraph_start = lines.len();
        let mut current = String::new();
        let mut current_width = 0;

        for mut word in paragraph.split_whitespace() {
            // Hard-split words wider than a full line
            while word.width() > width {
                if !current.is_empty() {
                    lines.push(std::mem::take(&mut current));
                    current_width = 0;
                }
                let (head, rest) = split_at_width(word, width);
                lines.push(head.to_string());
                word = rest;
            }
            if word.is_empty() {
                continue;
            }

            let word_width = word.width();
            let needed = if current.is_empty() {
                word_width
            } else {
                current_width + 1 + word_width
            };
            if needed > width {
                lines.push(std::mem::take(&mut current));
                current_width = 0;
            }
            if !current.is_empty() {
                current.push(' ');
                current_width += 1;
            }
            current.push_str(word);
            current_width += word_width;
        }

        if !current.is_empty() || lines.len() == paragraph_start {
            lines.push(current);
        }
    }

    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

/// Longest prefix that fits in `width` columns; always takes at least one char
fn split_at_width(word: &str, width: usize) -> (&str, &str) {
    let mut used = 0;
    for (i, c) in word.char_indices() {
        let w = c.width().unwrap_or(0);
        if used + w > width {
            let at = if i == 0 { c.len_utf8() } else { i };
            return word.split_at(at);
        }
        used += w;
    }
    (word, "")
}

/// Inline alert shown under the transcript while the error slot is set
pub fn error_alert(message: &str) -> Paragraph<'_> {
    Paragraph::new(Line::from(vec![
        Span::styled("⚠ ", Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)),
        Span::styled(message, Style::default().fg(Color::Red)),
    ]))
    .wrap(Wrap { trim: true })
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Red)),
    )
}
