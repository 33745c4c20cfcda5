use std::sync::Arc;

use anyhow::{Context, Result};
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{
    layout::{Constraint, Direction, Layout},
    style::{Color, Style},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::error::ChatError;
use crate::events::{TranscriptEntry, TuiEvent};
use crate::llm::CompletionClient;
use crate::session::ChatSession;
use crate::tui::{EventHandler, Tui};
use crate::ui::conversation::{
    error_alert, get_help_text, ComposerResult, ComposerStatus, ConversationComposer,
    ConversationHistory, ParsedCommand, SlashCommand,
};

type Reply = Result<TranscriptEntry, ChatError>;

const PAGE_LINES: usize = 5;
const MAX_COMPOSER_LINES: usize = 4;

/// Run one completion call in the background and send back exactly one outcome.
///
/// The call runs in its own task so a panic inside the client is caught here
/// and reported as a request failure instead of leaving the session waiting.
pub fn spawn_completion(
    client: Arc<dyn CompletionClient>,
    context: Vec<TranscriptEntry>,
    replies: mpsc::UnboundedSender<Reply>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let call = tokio::spawn(async move { client.complete(&context).await });
        let outcome = match call.await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!(error = %e, "completion task did not finish");
                Err(ChatError::request_failure(None))
            }
        };
        if replies.send(outcome).is_err() {
            debug!("chat closed before the reply arrived");
        }
    })
}

/// Interactive chat surface: owns the session and wires keys, replies and rendering
pub struct ChatApp {
    session: ChatSession,
    composer: ConversationComposer,
    history: ConversationHistory,
    client: Arc<dyn CompletionClient>,
    replies_tx: mpsc::UnboundedSender<Reply>,
    replies_rx: mpsc::UnboundedReceiver<Reply>,
    notice: Option<String>,
    show_welcome: bool,
    frame: u64,
    should_quit: bool,
}

impl ChatApp {
    pub fn new(
        system_prompt: impl Into<String>,
        client: Arc<dyn CompletionClient>,
        show_welcome: bool,
    ) -> Self {
        let (replies_tx, replies_rx) = mpsc::unbounded_channel();
        Self {
            session: ChatSession::new(system_prompt),
            composer: ConversationComposer::new("Enter your question..."),
            history: ConversationHistory::new(),
            client,
            replies_tx,
            replies_rx,
            notice: None,
            show_welcome,
            frame: 0,
            should_quit: false,
        }
    }

    pub fn session(&self) -> &ChatSession {
        &self.session
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    /// Drive the chat until the user quits
    pub async fn run(&mut self, terminal: &mut Tui) -> Result<()> {
        let mut events = EventHandler::new();
        info!("chat started");

        while !self.should_quit {
            terminal
                .draw(|f| self.render(f))
                .context("Failed to draw frame")?;

            tokio::select! {
                event = events.next() => match event {
                    Some(event) => self.handle_event(event),
                    None => break,
                },
                Some(reply) = self.replies_rx.recv() => self.on_reply(reply),
            }
        }

        info!(entries = self.session.transcript().len(), "chat closed");
        Ok(())
    }

    pub fn handle_event(&mut self, event: TuiEvent) {
        match event {
            TuiEvent::Key(key) => self.handle_key(key),
            TuiEvent::Paste(text) => {
                self.composer.paste(self.session.pending_input_mut(), &text);
            }
            TuiEvent::Resize(..) => {}
            TuiEvent::Tick => {
                self.frame = self.frame.wrapping_add(1);
            }
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        if key.kind != KeyEventKind::Press {
            return;
        }

        match key.code {
            KeyCode::Esc => {
                self.should_quit = true;
                return;
            }
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.should_quit = true;
                return;
            }
            KeyCode::PageUp => {
                self.history.scroll_up(PAGE_LINES);
                return;
            }
            KeyCode::PageDown => {
                self.history.scroll_down(PAGE_LINES);
                return;
            }
            _ => {}
        }

        match self.composer.handle_key(key, self.session.pending_input_mut()) {
            ComposerResult::Submitted(text) => self.submit(&text),
            ComposerResult::Command(command) => self.handle_slash_command(command),
            ComposerResult::None => {}
        }
    }

    /// Accept a submission and start its call; rejected submissions keep the draft
    pub fn submit(&mut self, text: &str) {
        let Some(context) = self.session.begin_submission(text) else {
            return;
        };

        self.composer.reset();
        self.notice = None;
        self.history.scroll_to_bottom();
        spawn_completion(Arc::clone(&self.client), context, self.replies_tx.clone());
    }

    /// Settle the outstanding submission
    pub fn on_reply(&mut self, reply: Reply) {
        if self.session.settle(reply) {
            self.history.scroll_to_bottom();
        }
    }

    /// Wait for the outstanding reply and settle it
    pub async fn settle_next_reply(&mut self) -> bool {
        match self.replies_rx.recv().await {
            Some(reply) => {
                self.on_reply(reply);
                true
            }
            None => false,
        }
    }

    fn handle_slash_command(&mut self, command: ParsedCommand) {
        self.session.pending_input_mut().clear();
        self.composer.reset();

        match command.command {
            SlashCommand::Help => {
                self.notice = Some(get_help_text());
            }
            SlashCommand::Quit => {
                self.should_quit = true;
            }
        }
    }

    pub fn render(&self, f: &mut Frame) {
        let area = f.size();

        let input_lines = self.session.pending_input().split('\n').count();
        let composer_height = (input_lines.clamp(1, MAX_COMPOSER_LINES) + 2) as u16;
        let alert_height = if self.session.last_error().is_some() { 3 } else { 0 };
        let notice_height = self
            .notice
            .as_deref()
            .map(|n| (n.lines().count() + 2) as u16)
            .unwrap_or(0);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(3),
                Constraint::Length(notice_height),
                Constraint::Length(alert_height),
                Constraint::Length(composer_height),
            ])
            .split(area);

        f.render_widget(
            self.history
                .widget(self.session.visible_entries(), self.show_welcome),
            chunks[0],
        );

        if let Some(notice) = self.notice.as_deref() {
            let help = Paragraph::new(notice)
                .wrap(Wrap { trim: false })
                .style(Style::default().fg(Color::Cyan))
                .block(Block::default().borders(Borders::ALL).title(" Help "));
            f.render_widget(help, chunks[1]);
        }

        if let Some(message) = self.session.last_error() {
            f.render_widget(error_alert(message), chunks[2]);
        }

        let status = if self.session.is_awaiting_reply() {
            ComposerStatus::Awaiting { frame: self.frame }
        } else {
            ComposerStatus::Idle
        };
        f.render_widget(
            self.composer.widget(self.session.pending_input(), status),
            chunks[3],
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GENERIC_FAILURE_MESSAGE;
    use async_trait::async_trait;
    use ratatui::{backend::TestBackend, Terminal};
    use tokio::sync::Notify;

    struct EchoClient;

    #[async_trait]
    impl CompletionClient for EchoClient {
        async fn complete(
            &self,
            messages: &[TranscriptEntry],
        ) -> Result<TranscriptEntry, ChatError> {
            let last = messages.last().map(|m| m.content.clone()).unwrap_or_default();
            Ok(TranscriptEntry::assistant(format!("echo: {last}")))
        }
    }

    struct PanickingClient;

    #[async_trait]
    impl CompletionClient for PanickingClient {
        async fn complete(
            &self,
            _messages: &[TranscriptEntry],
        ) -> Result<TranscriptEntry, ChatError> {
            panic!("client blew up");
        }
    }

    /// Holds the reply until released
    struct GatedClient {
        gate: Arc<Notify>,
    }

    #[async_trait]
    impl CompletionClient for GatedClient {
        async fn complete(
            &self,
            _messages: &[TranscriptEntry],
        ) -> Result<TranscriptEntry, ChatError> {
            self.gate.notified().await;
            Ok(TranscriptEntry::assistant("done"))
        }
    }

    fn press(app: &mut ChatApp, code: KeyCode) {
        app.handle_key(KeyEvent::new(code, KeyModifiers::NONE));
    }

    fn type_text(app: &mut ChatApp, text: &str) {
        for c in text.chars() {
            press(app, KeyCode::Char(c));
        }
    }

    fn screen(app: &ChatApp) -> String {
        let mut terminal = Terminal::new(TestBackend::new(60, 20)).unwrap();
        terminal.draw(|f| app.render(f)).unwrap();
        let buffer = terminal.backend().buffer().clone();
        let mut out = String::new();
        for y in 0..buffer.area.height {
            for x in 0..buffer.area.width {
                out.push_str(buffer.get(x, y).symbol());
            }
            out.push('\n');
        }
        out
    }

    #[tokio::test]
    async fn enter_sends_and_reply_is_appended() {
        let mut app = ChatApp::new("SECRET-INSTRUCTION", Arc::new(EchoClient), true);
        type_text(&mut app, "hello");
        press(&mut app, KeyCode::Enter);

        assert!(app.session().is_awaiting_reply());
        assert_eq!(app.session().pending_input(), "");

        assert!(app.settle_next_reply().await);
        assert!(!app.session().is_awaiting_reply());
        assert_eq!(
            app.session().transcript().last(),
            Some(&TranscriptEntry::assistant("echo: hello"))
        );

        let text = screen(&app);
        assert!(text.contains("You:"));
        assert!(text.contains("echo: hello"));
        assert!(!text.contains("SECRET-INSTRUCTION"));
    }

    #[tokio::test]
    async fn new_entries_bring_the_view_back_to_the_latest() {
        let mut app = ChatApp::new("rules", Arc::new(EchoClient), true);
        for i in 0..10 {
            app.submit(&format!("question {i}"));
            assert!(app.settle_next_reply().await);
        }
        assert!(screen(&app).contains("echo: question 9"));

        press(&mut app, KeyCode::PageUp);
        press(&mut app, KeyCode::PageUp);
        assert!(!app.history.is_at_bottom());
        assert!(!screen(&app).contains("echo: question 9"));

        type_text(&mut app, "latest");
        press(&mut app, KeyCode::Enter);
        assert!(app.history.is_at_bottom());
        assert!(screen(&app).contains("  latest"));

        press(&mut app, KeyCode::PageUp);
        press(&mut app, KeyCode::PageUp);
        assert!(!app.history.is_at_bottom());

        assert!(app.settle_next_reply().await);
        assert!(app.history.is_at_bottom());
        assert!(screen(&app).contains("echo: latest"));
    }

    #[tokio::test]
    async fn panicking_client_still_releases_the_flag() {
        let mut app = ChatApp::new("rules", Arc::new(PanickingClient), true);
        app.submit("hello");

        assert!(app.settle_next_reply().await);
        assert!(!app.session().is_awaiting_reply());
        assert_eq!(app.session().last_error(), Some(GENERIC_FAILURE_MESSAGE));
        assert_eq!(app.session().transcript().len(), 2);
        assert!(screen(&app).contains("Request failed"));
    }

    #[tokio::test]
    async fn typing_while_awaiting_keeps_draft() {
        let gate = Arc::new(Notify::new());
        let client = GatedClient { gate: Arc::clone(&gate) };
        let mut app = ChatApp::new("rules", Arc::new(client), true);

        app.submit("first");
        type_text(&mut app, "second");
        press(&mut app, KeyCode::Enter);

        assert_eq!(app.session().transcript().len(), 2);
        assert_eq!(app.session().pending_input(), "second");
        assert!(screen(&app).contains("AI is thinking"));

        gate.notify_one();
        assert!(app.settle_next_reply().await);
        assert_eq!(app.session().transcript().len(), 3);
        assert_eq!(app.session().pending_input(), "second");
    }

    #[tokio::test]
    async fn help_command_shows_notice_without_touching_transcript() {
        let mut app = ChatApp::new("rules", Arc::new(EchoClient), true);
        type_text(&mut app, "/help");
        press(&mut app, KeyCode::Enter);

        assert!(app.notice().unwrap().contains("/quit"));
        assert_eq!(app.session().transcript().len(), 1);
        assert_eq!(app.session().pending_input(), "");
        assert!(!app.session().is_awaiting_reply());
    }

    #[tokio::test]
    async fn quit_command_and_escape_exit() {
        let mut app = ChatApp::new("rules", Arc::new(EchoClient), true);
        type_text(&mut app, "/q");
        press(&mut app, KeyCode::Enter);
        assert!(app.should_quit());

        let mut app = ChatApp::new("rules", Arc::new(EchoClient), true);
        press(&mut app, KeyCode::Esc);
        assert!(app.should_quit());
    }
}
