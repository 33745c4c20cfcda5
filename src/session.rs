//! Chat session state and the submission round trip.
//!
//! A session is a two-state toggle between idle and awaiting-reply. A submission
//! is accepted only while idle; it appends the user entry, hands back the
//! transcript to send, and is closed by exactly one call to [`ChatSession::settle`].

use crate::error::ChatError;
use crate::events::TranscriptEntry;
use crate::llm::CompletionClient;
use tracing::{debug, info, warn};

/// What happened to a submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Blank text or a request already in flight; nothing changed
    Rejected,
    /// The reply was appended to the transcript
    Replied,
    /// The error slot was set; the transcript holds only the new user entry
    Failed(ChatError),
}

/// In-memory state of one chat surface
#[derive(Debug, Clone)]
pub struct ChatSession {
    transcript: Vec<TranscriptEntry>,
    pending_input: String,
    awaiting_reply: bool,
    last_error: Option<String>,
}

impl ChatSession {
    /// Start a session whose transcript holds only the hidden system entry
    pub fn new(system_prompt: impl Into<String>) -> Self {
        Self {
            transcript: vec![TranscriptEntry::system(system_prompt)],
            pending_input: String::new(),
            awaiting_reply: false,
            last_error: None,
        }
    }

    /// Full transcript, system entry first
    pub fn transcript(&self) -> &[TranscriptEntry] {
        &self.transcript
    }

    /// Entries shown to the user; the system entry is never among them
    pub fn visible_entries(&self) -> impl Iterator<Item = &TranscriptEntry> + '_ {
        self.transcript.iter().skip(1)
    }

    pub fn visible_len(&self) -> usize {
        self.transcript.len() - 1
    }

    pub fn pending_input(&self) -> &str {
        &self.pending_input
    }

    pub fn pending_input_mut(&mut self) -> &mut String {
        &mut self.pending_input
    }

    pub fn is_awaiting_reply(&self) -> bool {
        self.awaiting_reply
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Accept a submission and return the transcript to send.
    ///
    /// Returns `None` without touching any state when `text` is blank or a
    /// request is already in flight.
    pub fn begin_submission(&mut self, text: &str) -> Option<Vec<TranscriptEntry>> {
        if text.trim().is_empty() {
            debug!("submission rejected: blank input");
            return None;
        }
        if self.awaiting_reply {
            debug!("submission rejected: reply already pending");
            return None;
        }

        self.transcript.push(TranscriptEntry::user(text));
        self.pending_input.clear();
        self.awaiting_reply = true;
        self.last_error = None;

        info!(entries = self.transcript.len(), "submission accepted");
        Some(self.transcript.clone())
    }

    /// Apply the outcome of the outstanding call and return to idle.
    ///
    /// Returns true when the transcript grew.
    pub fn settle(&mut self, outcome: Result<TranscriptEntry, ChatError>) -> bool {
        if !self.awaiting_reply {
            warn!("settle called with no reply pending; ignoring");
            return false;
        }
        self.awaiting_reply = false;

        match outcome {
            Ok(reply) => {
                info!(role = %reply.role, chars = reply.content.len(), "reply appended");
                self.transcript.push(reply);
                true
            }
            Err(err) => {
                warn!(error = %err, "submission failed");
                self.last_error = Some(err.user_message());
                false
            }
        }
    }

    /// Run a whole submission inline against `client`
    pub async fn submit<C>(&mut self, text: &str, client: &C) -> SubmitOutcome
    where
        C: CompletionClient + ?Sized,
    {
        let Some(context) = self.begin_submission(text) else {
            return SubmitOutcome::Rejected;
        };

        match client.complete(&context).await {
            Ok(reply) => {
                self.settle(Ok(reply));
                SubmitOutcome::Replied
            }
            Err(err) => {
                self.settle(Err(err.clone()));
                SubmitOutcome::Failed(err)
            }
        }
    }
}
