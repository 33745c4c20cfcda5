use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

/// Terminal events fed into the chat event loop
#[derive(Debug, Clone)]
pub enum TuiEvent {
    /// Key press event
    Key(crossterm::event::KeyEvent),

    /// Paste event
    Paste(String),

    /// Terminal resize
    Resize(u16, u16),

    /// Animation tick
    Tick,
}

/// Role of a transcript entry, serialized the way the completion API expects
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ChatRole {
    /// Hidden instruction that shapes the assistant
    System,
    User,
    Assistant,
}

impl ChatRole {
    /// Label shown in front of a rendered entry
    pub fn display_label(&self) -> &'static str {
        match self {
            ChatRole::System => "System",
            ChatRole::User => "You",
            ChatRole::Assistant => "AI",
        }
    }
}

/// One role-tagged message in the transcript
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptEntry {
    pub role: ChatRole,
    pub content: String,
}

impl TranscriptEntry {
    pub fn new(role: ChatRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(ChatRole::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(ChatRole::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(ChatRole::Assistant, content)
    }
}
