use thiserror::Error;

/// Shown when the service answered but no usable message came back.
pub const EMPTY_REPLY_MESSAGE: &str = "The AI did not return any response. Please try again later.";

/// Shown when a failure carries no message of its own.
pub const GENERIC_FAILURE_MESSAGE: &str =
    "Request failed. Please check your API key or network connection.";

/// Shown when no credential could be resolved from config or environment.
pub const MISSING_API_KEY_MESSAGE: &str =
    "No API key configured. Set OPENROUTER_API_KEY or add api_key to the config file.";

/// Recoverable errors of a single submission. Neither kind ends the session.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChatError {
    /// The call succeeded but the payload held no usable message
    #[error("{}", EMPTY_REPLY_MESSAGE)]
    EmptyReply,

    /// Transport or remote-service failure
    #[error("{message}")]
    RequestFailure { message: String },
}

impl ChatError {
    /// Build a request failure from the most specific message available.
    pub fn request_failure(message: Option<String>) -> Self {
        let message = message
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| GENERIC_FAILURE_MESSAGE.to_string());
        ChatError::RequestFailure { message }
    }

    /// Text placed in the session's error slot
    pub fn user_message(&self) -> String {
        self.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn specific_message_is_kept_verbatim() {
        let err = ChatError::request_failure(Some("bad key".to_string()));
        assert_eq!(err.user_message(), "bad key");

        let err = ChatError::request_failure(Some(" bad key\n".to_string()));
        assert_eq!(err.user_message(), " bad key\n");
    }

    #[test]
    fn blank_message_falls_back_to_generic() {
        assert_eq!(
            ChatError::request_failure(Some("   ".to_string())).user_message(),
            GENERIC_FAILURE_MESSAGE
        );
        assert_eq!(
            ChatError::request_failure(None).user_message(),
            GENERIC_FAILURE_MESSAGE
        );
    }

    #[test]
    fn empty_reply_has_fixed_message() {
        assert_eq!(ChatError::EmptyReply.user_message(), EMPTY_REPLY_MESSAGE);
    }
}
