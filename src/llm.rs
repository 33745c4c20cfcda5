use crate::config::Config;
use crate::error::{ChatError, MISSING_API_KEY_MESSAGE};
use crate::events::{ChatRole, TranscriptEntry};
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Remote text-completion service the chat session talks to
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Send the ordered transcript and return the assistant's reply entry
    async fn complete(&self, messages: &[TranscriptEntry]) -> Result<TranscriptEntry, ChatError>;
}

/// Request body for the chat completions endpoint
#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [TranscriptEntry],
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    #[serde(default)]
    message: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: Option<ErrorBody>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

/// HTTP client for an OpenAI-compatible chat completions endpoint
#[derive(Clone)]
pub struct LlmClient {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: Option<String>,
}

impl std::fmt::Debug for LlmClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmClient")
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .field("has_api_key", &self.api_key.is_some())
            .finish()
    }
}

impl LlmClient {
    pub fn new(config: &Config) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.request_timeout() {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            model: config.model.clone(),
            api_key: config.get_api_key(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn is_openrouter(&self) -> bool {
        self.endpoint.contains("openrouter.ai")
    }
}

#[async_trait]
impl CompletionClient for LlmClient {
    async fn complete(&self, messages: &[TranscriptEntry]) -> Result<TranscriptEntry, ChatError> {
        let Some(api_key) = self.api_key.as_deref() else {
            warn!("completion skipped: no API key configured");
            return Err(ChatError::request_failure(Some(
                MISSING_API_KEY_MESSAGE.to_string(),
            )));
        };

        let payload = CompletionRequest {
            model: &self.model,
            messages,
        };

        let mut request = self
            .client
            .post(&self.endpoint)
            .header("Authorization", format!("Bearer {}", api_key))
            .header("Content-Type", "application/json");

        if self.is_openrouter() {
            request = request
                .header("HTTP-Referer", "https://github.com/supportbot/supportbot")
                .header("X-Title", "Supportbot");
        }

        debug!(
            endpoint = %self.endpoint,
            model = %self.model,
            messages = messages.len(),
            "sending completion request"
        );

        let response = match request.json(&payload).send().await {
            Ok(response) => response,
            Err(e) => {
                warn!(error = %e, "completion request failed to send");
                return Err(ChatError::request_failure(None));
            }
        };

        let status = response.status();
        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                warn!(error = %e, %status, "failed to read completion response body");
                return Err(ChatError::request_failure(None));
            }
        };

        if !status.is_success() {
            warn!(%status, "completion service returned an error");
            return Err(parse_failure(&body));
        }

        parse_reply(&body)
    }
}

/// Read the first choice's message from a success body
pub fn parse_reply(body: &str) -> Result<TranscriptEntry, ChatError> {
    let response: CompletionResponse = serde_json::from_str(body).map_err(|e| {
        warn!(error = %e, "completion response was not valid JSON");
        ChatError::EmptyReply
    })?;

    let message = response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message)
        .ok_or(ChatError::EmptyReply)?;

    let entry: TranscriptEntry = serde_json::from_value(message).map_err(|e| {
        warn!(error = %e, "completion message had an unexpected shape");
        ChatError::EmptyReply
    })?;

    // The system entry only ever appears once, at the head of the transcript
    if entry.role == ChatRole::System {
        return Err(ChatError::EmptyReply);
    }

    Ok(entry)
}

/// Pull `error.message` out of a failure body, falling back to the generic message
pub fn parse_failure(body: &str) -> ChatError {
    let message = serde_json::from_str::<ErrorEnvelope>(body)
        .ok()
        .and_then(|envelope| envelope.error)
        .and_then(|error| error.message);
    ChatError::request_failure(message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{EMPTY_REPLY_MESSAGE, GENERIC_FAILURE_MESSAGE};

    #[test]
    fn reads_first_choice_only() {
        let body = r#"{"choices":[
            {"message":{"role":"assistant","content":"Hi"}},
            {"message":{"role":"assistant","content":"ignored"}}
        ]}"#;
        assert_eq!(parse_reply(body).unwrap(), TranscriptEntry::assistant("Hi"));
    }

    #[test]
    fn extra_fields_are_ignored() {
        let body = r#"{"id":"gen-1","choices":[{"index":0,"finish_reason":"stop",
            "message":{"role":"assistant","content":"Hello","refusal":null}}],"usage":{}}"#;
        assert_eq!(parse_reply(body).unwrap().content, "Hello");
    }

    #[test]
    fn empty_or_malformed_payloads_are_empty_replies() {
        for body in [
            r#"{"choices":[]}"#,
            r#"{}"#,
            r#"{"choices":[{}]}"#,
            r#"{"choices":[{"message":null}]}"#,
            r#"{"choices":[{"message":{"role":"assistant","content":null}}]}"#,
            r#"{"choices":[{"message":{"role":"tool","content":"x"}}]}"#,
            r#"{"choices":[{"message":{"role":"system","content":"x"}}]}"#,
            "not json",
        ] {
            assert_eq!(parse_reply(body), Err(ChatError::EmptyReply), "body: {body}");
        }
        assert_eq!(ChatError::EmptyReply.to_string(), EMPTY_REPLY_MESSAGE);
    }

    #[test]
    fn error_envelope_message_is_used_verbatim() {
        let err = parse_failure(r#"{"error":{"message":"bad key","code":401}}"#);
        assert_eq!(err.to_string(), "bad key");

        let err = parse_failure(r#"{"error":{"message":" bad key\n"}}"#);
        assert_eq!(err.to_string(), " bad key\n");
    }

    #[test]
    fn failure_without_message_falls_back() {
        for body in ["", "<html>502</html>", r#"{"error":{}}"#, r#"{"error":"nope"}"#] {
            assert_eq!(parse_failure(body).to_string(), GENERIC_FAILURE_MESSAGE, "body: {body}");
        }
    }

    #[tokio::test]
    async fn missing_key_fails_without_network() {
        let config = Config {
            api_key: None,
            api_key_env: "SUPPORTBOT_TEST_UNSET_KEY".to_string(),
            endpoint: "http://127.0.0.1:9/never".to_string(),
            ..Config::default()
        };
        let client = LlmClient::new(&config).unwrap();
        let err = client
            .complete(&[TranscriptEntry::user("hello")])
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), MISSING_API_KEY_MESSAGE);
    }

    #[test]
    fn request_body_carries_model_and_ordered_messages() {
        let messages = vec![TranscriptEntry::system("rules"), TranscriptEntry::user("hi")];
        let body = serde_json::to_value(CompletionRequest {
            model: "gpt-3.5-turbo",
            messages: &messages,
        })
        .unwrap();
        assert_eq!(
            body,
            serde_json::json!({
                "model": "gpt-3.5-turbo",
                "messages": [
                    {"role": "system", "content": "rules"},
                    {"role": "user", "content": "hi"}
                ]
            })
        );
    }
}
