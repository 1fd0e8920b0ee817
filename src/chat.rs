//! Chat collaborator: a conversational model consumed only through
//! `respond(query, history) -> (response, new_history)`.
//!
//! The dataset pipeline never depends on this module. It exists so a model
//! (for example one fine-tuned on the generated records) can be queried
//! from the same tool. Calls are stateless: the caller owns the history and
//! passes it back in on the next call.

use crate::error::Pdf2DatasetError;
use edgequake_llm::{ChatMessage, CompletionOptions, LLMProvider, ProviderFactory};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::io::{BufRead, Write};
use std::sync::Arc;
use tracing::{debug, warn};

/// Who said a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

/// One turn of a chat history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: ChatRole,
    pub content: String,
}

impl ChatTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

/// A model response together with the history to pass to the next call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatReply {
    pub response: String,
    pub history: Vec<ChatTurn>,
}

impl ChatReply {
    /// Append the exchange `query` → `response` to `history`.
    pub fn new(history: Option<&[ChatTurn]>, query: &str, response: String) -> Self {
        let mut turns = history.map(<[ChatTurn]>::to_vec).unwrap_or_default();
        turns.push(ChatTurn::user(query));
        turns.push(ChatTurn::assistant(response.clone()));
        Self {
            response,
            history: turns,
        }
    }
}

/// The query → response contract.
pub trait ChatModel {
    fn respond(
        &self,
        query: &str,
        history: Option<&[ChatTurn]>,
    ) -> impl Future<Output = Result<ChatReply, Pdf2DatasetError>> + Send;
}

/// Provider and sampling settings for [`LlmChatModel`].
#[derive(Debug, Clone)]
pub struct ChatConfig {
    /// Provider name (e.g. "openai", "ollama"). If None, auto-detected.
    pub provider_name: Option<String>,
    /// Model identifier. If None, uses the provider default.
    pub model: Option<String>,
    /// Optional system prompt sent before the history.
    pub system_prompt: Option<String>,
    /// Sampling temperature. Default: 0.7.
    pub temperature: f32,
    /// Maximum tokens per reply. Default: 1024.
    pub max_tokens: usize,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            provider_name: None,
            model: None,
            system_prompt: None,
            temperature: 0.7,
            max_tokens: 1024,
        }
    }
}

/// [`ChatModel`] backed by an `edgequake_llm` provider.
pub struct LlmChatModel {
    provider: Arc<dyn LLMProvider>,
    options: CompletionOptions,
    system_prompt: Option<String>,
}

impl LlmChatModel {
    /// Wrap an already-constructed provider.
    pub fn new(provider: Arc<dyn LLMProvider>, config: &ChatConfig) -> Self {
        Self {
            provider,
            options: CompletionOptions {
                temperature: Some(config.temperature),
                max_tokens: Some(config.max_tokens),
                ..Default::default()
            },
            system_prompt: config.system_prompt.clone(),
        }
    }

    /// Resolve a provider from `config` and the environment.
    pub fn from_config(config: &ChatConfig) -> Result<Self, Pdf2DatasetError> {
        Ok(Self::new(resolve_provider(config)?, config))
    }

    fn build_messages(&self, query: &str, history: Option<&[ChatTurn]>) -> Vec<ChatMessage> {
        let mut messages = Vec::new();
        if let Some(ref prompt) = self.system_prompt {
            messages.push(ChatMessage::system(prompt.as_str()));
        }
        for turn in history.unwrap_or_default() {
            messages.push(match turn.role {
                ChatRole::User => ChatMessage::user(turn.content.as_str()),
                ChatRole::Assistant => ChatMessage::assistant(turn.content.as_str()),
            });
        }
        messages.push(ChatMessage::user(query));
        messages
    }
}

impl ChatModel for LlmChatModel {
    async fn respond(
        &self,
        query: &str,
        history: Option<&[ChatTurn]>,
    ) -> Result<ChatReply, Pdf2DatasetError> {
        let messages = self.build_messages(query, history);
        let response = self
            .provider
            .chat(&messages, Some(&self.options))
            .await
            .map_err(|e| Pdf2DatasetError::ChatFailed(e.to_string()))?;
        debug!(
            "Chat: {} input tokens, {} output tokens",
            response.prompt_tokens, response.completion_tokens
        );
        Ok(ChatReply::new(history, query, response.content))
    }
}

/// Resolve the LLM provider, from most-specific to least-specific:
///
/// 1. **Named provider** (`config.provider_name`) with `config.model`.
/// 2. **Environment pair** (`EDGEQUAKE_LLM_PROVIDER` + `EDGEQUAKE_MODEL`).
/// 3. **Full auto-detection** (`ProviderFactory::from_env`).
fn resolve_provider(config: &ChatConfig) -> Result<Arc<dyn LLMProvider>, Pdf2DatasetError> {
    if let Some(ref name) = config.provider_name {
        let model = config.model.as_deref().unwrap_or("gpt-4.1-nano");
        return create_provider(name, model);
    }

    if let (Ok(prov), Ok(model)) = (
        std::env::var("EDGEQUAKE_LLM_PROVIDER"),
        std::env::var("EDGEQUAKE_MODEL"),
    ) {
        if !prov.is_empty() && !model.is_empty() {
            return create_provider(&prov, &model);
        }
    }

    let (llm_provider, _embedding) =
        ProviderFactory::from_env().map_err(|e| Pdf2DatasetError::ProviderNotConfigured {
            provider: "auto".to_string(),
            hint: format!(
                "No LLM provider could be auto-detected from environment.\n\
                Set OPENAI_API_KEY, ANTHROPIC_API_KEY, or pass --provider.\n\
                Error: {}",
                e
            ),
        })?;

    Ok(llm_provider)
}

fn create_provider(name: &str, model: &str) -> Result<Arc<dyn LLMProvider>, Pdf2DatasetError> {
    ProviderFactory::create_llm_provider(name, model).map_err(|e| {
        Pdf2DatasetError::ProviderNotConfigured {
            provider: name.to_string(),
            hint: format!("{e}"),
        }
    })
}

/// Interactive loop: read a query per line from `input`, print the reply
/// to `output`, until EOF or `quit`. Returns the final history.
///
/// A failed call is reported and the loop continues with the old history.
pub async fn run_chat_loop<M, R, W>(
    model: &M,
    mut input: R,
    mut output: W,
) -> Result<Vec<ChatTurn>, Pdf2DatasetError>
where
    M: ChatModel,
    R: BufRead,
    W: Write,
{
    let io_err = |e: std::io::Error| Pdf2DatasetError::Internal(format!("chat I/O: {e}"));
    let mut history: Vec<ChatTurn> = Vec::new();

    writeln!(output, "Welcome! Type 'quit' to exit.").map_err(io_err)?;
    loop {
        write!(output, "\nYou: ").map_err(io_err)?;
        output.flush().map_err(io_err)?;

        let mut line = String::new();
        if input.read_line(&mut line).map_err(io_err)? == 0 {
            break;
        }
        let query = line.trim();
        if query.eq_ignore_ascii_case("quit") {
            break;
        }
        if query.is_empty() {
            continue;
        }

        match model.respond(query, Some(history.as_slice())).await {
            Ok(reply) => {
                writeln!(output, "\nAssistant: {}", reply.response).map_err(io_err)?;
                history = reply.history;
            }
            Err(e) => {
                warn!("Chat request failed: {}", e);
                writeln!(output, "\nError: {}", e).map_err(io_err)?;
            }
        }
    }

    Ok(history)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    /// Replies with the query upper-cased and how many turns it was given.
    struct ShoutModel;

    impl ChatModel for ShoutModel {
        async fn respond(
            &self,
            query: &str,
            history: Option<&[ChatTurn]>,
        ) -> Result<ChatReply, Pdf2DatasetError> {
            if query == "fail" {
                return Err(Pdf2DatasetError::ChatFailed("boom".into()));
            }
            let seen = history.map(|h| h.len()).unwrap_or(0);
            Ok(ChatReply::new(
                history,
                query,
                format!("{} ({seen})", query.to_uppercase()),
            ))
        }
    }

    #[test]
    fn reply_extends_history() {
        let first = ChatReply::new(None, "hi", "hello".into());
        assert_eq!(
            first.history,
            vec![ChatTurn::user("hi"), ChatTurn::assistant("hello")]
        );
        let second = ChatReply::new(Some(first.history.as_slice()), "again", "yes".into());
        assert_eq!(second.history.len(), 4);
        assert_eq!(second.history[2], ChatTurn::user("again"));
    }

    #[tokio::test]
    async fn loop_threads_history_and_stops_on_quit() {
        let input = Cursor::new("hello\n\nfail\nagain\nQUIT\nignored\n");
        let mut out = Vec::new();

        let history = run_chat_loop(&ShoutModel, input, &mut out).await.unwrap();
        let printed = String::from_utf8(out).unwrap();

        assert!(printed.contains("Assistant: HELLO (0)"), "{printed}");
        assert!(printed.contains("Error: Chat request failed: boom"), "{printed}");
        assert!(printed.contains("Assistant: AGAIN (2)"), "{printed}");
        assert!(!printed.contains("IGNORED"));
        assert_eq!(history.len(), 4);
    }

    #[tokio::test]
    async fn loop_ends_on_eof() {
        let history = run_chat_loop(&ShoutModel, Cursor::new(""), Vec::new())
            .await
            .unwrap();
        assert!(history.is_empty());
    }

    #[test]
    fn turns_serialise_with_lowercase_roles() {
        let v = serde_json::to_value(ChatTurn::assistant("x")).unwrap();
        assert_eq!(v, serde_json::json!({"role": "assistant", "content": "x"}));
    }
}
