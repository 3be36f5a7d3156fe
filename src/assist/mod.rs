//! AI assistance: explain-last-error and suggest-optimizations, one-shot
//! completions with a fixed role instruction per intent. Failures degrade to
//! canned fallback strings; nothing here ever returns an error.

use crate::llm::{ChatMessage, ChatOptions, LlmClient, Role};

const EXPLAIN_ROLE: &str =
    "You are a senior Python developer. Provide clear, concise explanations and code fixes.";
const OPTIMIZE_ROLE: &str =
    "You are an expert Python performance engineer. Focus on readability, efficiency, and Pythonic patterns.";

pub const EXPLAIN_FALLBACK: &str =
    "Failed to get AI assistance. Please check your network or try again.";
pub const OPTIMIZE_FALLBACK: &str = "Failed to get AI suggestions.";

/// Handle to the assistance service plus the single result slot's sequence
/// counter. Each request gets a fresh token; only the response carrying the
/// latest token is allowed to commit, so a slow earlier call can never
/// clobber a newer answer.
#[derive(Debug, Clone)]
pub struct AssistSession {
    client: LlmClient,
    opts: ChatOptions,
    seq: u64,
}

impl AssistSession {
    pub fn new(client: LlmClient, opts: ChatOptions) -> Self {
        Self {
            client,
            opts,
            seq: 0,
        }
    }

    /// Issue a token for a new request. Invalidates all earlier tokens.
    pub fn begin(&mut self) -> u64 {
        self.seq += 1;
        self.seq
    }

    /// Whether a response carrying `token` is still the latest request.
    pub fn is_current(&self, token: u64) -> bool {
        token == self.seq
    }

    /// Explain the most recent error in the context of the full source.
    /// Resolves to a fallback string on any transport or service failure.
    pub async fn explain_error(&self, source: &str, error: &str) -> String {
        let prompt = explain_prompt(source, error);
        self.ask(EXPLAIN_ROLE, &prompt, EXPLAIN_FALLBACK).await
    }

    /// Suggest improvements for the current source. Same never-fails
    /// contract as `explain_error`.
    pub async fn suggest_optimizations(&self, source: &str) -> String {
        let prompt = optimize_prompt(source);
        self.ask(OPTIMIZE_ROLE, &prompt, OPTIMIZE_FALLBACK).await
    }

    async fn ask(&self, role: &str, prompt: &str, fallback: &str) -> String {
        let messages = vec![
            ChatMessage::new(Role::System, role),
            ChatMessage::new(Role::User, prompt),
        ];
        match self.client.complete(&messages, &self.opts).await {
            Ok(text) => text,
            Err(_) => fallback.to_string(),
        }
    }
}

fn explain_prompt(source: &str, error: &str) -> String {
    format!(
        "I'm writing Python code and got an error.\n\n\
         Code:\n```python\n{source}\n```\n\n\
         Error:\n{error}\n\n\
         Please explain what went wrong and how to fix it in a concise way."
    )
}

fn optimize_prompt(source: &str) -> String {
    format!(
        "Analyze this Python code and suggest 2-3 optimizations or best practice improvements:\n\n\
         ```python\n{source}\n```"
    )
}
