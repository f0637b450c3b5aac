//! Two-bot conversation loop.
//!
//! Two bots, each with its own API key, take turns answering each other about
//! a topic through an OpenAI-compatible chat completions endpoint. Output goes
//! to stdout, which the [`ChatRunner`](crate::runner::ChatRunner) captures.

mod output;

pub use output::{Typewriter, wrap_text};

use std::time::Duration;

use anyhow::{Context, bail};
use serde::{Deserialize, Serialize};
use tokio::io::AsyncWrite;

use crate::config::ConverseArgs;
use crate::settings::FirstSpeaker;

/// Reply used when the model returns no content.
pub const EMPTY_REPLY: &str = "(no response)";

/// Chat message role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// A message in the shared conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

/// A chat completions backend.
#[async_trait::async_trait]
pub trait Completions: Send + Sync {
    async fn complete(
        &self,
        api_key: &str,
        model: &str,
        messages: &[ChatMessage],
    ) -> anyhow::Result<String>;
}

/// Non-streaming client for `/chat/completions`.
#[derive(Debug, Clone)]
pub struct HttpCompletions {
    http: reqwest::Client,
    endpoint: String,
}

impl HttpCompletions {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait::async_trait]
impl Completions for HttpCompletions {
    async fn complete(
        &self,
        api_key: &str,
        model: &str,
        messages: &[ChatMessage],
    ) -> anyhow::Result<String> {
        let body = serde_json::json!({
            "model": model,
            "messages": messages,
            "temperature": 0.7,
        });

        let resp = self
            .http
            .post(&self.endpoint)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await?
            .error_for_status()?;

        let v: serde_json::Value = resp.json().await?;
        let message = v
            .get("choices")
            .and_then(|c| c.get(0))
            .and_then(|c| c.get("message"))
            .context("response has no choices[0].message")?;
        Ok(message
            .get("content")
            .and_then(|c| c.as_str())
            .unwrap_or_default()
            .to_string())
    }
}

/// System prompt and opener for `topic`.
pub fn initial_conversation(topic: &str) -> Vec<ChatMessage> {
    vec![
        ChatMessage::new(
            Role::System,
            format!(
                "You are an AI model engaging in a friendly and thoughtful conversation \
                 with another AI about: {topic}. Keep your responses brief (1-5 sentences)."
            ),
        ),
        ChatMessage::new(
            Role::User,
            format!("Let's start our conversation about {topic}."),
        ),
    ]
}

/// Bot speaking on `turn`, starting from `first`.
pub fn speaker_for_turn(first: FirstSpeaker, turn: u32) -> FirstSpeaker {
    match (first, turn % 2 == 0) {
        (FirstSpeaker::Bot1, true) | (FirstSpeaker::Bot2, false) => FirstSpeaker::Bot1,
        _ => FirstSpeaker::Bot2,
    }
}

fn label(speaker: FirstSpeaker) -> &'static str {
    match speaker {
        FirstSpeaker::Bot1 => "Bot 1",
        FirstSpeaker::Bot2 => "Bot 2",
    }
}

/// Ask for the next reply and append it to `conversation`.
///
/// Only the last `context_limit` messages are sent. When the newest one is the
/// other bot's reply, it is repeated as a user message so this bot answers it.
pub async fn chat_turn<C: Completions + ?Sized>(
    backend: &C,
    conversation: &mut Vec<ChatMessage>,
    model: &str,
    api_key: &str,
    context_limit: usize,
) -> anyhow::Result<String> {
    let start = conversation.len().saturating_sub(context_limit.max(1));
    let mut context = conversation[start..].to_vec();

    if let Some(last) = context.last()
        && last.role == Role::Assistant
    {
        let echo = ChatMessage::new(Role::User, last.content.clone());
        context.push(echo);
    }

    let reply = backend.complete(api_key, model, &context).await?;
    let reply = match reply.trim() {
        "" => EMPTY_REPLY.to_string(),
        trimmed => trimmed.to_string(),
    };
    conversation.push(ChatMessage::new(Role::Assistant, reply.clone()));
    Ok(reply)
}

/// Run the conversation until `max_turns` (forever when 0).
pub async fn converse<C, W>(
    backend: &C,
    args: &ConverseArgs,
    out: &mut Typewriter<W>,
) -> anyhow::Result<()>
where
    C: Completions + ?Sized,
    W: AsyncWrite + Unpin,
{
    let missing: Vec<&str> = [("bot1", &args.bot1_key), ("bot2", &args.bot2_key)]
        .into_iter()
        .filter(|(_, key)| key.trim().is_empty())
        .map(|(bot, _)| bot)
        .collect();
    if !missing.is_empty() {
        bail!(
            "Missing GROQ API keys for: {}. Set GROQ_BOT1_KEY / GROQ_BOT2_KEY environment variables.",
            missing.join(", ")
        );
    }

    let delay = Duration::try_from_secs_f64(args.delay).unwrap_or_default();
    let context_limit = usize::try_from(args.context_limit).unwrap_or(usize::MAX);
    let mut conversation = initial_conversation(&args.topic);
    let mut turn = 0u32;

    out.banner().await?;
    loop {
        let speaker = speaker_for_turn(args.first_speaker, turn);
        let api_key = match speaker {
            FirstSpeaker::Bot1 => &args.bot1_key,
            FirstSpeaker::Bot2 => &args.bot2_key,
        };

        match chat_turn(backend, &mut conversation, &args.model, api_key, context_limit).await {
            Ok(reply) => {
                out.type_reply(label(speaker), &reply).await?;
                out.separator().await?;
            }
            Err(e) => {
                tracing::debug!(error = %e, "Chat turn failed");
                out.type_reply(label(speaker), &format!("[ERROR] {e}"))
                    .await?;
            }
        }

        tokio::time::sleep(delay).await;
        turn += 1;
        if args.max_turns > 0 && turn >= args.max_turns {
            break;
        }
    }
    Ok(())
}

/// Entry point of the `converse` subcommand.
pub async fn run(args: &ConverseArgs) -> anyhow::Result<()> {
    let backend = HttpCompletions::new(&args.endpoint);
    let char_delay = Duration::try_from_secs_f64(args.typing_speed).unwrap_or_default();
    let mut out = Typewriter::new(tokio::io::stdout(), args.width, char_delay);
    converse(&backend, args, &mut out).await
}
