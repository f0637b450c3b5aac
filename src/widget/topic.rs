//! Topic fetcher: fills the topic input with a generated suggestion.

use tracing::debug;

use super::view::{TopicInput, TriggerButton};
use super::{DEFAULT_TOPIC_PLACEHOLDER, TOPIC_FALLBACK_ERROR};
use crate::error::Result;

/// Where generated topics come from.
#[async_trait::async_trait]
pub trait TopicSource: Send + Sync {
    /// Request a topic. Returns the raw, untrimmed string.
    async fn fetch_topic(&self) -> Result<String>;
}

/// What a click resolved to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TopicOutcome {
    /// The input now holds this topic.
    Applied(String),
    /// The request failed. Carries the placeholder hint shown, if any.
    Failed { hint: Option<String> },
    /// The trigger was disabled, nothing happened.
    Ignored,
}

/// Handles clicks on the topic trigger.
#[derive(Debug, Clone)]
pub struct TopicFetcher<S> {
    source: S,
}

impl<S: TopicSource> TopicFetcher<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }

    /// Fetch a topic on behalf of a click.
    ///
    /// Controls are disabled while the request is in flight and always
    /// re-enabled (with the input focused) once it settles.
    pub async fn on_click<I, B>(&self, input: &mut I, button: &mut B) -> TopicOutcome
    where
        I: TopicInput + ?Sized,
        B: TriggerButton + ?Sized,
    {
        if button.is_disabled() {
            return TopicOutcome::Ignored;
        }

        let previous = input.value();
        input.set_disabled(true);
        button.set_disabled(true);

        let outcome = match self.source.fetch_topic().await {
            Ok(topic) if !topic.trim().is_empty() => {
                let topic = topic.trim().to_string();
                input.set_value(&topic);
                input.set_placeholder(DEFAULT_TOPIC_PLACEHOLDER);
                TopicOutcome::Applied(topic)
            }
            result => {
                let server_message = match &result {
                    Err(e) => {
                        debug!(name: "topic.fetch.failed", error = %e, "Topic fetch failed");
                        e.server_message().map(ToString::to_string)
                    }
                    Ok(_) => None,
                };
                let hint = previous.trim().is_empty().then(|| {
                    server_message.unwrap_or_else(|| TOPIC_FALLBACK_ERROR.to_string())
                });
                if let Some(hint) = &hint {
                    input.set_placeholder(hint);
                }
                TopicOutcome::Failed { hint }
            }
        };

        input.set_disabled(false);
        button.set_disabled(false);
        input.focus();
        outcome
    }
}
