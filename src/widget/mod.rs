//! Chat feed widget.
//!
//! Two behaviours share the page: a [`FeedPoller`] that keeps a scrolling
//! container in sync with the server's log lines, and a [`TopicFetcher`] that
//! prefills the topic input with a generated suggestion.
//!
//! Neither touches a concrete UI. Views are injected through the traits in
//! [`view`] and transport through [`LogSource`] / [`TopicSource`], with
//! [`PanelClient`] as the HTTP implementation of both.
//!
//! # Example
//!
//! ```rust
//! use chat_feed_panel::widget::{reconcile, FeedRow, VirtualFeed};
//!
//! let mut feed = VirtualFeed::new(20.0, 100.0);
//! reconcile(&mut feed, &[]);
//! assert_eq!(feed.rows(), &[FeedRow::Placeholder]);
//! ```

use std::time::Duration;

mod client;
mod feed;
mod terminal;
mod topic;
pub mod view;

pub use client::PanelClient;
pub use feed::{FeedPoller, LogSource, PollOutcome, reconcile};
pub use terminal::TerminalFeed;
pub use topic::{TopicFetcher, TopicOutcome, TopicSource};
pub use view::{
    FeedRow, FeedView, ScrollState, TopicInput, TriggerButton, VirtualButton, VirtualFeed,
    VirtualInput,
};

/// How often the feed polls `/logs`.
pub const POLL_INTERVAL: Duration = Duration::from_secs(3);

/// Slack, in pixels, for deciding the viewer is at the bottom.
pub const PIN_TOLERANCE_PX: f64 = 6.0;

/// Text of the row shown while the log is empty.
pub const PLACEHOLDER_TEXT: &str = "Waiting for chat output...";

/// Placeholder of the topic input when no error is shown.
pub const DEFAULT_TOPIC_PLACEHOLDER: &str = "Enter a conversation topic";

/// Hint shown when a topic request fails without a server message.
pub const TOPIC_FALLBACK_ERROR: &str = "Couldn't fetch a topic. Try again.";

/// The widget's UI elements, passed explicitly instead of looked up.
#[derive(Debug, Clone)]
pub struct WidgetState<F, I, B> {
    /// Scrolling log container.
    pub feed: F,
    /// Topic text input.
    pub topic_input: I,
    /// Button requesting a topic.
    pub topic_button: B,
}

impl<F, I, B> WidgetState<F, I, B>
where
    F: FeedView,
    I: TopicInput,
    B: TriggerButton,
{
    pub fn new(feed: F, topic_input: I, topic_button: B) -> Self {
        Self {
            feed,
            topic_input,
            topic_button,
        }
    }

    /// Run one feed cycle against this widget.
    pub async fn refresh<S: LogSource>(&mut self, poller: &FeedPoller<S>) -> PollOutcome {
        poller.poll_once(&mut self.feed).await
    }

    /// Handle a click on the topic button.
    pub async fn request_topic<S: TopicSource>(
        &mut self,
        fetcher: &TopicFetcher<S>,
    ) -> TopicOutcome {
        fetcher
            .on_click(&mut self.topic_input, &mut self.topic_button)
            .await
    }
}
