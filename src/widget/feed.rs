//! Feed poller: fetches log lines and reconciles them into a [`FeedView`].

use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::view::{FeedRow, FeedView};
use crate::error::Result;

/// Where the feed reads its lines from.
#[async_trait::async_trait]
pub trait LogSource: Send + Sync {
    /// Fetch the current lines, bypassing any cache.
    ///
    /// Any failure, including a response without a `lines` array, is an error.
    async fn fetch_lines(&self) -> Result<Vec<String>>;
}

/// Result of a single poll cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// The container was re-rendered with this many lines.
    Rendered { lines: usize },
    /// The fetch failed; previous content stays on screen.
    Skipped,
}

/// Replace the container contents with `lines` and restore the scroll position.
///
/// A viewer pinned to the bottom stays at the new bottom. Otherwise the offset
/// moves by exactly the change in content height.
pub fn reconcile<V: FeedView + ?Sized>(view: &mut V, lines: &[String]) {
    let before = view.scroll_state();
    let was_pinned = before.is_pinned();

    let rows = if lines.is_empty() {
        vec![FeedRow::Placeholder]
    } else {
        lines.iter().cloned().map(FeedRow::Line).collect()
    };
    view.replace_rows(rows);

    let after = view.scroll_state();
    if was_pinned {
        view.set_scroll_top(after.scroll_height);
    } else {
        let delta = after.scroll_height - before.scroll_height;
        view.set_scroll_top(before.scroll_top + delta);
    }
    view.commit();
}

/// Polls a [`LogSource`] and renders into a view.
#[derive(Debug, Clone)]
pub struct FeedPoller<S> {
    source: S,
}

impl<S: LogSource> FeedPoller<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }

    /// Run one fetch-and-render cycle.
    pub async fn poll_once<V: FeedView + ?Sized>(&self, view: &mut V) -> PollOutcome {
        match self.source.fetch_lines().await {
            Ok(lines) => {
                reconcile(view, &lines);
                PollOutcome::Rendered { lines: lines.len() }
            }
            Err(e) => {
                debug!(name: "feed.poll.skipped", error = %e, "Feed poll skipped");
                PollOutcome::Skipped
            }
        }
    }

    /// Poll immediately, then every `period` until `cancel` fires.
    ///
    /// Each cycle is awaited before the next tick, so cycles never overlap.
    pub async fn run<V: FeedView + ?Sized>(
        &self,
        view: &mut V,
        period: Duration,
        cancel: CancellationToken,
    ) {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                _ = ticker.tick() => {
                    self.poll_once(view).await;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::widget::PLACEHOLDER_TEXT;
    use crate::widget::view::VirtualFeed;
    use std::sync::Mutex;

    /// Serves queued responses, repeating the last one.
    struct ScriptedSource {
        responses: Mutex<Vec<Result<Vec<String>>>>,
    }

    impl ScriptedSource {
        fn new(responses: Vec<Result<Vec<String>>>) -> Self {
            Self {
                responses: Mutex::new(responses),
            }
        }
    }

    #[async_trait::async_trait]
    impl LogSource for ScriptedSource {
        async fn fetch_lines(&self) -> Result<Vec<String>> {
            let mut responses = self.responses.lock().unwrap();
            if responses.len() > 1 {
                responses.remove(0)
            } else {
                match responses.first() {
                    Some(Ok(lines)) => Ok(lines.clone()),
                    _ => Err(Error::MalformedResponse("exhausted".into())),
                }
            }
        }
    }

    fn lines(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("line {i}")).collect()
    }

    fn texts(feed: &VirtualFeed) -> Vec<&str> {
        feed.rows().iter().map(FeedRow::text).collect()
    }

    #[test]
    fn test_empty_log_renders_single_placeholder() {
        let mut feed = VirtualFeed::new(20.0, 100.0);
        reconcile(&mut feed, &[]);
        assert_eq!(feed.rows(), &[FeedRow::Placeholder]);
        assert_eq!(texts(&feed), vec![PLACEHOLDER_TEXT]);
    }

    #[test]
    fn test_lines_render_in_order_as_plain_text() {
        let mut feed = VirtualFeed::new(20.0, 100.0);
        reconcile(&mut feed, &["a".to_string(), "<b>b</b>".to_string()]);
        assert_eq!(texts(&feed), vec!["a", "<b>b</b>"]);
    }

    #[test]
    fn test_pinned_viewer_follows_new_bottom() {
        let mut feed = VirtualFeed::new(20.0, 100.0);
        reconcile(&mut feed, &lines(20));
        assert!((feed.scroll_top() - 300.0).abs() < f64::EPSILON);

        reconcile(&mut feed, &lines(25));
        assert!((feed.scroll_top() - 400.0).abs() < f64::EPSILON);
        assert!(feed.scroll_state().is_pinned());
    }

    #[test]
    fn test_scrolled_away_viewer_shifts_by_height_delta() {
        let mut feed = VirtualFeed::new(20.0, 100.0);
        reconcile(&mut feed, &lines(20));
        feed.set_scroll_top(100.0);

        reconcile(&mut feed, &lines(25));
        assert!((feed.scroll_top() - 200.0).abs() < f64::EPSILON);
        assert!(!feed.scroll_state().is_pinned());
    }

    #[test]
    fn test_unchanged_content_keeps_offset() {
        let mut feed = VirtualFeed::new(20.0, 100.0);
        reconcile(&mut feed, &lines(20));
        feed.set_scroll_top(40.0);

        reconcile(&mut feed, &lines(20));
        assert!((feed.scroll_top() - 40.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn test_failed_poll_leaves_rows_untouched() {
        let poller = FeedPoller::new(ScriptedSource::new(vec![
            Ok(vec!["a".into(), "b".into()]),
            Err(Error::Api {
                status: 502,
                message: None,
            }),
        ]));
        let mut feed = VirtualFeed::new(20.0, 100.0);

        assert_eq!(
            poller.poll_once(&mut feed).await,
            PollOutcome::Rendered { lines: 2 }
        );
        assert_eq!(poller.poll_once(&mut feed).await, PollOutcome::Skipped);
        assert_eq!(texts(&feed), vec!["a", "b"]);
        assert_eq!(feed.commits(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_polls_immediately_then_on_interval() {
        let poller = FeedPoller::new(ScriptedSource::new(vec![Ok(vec!["x".into()])]));
        let mut feed = VirtualFeed::new(20.0, 100.0);
        let cancel = CancellationToken::new();

        let stopper = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(6_500)).await;
            stopper.cancel();
        });

        poller
            .run(&mut feed, Duration::from_secs(3), cancel)
            .await;

        // t = 0s, 3s, 6s
        assert_eq!(feed.commits(), 3);
        assert_eq!(texts(&feed), vec!["x"]);
    }
}
