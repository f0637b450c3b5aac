//! View seams for the feed container and the topic controls.
//!
//! The poller and fetcher never touch a concrete UI. They talk to these traits,
//! which a browser binding, a terminal renderer or a test double implements.

use super::PIN_TOLERANCE_PX;

/// Scroll geometry of the feed container, sampled once per poll.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollState {
    /// Current scroll offset from the top.
    pub scroll_top: f64,
    /// Height of the visible area.
    pub client_height: f64,
    /// Total height of the content.
    pub scroll_height: f64,
}

impl ScrollState {
    /// Largest offset the container can scroll to.
    pub fn max_scroll_top(&self) -> f64 {
        (self.scroll_height - self.client_height).max(0.0)
    }

    /// Distance between the visible bottom edge and the end of the content.
    pub fn distance_from_bottom(&self) -> f64 {
        self.scroll_height - self.client_height - self.scroll_top
    }

    /// Whether the viewer is following the newest content.
    pub fn is_pinned(&self) -> bool {
        self.distance_from_bottom() <= PIN_TOLERANCE_PX
    }
}

/// One rendered row of the feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedRow {
    /// Shown alone when the log is empty.
    Placeholder,
    /// A log line, rendered as plain text.
    Line(String),
}

impl FeedRow {
    /// Text content of the row.
    pub fn text(&self) -> &str {
        match self {
            Self::Placeholder => super::PLACEHOLDER_TEXT,
            Self::Line(line) => line,
        }
    }
}

/// The scrolling container the feed renders into.
pub trait FeedView {
    /// Current scroll geometry.
    fn scroll_state(&self) -> ScrollState;

    /// Replace every row of the container.
    fn replace_rows(&mut self, rows: Vec<FeedRow>);

    /// Move the scroll offset. Implementations clamp to the valid range.
    fn set_scroll_top(&mut self, offset: f64);

    /// Called once the rows and offset of a cycle are settled.
    fn commit(&mut self) {}
}

/// The text input the topic fetcher fills.
pub trait TopicInput {
    fn value(&self) -> String;
    fn set_value(&mut self, value: &str);
    fn placeholder(&self) -> String;
    fn set_placeholder(&mut self, placeholder: &str);
    fn set_disabled(&mut self, disabled: bool);
    fn focus(&mut self);
}

/// The control that triggers a topic fetch.
pub trait TriggerButton {
    fn is_disabled(&self) -> bool;
    fn set_disabled(&mut self, disabled: bool);
}

/// In-memory feed container with fixed-height rows.
///
/// Mirrors how a block container lays out: content is never shorter than the
/// viewport and the offset stays within `0..=max_scroll_top`.
#[derive(Debug, Clone)]
pub struct VirtualFeed {
    rows: Vec<FeedRow>,
    row_height: f64,
    client_height: f64,
    scroll_top: f64,
    commits: usize,
}

impl VirtualFeed {
    pub fn new(row_height: f64, client_height: f64) -> Self {
        Self {
            rows: Vec::new(),
            row_height,
            client_height,
            scroll_top: 0.0,
            commits: 0,
        }
    }

    pub fn rows(&self) -> &[FeedRow] {
        &self.rows
    }

    pub fn scroll_top(&self) -> f64 {
        self.scroll_top
    }

    /// Number of settled render cycles.
    pub fn commits(&self) -> usize {
        self.commits
    }

    /// Rows intersecting the visible area, top to bottom.
    pub fn visible_rows(&self) -> &[FeedRow] {
        if self.rows.is_empty() || self.row_height <= 0.0 {
            return &self.rows;
        }
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let first = (self.scroll_top / self.row_height).floor() as usize;
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let last = ((self.scroll_top + self.client_height) / self.row_height).ceil() as usize;
        let first = first.min(self.rows.len());
        &self.rows[first..last.clamp(first, self.rows.len())]
    }

    fn content_height(&self) -> f64 {
        #[allow(clippy::cast_precision_loss)]
        let rows = self.rows.len() as f64;
        (rows * self.row_height).max(self.client_height)
    }
}

impl FeedView for VirtualFeed {
    fn scroll_state(&self) -> ScrollState {
        ScrollState {
            scroll_top: self.scroll_top,
            client_height: self.client_height,
            scroll_height: self.content_height(),
        }
    }

    fn replace_rows(&mut self, rows: Vec<FeedRow>) {
        self.rows = rows;
        // Shrinking content pulls the offset back like a browser does.
        let max = self.scroll_state().max_scroll_top();
        self.scroll_top = self.scroll_top.min(max);
    }

    fn set_scroll_top(&mut self, offset: f64) {
        let max = self.scroll_state().max_scroll_top();
        self.scroll_top = offset.clamp(0.0, max);
    }

    fn commit(&mut self) {
        self.commits += 1;
    }
}

/// In-memory text input.
#[derive(Debug, Clone, Default)]
pub struct VirtualInput {
    value: String,
    placeholder: String,
    disabled: bool,
    focused: bool,
}

impl VirtualInput {
    pub fn new(placeholder: &str) -> Self {
        Self {
            placeholder: placeholder.to_string(),
            ..Self::default()
        }
    }

    pub fn with_value(mut self, value: &str) -> Self {
        self.value = value.to_string();
        self
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    pub fn is_focused(&self) -> bool {
        self.focused
    }
}

impl TopicInput for VirtualInput {
    fn value(&self) -> String {
        self.value.clone()
    }

    fn set_value(&mut self, value: &str) {
        self.value = value.to_string();
    }

    fn placeholder(&self) -> String {
        self.placeholder.clone()
    }

    fn set_placeholder(&mut self, placeholder: &str) {
        self.placeholder = placeholder.to_string();
    }

    fn set_disabled(&mut self, disabled: bool) {
        self.disabled = disabled;
        if disabled {
            self.focused = false;
        }
    }

    fn focus(&mut self) {
        if !self.disabled {
            self.focused = true;
        }
    }
}

/// In-memory trigger control.
#[derive(Debug, Clone, Copy, Default)]
pub struct VirtualButton {
    disabled: bool,
}

impl TriggerButton for VirtualButton {
    fn is_disabled(&self) -> bool {
        self.disabled
    }

    fn set_disabled(&mut self, disabled: bool) {
        self.disabled = disabled;
    }
}
