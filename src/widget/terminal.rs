//! Terminal rendering of the feed for the `watch` subcommand.

use std::io::Write;

use super::view::{FeedRow, FeedView, ScrollState, VirtualFeed};

const CLEAR_SCREEN: &str = "\x1b[2J\x1b[H";

/// A feed container drawn to a terminal, one row per line.
#[derive(Debug)]
pub struct TerminalFeed<W> {
    inner: VirtualFeed,
    out: W,
}

impl<W: Write> TerminalFeed<W> {
    /// A viewport `height` lines tall writing to `out`.
    pub fn new(height: u16, out: W) -> Self {
        Self {
            inner: VirtualFeed::new(1.0, f64::from(height.max(1))),
            out,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn draw(&mut self) -> std::io::Result<()> {
        write!(self.out, "{CLEAR_SCREEN}")?;
        for row in self.inner.visible_rows() {
            writeln!(self.out, "{}", row.text())?;
        }
        self.out.flush()
    }
}

impl<W: Write> FeedView for TerminalFeed<W> {
    fn scroll_state(&self) -> ScrollState {
        self.inner.scroll_state()
    }

    fn replace_rows(&mut self, rows: Vec<FeedRow>) {
        self.inner.replace_rows(rows);
    }

    fn set_scroll_top(&mut self, offset: f64) {
        self.inner.set_scroll_top(offset);
    }

    fn commit(&mut self) {
        self.inner.commit();
        if let Err(e) = self.draw() {
            tracing::warn!(error = %e, "Failed to draw feed");
        }
    }
}
