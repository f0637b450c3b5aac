use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Default number of lines kept.
pub const DEFAULT_MAX_LINES: usize = 200;

/// Fixed-size FIFO of output lines.
///
/// Cloning is cheap and every clone shares the same lines.
#[derive(Debug, Clone)]
pub struct LogBuffer {
    inner: Arc<Mutex<VecDeque<String>>>,
    max_lines: usize,
}

impl Default for LogBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_LINES)
    }
}

impl LogBuffer {
    pub fn new(max_lines: usize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(VecDeque::new())),
            max_lines,
        }
    }

    fn lines(&self) -> MutexGuard<'_, VecDeque<String>> {
        // A panic mid-push leaves the deque consistent, so keep serving it.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn append(&self, line: impl Into<String>) {
        let mut lines = self.lines();
        push_bounded(&mut lines, line.into(), self.max_lines);
    }

    pub fn extend<I>(&self, new_lines: I)
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        let mut lines = self.lines();
        for line in new_lines {
            push_bounded(&mut lines, line.into(), self.max_lines);
        }
    }

    pub fn clear(&self) {
        self.lines().clear();
    }

    /// Copy of the current lines, oldest first.
    pub fn snapshot(&self) -> Vec<String> {
        self.lines().iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.lines().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines().is_empty()
    }

    pub fn max_lines(&self) -> usize {
        self.max_lines
    }
}

fn push_bounded(lines: &mut VecDeque<String>, line: String, max_lines: usize) {
    if max_lines == 0 {
        return;
    }
    while lines.len() >= max_lines {
        lines.pop_front();
    }
    lines.push_back(line);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_evicts_oldest_lines() {
        let buffer = LogBuffer::new(3);
        buffer.extend(["a", "b", "c"]);
        buffer.append("d");

        assert_eq!(buffer.snapshot(), vec!["b", "c", "d"]);
        assert_eq!(buffer.len(), 3);
    }

    #[test]
    fn test_clones_share_lines() {
        let buffer = LogBuffer::new(10);
        let writer = buffer.clone();
        writer.append("from clone");

        assert_eq!(buffer.snapshot(), vec!["from clone"]);
        buffer.clear();
        assert!(writer.is_empty());
    }

    #[test]
    fn test_zero_capacity_keeps_nothing() {
        let buffer = LogBuffer::new(0);
        buffer.append("dropped");
        assert!(buffer.is_empty());
        assert_eq!(buffer.max_lines(), 0);
    }

    #[test]
    fn test_huge_limit_allocates_lazily() {
        let buffer = LogBuffer::new(usize::MAX);
        buffer.append("only line");
        assert_eq!(buffer.snapshot(), vec!["only line"]);
        assert_eq!(buffer.max_lines(), usize::MAX);
    }
}
