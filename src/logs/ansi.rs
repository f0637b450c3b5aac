use std::borrow::Cow;
use std::sync::LazyLock;

use regex::Regex;

/// CSI sequences (colours, cursor moves) and the `ESC c` terminal reset.
static ANSI_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\x1B(?:\[[0-?]*[ -/]*[@-~]|c)").expect("valid ANSI pattern"));

/// Remove terminal escape sequences from `line`.
pub fn strip_ansi(line: &str) -> Cow<'_, str> {
    ANSI_RE.replace_all(line, "")
}
