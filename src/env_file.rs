//! In-place updates of a `KEY=value` env file.

use std::io::ErrorKind;
use std::path::Path;

/// Set or remove keys in the env file at `path`, keeping comments, blank lines
/// and unrelated entries. New keys are appended; `None` removes a key.
pub async fn write_env_updates(
    path: impl AsRef<Path>,
    updates: &[(&str, Option<String>)],
) -> std::io::Result<()> {
    let path = path.as_ref();
    let existing = match tokio::fs::read_to_string(path).await {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => String::new(),
        Err(e) => return Err(e),
    };

    let rendered = apply_updates(&existing, updates);
    tokio::fs::write(path, rendered).await
}

fn apply_updates(existing: &str, updates: &[(&str, Option<String>)]) -> String {
    let mut seen = Vec::new();
    let mut lines = Vec::new();

    for line in existing.lines() {
        let stripped = line.trim();
        let key = match line.split_once('=') {
            Some((key, _)) if !stripped.is_empty() && !stripped.starts_with('#') => key.trim(),
            _ => {
                lines.push(line.to_string());
                continue;
            }
        };
        match updates.iter().find(|(k, _)| *k == key) {
            Some((k, value)) => {
                seen.push(*k);
                if let Some(value) = value {
                    lines.push(format!("{k}={value}"));
                }
            }
            None => lines.push(line.to_string()),
        }
    }

    for (key, value) in updates {
        if let Some(value) = value
            && !seen.contains(key)
        {
            lines.push(format!("{key}={value}"));
        }
    }

    if lines.is_empty() {
        String::new()
    } else {
        lines.join("\n") + "\n"
    }
}
