//! Server-rendered control panel page.

use crate::settings::ControlSettings;
use crate::widget::{DEFAULT_TOPIC_PLACEHOLDER, PLACEHOLDER_TEXT};

/// Escape text for use in HTML content and quoted attributes.
pub fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Render the panel with the current settings and log lines.
///
/// Lines are rendered up front so the page is useful before the first poll.
pub fn render_panel(settings: &ControlSettings, running: bool, lines: &[String]) -> String {
    let topic = escape_html(&settings.topic);
    let model = escape_html(&settings.model);
    let status = if running { "Running" } else { "Stopped" };
    let rows = if lines.is_empty() {
        format!(r#"<div class="chat-feed__placeholder">{PLACEHOLDER_TEXT}</div>"#)
    } else {
        lines
            .iter()
            .map(|line| format!("<div>{}</div>", escape_html(line)))
            .collect::<Vec<_>>()
            .join("\n")
    };

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <title>Chat Control Panel</title>
    <link rel="stylesheet" href="/static/css/panel.css">
    <script defer src="/static/js/feed.js"></script>
    <script defer src="/static/js/control.js"></script>
</head>
<body>
    <main class="panel">
        <header class="panel__header">
            <h1>Chat Control Panel</h1>
            <span id="chat-status" class="panel__status" data-running="{running}">{status}</span>
        </header>

        <section class="panel__controls">
            <label for="topic-input">Topic</label>
            <div class="panel__topic">
                <input id="topic-input" name="topic" type="text" value="{topic}"
                       placeholder="{DEFAULT_TOPIC_PLACEHOLDER}"
                       data-default-placeholder="{DEFAULT_TOPIC_PLACEHOLDER}" autocomplete="off">
                <button id="topic-button" type="button">Suggest</button>
            </div>
            <p class="panel__meta">Model: <code>{model}</code></p>
            <div class="panel__actions">
                <button type="button" data-action="start">Start</button>
                <button type="button" data-action="stop">Stop</button>
                <button type="button" data-action="restart">Restart</button>
                <button type="button" data-action="save">Save</button>
            </div>
            <p id="control-message" class="panel__message" aria-live="polite">Ready for commands.</p>
        </section>

        <section id="chat-feed" class="chat-feed" aria-live="polite" aria-label="Chat output">
{rows}
        </section>
    </main>
</body>
</html>"#
    )
}
