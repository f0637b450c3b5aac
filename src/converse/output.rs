//! Typewriter-style output for a fixed-width display.

use std::time::Duration;

use tokio::io::{AsyncWrite, AsyncWriteExt};

const GREEN: &str = "\x1b[92m";
const RESET: &str = "\x1b[0m";
const CLEAR: &str = "\x1bc";
const MARGIN: &str = "  ";

/// Wrap `text` to `width` columns, splitting words that do not fit.
pub fn wrap_text(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for word in text.split_whitespace() {
        let mut word: Vec<char> = word.chars().collect();

        if current_len > 0 && current_len + 1 + word.len() <= width {
            current.push(' ');
            current.extend(word.iter());
            current_len += 1 + word.len();
            continue;
        }
        if current_len > 0 {
            lines.push(std::mem::take(&mut current));
            current_len = 0;
        }
        while word.len() > width {
            let rest = word.split_off(width);
            lines.push(word.iter().collect());
            word = rest;
        }
        current.extend(word.iter());
        current_len = word.len();
    }

    if current_len > 0 {
        lines.push(current);
    }
    lines
}

/// Writes speaker-labelled replies one character at a time.
#[derive(Debug)]
pub struct Typewriter<W> {
    out: W,
    width: usize,
    char_delay: Duration,
}

impl<W: AsyncWrite + Unpin> Typewriter<W> {
    pub fn new(out: W, width: usize, char_delay: Duration) -> Self {
        Self {
            out,
            width,
            char_delay,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    pub async fn banner(&mut self) -> std::io::Result<()> {
        let banner = format!(
            "{CLEAR}\n{GREEN}╔══════════════════════════════╗\n\
             ║  AI CONVERSATION TERMINAL    ║\n\
             ╚══════════════════════════════╝{RESET}\n\n"
        );
        self.out.write_all(banner.as_bytes()).await?;
        self.out.flush().await
    }

    pub async fn type_reply(&mut self, speaker: &str, text: &str) -> std::io::Result<()> {
        self.out
            .write_all(format!("{GREEN}[{speaker}]:{RESET}\n").as_bytes())
            .await?;
        self.out.flush().await?;

        for line in wrap_text(text, self.width) {
            self.out.write_all(MARGIN.as_bytes()).await?;
            self.out.write_all(GREEN.as_bytes()).await?;
            let mut buf = [0u8; 4];
            for ch in line.chars() {
                self.out.write_all(ch.encode_utf8(&mut buf).as_bytes()).await?;
                self.out.flush().await?;
                if !self.char_delay.is_zero() {
                    tokio::time::sleep(self.char_delay).await;
                }
            }
            self.out.write_all(RESET.as_bytes()).await?;
            self.out.write_all(b"\n").await?;
        }
        self.out.flush().await
    }

    pub async fn separator(&mut self) -> std::io::Result<()> {
        let rule = "─".repeat(self.width);
        self.out
            .write_all(format!("{GREEN}{rule}{RESET}\n").as_bytes())
            .await?;
        self.out.flush().await
    }
}
