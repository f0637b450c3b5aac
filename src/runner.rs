//! Supervision of the chat subprocess.
//!
//! The runner launches one conversation at a time and streams its stdout and
//! stderr, cleaned of terminal escapes, into the shared [`LogBuffer`].

use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use chrono::Local;
use futures::StreamExt;
use futures::stream::{BoxStream, select_all};
use tokio::process::Command;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::codec::{FramedRead, LinesCodec, LinesCodecError};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::config::ChatConfig;
use crate::logs::{LogBuffer, strip_ansi};
use crate::settings::ControlSettings;

/// How long to keep draining output after the process is gone.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(1);

#[derive(Debug)]
struct RunningChat {
    generation: u64,
    pid: Option<u32>,
    cancel: CancellationToken,
    monitor: JoinHandle<()>,
}

/// Launches the conversation and captures its output.
#[derive(Debug)]
pub struct ChatRunner {
    logs: LogBuffer,
    program: PathBuf,
    prefix_args: Vec<String>,
    current: Arc<Mutex<Option<RunningChat>>>,
    generation: AtomicU64,
}

fn system_line(message: &str) -> String {
    format!("[system {}] {message}", Local::now().format("%H:%M:%S"))
}

fn push_output(logs: &LogBuffer, raw: &str) {
    let line = strip_ansi(raw);
    let line = line.trim_end();
    if !line.is_empty() {
        logs.append(line);
    }
}

impl ChatRunner {
    /// Run `program`, passing `prefix_args` before the conversation flags.
    pub fn new(logs: LogBuffer, program: impl Into<PathBuf>, prefix_args: Vec<String>) -> Self {
        Self {
            logs,
            program: program.into(),
            prefix_args,
            current: Arc::new(Mutex::new(None)),
            generation: AtomicU64::new(0),
        }
    }

    /// Use the configured command, or this executable's `converse` subcommand.
    pub fn from_config(logs: LogBuffer, chat: &ChatConfig) -> std::io::Result<Self> {
        let program = match &chat.command {
            Some(command) => PathBuf::from(command),
            None => std::env::current_exe()?,
        };
        Ok(Self::new(logs, program, chat.command_args.clone()))
    }

    pub async fn is_running(&self) -> bool {
        self.current.lock().await.is_some()
    }

    pub async fn current_pid(&self) -> Option<u32> {
        self.current.lock().await.as_ref().and_then(|c| c.pid)
    }

    /// Launch a conversation. Returns `false` if one is already running.
    pub async fn start(&self, settings: &ControlSettings) -> std::io::Result<bool> {
        let mut current = self.current.lock().await;
        if current.is_some() {
            return Ok(false);
        }

        self.logs.clear();
        self.logs.append(system_line("Chat launched."));

        let mut child = match Command::new(&self.program)
            .args(&self.prefix_args)
            .args(settings.converse_args())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
        {
            Ok(child) => child,
            Err(e) => {
                self.logs
                    .append(system_line(&format!("Chat failed to start: {e}")));
                return Err(e);
            }
        };

        let generation = self.generation.fetch_add(1, Ordering::Relaxed) + 1;
        let pid = child.id();
        info!(name: "chat.launched", pid = ?pid, topic = %settings.topic, "Chat launched");

        let mut outputs: Vec<BoxStream<'static, Result<String, LinesCodecError>>> = Vec::new();
        if let Some(stdout) = child.stdout.take() {
            outputs.push(FramedRead::new(stdout, LinesCodec::new()).boxed());
        }
        if let Some(stderr) = child.stderr.take() {
            outputs.push(FramedRead::new(stderr, LinesCodec::new()).boxed());
        }

        let logs = self.logs.clone();
        let mut pump = tokio::spawn(async move {
            let mut lines = select_all(outputs);
            while let Some(line) = lines.next().await {
                match line {
                    Ok(line) => push_output(&logs, &line),
                    Err(e) => warn!(error = %e, "Unreadable chat output"),
                }
            }
        });

        let cancel = CancellationToken::new();
        let stop_signal = cancel.clone();
        let logs = self.logs.clone();
        let slot = Arc::clone(&self.current);
        let monitor = tokio::spawn(async move {
            let status = tokio::select! {
                status = child.wait() => status,
                () = stop_signal.cancelled() => {
                    if let Err(e) = child.start_kill() {
                        warn!(error = %e, "Failed to kill chat process");
                    }
                    child.wait().await
                }
            };

            // Orphaned grandchildren can hold the pipes open.
            if tokio::time::timeout(DRAIN_TIMEOUT, &mut pump).await.is_err() {
                pump.abort();
            }

            logs.append(system_line("Chat process exited."));
            match status {
                Ok(status) => info!(name: "chat.exited", %status, "Chat process exited"),
                Err(e) => warn!(name: "chat.exited", error = %e, "Chat process wait failed"),
            }

            let mut current = slot.lock().await;
            if current.as_ref().is_some_and(|c| c.generation == generation) {
                *current = None;
            }
        });

        *current = Some(RunningChat {
            generation,
            pid,
            cancel,
            monitor,
        });
        Ok(true)
    }

    /// Terminate the running conversation and wait for it to exit.
    /// Returns `false` if nothing was running.
    pub async fn stop(&self) -> bool {
        let running = self.current.lock().await.take();
        let Some(running) = running else {
            return false;
        };

        running.cancel.cancel();
        if let Err(e) = running.monitor.await {
            warn!(error = %e, "Chat monitor task failed");
        }
        true
    }

    pub async fn restart(&self, settings: &ControlSettings) -> std::io::Result<()> {
        self.stop().await;
        self.start(settings).await.map(|_| ())
    }
}
