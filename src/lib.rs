//! Chat Feed Panel
//!
//! A control panel that supervises a two-bot chat, serves its captured output,
//! and a feed widget that follows that output without fighting the reader's
//! scroll position.
//!
//! # Architecture
//!
//! - **Server**: Axum control panel serving `/logs`, `/topics` and the control API
//! - **Runner**: Supervises the conversation subprocess and captures its output
//! - **Scheduler**: Starts and stops the chat on a daily window
//! - **Widget**: Feed poller and topic fetcher behind injectable view traits
//!
//! # Modules
//!
//! - [`widget`]: Feed poller, topic fetcher and their HTTP transport
//! - [`logs`]: Bounded log buffer and ANSI cleanup
//! - [`runner`]: Chat subprocess supervision
//! - [`scheduler`]: Daily start/stop window
//! - [`converse`]: The two-bot conversation loop
//! - [`server`]: HTTP routes

// Allow pedantic clippy warnings that don't add value for this codebase
#![allow(clippy::cargo_common_metadata)]
#![allow(clippy::multiple_crate_versions)]
#![allow(clippy::unused_async)]

pub mod config;
pub mod converse;
pub mod env_file;
pub mod error;
pub mod logs;
pub mod page;
pub mod runner;
pub mod scheduler;
pub mod server;
pub mod settings;
pub mod topics;
pub mod widget;

use std::sync::Arc;

use tokio::sync::RwLock;

use crate::config::AppConfig;
use crate::logs::LogBuffer;
use crate::runner::ChatRunner;
use crate::settings::ControlSettings;
use crate::topics::TopicGenerator;

/// Application state shared across all handlers.
#[derive(Clone, Debug)]
pub struct AppState {
    /// Captured chat output.
    pub logs: LogBuffer,
    /// Chat subprocess supervisor.
    pub runner: Arc<ChatRunner>,
    /// Settings used for the next launch.
    pub settings: Arc<RwLock<ControlSettings>>,
    /// Topic source for `/topics`.
    pub topics: Arc<TopicGenerator>,
    /// Global Configuration
    pub config: Arc<AppConfig>,
}
