use clap::{Args, Parser, Subcommand};
use config::{Config, Environment, File};
use serde::Deserialize;

use crate::logs::DEFAULT_MAX_LINES;
use crate::settings::FirstSpeaker;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Config file path
    #[arg(short, long, env = "CONFIG_FILE", global = true)]
    pub config: Option<String>,

    /// Port to listen on
    #[arg(long, env = "PORT", global = true)]
    pub port: Option<u16>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the control panel server (default)
    Serve,
    /// Run the two-bot conversation loop, writing to stdout
    Converse(ConverseArgs),
    /// Follow a panel's chat feed in the terminal
    Watch(WatchArgs),
    /// Ask a panel for a generated topic
    Topic(TopicArgs),
}

#[derive(Args, Debug, Clone)]
pub struct ConverseArgs {
    /// Conversation topic
    #[arg(long, default_value = "Default topic")]
    pub topic: String,

    /// Bot that speaks first
    #[arg(long, value_enum, default_value_t = FirstSpeaker::Bot1)]
    pub first_speaker: FirstSpeaker,

    /// Model identifier
    #[arg(long, default_value = "gemma2-9b-it")]
    pub model: String,

    /// Stop after this many turns (0 = never)
    #[arg(long, default_value_t = 10)]
    pub max_turns: u32,

    /// Seconds to wait between turns
    #[arg(long, default_value_t = 1.2)]
    pub delay: f64,

    /// Seconds per typed character
    #[arg(long, default_value_t = 0.015)]
    pub typing_speed: f64,

    /// Messages of history sent with each turn
    #[arg(long, default_value_t = 6)]
    pub context_limit: u32,

    /// Chat completions endpoint
    #[arg(
        long,
        env = "GROQ_ENDPOINT",
        default_value = "https://api.groq.com/openai/v1/chat/completions"
    )]
    pub endpoint: String,

    /// API key used for bot 1
    #[arg(long, env = "GROQ_BOT1_KEY", hide_env_values = true)]
    pub bot1_key: String,

    /// API key used for bot 2
    #[arg(long, env = "GROQ_BOT2_KEY", hide_env_values = true)]
    pub bot2_key: String,

    /// Output width in characters
    #[arg(long, env = "CHAT_LCD_WIDTH", default_value_t = 55)]
    pub width: usize,
}

#[derive(Args, Debug, Clone)]
pub struct WatchArgs {
    /// Panel base URL
    #[arg(long, default_value = "http://127.0.0.1:5000")]
    pub url: String,

    /// Visible lines
    #[arg(long, default_value_t = 20)]
    pub rows: u16,

    /// Seconds between polls
    #[arg(long, default_value_t = 3)]
    pub interval: u64,
}

#[derive(Args, Debug, Clone)]
pub struct TopicArgs {
    /// Panel base URL
    #[arg(long, default_value = "http://127.0.0.1:5000")]
    pub url: String,

    /// Text already typed into the topic field
    #[arg(long, default_value = "")]
    pub current: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub logs: LogsConfig,
    pub chat: ChatConfig,
    pub schedule: ScheduleConfig,
    #[serde(default)]
    pub topics: TopicsConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
    pub static_dir: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LogsConfig {
    pub max_lines: usize,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChatConfig {
    pub topic: String,
    pub first_speaker: FirstSpeaker,
    pub model: String,
    pub max_turns: u32,
    pub delay: f64,
    pub typing_speed: f64,
    pub context_limit: u32,
    /// Program launched for a chat; defaults to this binary's `converse`.
    #[serde(default)]
    pub command: Option<String>,
    /// Extra arguments placed before the conversation flags.
    #[serde(default)]
    pub command_args: Vec<String>,
    /// File the schedule is persisted to.
    pub env_file: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ScheduleConfig {
    #[serde(default)]
    pub start_hour: Option<u32>,
    #[serde(default)]
    pub start_minute: Option<u32>,
    #[serde(default)]
    pub stop_hour: Option<u32>,
    #[serde(default)]
    pub stop_minute: Option<u32>,
    pub interval_secs: u64,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct TopicsConfig {
    #[serde(default)]
    pub subjects: Vec<String>,
    #[serde(default)]
    pub framings: Vec<String>,
}

impl AppConfig {
    pub fn load_from_args<I, T>(args: I) -> Result<Self, config::ConfigError>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let cli =
            Cli::try_parse_from(args).map_err(|e| config::ConfigError::Message(e.to_string()))?;
        Self::from_cli(&cli)
    }

    /// Layer defaults, config file, `PANEL_*` environment and CLI flags.
    ///
    /// Priority: CLI flag > environment > config file > defaults.
    pub fn from_cli(cli: &Cli) -> Result<Self, config::ConfigError> {
        let mut builder = Config::builder()
            .set_default("server.port", 5000)?
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.static_dir", "static")?
            .set_default("logs.max_lines", i64::try_from(DEFAULT_MAX_LINES).unwrap_or(200))?
            .set_default("chat.topic", "Who are you?")?
            .set_default("chat.first_speaker", "bot1")?
            .set_default("chat.model", "groq/compound-mini")?
            .set_default("chat.max_turns", 0)?
            .set_default("chat.delay", 20.0)?
            .set_default("chat.typing_speed", 0.01)?
            .set_default("chat.context_limit", 6)?
            .set_default("chat.env_file", ".env")?
            .set_default("schedule.interval_secs", 60)?;

        // Explicit file must exist; ./config.* is optional.
        builder = match &cli.config {
            Some(path) => builder.add_source(File::with_name(path)),
            None => builder.add_source(File::with_name("config").required(false)),
        };

        // E.g. PANEL_SERVER__PORT=8000, PANEL_SCHEDULE__START_HOUR=9
        builder = builder.add_source(
            Environment::with_prefix("PANEL")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        if let Some(port) = cli.port {
            builder = builder.set_override("server.port", i64::from(port))?;
        }

        builder.build()?.try_deserialize()
    }
}
