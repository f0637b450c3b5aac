//! Conversation and schedule settings edited from the control panel.

use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

use crate::config::{ChatConfig, ScheduleConfig};
use crate::scheduler::ScheduleWindow;

/// Which bot opens the conversation.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum FirstSpeaker {
    #[default]
    Bot1,
    Bot2,
}

impl FirstSpeaker {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Bot1 => "bot1",
            Self::Bot2 => "bot2",
        }
    }
}

/// Live settings used for the next chat launch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControlSettings {
    pub topic: String,
    pub first_speaker: FirstSpeaker,
    pub model: String,
    /// 0 means unlimited.
    pub max_turns: u32,
    /// Seconds between turns.
    pub delay: f64,
    /// Seconds per typed character.
    pub typing_speed: f64,
    pub context_limit: u32,
    pub start_hour: Option<u32>,
    pub start_minute: Option<u32>,
    pub stop_hour: Option<u32>,
    pub stop_minute: Option<u32>,
}

/// Partial update from the control panel. Absent fields are left alone;
/// an explicit `null` clears a schedule field.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SettingsUpdate {
    pub topic: Option<String>,
    pub first_speaker: Option<FirstSpeaker>,
    pub model: Option<String>,
    pub max_turns: Option<u32>,
    pub delay: Option<f64>,
    pub typing_speed: Option<f64>,
    pub context_limit: Option<u32>,
    #[serde(default, deserialize_with = "present")]
    pub start_hour: Option<Option<u32>>,
    #[serde(default, deserialize_with = "present")]
    pub start_minute: Option<Option<u32>>,
    #[serde(default, deserialize_with = "present")]
    pub stop_hour: Option<Option<u32>>,
    #[serde(default, deserialize_with = "present")]
    pub stop_minute: Option<Option<u32>>,
}

fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[derive(Debug, Error, PartialEq)]
pub enum SettingsError {
    #[error("Invalid input for {field}.")]
    OutOfRange { field: &'static str },
    #[error("{field} cannot be empty.")]
    Empty { field: &'static str },
}

impl ControlSettings {
    pub fn from_config(chat: &ChatConfig, schedule: &ScheduleConfig) -> Self {
        Self {
            topic: chat.topic.clone(),
            first_speaker: chat.first_speaker,
            model: chat.model.clone(),
            max_turns: chat.max_turns,
            delay: chat.delay,
            typing_speed: chat.typing_speed,
            context_limit: chat.context_limit,
            start_hour: schedule.start_hour,
            start_minute: schedule.start_minute,
            stop_hour: schedule.stop_hour,
            stop_minute: schedule.stop_minute,
        }
    }

    /// The daily window, when all four fields are set.
    pub fn schedule(&self) -> Option<ScheduleWindow> {
        ScheduleWindow::from_parts(
            self.start_hour?,
            self.start_minute?,
            self.stop_hour?,
            self.stop_minute?,
        )
    }

    /// Apply `update`, all or nothing.
    pub fn apply(&mut self, update: SettingsUpdate) -> Result<(), SettingsError> {
        let mut next = self.clone();

        if let Some(topic) = update.topic {
            next.topic = topic;
        }
        if let Some(first_speaker) = update.first_speaker {
            next.first_speaker = first_speaker;
        }
        if let Some(model) = update.model {
            next.model = model;
        }
        if let Some(max_turns) = update.max_turns {
            next.max_turns = max_turns;
        }
        if let Some(delay) = update.delay {
            next.delay = delay;
        }
        if let Some(typing_speed) = update.typing_speed {
            next.typing_speed = typing_speed;
        }
        if let Some(context_limit) = update.context_limit {
            next.context_limit = context_limit;
        }
        if let Some(start_hour) = update.start_hour {
            next.start_hour = start_hour;
        }
        if let Some(start_minute) = update.start_minute {
            next.start_minute = start_minute;
        }
        if let Some(stop_hour) = update.stop_hour {
            next.stop_hour = stop_hour;
        }
        if let Some(stop_minute) = update.stop_minute {
            next.stop_minute = stop_minute;
        }

        next.validate()?;
        *self = next;
        Ok(())
    }

    fn validate(&self) -> Result<(), SettingsError> {
        if self.topic.trim().is_empty() {
            return Err(SettingsError::Empty { field: "topic" });
        }
        if self.model.trim().is_empty() {
            return Err(SettingsError::Empty { field: "model" });
        }
        if !(self.delay.is_finite() && self.delay >= 0.0) {
            return Err(SettingsError::OutOfRange { field: "delay" });
        }
        if !(self.typing_speed.is_finite() && self.typing_speed >= 0.0) {
            return Err(SettingsError::OutOfRange {
                field: "typing_speed",
            });
        }
        let bounded = [
            ("start_hour", self.start_hour, 23),
            ("start_minute", self.start_minute, 59),
            ("stop_hour", self.stop_hour, 23),
            ("stop_minute", self.stop_minute, 59),
        ];
        for (field, value, max) in bounded {
            if value.is_some_and(|v| v > max) {
                return Err(SettingsError::OutOfRange { field });
            }
        }
        Ok(())
    }

    /// Schedule values as `PANEL_SCHEDULE__*` entries; `None` removes the key.
    pub fn schedule_env_entries(&self) -> Vec<(&'static str, Option<String>)> {
        vec![
            (
                "PANEL_SCHEDULE__START_HOUR",
                self.start_hour.map(|v| v.to_string()),
            ),
            (
                "PANEL_SCHEDULE__START_MINUTE",
                self.start_minute.map(|v| v.to_string()),
            ),
            (
                "PANEL_SCHEDULE__STOP_HOUR",
                self.stop_hour.map(|v| v.to_string()),
            ),
            (
                "PANEL_SCHEDULE__STOP_MINUTE",
                self.stop_minute.map(|v| v.to_string()),
            ),
        ]
    }

    /// Flags for the `converse` subcommand.
    pub fn converse_args(&self) -> Vec<String> {
        vec![
            "converse".into(),
            "--topic".into(),
            self.topic.clone(),
            "--first-speaker".into(),
            self.first_speaker.as_str().into(),
            "--model".into(),
            self.model.clone(),
            "--max-turns".into(),
            self.max_turns.to_string(),
            "--delay".into(),
            self.delay.to_string(),
            "--typing-speed".into(),
            self.typing_speed.to_string(),
            "--context-limit".into(),
            self.context_limit.to_string(),
        ]
    }
}
