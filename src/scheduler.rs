//! Starts and stops the chat on a daily time window.

use std::sync::Arc;
use std::time::Duration;

use chrono::{Local, NaiveTime};
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::runner::ChatRunner;
use crate::settings::ControlSettings;

/// Daily `[start, stop)` window. Wraps past midnight when `start >= stop`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduleWindow {
    pub start: NaiveTime,
    pub stop: NaiveTime,
}

impl ScheduleWindow {
    pub fn from_parts(
        start_hour: u32,
        start_minute: u32,
        stop_hour: u32,
        stop_minute: u32,
    ) -> Option<Self> {
        Some(Self {
            start: NaiveTime::from_hms_opt(start_hour, start_minute, 0)?,
            stop: NaiveTime::from_hms_opt(stop_hour, stop_minute, 0)?,
        })
    }

    pub fn contains(&self, now: NaiveTime) -> bool {
        if self.start < self.stop {
            self.start <= now && now < self.stop
        } else {
            now >= self.start || now < self.stop
        }
    }
}

/// What a scheduler tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickAction {
    Started,
    Stopped,
    Idle,
}

/// Background loop driving a [`ChatRunner`] from the configured window.
#[derive(Debug)]
pub struct ChatScheduler {
    runner: Arc<ChatRunner>,
    settings: Arc<RwLock<ControlSettings>>,
    interval: Duration,
}

impl ChatScheduler {
    pub fn new(
        runner: Arc<ChatRunner>,
        settings: Arc<RwLock<ControlSettings>>,
        interval: Duration,
    ) -> Self {
        Self {
            runner,
            settings,
            interval,
        }
    }

    /// Reconcile the runner with the window at `now`.
    pub async fn tick(&self, now: NaiveTime) -> TickAction {
        let snapshot = self.settings.read().await.clone();
        let Some(window) = snapshot.schedule() else {
            return TickAction::Idle;
        };

        let should_run = window.contains(now);
        let running = self.runner.is_running().await;
        debug!(name: "scheduler.tick", %now, should_run, running, "Scheduler tick");

        if should_run && !running {
            match self.runner.start(&snapshot).await {
                Ok(true) => {
                    info!(name: "scheduler.started", "Chat started by schedule");
                    TickAction::Started
                }
                Ok(false) => TickAction::Idle,
                Err(e) => {
                    warn!(name: "scheduler.start_failed", error = %e, "Scheduled start failed");
                    TickAction::Idle
                }
            }
        } else if !should_run && running {
            self.runner.stop().await;
            info!(name: "scheduler.stopped", "Chat stopped by schedule");
            TickAction::Stopped
        } else {
            TickAction::Idle
        }
    }

    /// Tick every interval until `cancel` fires.
    pub fn spawn(self, cancel: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    biased;
                    () = cancel.cancelled() => break,
                    _ = ticker.tick() => {
                        self.tick(Local::now().time()).await;
                    }
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logs::LogBuffer;
    use crate::settings::FirstSpeaker;

    fn at(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn test_same_day_window() {
        let window = ScheduleWindow::from_parts(9, 0, 17, 30).unwrap();
        assert!(window.contains(at(9, 0)));
        assert!(window.contains(at(12, 0)));
        assert!(!window.contains(at(17, 30)));
        assert!(!window.contains(at(8, 59)));
    }

    #[test]
    fn test_window_wraps_midnight() {
        let window = ScheduleWindow::from_parts(22, 0, 6, 0).unwrap();
        assert!(window.contains(at(23, 15)));
        assert!(window.contains(at(0, 0)));
        assert!(window.contains(at(5, 59)));
        assert!(!window.contains(at(6, 0)));
        assert!(!window.contains(at(12, 0)));
    }

    #[test]
    fn test_equal_bounds_cover_whole_day() {
        let window = ScheduleWindow::from_parts(8, 0, 8, 0).unwrap();
        assert!(window.contains(at(8, 0)));
        assert!(window.contains(at(3, 0)));
    }

    #[test]
    fn test_rejects_invalid_times() {
        assert!(ScheduleWindow::from_parts(24, 0, 6, 0).is_none());
        assert!(ScheduleWindow::from_parts(1, 60, 6, 0).is_none());
    }

    fn settings(window: Option<(u32, u32)>) -> ControlSettings {
        ControlSettings {
            topic: "tides".into(),
            first_speaker: FirstSpeaker::Bot1,
            model: "m".into(),
            max_turns: 0,
            delay: 0.0,
            typing_speed: 0.0,
            context_limit: 6,
            start_hour: window.map(|(start, _)| start),
            start_minute: window.map(|_| 0),
            stop_hour: window.map(|(_, stop)| stop),
            stop_minute: window.map(|_| 0),
        }
    }

    fn scheduler(window: Option<(u32, u32)>) -> (ChatScheduler, Arc<ChatRunner>) {
        let runner = Arc::new(ChatRunner::new(
            LogBuffer::new(20),
            "sh",
            vec!["-c".into(), "exec sleep 30".into(), "sh".into()],
        ));
        let scheduler = ChatScheduler::new(
            Arc::clone(&runner),
            Arc::new(RwLock::new(settings(window))),
            Duration::from_secs(60),
        );
        (scheduler, runner)
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_tick_starts_inside_window_and_stops_outside() {
        let (scheduler, runner) = scheduler(Some((9, 17)));

        assert_eq!(scheduler.tick(at(12, 0)).await, TickAction::Started);
        assert!(runner.is_running().await);
        assert_eq!(scheduler.tick(at(12, 0)).await, TickAction::Idle);

        assert_eq!(scheduler.tick(at(20, 0)).await, TickAction::Stopped);
        assert!(!runner.is_running().await);
        assert_eq!(scheduler.tick(at(20, 0)).await, TickAction::Idle);
    }

    #[tokio::test]
    async fn test_tick_without_schedule_is_idle() {
        let (scheduler, runner) = scheduler(None);

        assert_eq!(scheduler.tick(at(12, 0)).await, TickAction::Idle);
        assert!(!runner.is_running().await);
    }
}
