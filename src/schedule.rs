// Recurring feed refresh.
// Maps named intervals to periods and runs one background task per scheduled event.

use std::future::Future;
use std::sync::Mutex;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tracing::{debug, info, warn};

use crate::error::{FeedError, Result};

/// Named refresh interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recurrence {
    Minutely,
    SixTimesHourly,
    TwiceHourly,
    Hourly,
    TwiceDaily,
    Daily,
    Weekly,
}

impl Recurrence {
    pub const ALL: [Recurrence; 7] = [
        Recurrence::Minutely,
        Recurrence::SixTimesHourly,
        Recurrence::TwiceHourly,
        Recurrence::Hourly,
        Recurrence::TwiceDaily,
        Recurrence::Daily,
        Recurrence::Weekly,
    ];

    /// Name stored in the `cron_interval` setting.
    pub fn name(&self) -> &'static str {
        match self {
            Recurrence::Minutely => "minutely",
            Recurrence::SixTimesHourly => "sixtimeshourly",
            Recurrence::TwiceHourly => "twicehourly",
            Recurrence::Hourly => "hourly",
            Recurrence::TwiceDaily => "twicedaily",
            Recurrence::Daily => "daily",
            Recurrence::Weekly => "weekly",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Recurrence::Minutely => "Once every minute",
            Recurrence::SixTimesHourly => "Once every 10 minutes",
            Recurrence::TwiceHourly => "Once every 30 minutes",
            Recurrence::Hourly => "Once every hour",
            Recurrence::TwiceDaily => "Once every 12 hours",
            Recurrence::Daily => "Once every day",
            Recurrence::Weekly => "Once every week",
        }
    }

    pub fn seconds(&self) -> u64 {
        match self {
            Recurrence::Minutely => 60,
            Recurrence::SixTimesHourly => 10 * 60,
            Recurrence::TwiceHourly => 30 * 60,
            Recurrence::Hourly => 60 * 60,
            Recurrence::TwiceDaily => 12 * 60 * 60,
            Recurrence::Daily => 24 * 60 * 60,
            Recurrence::Weekly => 7 * 24 * 60 * 60,
        }
    }

    pub fn period(&self) -> Duration {
        Duration::from_secs(self.seconds())
    }

    /// Parse a `cron_interval` value. Empty means "no schedule".
    pub fn parse_setting(value: &str) -> Result<Option<Self>> {
        if value.is_empty() {
            return Ok(None);
        }
        value.parse().map(Some)
    }
}

impl std::str::FromStr for Recurrence {
    type Err = FeedError;

    fn from_str(s: &str) -> Result<Self> {
        Recurrence::ALL
            .into_iter()
            .find(|r| r.name() == s)
            .ok_or_else(|| FeedError::Schedule(s.to_string()))
    }
}

struct ScheduledTask {
    recurrence: Recurrence,
    handle: JoinHandle<()>,
}

/// Runs a single named recurring event.
pub struct Scheduler {
    hook: String,
    task: Mutex<Option<ScheduledTask>>,
}

impl Scheduler {
    pub fn new(hook: impl Into<String>) -> Self {
        Self {
            hook: hook.into(),
            task: Mutex::new(None),
        }
    }

    /// Event name this scheduler fires.
    pub fn hook(&self) -> &str {
        &self.hook
    }

    /// Replace any existing schedule with `job` running every `recurrence`.
    ///
    /// The first run happens one period from now. Each run completes before the
    /// next tick is taken; ticks missed while a run is in flight are skipped.
    /// Must be called from within a tokio runtime.
    pub fn schedule<F, Fut>(&self, recurrence: Recurrence, job: F)
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let period = recurrence.period();
        let hook = self.hook.clone();
        let handle = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                debug!("Firing {}", hook);
                job().await;
            }
        });

        info!("Scheduled {} {}", self.hook, recurrence.label().to_lowercase());
        self.replace(Some(ScheduledTask { recurrence, handle }));
    }

    /// Cancel the scheduled event, if any.
    pub fn clear(&self) {
        if self.replace(None) {
            info!("Cleared schedule for {}", self.hook);
        }
    }

    /// The active recurrence, if scheduled.
    pub fn current(&self) -> Option<Recurrence> {
        match self.task.lock() {
            Ok(task) => task.as_ref().map(|t| t.recurrence),
            Err(_) => None,
        }
    }

    /// Swap the task slot, aborting the previous task. Returns whether one existed.
    fn replace(&self, next: Option<ScheduledTask>) -> bool {
        let mut slot = match self.task.lock() {
            Ok(slot) => slot,
            Err(poisoned) => {
                warn!("Scheduler lock poisoned, recovering");
                poisoned.into_inner()
            }
        };
        let previous = std::mem::replace(&mut *slot, next);
        match previous {
            Some(task) => {
                task.handle.abort();
                true
            }
            None => false,
        }
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.replace(None);
    }
}
