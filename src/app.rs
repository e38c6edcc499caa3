// Application context.
// Wires settings, cache, logs and scheduler together and exposes the render and refresh surfaces.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::{info, warn};

use crate::cache::{CachePaths, LogKind, store};
use crate::config::Config;
use crate::error::{FeedError, Result};
use crate::feed::{FeedCache, FeedClient};
use crate::schedule::{Recurrence, Scheduler};
use crate::settings::{
    FileSettingsStore, Settings, SettingsGroup, SettingsStore, resolve_group,
};
use crate::template::{RenderContext, render_feed, stylesheet};

/// Feed log suffix for scheduled refreshes.
pub const CRON_SUFFIX: &str = "via cron";
/// Feed log suffix for manual refreshes.
pub const MANUAL_SUFFIX: &str = "manually";

/// User-facing outcome of an action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Updated(String),
    Error(String),
}

impl Notice {
    pub fn is_error(&self) -> bool {
        matches!(self, Notice::Error(_))
    }

    /// Notices for a fetch outcome.
    pub fn from_fetch(result: &Result<()>) -> Vec<Notice> {
        match result {
            Ok(()) => vec![Notice::Updated("Feed successfully updated".to_string())],
            Err(err) => err.messages().into_iter().map(Notice::Error).collect(),
        }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::Updated(message) | Notice::Error(message) => f.write_str(message),
        }
    }
}

/// Cloneable handle that performs a feed refresh; shared with scheduled tasks.
#[derive(Clone)]
struct FeedUpdater {
    config: Arc<Config>,
    store: Arc<dyn SettingsStore>,
    cache: FeedCache,
}

impl FeedUpdater {
    fn settings(&self) -> Settings {
        Settings::resolve(self.store.as_ref(), &self.config).unwrap_or_else(|err| {
            warn!("Falling back to default settings: {}", err);
            Settings::defaults(&self.config)
        })
    }

    async fn pull_feed(&self, suffix: &str) -> Result<()> {
        let feed_url = self.settings().general.feed_url;
        self.cache.fetch(&feed_url, suffix).await
    }

    /// The scheduled refresh job.
    async fn scheduled_refresh(&self) {
        // Errors are already in the error log
        let _ = self.pull_feed(CRON_SUFFIX).await;
    }
}

/// The explicitly constructed application context.
pub struct App {
    updater: FeedUpdater,
    scheduler: Scheduler,
}

impl App {
    pub fn new(config: Config, store: Arc<dyn SettingsStore>, data_dir: PathBuf) -> Result<Self> {
        config.validate()?;
        let paths = CachePaths::new(data_dir);
        let cache = FeedCache::new(FeedClient::new()?, paths, config.log_limit);
        let scheduler = Scheduler::new(config.hook_name());

        Ok(Self {
            updater: FeedUpdater {
                config: Arc::new(config),
                store,
                cache,
            },
            scheduler,
        })
    }

    /// Build from config with the file-backed settings store in the data directory.
    pub fn from_config(config: Config) -> Result<Self> {
        let data_dir = config
            .data_dir()
            .ok_or_else(|| FeedError::Settings("could not determine data directory".to_string()))?;
        let store = Arc::new(FileSettingsStore::new(
            CachePaths::new(&data_dir).options_file(),
        ));
        Self::new(config, store, data_dir)
    }

    pub fn config(&self) -> &Config {
        &self.updater.config
    }

    pub fn store(&self) -> &dyn SettingsStore {
        self.updater.store.as_ref()
    }

    pub fn cache(&self) -> &FeedCache {
        &self.updater.cache
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    /// Current settings; defaults if the store cannot be read.
    pub fn settings(&self) -> Settings {
        self.updater.settings()
    }

    fn render_context(&self, settings: &Settings) -> RenderContext {
        let host = &self.config().host;
        RenderContext {
            date_format: settings.advanced.date_format.clone(),
            host_date_format: host.date_format.clone(),
            offset: host.offset(),
        }
    }

    /// Render the cached feed as HTML. Empty when there is nothing to show.
    pub async fn display_feed(&self) -> String {
        let settings = self.settings();
        let records = self.cache().load(&settings.general.feed_url).await;
        if records.is_empty() {
            return String::new();
        }

        let ctx = self.render_context(&settings);
        render_feed(
            &settings.general.template_loop,
            &settings.advanced.template_container,
            &records,
            &ctx,
        )
    }

    /// Stylesheet to include alongside the rendered feed.
    pub fn stylesheet(&self) -> String {
        stylesheet(&self.settings().general.template_css, &self.config().name)
    }

    /// Tag the rendered feed is embedded under.
    pub fn shortcode_tag(&self) -> String {
        let tag = self.settings().advanced.shortcode_tag;
        if tag.is_empty() {
            self.config().name.clone()
        } else {
            tag
        }
    }

    /// Fetch the configured feed URL into the cache.
    pub async fn pull_feed(&self, suffix: &str) -> Result<()> {
        self.updater.pull_feed(suffix).await
    }

    /// Scheduled refresh.
    pub async fn update_feed(&self) {
        self.updater.scheduled_refresh().await;
    }

    /// Manual refresh, reported as notices.
    pub async fn refresh(&self) -> Vec<Notice> {
        Notice::from_fetch(&self.pull_feed(MANUAL_SUFFIX).await)
    }

    /// Save a settings group and react to changed values.
    ///
    /// A new `feed_url` triggers an immediate fetch; a changed `cron_interval`
    /// reschedules the refresh.
    pub async fn update_settings(
        &self,
        group: SettingsGroup,
        values: Map<String, Value>,
    ) -> Result<Vec<Notice>> {
        let previous = self.store().get_settings(group)?.unwrap_or_default();
        self.store().set_settings(group, values.clone())?;

        let changed = |key: &str| match values.get(key) {
            Some(current) => previous.get(key) != Some(current),
            None => false,
        };

        let mut notices = Vec::new();
        match group {
            SettingsGroup::General => {
                if changed("feed_url") {
                    notices = Notice::from_fetch(&self.pull_feed("").await);
                }
            }
            SettingsGroup::Advanced => {
                if changed("cron_interval") {
                    let interval = values
                        .get("cron_interval")
                        .and_then(Value::as_str)
                        .unwrap_or_default();
                    self.update_cron_interval(Some(interval))?;
                }
            }
        }
        Ok(notices)
    }

    /// Set a single key, keeping the group's other stored values.
    pub async fn update_setting(
        &self,
        group: SettingsGroup,
        key: &str,
        value: Value,
    ) -> Result<Vec<Notice>> {
        if !group.keys().contains(&key) {
            return Err(FeedError::Settings(format!(
                "unknown {} setting: {}",
                group.name(),
                key
            )));
        }
        let mut values = self.store().get_settings(group)?.unwrap_or_default();
        values.insert(key.to_string(), value);
        self.update_settings(group, values).await
    }

    /// Resolved values of a group.
    pub fn group_settings(&self, group: SettingsGroup) -> Result<Map<String, Value>> {
        resolve_group(self.store(), group, self.config())
    }

    /// Reschedule the refresh. `None` reads the `cron_interval` setting; empty clears.
    pub fn update_cron_interval(&self, interval: Option<&str>) -> Result<()> {
        let interval = match interval {
            Some(interval) => interval.to_string(),
            None => self.settings().advanced.cron_interval,
        };

        let recurrence = Recurrence::parse_setting(&interval)?;
        self.scheduler.clear();
        if let Some(recurrence) = recurrence {
            let updater = self.updater.clone();
            self.scheduler.schedule(recurrence, move || {
                let updater = updater.clone();
                async move { updater.scheduled_refresh().await }
            });
        }
        Ok(())
    }

    /// Start refreshing on the default schedule.
    pub fn activate(&self) -> Result<()> {
        let defaults = Settings::defaults(self.config());
        self.update_cron_interval(Some(defaults.advanced.cron_interval.as_str()))
    }

    /// Forget stored settings, stop refreshing and delete cached files.
    pub fn deactivate(&self) -> Result<()> {
        for group in SettingsGroup::ALL {
            self.store().delete_settings(group)?;
        }
        self.scheduler.clear();
        for path in self.cache().paths().owned_files() {
            store::delete(&path)?;
        }
        info!("Deactivated {}", self.config().name);
        Ok(())
    }

    /// Recent log lines, newest first, at most the log limit.
    pub fn logs(&self, kind: LogKind) -> Result<Vec<String>> {
        let log = self.cache().log(kind);
        log.recent(log.limit())
    }

    pub fn clear_logs(&self, kind: LogKind) -> Result<()> {
        self.cache().log(kind).clear()
    }
}
