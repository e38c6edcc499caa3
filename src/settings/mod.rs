// Settings module.
// Defines the two option groups, their defaults, and resolution against a store.

pub mod store;

use serde_json::{Map, Value, json};

use crate::config::Config;
use crate::error::{FeedError, Result};

pub use store::{FileSettingsStore, MemorySettingsStore, SettingsStore};

/// Feed URL used when nothing else is configured.
pub const DEFAULT_FEED_URL: &str =
    "https://www.recright.com/api/v1/careers/recright-demo-career-page/feed";

/// Default refresh schedule.
pub const DEFAULT_CRON_INTERVAL: &str = "sixtimeshourly";

/// A named option group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SettingsGroup {
    General,
    Advanced,
}

impl SettingsGroup {
    pub const ALL: [SettingsGroup; 2] = [SettingsGroup::General, SettingsGroup::Advanced];

    pub fn name(&self) -> &'static str {
        match self {
            SettingsGroup::General => "general",
            SettingsGroup::Advanced => "advanced",
        }
    }

    /// Recognized keys in this group.
    pub fn keys(&self) -> &'static [&'static str] {
        match self {
            SettingsGroup::General => &["feed_url", "template_loop", "template_css"],
            SettingsGroup::Advanced => &[
                "date_format",
                "shortcode_tag",
                "template_container",
                "cron_interval",
            ],
        }
    }

    /// Hard-coded defaults, shallow-merged with the config file overrides.
    pub fn defaults(&self, config: &Config) -> Map<String, Value> {
        let name = &config.name;
        let (mut defaults, overrides) = match self {
            SettingsGroup::General => (
                json!({
                    "feed_url": DEFAULT_FEED_URL,
                    "template_loop": default_loop_template(name),
                    "template_css": "",
                }),
                &config.general,
            ),
            SettingsGroup::Advanced => (
                json!({
                    "date_format": "",
                    "shortcode_tag": name,
                    "template_container": default_container_template(name),
                    "cron_interval": DEFAULT_CRON_INTERVAL,
                }),
                &config.advanced,
            ),
        };

        let mut merged = match defaults.take() {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        for (key, value) in overrides {
            merged.insert(key.clone(), value.clone());
        }
        merged
    }
}

impl std::str::FromStr for SettingsGroup {
    type Err = FeedError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "general" => Ok(SettingsGroup::General),
            "advanced" => Ok(SettingsGroup::Advanced),
            other => Err(FeedError::Settings(format!("unknown settings group: {}", other))),
        }
    }
}

/// Loop template rendered once per feed item.
pub fn default_loop_template(name: &str) -> String {
    format!(
        "<div class=\"{name}-item\">\n\
         \x20 <div class=\"{name}-title\">\n\
         \x20   <strong><a href=\"[adUrl]\" target=\"_blank\">[title]</a></strong>\n\
         \x20   <span>[location]</span>\n\
         \x20 </div>\n\
         \x20 <small class=\"{name}-item-date\">\n\
         \x20   <time>[publishTime:date]</time>\n\
         \x20   <span>-</span>\n\
         \x20   <time>[endTime:date]</time>\n\
         \x20 </small>\n\
         </div>\n",
        name = name
    )
}

/// Container template wrapping all rendered items.
pub fn default_container_template(name: &str) -> String {
    format!("<div class=\"{name}\">\n  [feed]\n</div>\n", name = name)
}

/// Stored values over defaults. Null stored values do not mask defaults.
pub fn resolve_group(
    store: &dyn SettingsStore,
    group: SettingsGroup,
    config: &Config,
) -> Result<Map<String, Value>> {
    let mut merged = group.defaults(config);
    if let Some(stored) = store.get_settings(group)? {
        for (key, value) in stored {
            if !value.is_null() {
                merged.insert(key, value);
            }
        }
    }
    Ok(merged)
}

fn text(values: &Map<String, Value>, key: &str) -> String {
    match values.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

/// Resolved `general` group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneralSettings {
    pub feed_url: String,
    pub template_loop: String,
    pub template_css: String,
}

impl GeneralSettings {
    pub fn from_map(values: &Map<String, Value>) -> Self {
        Self {
            feed_url: text(values, "feed_url"),
            template_loop: text(values, "template_loop"),
            template_css: text(values, "template_css"),
        }
    }
}

/// Resolved `advanced` group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdvancedSettings {
    pub date_format: String,
    pub shortcode_tag: String,
    pub template_container: String,
    pub cron_interval: String,
}

impl AdvancedSettings {
    pub fn from_map(values: &Map<String, Value>) -> Self {
        Self {
            date_format: text(values, "date_format"),
            shortcode_tag: text(values, "shortcode_tag"),
            template_container: text(values, "template_container"),
            cron_interval: text(values, "cron_interval"),
        }
    }
}

/// Both groups, resolved once per operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub general: GeneralSettings,
    pub advanced: AdvancedSettings,
}

impl Settings {
    pub fn resolve(store: &dyn SettingsStore, config: &Config) -> Result<Self> {
        let general = resolve_group(store, SettingsGroup::General, config)?;
        let advanced = resolve_group(store, SettingsGroup::Advanced, config)?;
        Ok(Self {
            general: GeneralSettings::from_map(&general),
            advanced: AdvancedSettings::from_map(&advanced),
        })
    }

    /// Defaults only, used when the store cannot be read.
    pub fn defaults(config: &Config) -> Self {
        Self {
            general: GeneralSettings::from_map(&SettingsGroup::General.defaults(config)),
            advanced: AdvancedSettings::from_map(&SettingsGroup::Advanced.defaults(config)),
        }
    }
}
