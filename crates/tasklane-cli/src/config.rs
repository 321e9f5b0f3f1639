use chrono_tz::Tz;
use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::Deserialize;
use std::time::Duration;
use tasklane_core::config::StoreConfig;
use tasklane_core::error::CoreError;
use tasklane_core::filter::{DateBucket, FilterCriteria, PriorityFilter, TagFilter};
use tasklane_core::timezone::parse_timezone;

const CONFIG_FILE: &str = "tasklane.toml";

#[derive(Deserialize, Debug)]
#[serde(default)]
pub struct Config {
    pub database_path: String,
    /// Identity all rows are stored under.
    pub user: String,
    /// IANA timezone that decides what "today" is.
    pub timezone: String,
    pub remote_timeout_ms: u64,
    pub default_list: ListDefaults,
}

/// Filters `list` starts from when no flags are given.
#[derive(Deserialize, Debug, Default)]
#[serde(default)]
pub struct ListDefaults {
    pub completed: bool,
    pub date: DateBucket,
    pub priority: PriorityFilter,
    pub tag: TagFilter,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: "tasklane.db".to_string(),
            user: "local".to_string(),
            timezone: "UTC".to_string(),
            remote_timeout_ms: 10_000,
            default_list: ListDefaults::default(),
        }
    }
}

impl Config {
    /// Layers `tasklane.toml` (or the file named by `TASKLANE_CONFIG`) and
    /// `TASKLANE_*` environment variables over the defaults.
    pub fn new() -> Result<Self, figment::Error> {
        let file = std::env::var("TASKLANE_CONFIG").unwrap_or_else(|_| CONFIG_FILE.to_string());
        Figment::new()
            .merge(Toml::file(file))
            .merge(Env::prefixed("TASKLANE_"))
            .extract()
    }

    pub fn timezone(&self) -> Result<Tz, CoreError> {
        parse_timezone(&self.timezone)
    }

    pub fn store_config(&self) -> StoreConfig {
        StoreConfig::default().with_remote_timeout(Duration::from_millis(self.remote_timeout_ms))
    }
}

impl ListDefaults {
    pub fn criteria(&self) -> FilterCriteria {
        FilterCriteria {
            completed: self.completed,
            date_filter: self.date,
            priority_filter: self.priority,
            tag_filter: self.tag.clone(),
        }
    }
}
