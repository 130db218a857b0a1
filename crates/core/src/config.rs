use serde::Deserialize;

/// Root application configuration. Loaded from environment variables
/// with the prefix `CHAT_CADENCE__`.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Identity the automation sends as; its own messages count as activity.
    #[serde(default = "default_actor_id")]
    pub actor_id: i64,
    #[serde(default)]
    pub pacing: PacingConfig,
    #[serde(default)]
    pub automation: AutomationConfig,
}

/// Tuning for the activity tracker and the adaptive interval computation.
#[derive(Debug, Clone, Deserialize)]
pub struct PacingConfig {
    /// How long observed events are retained per destination.
    #[serde(default = "default_retention_window_secs")]
    pub retention_window_secs: u64,
    /// Trailing window used for the frequency estimate. Kept shorter than
    /// retention so the estimate reacts faster than history expires.
    #[serde(default = "default_rate_subwindow_secs")]
    pub rate_subwindow_secs: u64,
    /// Half-open `[start, end)` hour ranges treated as active.
    #[serde(default = "default_active_hours")]
    pub active_hours: Vec<(u32, u32)>,
    /// Inclusive `[start, end]` hour range treated as night.
    #[serde(default = "default_night_hours")]
    pub night_hours: (u32, u32),
    #[serde(default = "default_active_hour_factor")]
    pub active_hour_factor: f64,
    #[serde(default = "default_night_hour_factor")]
    pub night_hour_factor: f64,
    /// Absolute minimum spacing regardless of the computed interval.
    #[serde(default = "default_min_interval_floor_secs")]
    pub min_interval_floor_secs: u64,
}

/// Tuning for the automation loop's own cadence.
#[derive(Debug, Clone, Deserialize)]
pub struct AutomationConfig {
    /// Inter-pass delay range during active hours.
    #[serde(default = "default_pass_delay_active_secs")]
    pub pass_delay_active_secs: (u64, u64),
    /// Inter-pass delay range outside active hours.
    #[serde(default = "default_pass_delay_idle_secs")]
    pub pass_delay_idle_secs: (u64, u64),
    /// Short pause range between individual sends within a pass.
    #[serde(default = "default_send_jitter_secs")]
    pub send_jitter_secs: (u64, u64),
    /// Visit destinations in random order each pass.
    #[serde(default = "default_shuffle_destinations")]
    pub shuffle_destinations: bool,
}

// Default functions
fn default_actor_id() -> i64 {
    1000
}
fn default_retention_window_secs() -> u64 {
    3600
}
fn default_rate_subwindow_secs() -> u64 {
    1800
}
fn default_active_hours() -> Vec<(u32, u32)> {
    vec![(9, 12), (14, 18), (20, 24)]
}
fn default_night_hours() -> (u32, u32) {
    (1, 7)
}
fn default_active_hour_factor() -> f64 {
    0.7
}
fn default_night_hour_factor() -> f64 {
    1.5
}
fn default_min_interval_floor_secs() -> u64 {
    60
}
fn default_pass_delay_active_secs() -> (u64, u64) {
    (300, 600)
}
fn default_pass_delay_idle_secs() -> (u64, u64) {
    (600, 1200)
}
fn default_send_jitter_secs() -> (u64, u64) {
    (2, 5)
}
fn default_shuffle_destinations() -> bool {
    true
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            retention_window_secs: default_retention_window_secs(),
            rate_subwindow_secs: default_rate_subwindow_secs(),
            active_hours: default_active_hours(),
            night_hours: default_night_hours(),
            active_hour_factor: default_active_hour_factor(),
            night_hour_factor: default_night_hour_factor(),
            min_interval_floor_secs: default_min_interval_floor_secs(),
        }
    }
}

impl Default for AutomationConfig {
    fn default() -> Self {
        Self {
            pass_delay_active_secs: default_pass_delay_active_secs(),
            pass_delay_idle_secs: default_pass_delay_idle_secs(),
            send_jitter_secs: default_send_jitter_secs(),
            shuffle_destinations: default_shuffle_destinations(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            actor_id: default_actor_id(),
            pacing: PacingConfig::default(),
            automation: AutomationConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, config::ConfigError> {
        let builder = config::Config::builder().add_source(
            config::Environment::with_prefix("CHAT_CADENCE")
                .separator("__")
                .try_parsing(true)
                .list_separator(","),
        );

        let config = builder.build()?;
        config.try_deserialize()
    }
}
