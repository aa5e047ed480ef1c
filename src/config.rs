use anyhow::Result;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub service: ServiceConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    pub nats: NatsConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    pub name: String,
    pub http: HttpConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    pub bind: String,
    pub port: u16,
}

/// Per-session scheduling knobs
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Maximum number of pending requests per session
    pub queue_capacity: usize,

    /// Distinct skip votes required to advance past the active item
    pub skip_quorum: usize,

    /// Playback volume applied to new output connections (0.0 to 2.0)
    pub default_volume: f32,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            queue_capacity: 10,
            skip_quorum: 3,
            default_volume: 0.6,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NatsConfig {
    pub url: String,
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path))
            .build()?;

        Ok(settings.try_deserialize()?)
    }
}
