use serde::Deserialize;
use std::path::PathBuf;

#[derive(Debug, Deserialize, Clone)]
pub struct DashboardConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub feed: FeedConfig,
    /// Present only when this instance also processes captures.
    #[serde(default)]
    pub ingest: Option<IngestConfig>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_listen")]
    pub listen: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            listen: default_listen(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct FeedConfig {
    #[serde(default = "default_out_dir")]
    pub out_dir: PathBuf,
}

impl Default for FeedConfig {
    fn default() -> Self {
        FeedConfig {
            out_dir: default_out_dir(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct IngestConfig {
    pub capture_dir: PathBuf,
    #[serde(default = "default_simplify_area")]
    pub simplify_area: f64,
}

fn default_listen() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_out_dir() -> PathBuf {
    PathBuf::from("out")
}

fn default_simplify_area() -> f64 {
    100_000.0
}

/// Load config/dashboard.{toml,yaml,...}; every setting has a default,
/// so a missing file just means the defaults.
pub fn load_config() -> anyhow::Result<DashboardConfig> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("config/dashboard").required(false))
        .build()?;

    Ok(settings.try_deserialize()?)
}
