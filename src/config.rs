use std::time::Duration;

use clap::Parser;
use indexmap::IndexMap;

pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub const DEFAULT_URL: &str = "http://127.0.0.1:8086/write?db=bwmon";
pub const DEFAULT_ENDPOINT: &str = "https://speed.cloudflare.com/__down?bytes=25000000";

/// Ordered so encoded lines are reproducible.
pub type Tags = IndexMap<String, String>;
pub type Fields = IndexMap<String, String>;

/// Knobs for the download prober.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceConfig {
    pub endpoints: Vec<String>,
    pub measure_for: Duration,
    pub sample_period: Duration,
}
impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            endpoints: vec![DEFAULT_ENDPOINT.to_string()],
            measure_for: Duration::from_secs(10),
            sample_period: Duration::from_millis(200),
        }
    }
}

/// Everything that stays fixed once the monitor starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub debug: bool,
    pub interval: Duration,
    pub measurement: String,
    pub tags: Tags,
    pub fields: Fields,
    pub url: String,
    pub timeout: Duration,
    pub source: SourceConfig,
}
impl Config {
    pub fn new() -> Self {
        Self {
            debug: false,
            interval: Duration::from_secs(300),
            measurement: "bandwidth".to_string(),
            tags: Tags::new(),
            fields: Fields::new(),
            url: DEFAULT_URL.to_string(),
            timeout: Duration::from_secs(30),
            source: SourceConfig::default(),
        }
    }
}
impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Parser)]
#[command(name = "bwmon", version, about = "Periodically measure bandwidth and write it to InfluxDB")]
pub struct Args {
    /// Log debugging messages.
    #[arg(short, long)]
    pub debug: bool,

    /// Measurement interval in seconds.
    #[arg(short, long, default_value_t = 300)]
    pub interval: u64,

    /// Measurement name.
    #[arg(short, long, default_value = "bandwidth")]
    pub measurement: String,

    /// InfluxDB URL.
    #[arg(short, long, default_value = DEFAULT_URL)]
    pub url: String,

    /// Timeout for each write to the database.
    #[arg(short, long, default_value = "30s", value_parser = humantime::parse_duration)]
    pub timeout: Duration,

    /// Download endpoint to probe. Repeat to download from several in parallel.
    #[arg(short, long = "endpoint", default_value = DEFAULT_ENDPOINT)]
    pub endpoints: Vec<String>,

    /// Upper bound on a single measurement.
    #[arg(long, default_value = "10s", value_parser = humantime::parse_duration)]
    pub measure_for: Duration,

    /// How often a throughput sample is taken while downloading.
    #[arg(long, default_value = "200ms", value_parser = humantime::parse_duration)]
    pub sample_period: Duration,
}
impl Args {
    /// Builds the runtime config, stamping the identity tags.
    pub fn into_config(self, hostname: String) -> Config {
        let mut tags = Tags::new();
        tags.insert("Hostname".to_string(), hostname);
        tags.insert("AppName".to_string(), APP_NAME.to_string());
        tags.insert("Version".to_string(), VERSION.to_string());
        Config {
            debug: self.debug,
            interval: Duration::from_secs(self.interval),
            measurement: self.measurement,
            tags,
            fields: Fields::new(),
            url: self.url,
            timeout: self.timeout,
            source: SourceConfig {
                endpoints: self.endpoints,
                measure_for: self.measure_for,
                sample_period: self.sample_period,
            },
        }
    }
}
