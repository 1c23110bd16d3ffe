//! CLI definitions using clap.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use lapse_web::ServerConfig;

/// Lapse - timeout registry
#[derive(Parser, Debug)]
#[command(name = "lapse")]
#[command(version)]
#[command(about = "Register named events with a TTL and get a webhook when they lapse")]
pub struct Cli {
    /// Config file (TOML, or JSON with a .json extension)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Address to listen on
    #[arg(short, long)]
    pub bind: Option<String>,

    /// Where do you want your emitted events to go?
    #[arg(short, long)]
    pub webhook_url: Option<String>,

    /// Largest accepted timeout, in seconds
    #[arg(long)]
    pub max_timeout_secs: Option<u64>,

    /// Per-request timeout for webhook delivery, in seconds
    #[arg(long)]
    pub webhook_timeout_secs: Option<u64>,

    /// Do not mount the POST /webhook sink that logs delivered events
    #[arg(long, default_value_t = false)]
    pub no_webhook_sink: bool,
}

impl Cli {
    /// Resolve the effective configuration: file (or defaults), then
    /// environment, then flags.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file cannot be loaded.
    pub fn into_config(self) -> Result<ServerConfig, lapse_web::Error> {
        let base = match &self.config {
            Some(path) => ServerConfig::from_file(path)?,
            None => ServerConfig::default(),
        };
        Ok(self.apply(base.merge_env()))
    }

    fn apply(self, mut config: ServerConfig) -> ServerConfig {
        if let Some(bind) = self.bind {
            config.bind_address = bind;
        }
        if let Some(url) = self.webhook_url {
            config.webhook_url = url;
        }
        if let Some(secs) = self.max_timeout_secs {
            config.registry.max_timeout = Duration::from_secs(secs);
        }
        if let Some(secs) = self.webhook_timeout_secs {
            config.webhook_timeout = Duration::from_secs(secs);
        }
        if self.no_webhook_sink {
            config.enable_webhook_sink = false;
        }
        config
    }
}
