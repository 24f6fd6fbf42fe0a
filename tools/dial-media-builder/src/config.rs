use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use tracing_subscriber::EnvFilter;

use crate::profile::REFERENCE_TAPE;

/// Options shared by every subcommand.
#[derive(Debug, Clone, Args)]
pub struct GlobalArgs {
    /// Directory holding `handlers/`, `unit-specs/` and `reference/`.
    ///
    /// Environment variable: `DIAL_MEDIA_RESOURCES`.
    #[arg(long, global = true, env = "DIAL_MEDIA_RESOURCES", value_name = "DIR")]
    resources: Option<PathBuf>,

    /// Log filter (tracing-subscriber EnvFilter syntax).
    ///
    /// Environment variable: `DIAL_MEDIA_LOG`.
    #[arg(long, global = true, env = "DIAL_MEDIA_LOG", value_name = "FILTER")]
    log_level: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub resources: PathBuf,
    pub log_level: String,
}

impl Config {
    pub fn from_args(args: &GlobalArgs) -> Self {
        Self {
            resources: args.resources.clone().unwrap_or_else(|| PathBuf::from(".")),
            log_level: args.log_level.clone().unwrap_or_else(|| "info".to_string()),
        }
    }

    /// Resolves a resource-relative path.
    pub fn resource(&self, relative: &str) -> PathBuf {
        self.resources.join(relative)
    }

    pub fn reference_tape(&self, override_path: Option<&Path>) -> PathBuf {
        override_path
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.resource(REFERENCE_TAPE))
    }

    /// Installs the stderr subscriber. A filter that does not parse is an error.
    pub fn init_logging(&self) -> Result<()> {
        let filter = EnvFilter::try_new(&self.log_level)
            .with_context(|| format!("invalid log filter '{}'", self.log_level))?;
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .init();
        Ok(())
    }
}
