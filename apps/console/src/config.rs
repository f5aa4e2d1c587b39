//! # Console Configuration
//!
//! ## Sources (Priority Order)
//! 1. Command line flags (`--demo`, `--config`)
//! 2. Environment variables (`LAVAPRO_*`, e.g. `LAVAPRO_REVENUE_MONTHS=12`)
//! 3. Config file (`--config <path>`, else `lavapro.toml` in the platform
//!    config directory, if present)
//! 4. Defaults (this file)
//!
//! Backend credentials are not part of this file: they come from
//! `SUPABASE_URL` / `SUPABASE_ANON_KEY` (see `lavapro_baas::BaasConfig`).

use ::config::builder::DefaultState;
use ::config::{Config, ConfigBuilder, Environment, File, FileFormat};
use directories::ProjectDirs;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use lavapro_core::DEFAULT_REVENUE_MONTHS;

use crate::error::CliError;

const CONFIG_FILE: &str = "lavapro.toml";
const SESSION_FILE: &str = "session.toml";
const ENV_PREFIX: &str = "LAVAPRO";

/// Longest revenue chart offered.
pub const MAX_REVENUE_MONTHS: usize = 24;

/// Console settings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ConsoleConfig {
    /// Months on the revenue chart
    pub revenue_months: usize,

    /// Per-request timeout against the hosted backend
    pub timeout_secs: u64,

    /// Use the in-process demo dataset instead of the hosted backend
    pub demo: bool,

    /// Where the signed-in session is kept between runs
    pub session_file: Option<PathBuf>,
}

impl ConsoleConfig {
    /// Loads from the default file location, an optional explicit file and
    /// the environment.
    pub fn load(explicit: Option<&Path>) -> Result<Self, CliError> {
        let mut builder = Self::defaults()?;
        if let Some(dirs) = project_dirs() {
            let path = dirs.config_dir().join(CONFIG_FILE);
            builder = builder.add_source(File::from(path).required(false));
        }
        if let Some(path) = explicit {
            builder = builder.add_source(File::from(path).required(true));
        }
        builder = builder.add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true));

        Self::build(builder)
    }

    /// Loads from TOML text layered over the defaults.
    pub fn from_toml(text: &str) -> Result<Self, CliError> {
        let builder = Self::defaults()?.add_source(File::from_str(text, FileFormat::Toml));
        Self::build(builder)
    }

    fn defaults() -> Result<ConfigBuilder<DefaultState>, CliError> {
        Ok(Config::builder()
            .set_default("revenue_months", DEFAULT_REVENUE_MONTHS as i64)?
            .set_default("timeout_secs", 15_i64)?
            .set_default("demo", false)?)
    }

    fn build(builder: ConfigBuilder<DefaultState>) -> Result<Self, CliError> {
        let config: ConsoleConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), CliError> {
        if self.revenue_months == 0 || self.revenue_months > MAX_REVENUE_MONTHS {
            return Err(CliError::Config(format!(
                "revenue_months must be between 1 and {}, got {}",
                MAX_REVENUE_MONTHS, self.revenue_months
            )));
        }
        if self.timeout_secs == 0 {
            return Err(CliError::Config("timeout_secs must be positive".to_string()));
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// The configured session file, or `session.toml` in the data directory.
    pub fn session_path(&self) -> Result<PathBuf, CliError> {
        if let Some(path) = &self.session_file {
            return Ok(path.clone());
        }
        project_dirs()
            .map(|dirs| dirs.data_dir().join(SESSION_FILE))
            .ok_or_else(|| {
                CliError::Config("no home directory; set LAVAPRO_SESSION_FILE".to_string())
            })
    }
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("br", "LavaPro", "lavapro")
}
