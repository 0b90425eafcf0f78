use anyhow::{Context, Result, bail};
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::Serialize;
use std::path::Path;

use super::LineprocConfig;

// Embed the default config at compile time
const DEFAULT_CONFIG: &str = include_str!("../../default-config.toml");

/// Repository config picked up from the working directory
pub const REPO_CONFIG_FILE: &str = "lineproc.toml";

/// Prefix for environment overrides; `__` separates nested keys
pub const ENV_PREFIX: &str = "LINEPROC_";

/// Largest accepted `processing.channel_buffer_multiplier`
pub const MAX_CHANNEL_BUFFER_MULTIPLIER: usize = 1024;

impl LineprocConfig {
    /// Load configuration relative to the current working directory
    pub fn load<T: Serialize>(custom_config: Option<&Path>, cli_overrides: Option<T>) -> Result<Self> {
        Self::load_in(Path::new("."), custom_config, cli_overrides)
    }

    /// Load configuration, looking for the repository config in `base_dir`
    pub fn load_in<T: Serialize>(
        base_dir: &Path,
        custom_config: Option<&Path>,
        cli_overrides: Option<T>,
    ) -> Result<Self> {
        let figment = Self::figment(base_dir, custom_config, cli_overrides)?;

        let config: LineprocConfig = figment
            .extract()
            .context("Failed to parse configuration")?;
        config.validate()?;

        tracing::trace!(?config, "CONFIG LOAD: Final configuration");
        Ok(config)
    }

    /// Build the provider chain, lowest priority first
    pub fn figment<T: Serialize>(
        base_dir: &Path,
        custom_config: Option<&Path>,
        cli_overrides: Option<T>,
    ) -> Result<Figment> {
        tracing::trace!("CONFIG LOAD: Starting");

        let mut figment = Figment::new()
            .merge(Toml::string(DEFAULT_CONFIG))
            .merge(Toml::file(base_dir.join(REPO_CONFIG_FILE)));

        if let Some(custom_path) = custom_config {
            // An explicit config file must exist; the implicit ones are optional
            if !custom_path.is_file() {
                bail!("Configuration file not found: {}", custom_path.display());
            }
            figment = figment.merge(Toml::file(custom_path));
        }

        figment = figment.merge(Env::prefixed(ENV_PREFIX).split("__"));

        if let Some(overrides) = cli_overrides {
            tracing::trace!("CONFIG LOAD: Applying CLI overrides");
            figment = figment.merge(Serialized::defaults(overrides));
        }

        Ok(figment)
    }

    /// Reject values the transformer cannot work with
    pub fn validate(&self) -> Result<()> {
        let processing = &self.processing;

        if !(1..=100).contains(&processing.thread_percentage) {
            bail!(
                "processing.thread_percentage must be between 1 and 100, got {}",
                processing.thread_percentage
            );
        }
        if processing.timeout_secs == 0 {
            bail!("processing.timeout_secs must be greater than 0");
        }
        if !(1..=MAX_CHANNEL_BUFFER_MULTIPLIER).contains(&processing.channel_buffer_multiplier) {
            bail!(
                "processing.channel_buffer_multiplier must be between 1 and {}, got {}",
                MAX_CHANNEL_BUFFER_MULTIPLIER,
                processing.channel_buffer_multiplier
            );
        }
        if self.input.path.as_os_str().is_empty() {
            bail!("input.path must not be empty");
        }

        Ok(())
    }

    /// Effective configuration rendered as TOML
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to render configuration")
    }
}
