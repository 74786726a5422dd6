//! Core runtime configuration.
//!
//! # Responsibility
//! - Describe tunables for the sweep loop, review paging and pricing.
//! - Load them from JSON with a default for every field.
//!
//! # Invariants
//! - A validated config always carries a usable commission schedule.

use crate::pricing::{CommissionSchedule, PricingError};
use crate::service::review_service::REVIEWS_PAGE_SIZE_MAX;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::time::Duration;

const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 60;
const DEFAULT_REVIEW_PAGE_SIZE: u32 = 10;

/// Errors from loading or validating configuration.
#[derive(Debug)]
pub enum ConfigError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse(serde_json::Error),
    ZeroSweepInterval,
    PageSizeOutOfRange(u32),
    Pricing(PricingError),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "failed to read config `{}`: {source}", path.display())
            }
            Self::Parse(err) => write!(f, "invalid config JSON: {err}"),
            Self::ZeroSweepInterval => write!(f, "sweep_interval_secs must be greater than 0"),
            Self::PageSizeOutOfRange(size) => write!(
                f,
                "review_page_size must be between 1 and {REVIEWS_PAGE_SIZE_MAX}, got {size}"
            ),
            Self::Pricing(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse(err) => Some(err),
            Self::Pricing(err) => Some(err),
            Self::ZeroSweepInterval | Self::PageSizeOutOfRange(_) => None,
        }
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(value: serde_json::Error) -> Self {
        Self::Parse(value)
    }
}

impl From<PricingError> for ConfigError {
    fn from(value: PricingError) -> Self {
        Self::Pricing(value)
    }
}

/// Tunables for the gigboard core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CoreConfig {
    /// Seconds between recurrence sweeps.
    pub sweep_interval_secs: u64,
    /// Reviews per page when a query does not ask for a size.
    pub review_page_size: u32,
    pub commission_tiers: CommissionSchedule,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            sweep_interval_secs: DEFAULT_SWEEP_INTERVAL_SECS,
            review_page_size: DEFAULT_REVIEW_PAGE_SIZE,
            commission_tiers: CommissionSchedule::default(),
        }
    }
}

impl CoreConfig {
    /// Parses and validates JSON config text.
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&raw)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sweep_interval_secs == 0 {
            return Err(ConfigError::ZeroSweepInterval);
        }
        if !(1..=REVIEWS_PAGE_SIZE_MAX).contains(&self.review_page_size) {
            return Err(ConfigError::PageSizeOutOfRange(self.review_page_size));
        }
        self.commission_tiers.validate()?;
        Ok(())
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }
}
