use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use backoff::{ExponentialBackoff, ExponentialBackoffBuilder};

use crate::retry::{ErrorClassifier, Limited, StatusConditioner};

/// Backoff schedule parameters (`[backoff]` in config.toml).
///
/// Defaults match `backoff::ExponentialBackoff::default()`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackoffConfig {
    /// First delay in milliseconds.
    pub initial_interval_ms: u64,
    /// Growth factor applied after each delay.
    pub multiplier: f64,
    /// Jitter: each delay is drawn from `interval * (1 ± randomization_factor)`.
    pub randomization_factor: f64,
    /// Upper bound on a single delay, in seconds.
    pub max_interval_secs: u64,
    /// Stop retrying once this much time has passed since the first attempt.
    /// `0` = no elapsed-time limit.
    pub max_elapsed_secs: u64,
    /// Stop after this many retries (attempts = retries + 1). `None` = no count limit.
    pub max_retries: Option<u32>,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            initial_interval_ms: 500,
            multiplier: 1.5,
            randomization_factor: 0.5,
            max_interval_secs: 60,
            max_elapsed_secs: 900,
            max_retries: None,
        }
    }
}

impl BackoffConfig {
    /// Elapsed-time bound for the schedule; `None` when `max_elapsed_secs` is 0.
    pub fn max_elapsed(&self) -> Option<Duration> {
        match self.max_elapsed_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }

    /// Build the backoff schedule described by this section.
    pub fn build(&self) -> Limited<ExponentialBackoff> {
        let exponential = ExponentialBackoffBuilder::new()
            .with_initial_interval(Duration::from_millis(self.initial_interval_ms))
            .with_multiplier(self.multiplier)
            .with_randomization_factor(self.randomization_factor)
            .with_max_interval(Duration::from_secs(self.max_interval_secs))
            .with_max_elapsed_time(self.max_elapsed())
            .build();
        Limited::new(exponential, self.max_retries)
    }
}

/// Classification tweaks (`[classify]` in config.toml).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifyConfig {
    /// Status codes retried in addition to 5xx (e.g. 429, 408).
    pub extra_retry_statuses: Vec<u16>,
    /// Substrings of an unstructured transport error message that mean the
    /// peer closed the stream early.
    pub closed_markers: Vec<String>,
}

impl Default for ClassifyConfig {
    fn default() -> Self {
        Self {
            extra_retry_statuses: Vec::new(),
            closed_markers: vec!["EOF".to_string()],
        }
    }
}

impl ClassifyConfig {
    pub fn conditioner(&self) -> StatusConditioner {
        self.extra_retry_statuses
            .iter()
            .fold(StatusConditioner::default(), |c, code| c.retry_on(*code))
    }

    pub fn error_classifier(&self) -> ErrorClassifier {
        ErrorClassifier::with_markers(self.closed_markers.iter().cloned())
    }
}

/// libcurl transport settings (`[transport]` in config.toml).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    pub connect_timeout_secs: u64,
    /// Whole-request deadline in seconds.
    pub timeout_secs: u64,
    pub follow_redirects: bool,
    pub max_redirects: u32,
    pub user_agent: Option<String>,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: 15,
            timeout_secs: 30,
            follow_redirects: true,
            max_redirects: 10,
            user_agent: None,
        }
    }
}

/// Global configuration loaded from `~/.config/eeve/config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EeveConfig {
    #[serde(default)]
    pub backoff: BackoffConfig,
    #[serde(default)]
    pub classify: ClassifyConfig,
    #[serde(default)]
    pub transport: TransportConfig,
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("eeve")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<EeveConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = EeveConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    load_from_path(&path)
}

/// Load configuration from an explicit file. Missing sections take defaults.
pub fn load_from_path(path: &Path) -> Result<EeveConfig> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    let cfg: EeveConfig =
        toml::from_str(&data).with_context(|| format!("parsing config {}", path.display()))?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use backoff::backoff::Backoff;

    #[test]
    fn default_config_values() {
        let cfg = EeveConfig::default();
        assert_eq!(cfg.backoff.initial_interval_ms, 500);
        assert_eq!(cfg.backoff.max_elapsed_secs, 900);
        assert!(cfg.backoff.max_retries.is_none());
        assert!(cfg.classify.extra_retry_statuses.is_empty());
        assert_eq!(cfg.classify.closed_markers, vec!["EOF".to_string()]);
        assert_eq!(cfg.transport.timeout_secs, 30);
        assert!(cfg.transport.follow_redirects);
    }

    #[test]
    fn config_toml_roundtrip() {
        let cfg = EeveConfig::default();
        let toml = toml::to_string_pretty(&cfg).unwrap();
        let parsed: EeveConfig = toml::from_str(&toml).unwrap();
        assert_eq!(parsed, cfg);
    }

    #[test]
    fn unlimited_elapsed_survives_roundtrip() {
        let mut cfg = EeveConfig::default();
        cfg.backoff.max_elapsed_secs = 0;
        let toml = toml::to_string_pretty(&cfg).unwrap();
        let parsed: EeveConfig = toml::from_str(&toml).unwrap();
        assert_eq!(parsed.backoff.max_elapsed_secs, 0);
        assert_eq!(parsed.backoff.max_elapsed(), None);
        assert_eq!(parsed, cfg);
    }

    #[test]
    fn max_elapsed_maps_zero_to_unlimited() {
        let mut cfg = BackoffConfig::default();
        assert_eq!(cfg.max_elapsed(), Some(Duration::from_secs(900)));
        cfg.max_elapsed_secs = 0;
        assert_eq!(cfg.max_elapsed(), None);
        let toml: EeveConfig = toml::from_str("[backoff]\nmax_elapsed_secs = 0\n").unwrap();
        assert_eq!(toml.backoff.max_elapsed(), None);
    }

    #[test]
    fn config_empty_file_is_default() {
        let cfg: EeveConfig = toml::from_str("").unwrap();
        assert_eq!(cfg, EeveConfig::default());
    }

    #[test]
    fn config_toml_custom_values() {
        let toml = r#"
            [backoff]
            initial_interval_ms = 100
            max_retries = 3

            [classify]
            extra_retry_statuses = [429, 408]

            [transport]
            timeout_secs = 5
            user_agent = "eeve/0.1"
        "#;
        let cfg: EeveConfig = toml::from_str(toml).unwrap();
        assert_eq!(cfg.backoff.initial_interval_ms, 100);
        assert_eq!(cfg.backoff.max_retries, Some(3));
        // Unset keys in a present section keep their defaults.
        assert!((cfg.backoff.multiplier - 1.5).abs() < 1e-9);
        assert_eq!(cfg.classify.extra_retry_statuses, vec![429, 408]);
        assert_eq!(cfg.classify.closed_markers, vec!["EOF".to_string()]);
        assert_eq!(cfg.transport.timeout_secs, 5);
        assert_eq!(cfg.transport.connect_timeout_secs, 15);
        assert_eq!(cfg.transport.user_agent.as_deref(), Some("eeve/0.1"));
    }

    #[test]
    fn built_backoff_honours_max_retries() {
        let cfg = BackoffConfig {
            initial_interval_ms: 1,
            randomization_factor: 0.0,
            max_retries: Some(2),
            ..BackoffConfig::default()
        };
        let mut b = cfg.build();
        assert!(b.next_backoff().is_some());
        assert!(b.next_backoff().is_some());
        assert_eq!(b.next_backoff(), None);
    }

    #[test]
    fn built_backoff_grows_and_is_capped() {
        let cfg = BackoffConfig {
            initial_interval_ms: 250,
            multiplier: 2.0,
            randomization_factor: 0.0,
            max_interval_secs: 1,
            max_elapsed_secs: 0,
            max_retries: None,
        };
        let mut b = cfg.build();
        let d1 = b.next_backoff().unwrap();
        let d2 = b.next_backoff().unwrap();
        assert!(d2 > d1);
        for _ in 0..8 {
            let d = b.next_backoff().unwrap();
            assert!(d <= Duration::from_secs(1) + Duration::from_millis(1));
        }
    }

    #[test]
    fn classify_section_builds_classifiers() {
        let cfg = ClassifyConfig {
            extra_retry_statuses: vec![429],
            closed_markers: vec!["unexpected end".to_string()],
        };
        let c = cfg.conditioner();
        assert!(c.retries(429));
        assert!(c.retries(502));
        assert!(!c.retries(404));
        assert_eq!(cfg.error_classifier().markers(), &["unexpected end".to_string()]);
    }

    #[test]
    fn load_from_path_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[backoff]\nmax_retries = 7\n").unwrap();
        let cfg = load_from_path(&path).unwrap();
        assert_eq!(cfg.backoff.max_retries, Some(7));
    }

    #[test]
    fn load_from_path_reports_bad_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[backoff\n").unwrap();
        let err = load_from_path(&path).unwrap_err();
        assert!(format!("{:#}", err).contains("parsing config"));
    }
}
