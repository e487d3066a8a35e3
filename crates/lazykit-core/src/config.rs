use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::retry::{DefaultPolicy, RetryDefaults, RetryOptions};

/// Retry policy parameters (optional section in config.toml).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of attempts (including the first).
    pub max_retries: u32,
    /// Initial delay in seconds before the first retry (e.g. 0.5 = 500ms).
    pub delay_secs: f64,
    /// Factor applied to the delay after each retry.
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,
    /// Wall-clock budget in seconds, measured from the first attempt.
    #[serde(default)]
    pub max_duration_secs: Option<f64>,
    /// Attempt number from which warnings are reported.
    #[serde(default)]
    pub alert_threshold: Option<u32>,
    /// Upper bound on a single backoff wait, in seconds. Unbounded if missing.
    #[serde(default)]
    pub max_delay_secs: Option<f64>,
}

fn default_backoff_multiplier() -> f64 {
    2.0
}

impl Default for RetryConfig {
    fn default() -> Self {
        let d = RetryDefaults::default();
        Self {
            max_retries: d.max_retries,
            delay_secs: d.delay.as_secs_f64(),
            backoff_multiplier: default_backoff_multiplier(),
            max_duration_secs: None,
            alert_threshold: None,
            max_delay_secs: None,
        }
    }
}

/// Seconds from the config file to a `Duration`; negative or non-finite values are rejected.
pub fn secs(value: f64) -> Result<Duration> {
    Duration::try_from_secs_f64(value).with_context(|| format!("invalid duration: {value} seconds"))
}

/// Backoff factor from the config file or command line; must be finite and at least 1.0.
pub fn multiplier(value: f64) -> Result<f64> {
    if !value.is_finite() || value < 1.0 {
        bail!("invalid backoff multiplier: {value} (must be >= 1.0)");
    }
    Ok(value)
}

impl RetryConfig {
    pub fn defaults(&self) -> Result<RetryDefaults> {
        Ok(RetryDefaults {
            max_retries: self.max_retries,
            delay: secs(self.delay_secs)?,
        })
    }

    /// Install `max_retries` and `delay` as the defaults of `policy`.
    pub fn apply(&self, policy: &DefaultPolicy) -> Result<()> {
        let d = self.defaults()?;
        policy.set_defaults(d.max_retries, d.delay);
        Ok(())
    }

    /// Options carrying the non-default fields of this section.
    ///
    /// `max_retries` and `delay` are left unset so they come from whichever
    /// `DefaultPolicy` the options are resolved against.
    pub fn options<E>(&self) -> Result<RetryOptions<E>> {
        let mut opts =
            RetryOptions::new().backoff_multiplier(multiplier(self.backoff_multiplier)?);
        if let Some(s) = self.max_duration_secs {
            opts = opts.max_duration(secs(s)?);
        }
        if let Some(t) = self.alert_threshold {
            opts = opts.alert_threshold(t);
        }
        if let Some(s) = self.max_delay_secs {
            opts = opts.max_delay(secs(s)?);
        }
        Ok(opts)
    }
}

/// Global configuration loaded from `~/.config/lazykit/config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LazykitConfig {
    /// Optional retry policy; if missing, built-in defaults are used.
    #[serde(default)]
    pub retry: Option<RetryConfig>,
}

impl LazykitConfig {
    /// The retry section, or built-in values when the file has none.
    pub fn retry_or_default(&self) -> RetryConfig {
        self.retry.clone().unwrap_or_default()
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("lazykit")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from `path`.
pub fn load_from_path(path: &Path) -> Result<LazykitConfig> {
    let data = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: LazykitConfig =
        toml::from_str(&data).with_context(|| format!("parse {}", path.display()))?;
    Ok(cfg)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<LazykitConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = LazykitConfig {
            retry: Some(RetryConfig::default()),
        };
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

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn default_retry_values() {
        let r = RetryConfig::default();
        assert_eq!(r.max_retries, 3);
        assert!((r.delay_secs - 1.0).abs() < 1e-9);
        assert!((r.backoff_multiplier - 2.0).abs() < 1e-9);
        assert!(r.max_duration_secs.is_none());
        assert!(r.alert_threshold.is_none());
    }

    #[test]
    fn config_toml_roundtrip() {
        let cfg = LazykitConfig {
            retry: Some(RetryConfig::default()),
        };
        let toml = toml::to_string_pretty(&cfg).unwrap();
        let parsed: LazykitConfig = toml::from_str(&toml).unwrap();
        assert_eq!(parsed, cfg);
    }

    #[test]
    fn empty_file_has_no_retry_section() {
        let cfg: LazykitConfig = toml::from_str("").unwrap();
        assert!(cfg.retry.is_none());
        assert_eq!(cfg.retry_or_default(), RetryConfig::default());
    }

    #[test]
    fn config_toml_custom_retry() {
        let toml = r#"
            [retry]
            max_retries = 5
            delay_secs = 0.5
            max_duration_secs = 30
            alert_threshold = 3
        "#;
        let cfg: LazykitConfig = toml::from_str(toml).unwrap();
        let retry = cfg.retry.as_ref().unwrap();
        assert_eq!(retry.max_retries, 5);
        assert!((retry.delay_secs - 0.5).abs() < 1e-9);
        assert!((retry.backoff_multiplier - 2.0).abs() < 1e-9);
        assert_eq!(retry.max_duration_secs, Some(30.0));
        assert_eq!(retry.alert_threshold, Some(3));
        assert!(retry.max_delay_secs.is_none());
    }

    #[test]
    fn apply_installs_defaults() {
        let policy = DefaultPolicy::default();
        let retry = RetryConfig {
            max_retries: 6,
            delay_secs: 0.25,
            ..RetryConfig::default()
        };
        retry.apply(&policy).unwrap();
        let d = policy.read_defaults();
        assert_eq!(d.max_retries, 6);
        assert_eq!(d.delay, Duration::from_millis(250));
    }

    #[test]
    fn options_carry_optional_fields() {
        let retry = RetryConfig {
            backoff_multiplier: 3.0,
            max_duration_secs: Some(2.0),
            alert_threshold: Some(4),
            max_delay_secs: Some(1.5),
            ..RetryConfig::default()
        };
        let policy = DefaultPolicy::default();
        let r = retry.options::<()>().unwrap().resolve(&policy);
        let p = r.policy();
        assert_eq!(p.backoff_multiplier, 3.0);
        assert_eq!(p.max_duration, Some(Duration::from_secs(2)));
        assert_eq!(p.alert_threshold, Some(4));
        assert_eq!(p.max_delay, Some(Duration::from_millis(1500)));
    }

    #[test]
    fn backoff_multiplier_below_one_is_rejected() {
        for bad in [-1.0, 0.0, 0.5, f64::NAN, f64::INFINITY] {
            let retry = RetryConfig {
                backoff_multiplier: bad,
                ..RetryConfig::default()
            };
            assert!(retry.options::<()>().is_err(), "accepted {bad}");
        }
        let flat = RetryConfig {
            backoff_multiplier: 1.0,
            ..RetryConfig::default()
        };
        assert!(flat.options::<()>().is_ok());
    }

    #[test]
    fn negative_delay_is_rejected() {
        let retry = RetryConfig {
            delay_secs: -1.0,
            ..RetryConfig::default()
        };
        assert!(retry.defaults().is_err());
    }

    #[test]
    fn load_from_path_reads_file() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        writeln!(f, "[retry]\nmax_retries = 2\ndelay_secs = 0.1").unwrap();
        let cfg = load_from_path(f.path()).unwrap();
        assert_eq!(cfg.retry.unwrap().max_retries, 2);
    }

    #[test]
    fn load_from_path_reports_parse_errors() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        writeln!(f, "[retry]\nmax_retries = \"many\"").unwrap();
        let err = load_from_path(f.path()).unwrap_err();
        assert!(format!("{err:#}").contains("parse"));
    }
}
