//! Process-wide gateway settings.
//!
//! Loaded once at startup and read-only afterwards. Precedence, lowest first:
//!
//! 1. built-in defaults
//! 2. the file named by `SENTINEL_CONFIG` (any format the kernel loader knows)
//! 3. `SENTINEL_*` environment variables (`SENTINEL_API_KEYS` is comma separated)
//! 4. the unprefixed `DEFAULT_LIMIT`, `USER_LIMIT` and `DEFAULT_PERIOD` variables
//!
//! | Key | Default | Meaning |
//! |-----|---------|---------|
//! | `host` | `0.0.0.0` | bind address |
//! | `port` | `8000` | bind port |
//! | `default_limit` | `100` | anonymous tokens per period |
//! | `user_limit` | `1000` | authenticated tokens per period |
//! | `default_period` | `60.0` | period in seconds |
//! | `api_keys` | empty | credentials that select the authenticated tier |
//! | `trust_forwarded_for` | `false` | key anonymous callers by `X-Forwarded-For` |
//! | `bucket_ttl_secs` | `300` | idle time before a bucket is evicted |
//! | `sweep_threshold` | `1000` | engine calls between lazy sweeps |
//! | `sweep_interval_secs` | unset | run a background sweep on this interval |

use error_stack::{Report, ResultExt};
use sentinel_kernel::config::{load_layered, ConfigError, EnvSource};
use sentinel_kernel::error::{KernelError, KernelResult};
use sentinel_kernel::limiter::CleanupPolicy;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Environment variable naming an optional settings file.
pub const CONFIG_PATH_VAR: &str = "SENTINEL_CONFIG";

/// Prefix of the environment overrides.
pub const ENV_PREFIX: &str = "SENTINEL";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub host: String,
    pub port: u16,
    pub default_limit: u32,
    pub user_limit: u32,
    pub default_period: f64,
    pub api_keys: Vec<String>,
    pub trust_forwarded_for: bool,
    pub bucket_ttl_secs: u64,
    pub sweep_threshold: u64,
    pub sweep_interval_secs: Option<u64>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            default_limit: 100,
            user_limit: 1000,
            default_period: 60.0,
            api_keys: Vec::new(),
            trust_forwarded_for: false,
            bucket_ttl_secs: 300,
            sweep_threshold: 1000,
            sweep_interval_secs: None,
        }
    }
}

/// The `SENTINEL_*` environment source.
pub fn env_source() -> EnvSource {
    EnvSource::with_prefix(ENV_PREFIX)
        .prefix_separator("_")
        .try_parsing(true)
        .list_separator(",")
        .with_list_parse_key("api_keys")
}

impl Settings {
    /// Load from the process environment (and `SENTINEL_CONFIG`, if set).
    pub fn load() -> KernelResult<Self> {
        let path = std::env::var(CONFIG_PATH_VAR).ok();
        Self::load_from(path.as_deref(), env_source(), |key| std::env::var(key).ok())
    }

    /// Load from an explicit file, environment source and variable lookup.
    pub fn load_from(
        path: Option<&str>,
        env: EnvSource,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> KernelResult<Self> {
        let mut settings: Settings = load_layered(path, env)
            .map_err(KernelError::from)
            .map_err(Report::new)
            .attach(format!(
                "loading settings from {}",
                path.unwrap_or("environment")
            ))?;

        settings
            .apply_overrides(lookup)
            .and_then(|()| settings.validate())
            .map_err(KernelError::from)
            .map_err(Report::new)
            .attach("validating settings")?;

        Ok(settings)
    }

    /// Apply the unprefixed `DEFAULT_LIMIT`, `USER_LIMIT` and `DEFAULT_PERIOD`.
    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<(), ConfigError> {
        if let Some(raw) = lookup("DEFAULT_LIMIT") {
            self.default_limit = parse_var("DEFAULT_LIMIT", &raw)?;
        }
        if let Some(raw) = lookup("USER_LIMIT") {
            self.user_limit = parse_var("USER_LIMIT", &raw)?;
        }
        if let Some(raw) = lookup("DEFAULT_PERIOD") {
            self.default_period = parse_var("DEFAULT_PERIOD", &raw)?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.default_limit == 0 {
            return Err(invalid("default_limit", "must be at least 1"));
        }
        if self.user_limit == 0 {
            return Err(invalid("user_limit", "must be at least 1"));
        }
        if !(self.default_period.is_finite() && self.default_period > 0.0) {
            return Err(invalid("default_period", "must be a positive number of seconds"));
        }
        if Duration::try_from_secs_f64(self.default_period).is_err() {
            return Err(invalid("default_period", "is too large"));
        }
        if self.bucket_ttl_secs == 0 {
            return Err(invalid("bucket_ttl_secs", "must be at least 1"));
        }
        if self.sweep_interval_secs == Some(0) {
            return Err(invalid("sweep_interval_secs", "must be at least 1 when set"));
        }
        Ok(())
    }

    /// Refill period shared by both tiers.
    ///
    /// Zero when `default_period` is out of range, which
    /// [`RatePolicy::per_period`](sentinel_kernel::limiter::RatePolicy::per_period) rejects.
    pub fn period(&self) -> Duration {
        Duration::try_from_secs_f64(self.default_period).unwrap_or(Duration::ZERO)
    }

    pub fn cleanup_policy(&self) -> CleanupPolicy {
        CleanupPolicy::new(Duration::from_secs(self.bucket_ttl_secs), self.sweep_threshold)
    }

    pub fn sweep_interval(&self) -> Option<Duration> {
        self.sweep_interval_secs.map(Duration::from_secs)
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_var<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T, ConfigError> {
    raw.trim()
        .parse()
        .map_err(|_| invalid(key, &format!("cannot parse '{raw}'")))
}

fn invalid(key: &str, reason: &str) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn env(pairs: &[(&str, &str)]) -> EnvSource {
        let map = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        env_source().source(Some(map))
    }

    fn no_vars(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn defaults_apply_without_any_source() {
        let settings = Settings::load_from(None, env(&[]), no_vars).unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.period(), Duration::from_secs(60));
        assert_eq!(settings.bind_addr(), "0.0.0.0:8000");
        assert_eq!(settings.sweep_interval(), None);
    }

    #[test]
    fn prefixed_environment_is_read() {
        let settings = Settings::load_from(
            None,
            env(&[
                ("SENTINEL_PORT", "9100"),
                ("SENTINEL_API_KEYS", "my_secret_token_123,other"),
                ("SENTINEL_TRUST_FORWARDED_FOR", "true"),
                ("SENTINEL_SWEEP_INTERVAL_SECS", "30"),
            ]),
            no_vars,
        )
        .unwrap();

        assert_eq!(settings.port, 9100);
        assert_eq!(settings.api_keys, vec!["my_secret_token_123", "other"]);
        assert!(settings.trust_forwarded_for);
        assert_eq!(settings.sweep_interval(), Some(Duration::from_secs(30)));
    }

    #[test]
    fn unprefixed_limits_win() {
        let vars: HashMap<&str, &str> = [
            ("DEFAULT_LIMIT", "5"),
            ("USER_LIMIT", "50"),
            ("DEFAULT_PERIOD", "2.5"),
        ]
        .into_iter()
        .collect();

        let settings = Settings::load_from(
            None,
            env(&[("SENTINEL_DEFAULT_LIMIT", "7")]),
            |key| vars.get(key).map(|v| v.to_string()),
        )
        .unwrap();

        assert_eq!(settings.default_limit, 5);
        assert_eq!(settings.user_limit, 50);
        assert_eq!(settings.period(), Duration::from_millis(2500));
    }

    #[test]
    fn file_values_sit_under_environment() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "default_limit = 20\nuser_limit = 200\nport = 7000").unwrap();

        let settings = Settings::load_from(
            file.path().to_str(),
            env(&[("SENTINEL_PORT", "7001")]),
            no_vars,
        )
        .unwrap();

        assert_eq!(settings.default_limit, 20);
        assert_eq!(settings.user_limit, 200);
        assert_eq!(settings.port, 7001);
    }

    #[test]
    fn invalid_values_are_reported() {
        let zero_period = Settings::load_from(None, env(&[]), |key| {
            (key == "DEFAULT_PERIOD").then(|| "0".to_string())
        });
        let report = zero_period.unwrap_err();
        assert!(format!("{report:?}").contains("default_period"));

        let garbage = Settings::load_from(None, env(&[]), |key| {
            (key == "USER_LIMIT").then(|| "lots".to_string())
        });
        assert!(format!("{:?}", garbage.unwrap_err()).contains("USER_LIMIT"));
    }

    #[test]
    fn oversized_period_is_rejected_not_panicking() {
        let loaded = Settings::load_from(None, env(&[]), |key| {
            (key == "DEFAULT_PERIOD").then(|| "1e20".to_string())
        });
        let report = loaded.unwrap_err();
        assert!(format!("{report:?}").contains("too large"));

        let built = Settings {
            default_period: 1e20,
            ..Settings::default()
        };
        assert_eq!(built.period(), Duration::ZERO);
        assert!(crate::policy::TierPolicy::from_settings(&built).is_err());
    }

    #[test]
    fn cleanup_policy_follows_settings() {
        let settings = Settings {
            bucket_ttl_secs: 42,
            sweep_threshold: 7,
            ..Settings::default()
        };
        let policy = settings.cleanup_policy();
        assert_eq!(policy.ttl, Duration::from_secs(42));
        assert_eq!(policy.sweep_threshold, 7);
    }
}
