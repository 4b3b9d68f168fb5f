// Probe configuration, loaded once by the caller and injected into the prober
use crate::application::constants::{
    DEFAULT_MAX_ATTEMPTS, DEFAULT_NAME_PREFIX, MAX_ATTEMPTS_ENV_VAR, OVERRIDE_ENV_VAR,
};
use crate::error::{AppError, Result};

/// Prober configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeConfig {
    /// False forces a serial verdict without touching the OS
    pub override_enabled: bool,

    /// Semaphore name prefix
    pub name_prefix: String,

    /// Name collision budget (must be at least 1)
    pub max_attempts: u32,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            override_enabled: true,
            name_prefix: DEFAULT_NAME_PREFIX.to_string(),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

impl ProbeConfig {
    /// Load configuration from the process environment
    ///
    /// # Environment Variables
    ///
    /// - `JOBLIB_MULTIPROCESSING`: integer toggle, `0` disables (default: 1)
    /// - `MPGATE_MAX_ATTEMPTS`: positive integer (default: 100)
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    ///
    /// # Errors
    /// - AppError::Config if a variable is set but not a valid integer
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(raw) = lookup(OVERRIDE_ENV_VAR) {
            config.override_enabled = parse_toggle(OVERRIDE_ENV_VAR, &raw)?;
        }

        if let Some(raw) = lookup(MAX_ATTEMPTS_ENV_VAR) {
            config.max_attempts = parse_attempts(MAX_ATTEMPTS_ENV_VAR, &raw)?;
        }

        Ok(config)
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Result<Self> {
        if max_attempts == 0 {
            return Err(AppError::Config(
                "max_attempts must be at least 1".to_string(),
            ));
        }
        self.max_attempts = max_attempts;
        Ok(self)
    }
}

/// Integer truthiness: any non-zero integer enables
///
/// Accepts an optional sign and `_` between digit groups (`1_000`). The value
/// is never materialized, so arbitrarily long integers are fine.
fn parse_toggle(key: &str, raw: &str) -> Result<bool> {
    let trimmed = raw.trim();
    let digits = trimmed
        .strip_prefix(|c: char| c == '+' || c == '-')
        .unwrap_or(trimmed);

    let well_formed = !digits.is_empty()
        && digits
            .split('_')
            .all(|group| !group.is_empty() && group.bytes().all(|b| b.is_ascii_digit()));

    if !well_formed {
        return Err(AppError::Config(format!(
            "{} must be an integer, got {:?}",
            key, raw
        )));
    }

    Ok(digits.bytes().any(|b| b.is_ascii_digit() && b != b'0'))
}

fn parse_attempts(key: &str, raw: &str) -> Result<u32> {
    match raw.trim().parse::<u32>() {
        Ok(0) => Err(AppError::Config(format!("{} must be at least 1", key))),
        Ok(value) => Ok(value),
        Err(e) => Err(AppError::Config(format!(
            "{} must be a positive integer, got {:?}: {}",
            key, raw, e
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<ProbeConfig> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ProbeConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_missing_toggle_defaults_to_enabled() {
        let config = load(&[]).unwrap();
        assert_eq!(config, ProbeConfig::default());
        assert!(config.override_enabled);
    }

    #[test]
    fn test_zero_disables() {
        assert!(!load(&[(OVERRIDE_ENV_VAR, "0")]).unwrap().override_enabled);
        assert!(!load(&[(OVERRIDE_ENV_VAR, "-0")]).unwrap().override_enabled);
    }

    #[test]
    fn test_non_zero_enables() {
        assert!(load(&[(OVERRIDE_ENV_VAR, "1")]).unwrap().override_enabled);
        assert!(load(&[(OVERRIDE_ENV_VAR, " 2 ")]).unwrap().override_enabled);
        assert!(load(&[(OVERRIDE_ENV_VAR, "-1")]).unwrap().override_enabled);
        assert!(load(&[(OVERRIDE_ENV_VAR, "+3")]).unwrap().override_enabled);
    }

    #[test]
    fn test_oversized_integers_are_truthy() {
        assert!(
            load(&[(OVERRIDE_ENV_VAR, "99999999999999999999")])
                .unwrap()
                .override_enabled
        );
        assert!(
            load(&[(OVERRIDE_ENV_VAR, "-99999999999999999999")])
                .unwrap()
                .override_enabled
        );
        assert!(
            !load(&[(OVERRIDE_ENV_VAR, "000000000000000000000000")])
                .unwrap()
                .override_enabled
        );
    }

    #[test]
    fn test_digit_group_underscores() {
        assert!(load(&[(OVERRIDE_ENV_VAR, "1_0")]).unwrap().override_enabled);
        assert!(!load(&[(OVERRIDE_ENV_VAR, "0_0")]).unwrap().override_enabled);

        for bad in ["_1", "1_", "1__0", "+_1"] {
            assert!(
                load(&[(OVERRIDE_ENV_VAR, bad)]).is_err(),
                "{:?} should be rejected",
                bad
            );
        }
    }

    #[test]
    fn test_non_integer_toggle_is_config_error() {
        let err = load(&[(OVERRIDE_ENV_VAR, "yes")]).unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
        assert!(err.to_string().contains(OVERRIDE_ENV_VAR));

        assert!(load(&[(OVERRIDE_ENV_VAR, "")]).is_err());
        assert!(load(&[(OVERRIDE_ENV_VAR, "+")]).is_err());
        assert!(load(&[(OVERRIDE_ENV_VAR, "+-1")]).is_err());
        assert!(load(&[(OVERRIDE_ENV_VAR, "1.5")]).is_err());
    }

    #[test]
    fn test_max_attempts_override() {
        let config = load(&[(MAX_ATTEMPTS_ENV_VAR, "7")]).unwrap();
        assert_eq!(config.max_attempts, 7);

        assert!(load(&[(MAX_ATTEMPTS_ENV_VAR, "0")]).is_err());
        assert!(load(&[(MAX_ATTEMPTS_ENV_VAR, "-4")]).is_err());
    }

    #[test]
    fn test_with_max_attempts() {
        let config = ProbeConfig::default().with_max_attempts(5).unwrap();
        assert_eq!(config.max_attempts, 5);
        assert!(ProbeConfig::default().with_max_attempts(0).is_err());
    }
}
