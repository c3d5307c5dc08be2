//! Worker configuration loaded from environment variables.

use std::str::FromStr;
use std::time::Duration;

use catalog_core::voting::{
    VotingConfig, DEFAULT_EDIT_UPDATE_LIMIT, DEFAULT_MIN_DESTRUCTIVE_VOTING_PERIOD_SECS,
    DEFAULT_VOTE_APPLICATION_THRESHOLD, DEFAULT_VOTING_PERIOD_SECS,
};

/// Default pool size.
const DEFAULT_MAX_CONNECTIONS: u32 = 20;

/// Default closer tick: five minutes.
const DEFAULT_EDIT_CLOSER_INTERVAL_SECS: u64 = 300;

/// Default notification retention: 30 days.
const DEFAULT_NOTIFICATION_RETENTION_DAYS: i64 = 30;

/// Default pruning tick: one hour.
const DEFAULT_NOTIFICATION_RETENTION_INTERVAL_SECS: u64 = 3600;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} has invalid value '{value}': {reason}")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub database_url: String,
    pub max_connections: u32,
    pub voting: VotingConfig,
    /// `None` disables the edit closer.
    pub edit_closer_interval: Option<Duration>,
    pub notification_retention: chrono::Duration,
    pub notification_retention_interval: Duration,
}

impl WorkerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                                 | Default  |
    /// |-----------------------------------------|----------|
    /// | `DATABASE_URL`                          | required |
    /// | `DATABASE_MAX_CONNECTIONS`              | `20`     |
    /// | `VOTING_PERIOD_SECS`                    | `172800` |
    /// | `MIN_DESTRUCTIVE_VOTING_PERIOD_SECS`    | `345600` |
    /// | `VOTE_APPLICATION_THRESHOLD`            | `3`      |
    /// | `EDIT_UPDATE_LIMIT`                     | `1`      |
    /// | `EDIT_CLOSER_INTERVAL_SECS`             | `300`    |
    /// | `NOTIFICATION_RETENTION_DAYS`           | `30`     |
    /// | `NOTIFICATION_RETENTION_INTERVAL_SECS`  | `3600`   |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL")
            .filter(|url| !url.trim().is_empty())
            .ok_or(ConfigError::Missing("DATABASE_URL"))?;

        let max_connections: u32 =
            parse_var(&lookup, "DATABASE_MAX_CONNECTIONS", DEFAULT_MAX_CONNECTIONS)?;
        if max_connections == 0 {
            return Err(invalid("DATABASE_MAX_CONNECTIONS", "0", "must be positive"));
        }

        let voting_period: i64 = parse_var(&lookup, "VOTING_PERIOD_SECS", DEFAULT_VOTING_PERIOD_SECS)?;
        let destructive_period: i64 = parse_var(
            &lookup,
            "MIN_DESTRUCTIVE_VOTING_PERIOD_SECS",
            DEFAULT_MIN_DESTRUCTIVE_VOTING_PERIOD_SECS,
        )?;
        non_negative("VOTING_PERIOD_SECS", voting_period)?;
        non_negative("MIN_DESTRUCTIVE_VOTING_PERIOD_SECS", destructive_period)?;

        let threshold: i32 = parse_var(
            &lookup,
            "VOTE_APPLICATION_THRESHOLD",
            DEFAULT_VOTE_APPLICATION_THRESHOLD,
        )?;
        non_negative("VOTE_APPLICATION_THRESHOLD", i64::from(threshold))?;

        let update_limit: i32 = parse_var(&lookup, "EDIT_UPDATE_LIMIT", DEFAULT_EDIT_UPDATE_LIMIT)?;
        non_negative("EDIT_UPDATE_LIMIT", i64::from(update_limit))?;

        let closer_secs: u64 = parse_var(
            &lookup,
            "EDIT_CLOSER_INTERVAL_SECS",
            DEFAULT_EDIT_CLOSER_INTERVAL_SECS,
        )?;

        let retention_days: i64 = parse_var(
            &lookup,
            "NOTIFICATION_RETENTION_DAYS",
            DEFAULT_NOTIFICATION_RETENTION_DAYS,
        )?;
        non_negative("NOTIFICATION_RETENTION_DAYS", retention_days)?;

        let retention_interval_secs: u64 = parse_var(
            &lookup,
            "NOTIFICATION_RETENTION_INTERVAL_SECS",
            DEFAULT_NOTIFICATION_RETENTION_INTERVAL_SECS,
        )?;
        if retention_interval_secs == 0 {
            return Err(invalid(
                "NOTIFICATION_RETENTION_INTERVAL_SECS",
                "0",
                "must be positive",
            ));
        }

        Ok(Self {
            database_url,
            max_connections,
            voting: VotingConfig {
                voting_period: chrono::Duration::seconds(voting_period),
                min_destructive_voting_period: chrono::Duration::seconds(destructive_period),
                vote_application_threshold: threshold,
                edit_update_limit: update_limit,
            },
            edit_closer_interval: (closer_secs > 0).then(|| Duration::from_secs(closer_secs)),
            notification_retention: chrono::Duration::days(retention_days),
            notification_retention_interval: Duration::from_secs(retention_interval_secs),
        })
    }
}

fn parse_var<F, T>(lookup: &F, name: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(name) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e: T::Err| invalid(name, &raw, &e.to_string())),
    }
}

fn non_negative(name: &'static str, value: i64) -> Result<(), ConfigError> {
    if value < 0 {
        return Err(invalid(name, &value.to_string(), "must not be negative"));
    }
    Ok(())
}

fn invalid(name: &'static str, value: &str, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        name,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use assert_matches::assert_matches;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<WorkerConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        WorkerConfig::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn defaults_apply_when_only_database_url_is_set() {
        let config = load(&[("DATABASE_URL", "postgres://localhost/catalog")]).unwrap();
        assert_eq!(config.max_connections, 20);
        assert_eq!(config.voting, VotingConfig::default());
        assert_eq!(config.edit_closer_interval, Some(Duration::from_secs(300)));
        assert_eq!(config.notification_retention, chrono::Duration::days(30));
        assert_eq!(config.notification_retention_interval, Duration::from_secs(3600));
    }

    #[test]
    fn database_url_is_required() {
        assert_eq!(load(&[]).unwrap_err(), ConfigError::Missing("DATABASE_URL"));
        assert_eq!(
            load(&[("DATABASE_URL", "  ")]).unwrap_err(),
            ConfigError::Missing("DATABASE_URL")
        );
    }

    #[test]
    fn overrides_are_parsed() {
        let config = load(&[
            ("DATABASE_URL", "postgres://localhost/catalog"),
            ("VOTING_PERIOD_SECS", "60"),
            ("MIN_DESTRUCTIVE_VOTING_PERIOD_SECS", "120"),
            ("VOTE_APPLICATION_THRESHOLD", "0"),
            ("EDIT_UPDATE_LIMIT", "2"),
            ("NOTIFICATION_RETENTION_DAYS", "7"),
        ])
        .unwrap();
        assert_eq!(config.voting.voting_period, chrono::Duration::seconds(60));
        assert_eq!(
            config.voting.min_destructive_voting_period,
            chrono::Duration::seconds(120)
        );
        assert_eq!(config.voting.vote_application_threshold, 0);
        assert_eq!(config.voting.edit_update_limit, 2);
        assert_eq!(config.notification_retention, chrono::Duration::days(7));
    }

    #[test]
    fn zero_closer_interval_disables_the_closer() {
        let config = load(&[
            ("DATABASE_URL", "postgres://localhost/catalog"),
            ("EDIT_CLOSER_INTERVAL_SECS", "0"),
        ])
        .unwrap();
        assert_eq!(config.edit_closer_interval, None);
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert_matches!(
            load(&[
                ("DATABASE_URL", "postgres://localhost/catalog"),
                ("VOTE_APPLICATION_THRESHOLD", "three"),
            ]),
            Err(ConfigError::Invalid { name: "VOTE_APPLICATION_THRESHOLD", .. })
        );
        assert_matches!(
            load(&[
                ("DATABASE_URL", "postgres://localhost/catalog"),
                ("VOTING_PERIOD_SECS", "-1"),
            ]),
            Err(ConfigError::Invalid { name: "VOTING_PERIOD_SECS", .. })
        );
        assert_matches!(
            load(&[
                ("DATABASE_URL", "postgres://localhost/catalog"),
                ("NOTIFICATION_RETENTION_INTERVAL_SECS", "0"),
            ]),
            Err(ConfigError::Invalid { name: "NOTIFICATION_RETENTION_INTERVAL_SECS", .. })
        );
    }
}
