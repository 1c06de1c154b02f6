// src/config.rs
use crate::error::SetupError;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use tokio::time::Duration;

pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3030";
pub const DEFAULT_MAX_HISTORY_DAYS: u32 = 3650;

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: SocketAddr,
    pub reference_file: Option<PathBuf>,
    pub rng_seed: Option<u64>,
    pub max_history_days: u32,
    pub watch_interval: Option<Duration>,
}

impl Config {
    pub fn from_env() -> Result<Self, SetupError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, SetupError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let bind_addr = parse_var(&lookup, "BOURSE_BIND_ADDR")?
            .unwrap_or_else(|| SocketAddr::from(([127, 0, 0, 1], 3030)));
        let max_history_days =
            parse_var(&lookup, "BOURSE_MAX_HISTORY_DAYS")?.unwrap_or(DEFAULT_MAX_HISTORY_DAYS);
        if max_history_days == 0 {
            return Err(SetupError::InvalidConfig {
                key: "BOURSE_MAX_HISTORY_DAYS",
                value: "0".into(),
            });
        }
        let watch_interval = match parse_var::<u64, _>(&lookup, "BOURSE_WATCH_INTERVAL_SECS")? {
            Some(0) => {
                return Err(SetupError::InvalidConfig {
                    key: "BOURSE_WATCH_INTERVAL_SECS",
                    value: "0".into(),
                })
            }
            secs => secs.map(Duration::from_secs),
        };

        Ok(Config {
            bind_addr,
            reference_file: lookup("BOURSE_REFERENCE_FILE")
                .filter(|p| !p.trim().is_empty())
                .map(PathBuf::from),
            rng_seed: parse_var(&lookup, "BOURSE_RNG_SEED")?,
            max_history_days,
            watch_interval,
        })
    }
}

fn parse_var<T, F>(lookup: &F, key: &'static str) -> Result<Option<T>, SetupError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) if raw.trim().is_empty() => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| SetupError::InvalidConfig { key, value: raw }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_unset() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.bind_addr.to_string(), DEFAULT_BIND_ADDR);
        assert_eq!(config.max_history_days, DEFAULT_MAX_HISTORY_DAYS);
        assert!(config.reference_file.is_none());
        assert!(config.rng_seed.is_none());
        assert!(config.watch_interval.is_none());
    }

    #[test]
    fn reads_overrides() {
        let config = Config::from_lookup(lookup(&[
            ("BOURSE_BIND_ADDR", "0.0.0.0:8080"),
            ("BOURSE_RNG_SEED", "42"),
            ("BOURSE_MAX_HISTORY_DAYS", "730"),
            ("BOURSE_WATCH_INTERVAL_SECS", "30"),
            ("BOURSE_REFERENCE_FILE", "/etc/bourse/reference.json"),
        ]))
        .unwrap();
        assert_eq!(config.bind_addr.port(), 8080);
        assert_eq!(config.rng_seed, Some(42));
        assert_eq!(config.max_history_days, 730);
        assert_eq!(config.watch_interval, Some(Duration::from_secs(30)));
        assert_eq!(
            config.reference_file.unwrap(),
            PathBuf::from("/etc/bourse/reference.json")
        );
    }

    #[test]
    fn rejects_malformed_values() {
        let err = Config::from_lookup(lookup(&[("BOURSE_RNG_SEED", "lots")])).unwrap_err();
        assert!(matches!(
            err,
            SetupError::InvalidConfig { key: "BOURSE_RNG_SEED", .. }
        ));
        assert!(Config::from_lookup(lookup(&[("BOURSE_MAX_HISTORY_DAYS", "0")])).is_err());
        assert!(Config::from_lookup(lookup(&[("BOURSE_WATCH_INTERVAL_SECS", "0")])).is_err());
        assert!(Config::from_lookup(lookup(&[("BOURSE_BIND_ADDR", "localhost")])).is_err());
    }
}
