use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Server configuration sourced from `INNKEEP_*` environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub bind: String,
    pub port: u16,
    pub data_dir: PathBuf,
    /// Prometheus listener port; metrics are off when unset.
    pub metrics_port: Option<u16>,
    /// WAL appends between background compactions.
    pub compact_threshold: u64,
    /// Period of the occupancy sweep; `None` disables it.
    pub reconcile_interval: Option<Duration>,
    /// Load sample rooms and guests into an empty store.
    pub seed: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0".into(),
            port: 3000,
            data_dir: PathBuf::from("./data"),
            metrics_port: None,
            compact_threshold: 1000,
            reconcile_interval: None,
            seed: false,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup. Unparsable values fall back to the default.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let secs: u64 = parsed(&lookup, "INNKEEP_RECONCILE_INTERVAL_SECS").unwrap_or(0);
        Self {
            bind: lookup("INNKEEP_BIND").unwrap_or(defaults.bind),
            port: parsed(&lookup, "INNKEEP_PORT").unwrap_or(defaults.port),
            data_dir: lookup("INNKEEP_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.data_dir),
            metrics_port: parsed(&lookup, "INNKEEP_METRICS_PORT"),
            compact_threshold: parsed(&lookup, "INNKEEP_COMPACT_THRESHOLD")
                .unwrap_or(defaults.compact_threshold),
            reconcile_interval: (secs > 0).then(|| Duration::from_secs(secs)),
            seed: lookup("INNKEEP_SEED").is_some_and(|v| truthy(&v)),
        }
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.bind, self.port)
    }

    pub fn wal_path(&self) -> PathBuf {
        self.data_dir.join("innkeep.wal")
    }
}

fn parsed<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!("ignoring unparsable {key}={raw:?}");
            None
        }
    }
}

fn truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_when_unset() {
        let cfg = config(&[]);
        assert_eq!(cfg, Config::default());
        assert_eq!(cfg.listen_addr(), "0.0.0.0:3000");
        assert_eq!(cfg.wal_path(), PathBuf::from("./data/innkeep.wal"));
    }

    #[test]
    fn reads_every_key() {
        let cfg = config(&[
            ("INNKEEP_BIND", "127.0.0.1"),
            ("INNKEEP_PORT", "8080"),
            ("INNKEEP_DATA_DIR", "/var/lib/innkeep"),
            ("INNKEEP_METRICS_PORT", "9090"),
            ("INNKEEP_COMPACT_THRESHOLD", "50"),
            ("INNKEEP_RECONCILE_INTERVAL_SECS", "60"),
            ("INNKEEP_SEED", "true"),
        ]);
        assert_eq!(cfg.listen_addr(), "127.0.0.1:8080");
        assert_eq!(cfg.wal_path(), PathBuf::from("/var/lib/innkeep/innkeep.wal"));
        assert_eq!(cfg.metrics_port, Some(9090));
        assert_eq!(cfg.compact_threshold, 50);
        assert_eq!(cfg.reconcile_interval, Some(Duration::from_secs(60)));
        assert!(cfg.seed);
    }

    #[test]
    fn bad_values_fall_back() {
        let cfg = config(&[
            ("INNKEEP_PORT", "http"),
            ("INNKEEP_METRICS_PORT", "-1"),
            ("INNKEEP_RECONCILE_INTERVAL_SECS", "0"),
            ("INNKEEP_SEED", "0"),
        ]);
        assert_eq!(cfg.port, 3000);
        assert_eq!(cfg.metrics_port, None);
        assert_eq!(cfg.reconcile_interval, None);
        assert!(!cfg.seed);
    }
}
