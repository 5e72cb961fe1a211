// src/config.rs
//! Service configuration: storage path, scheduler cadences, retention
//! horizon, fetch timeout, and the source table. Loaded from TOML with an
//! env-var path override; every field has a production default so the
//! service boots with no config file at all.

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;

pub const ENV_CONFIG_PATH: &str = "GPRESS_CONFIG_PATH";
pub const DEFAULT_CONFIG_PATH: &str = "config/gpress.toml";

#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    /// Stable source key, e.g. "hindu". Doubles as the store discriminator.
    pub id: String,
    /// Program invoked for one fetch of this source.
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,
    /// Ingestion cycle cadence. Production scrapes every 2 hours.
    #[serde(default = "default_scrape_interval_secs")]
    pub scrape_interval_secs: u64,
    /// Retention cycle cadence, daily by default.
    #[serde(default = "default_cleanup_interval_secs")]
    pub cleanup_interval_secs: u64,
    /// Articles published before now − retention_days are swept.
    #[serde(default = "default_retention_days")]
    pub retention_days: i64,
    /// Upper bound on a single fetch process run.
    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,
    #[serde(default = "default_sources", rename = "source")]
    pub sources: Vec<SourceConfig>,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("data/gpress.db")
}

fn default_scrape_interval_secs() -> u64 {
    2 * 3600
}

fn default_cleanup_interval_secs() -> u64 {
    24 * 3600
}

fn default_retention_days() -> i64 {
    10
}

fn default_fetch_timeout_secs() -> u64 {
    120
}

fn default_sources() -> Vec<SourceConfig> {
    let python = |script: &str| SourceConfig {
        id: String::new(),
        command: "python".to_string(),
        args: vec![format!("scrapers/{script}")],
    };
    vec![
        SourceConfig {
            id: "hindu".into(),
            ..python("hindu_scraper.py")
        },
        SourceConfig {
            id: "hindustan-times".into(),
            ..python("hindustan_scraper.py")
        },
        SourceConfig {
            id: "toi".into(),
            ..python("times_of_india_scraper.py")
        },
        SourceConfig {
            id: "ie".into(),
            ..python("indian_express.py")
        },
        SourceConfig {
            id: "dna".into(),
            ..python("dna_scraper.py")
        },
    ]
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            scrape_interval_secs: default_scrape_interval_secs(),
            cleanup_interval_secs: default_cleanup_interval_secs(),
            retention_days: default_retention_days(),
            fetch_timeout_secs: default_fetch_timeout_secs(),
            sources: default_sources(),
        }
    }
}

impl Config {
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let cfg: Config = toml::from_str(s).context("parsing config toml")?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        Self::from_toml_str(&content)
    }

    /// Load using env var + fallbacks:
    /// 1) $GPRESS_CONFIG_PATH (must exist if set)
    /// 2) config/gpress.toml
    /// 3) built-in defaults
    pub fn load_default() -> Result<Self> {
        if let Ok(p) = std::env::var(ENV_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if !pb.exists() {
                return Err(anyhow!("GPRESS_CONFIG_PATH points to non-existent path"));
            }
            return Self::from_path(&pb);
        }
        let conventional = PathBuf::from(DEFAULT_CONFIG_PATH);
        if conventional.exists() {
            return Self::from_path(&conventional);
        }
        Ok(Self::default())
    }

    fn validate(&self) -> Result<()> {
        if self.retention_days <= 0 {
            return Err(anyhow!("retention_days must be positive"));
        }
        if self.fetch_timeout_secs == 0 {
            return Err(anyhow!("fetch_timeout_secs must be positive"));
        }
        for s in &self.sources {
            if s.id.trim().is_empty() {
                return Err(anyhow!("source with empty id"));
            }
            if s.command.trim().is_empty() {
                return Err(anyhow!("source {} has empty command", s.id));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{env, fs};

    #[test]
    fn defaults_carry_the_production_sources() {
        let cfg = Config::default();
        assert_eq!(cfg.retention_days, 10);
        assert_eq!(cfg.scrape_interval_secs, 7200);
        let ids: Vec<_> = cfg.sources.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["hindu", "hindustan-times", "toi", "ie", "dna"]);
    }

    #[test]
    fn toml_overrides_and_defaults_mix() {
        let cfg = Config::from_toml_str(
            r#"
            retention_days = 3

            [[source]]
            id = "local"
            command = "./fetch.sh"
            args = ["--fast"]
            "#,
        )
        .unwrap();
        assert_eq!(cfg.retention_days, 3);
        assert_eq!(cfg.fetch_timeout_secs, 120);
        assert_eq!(cfg.sources.len(), 1);
        assert_eq!(cfg.sources[0].args, vec!["--fast".to_string()]);
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert!(Config::from_toml_str("retention_days = 0").is_err());
        assert!(Config::from_toml_str(
            r#"
            [[source]]
            id = "  "
            command = "x"
            "#
        )
        .is_err());
    }

    #[serial_test::serial]
    #[test]
    fn env_path_wins_over_conventional_file() {
        let tmp = tempfile::tempdir().unwrap();
        let p = tmp.path().join("gpress.toml");
        fs::write(&p, "retention_days = 7").unwrap();
        env::set_var(ENV_CONFIG_PATH, p.display().to_string());
        let cfg = Config::load_default().unwrap();
        assert_eq!(cfg.retention_days, 7);
        env::remove_var(ENV_CONFIG_PATH);
    }
}
