use anyhow::{Context, Result};
use apptrack_core::EngineConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::state::ensure_apptrack_home;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Owner id for CSV snapshots when `--user` is not passed.
    #[serde(default = "default_user")]
    pub default_user: String,
    #[serde(default)]
    pub engine: EngineConfig,
}

fn default_user() -> String {
    "me".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_user: default_user(),
            engine: EngineConfig::default(),
        }
    }
}

pub fn config_path() -> Result<PathBuf> {
    Ok(ensure_apptrack_home()?.join("config.toml"))
}

pub fn load_config() -> Result<Config> {
    load_config_from(&config_path()?)
}

/// Missing file means defaults. Policy values are validated by `Engine::new`.
pub fn load_config_from(p: &Path) -> Result<Config> {
    if !p.exists() {
        return Ok(Config::default());
    }
    let s = fs::read_to_string(p).with_context(|| format!("read {}", p.display()))?;
    toml::from_str(&s).with_context(|| format!("parse {}", p.display()))
}

pub fn save_config_to(p: &Path, cfg: &Config) -> Result<()> {
    let s = toml::to_string_pretty(cfg).context("serialize config")?;
    fs::write(p, s).with_context(|| format!("write {}", p.display()))?;
    Ok(())
}

pub fn init_config() -> Result<()> {
    let p = config_path()?;
    if p.exists() {
        println!("Config already exists: {}", p.display());
        return Ok(());
    }
    save_config_to(&p, &Config::default())?;
    println!("Wrote {}", p.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_gives_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        let cfg = load_config_from(&tmp.path().join("config.toml")).unwrap();
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        let p = tmp.path().join("config.toml");
        fs::write(
            &p,
            "default_user = \"maya\"\n\n[engine.risk]\ncritical_floor_hours = 6.0\n",
        )
        .unwrap();

        let cfg = load_config_from(&p).unwrap();
        assert_eq!(cfg.default_user, "maya");
        assert_eq!(cfg.engine.risk.critical_floor_hours, 6.0);
        assert_eq!(cfg.engine.risk.tight_multiplier, EngineConfig::default().risk.tight_multiplier);
        assert_eq!(cfg.engine.bottleneck, EngineConfig::default().bottleneck);
    }

    #[test]
    fn test_save_and_reload() {
        let tmp = tempfile::tempdir().unwrap();
        let p = tmp.path().join("config.toml");
        let mut cfg = Config::default();
        cfg.engine.bottleneck.top_n = 3;
        save_config_to(&p, &cfg).unwrap();
        assert_eq!(load_config_from(&p).unwrap(), cfg);
    }
}
