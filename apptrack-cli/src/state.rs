use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;

/// `$APPTRACK_HOME`, else `~/.apptrack`.
pub fn apptrack_home() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var("APPTRACK_HOME") {
        return Ok(PathBuf::from(dir));
    }
    let home = std::env::var("HOME").context("HOME is not set")?;
    Ok(PathBuf::from(home).join(".apptrack"))
}

pub fn ensure_apptrack_home() -> Result<PathBuf> {
    let dir = apptrack_home()?;
    fs::create_dir_all(&dir).with_context(|| format!("create {}", dir.display()))?;
    Ok(dir)
}

/// Where `alerts --save` keeps a user's last report when no path is given.
pub fn last_report_path(user_id: &str) -> Result<PathBuf> {
    Ok(ensure_apptrack_home()?
        .join("reports")
        .join(format!("{}.json", user_id)))
}
