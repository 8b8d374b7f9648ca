use anyhow::{Context, Result};
use cardstmt_export::OutputFormat;
use cardstmt_ingest::{LayoutKind, DEFAULT_LINE_TOLERANCE};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::state::{cardstmt_home, ensure_cardstmt_home};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub default_format: OutputFormat,
    pub layout: LayoutKind,
    /// Where converted files go. Unset: next to the source document.
    pub destination_dir: Option<PathBuf>,
    pub overwrite: bool,
    pub line_tolerance: f32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_format: OutputFormat::Tsv,
            layout: LayoutKind::Ics,
            destination_dir: None,
            overwrite: false,
            line_tolerance: DEFAULT_LINE_TOLERANCE,
        }
    }
}

pub fn config_path() -> Result<PathBuf> {
    Ok(cardstmt_home()?.join("config.toml"))
}

pub fn load_config() -> Result<Config> {
    load_config_from(&config_path()?)
}

pub fn load_config_from(p: &Path) -> Result<Config> {
    if !p.exists() {
        return Ok(Config::default());
    }
    let s = fs::read_to_string(p).with_context(|| format!("read {}", p.display()))?;
    toml::from_str(&s).with_context(|| format!("parse {}", p.display()))
}

pub fn save_config(cfg: &Config) -> Result<()> {
    let p = ensure_cardstmt_home()?.join("config.toml");
    let s = toml::to_string_pretty(cfg).context("serialize config")?;
    fs::write(&p, s).with_context(|| format!("write {}", p.display()))?;
    Ok(())
}

pub fn init_config() -> Result<()> {
    let p = config_path()?;
    if p.exists() {
        println!("Config already exists: {}", p.display());
        return Ok(());
    }
    save_config(&Config::default())?;
    println!("Wrote {}", p.display());
    Ok(())
}

pub fn show_config(cfg: &Config) -> Result<()> {
    println!("# {}", config_path()?.display());
    print!("{}", toml::to_string_pretty(cfg).context("serialize config")?);
    Ok(())
}
