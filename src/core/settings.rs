//! Settings module
//!
//! This module contains user-configurable settings for proctree, read from
//! an htoprc-style `key=value` file.

use std::fs;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use super::error::SettingsError;

/// Color scheme options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorScheme {
    #[default]
    Default,
    Monochrome,
}

impl ColorScheme {
    pub fn from_i32(value: i32) -> Self {
        match value {
            1 => ColorScheme::Monochrome,
            _ => ColorScheme::Default,
        }
    }
}

/// User settings
#[derive(Debug, Clone)]
pub struct Settings {
    pub filename: Option<PathBuf>,

    /// Refresh interval in tenths of seconds
    pub delay: u32,
    pub allow_unicode: bool,
    pub auto_refresh: bool,
    pub color_scheme: ColorScheme,
    /// Root of the process information source
    pub proc_root: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Settings::new()
    }
}

impl Settings {
    pub fn new() -> Self {
        Settings {
            filename: Self::default_config_path(),
            delay: 20, // 2 seconds
            allow_unicode: true,
            auto_refresh: true,
            color_scheme: ColorScheme::Default,
            proc_root: PathBuf::from("/proc"),
        }
    }

    /// Get the default config file path
    fn default_config_path() -> Option<PathBuf> {
        Self::config_dir().map(|dir| dir.join("proctree").join("proctreerc"))
    }

    pub fn config_dir() -> Option<PathBuf> {
        std::env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))
    }

    /// Load settings from the config file, if there is one
    pub fn load(&mut self) -> Result<(), SettingsError> {
        let path = match &self.filename {
            Some(p) => p.clone(),
            None => return Ok(()),
        };

        if !path.exists() {
            return Ok(());
        }

        self.load_from(&path)
    }

    pub fn load_from(&mut self, path: &Path) -> Result<(), SettingsError> {
        let read_err = |source| SettingsError::Read {
            path: path.to_path_buf(),
            source,
        };
        let file = fs::File::open(path).map_err(read_err)?;
        let reader = BufReader::new(file);

        for line in reader.lines() {
            let line = line.map_err(read_err)?;
            let line = line.trim();

            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            if let Some((key, value)) = line.split_once('=') {
                self.parse_setting(key.trim(), value.trim());
            }
        }

        Ok(())
    }

    /// Parse a single setting line
    fn parse_setting(&mut self, key: &str, value: &str) {
        match key {
            "delay" => {
                if let Ok(v) = value.parse::<u32>() {
                    self.delay = v.clamp(1, 100);
                }
            }
            "allow_unicode" => {
                self.allow_unicode = value == "1";
            }
            "auto_refresh" => {
                self.auto_refresh = value == "1";
            }
            "color_scheme" => {
                if let Ok(v) = value.parse::<i32>() {
                    self.color_scheme = ColorScheme::from_i32(v);
                }
            }
            "proc_root" => {
                if !value.is_empty() {
                    self.proc_root = PathBuf::from(value);
                }
            }
            _ => {}
        }
    }

    /// Refresh interval
    pub fn refresh_interval(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.delay as u64 * 100)
    }
}
