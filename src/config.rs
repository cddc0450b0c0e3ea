use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use serde::Deserialize;

use crate::data::aggregate::TrendGranularity;

/// Settings file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "skyfare.toml";

/// Environment variable naming an explicit settings file.
pub const CONFIG_ENV: &str = "SKYFARE_CONFIG";

/// Dashboard settings. Every field has a default, so an empty file is valid.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Booking file opened at startup.
    pub data_path: Option<PathBuf>,
    /// Bucket size of the price trend chart.
    pub trend_granularity: TrendGranularity,
    /// Bars shown in the popular-routes chart.
    pub top_routes: usize,
    /// Initial window size in points.
    pub window_size: [f32; 2],
    /// Whether the insights panel is populated.
    pub insights: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_path: None,
            trend_granularity: TrendGranularity::Day,
            top_routes: 10,
            window_size: [1280.0, 820.0],
            insights: true,
        }
    }
}

/// Load settings from `explicit`, else `skyfare.toml` if present, else defaults.
/// An explicit path that does not exist is an error.
pub fn load_settings(explicit: Option<&Path>) -> Result<Settings> {
    let (candidate, explicit_provided) = match explicit {
        Some(path) => (path.to_path_buf(), true),
        None => (PathBuf::from(DEFAULT_CONFIG_FILE), false),
    };

    if candidate.exists() {
        let raw = std::fs::read_to_string(&candidate)
            .with_context(|| format!("failed to read settings from {}", candidate.display()))?;
        let parsed = toml::from_str(&raw)
            .with_context(|| format!("failed to parse TOML settings at {}", candidate.display()))?;
        Ok(parsed)
    } else if explicit_provided {
        bail!("settings file not found at {}", candidate.display());
    } else {
        Ok(Settings::default())
    }
}

/// Settings for this process: `$SKYFARE_CONFIG` or the working-directory file,
/// with `data_path` overridden by a command-line argument when given.
pub fn from_env(cli_data_path: Option<PathBuf>) -> Result<Settings> {
    let explicit = std::env::var_os(CONFIG_ENV).map(PathBuf::from);
    let mut settings = load_settings(explicit.as_deref())?;
    if cli_data_path.is_some() {
        settings.data_path = cli_data_path;
    }
    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn missing_explicit_path_is_an_error() {
        let result = load_settings(Some(Path::new("definitely_missing_skyfare.toml")));
        assert!(result.is_err());
    }

    #[test]
    fn parses_partial_toml_over_defaults() {
        let file = NamedTempFile::new().expect("temp file");
        std::fs::write(
            file.path(),
            r#"data_path = "data/bookings.csv"
trend_granularity = "week"
top_routes = 5
"#,
        )
        .expect("write settings");

        let settings = load_settings(Some(file.path())).expect("settings");
        assert_eq!(settings.data_path, Some(PathBuf::from("data/bookings.csv")));
        assert_eq!(settings.trend_granularity, TrendGranularity::Week);
        assert_eq!(settings.top_routes, 5);
        assert_eq!(settings.window_size, Settings::default().window_size);
        assert!(settings.insights);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let file = NamedTempFile::new().expect("temp file");
        std::fs::write(file.path(), "top_rout = 3\n").expect("write settings");
        assert!(load_settings(Some(file.path())).is_err());
    }

    #[test]
    fn bad_granularity_is_rejected() {
        let file = NamedTempFile::new().expect("temp file");
        std::fs::write(file.path(), "trend_granularity = \"hourly\"\n").expect("write settings");
        assert!(load_settings(Some(file.path())).is_err());
    }
}
