use anyhow::{Context, Result};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use momo_core::time::{DEFAULT_TIMEZONE, parse_timezone};
use momo_core::{Categorizer, CategoryRule};

pub const DEFAULT_CONFIG_FILE: &str = "momo.toml";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub input: InputSection,
    pub output: OutputSection,
    pub logging: LoggingSection,
    pub extract: ExtractSection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputSection {
    /// XML backup or JSON export of SMS messages
    pub path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputSection {
    pub database: PathBuf,
    pub dashboard_json: Option<PathBuf>,
    pub transactions_csv: Option<PathBuf>,
    pub dead_letter_dir: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    pub level: String,
    pub file: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractSection {
    /// IANA timezone for SMS timestamps
    pub timezone: String,
    /// Replaces the built-in keyword table when non-empty (order is priority)
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub categories: Vec<CategoryRule>,
}

impl Default for InputSection {
    fn default() -> Self {
        Self {
            path: PathBuf::from("data/raw/momo.xml"),
        }
    }
}

impl Default for OutputSection {
    fn default() -> Self {
        Self {
            database: PathBuf::from("data/processed/transactions.db"),
            dashboard_json: Some(PathBuf::from("data/processed/dashboard.json")),
            transactions_csv: None,
            dead_letter_dir: PathBuf::from("data/logs/dead_letter"),
        }
    }
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: Some(PathBuf::from("data/logs/etl.log")),
        }
    }
}

impl Default for ExtractSection {
    fn default() -> Self {
        Self {
            timezone: DEFAULT_TIMEZONE.to_string(),
            categories: Vec::new(),
        }
    }
}

impl Config {
    pub fn timezone(&self) -> Result<Tz> {
        parse_timezone(&self.extract.timezone)
    }

    pub fn categorizer(&self) -> Categorizer {
        if self.extract.categories.is_empty() {
            Categorizer::default()
        } else {
            Categorizer::new(self.extract.categories.iter().cloned())
        }
    }

    /// `XML_INPUT_PATH` and `DATABASE_URL` take precedence over the file.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(path) = lookup("XML_INPUT_PATH").filter(|s| !s.is_empty()) {
            self.input.path = PathBuf::from(path);
        }
        if let Some(url) = lookup("DATABASE_URL").filter(|s| !s.is_empty()) {
            self.output.database = database_path_from_url(&url);
        }
    }
}

/// `sqlite:///data/x.db` -> `data/x.db`; plain paths pass through.
pub fn database_path_from_url(url: &str) -> PathBuf {
    PathBuf::from(url.strip_prefix("sqlite:///").unwrap_or(url))
}

pub fn config_path(explicit: Option<&Path>) -> PathBuf {
    explicit
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE))
}

/// Defaults, then the file if it exists, then the environment.
pub fn load_config(path: &Path) -> Result<Config> {
    let mut cfg = if path.exists() {
        let s = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
        toml::from_str(&s).with_context(|| format!("parse {}", path.display()))?
    } else {
        Config::default()
    };
    cfg.apply_env(|key| std::env::var(key).ok());
    Ok(cfg)
}

pub fn save_config(path: &Path, cfg: &Config) -> Result<()> {
    let s = toml::to_string_pretty(cfg).context("serialize config")?;
    fs::write(path, s).with_context(|| format!("write {}", path.display()))?;
    Ok(())
}

pub fn init_config(path: &Path) -> Result<()> {
    if path.exists() {
        println!("Config already exists: {}", path.display());
        return Ok(());
    }
    save_config(path, &Config::default())?;
    println!("Wrote {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use momo_core::Category;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let cfg: Config = toml::from_str(
            r#"
[input]
path = "sms.json"

[extract]
timezone = "UTC"
"#,
        )
        .unwrap();
        assert_eq!(cfg.input.path, PathBuf::from("sms.json"));
        assert_eq!(cfg.output, OutputSection::default());
        assert_eq!(cfg.logging.level, "info");
        assert_eq!(cfg.timezone().unwrap(), chrono_tz::Tz::UTC);
    }

    #[test]
    fn test_env_overrides() {
        let mut cfg = Config::default();
        cfg.apply_env(|key| match key {
            "XML_INPUT_PATH" => Some("in/backup.xml".to_string()),
            "DATABASE_URL" => Some("sqlite:///mobilemoney.db".to_string()),
            _ => None,
        });
        assert_eq!(cfg.input.path, PathBuf::from("in/backup.xml"));
        assert_eq!(cfg.output.database, PathBuf::from("mobilemoney.db"));
    }

    #[test]
    fn test_database_url_stripping() {
        assert_eq!(database_path_from_url("sqlite:///a/b.db"), PathBuf::from("a/b.db"));
        assert_eq!(database_path_from_url("plain.db"), PathBuf::from("plain.db"));
    }

    #[test]
    fn test_custom_category_table() {
        let cfg: Config = toml::from_str(
            r#"
[[extract.categories]]
category = "food"
keywords = ["pizza"]
"#,
        )
        .unwrap();
        let c = cfg.categorizer();
        assert_eq!(c.categorize("pizza night"), Category::Food);
        assert_eq!(c.categorize("electricity bill"), Category::Other);
        assert_eq!(Config::default().categorizer().categorize("electricity bill"), Category::Bills);
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("momo.toml");
        init_config(&path).unwrap();
        let text = fs::read_to_string(&path).unwrap();
        let back: Config = toml::from_str(&text).unwrap();
        assert_eq!(back, Config::default());
    }

    #[test]
    fn test_missing_file_means_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg: Config = toml::from_str("").unwrap();
        assert_eq!(cfg, Config::default());
        assert!(!config_path(Some(&dir.path().join("nope.toml"))).exists());
    }
}
