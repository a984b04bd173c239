use crate::error::AppError;
use crate::locale::Language;
use crate::model::Priority;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const CONFIG_FILE_NAME: &str = "config.json";
const CONFIG_ENV_VAR: &str = "ZEN_CONFIG_PATH";
const API_KEY_ENV_VARS: [&str; 2] = ["ZEN_API_KEY", "API_KEY"];

#[derive(Debug, Clone)]
pub struct Palette {
    pub accent: &'static str,
    pub muted: &'static str,
    pub high: &'static str,
    pub medium: &'static str,
    pub low: &'static str,
    pub reset: &'static str,
}

impl Palette {
    pub fn accentize(&self, text: &str) -> String {
        paint(self.accent, text, self.reset)
    }

    pub fn mutedize(&self, text: &str) -> String {
        paint(self.muted, text, self.reset)
    }

    pub fn priority(&self, priority: Priority, text: &str) -> String {
        let color = match priority {
            Priority::High => self.high,
            Priority::Medium => self.medium,
            Priority::Low => self.low,
        };
        paint(color, text, self.reset)
    }
}

fn paint(color: &str, text: &str, reset: &str) -> String {
    if color.is_empty() {
        text.to_string()
    } else {
        format!("{color}{text}{reset}")
    }
}

pub fn palette_for_theme(theme: Option<&str>) -> Palette {
    match theme.and_then(canonical_theme_name).as_deref() {
        Some("zen") => Palette {
            accent: "\x1b[38;5;73m",
            muted: "\x1b[38;5;245m",
            high: "\x1b[38;5;204m",
            medium: "\x1b[38;5;74m",
            low: "\x1b[38;5;78m",
            reset: "\x1b[0m",
        },
        Some("noir") => Palette {
            accent: "\x1b[38;5;208m",
            muted: "\x1b[38;5;250m",
            high: "\x1b[38;5;203m",
            medium: "\x1b[38;5;117m",
            low: "\x1b[38;5;114m",
            reset: "\x1b[0m",
        },
        _ => Palette {
            accent: "",
            muted: "",
            high: "",
            medium: "",
            low: "",
            reset: "",
        },
    }
}

pub fn canonical_theme_name(raw: &str) -> Option<String> {
    let mut cleaned = String::new();
    let mut previous_underscore = false;

    for ch in raw.chars() {
        if ch.is_ascii_alphanumeric() {
            cleaned.push(ch.to_ascii_lowercase());
            previous_underscore = false;
        } else if !previous_underscore && !cleaned.is_empty() {
            cleaned.push('_');
            previous_underscore = true;
        }
    }

    let trimmed = cleaned.trim_matches('_');
    if trimmed.is_empty() {
        return Some("default".into());
    }

    match trimmed {
        "plain" | "light" | "none" => Some("default".to_string()),
        "dark" | "dark_mode" | "darkmode" => Some("noir".to_string()),
        "calm" | "sky" => Some("zen".to_string()),
        other => Some(other.to_string()),
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub theme: Option<String>,
    #[serde(default)]
    pub language: Option<Language>,
    #[serde(default)]
    pub api_url: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    /// Speech capture program and its arguments; `{locale}` is substituted.
    #[serde(default)]
    pub stt_command: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct ConfigLoad {
    pub config: Config,
    pub error: Option<AppError>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ConfigOverrides {
    pub theme: Option<String>,
    pub language: Option<Language>,
    pub api_url: Option<String>,
    pub model: Option<String>,
    pub stt_command: Option<Vec<String>>,
}

pub fn config_path() -> Result<PathBuf, AppError> {
    if let Ok(path) = std::env::var(CONFIG_ENV_VAR)
        && !path.trim().is_empty()
    {
        return Ok(PathBuf::from(path));
    }

    if cfg!(windows) {
        let appdata =
            std::env::var("APPDATA").map_err(|_| AppError::invalid_data("APPDATA is not set"))?;
        Ok(PathBuf::from(appdata).join("zen").join(CONFIG_FILE_NAME))
    } else {
        let home = std::env::var("HOME").map_err(|_| AppError::invalid_data("HOME is not set"))?;
        Ok(PathBuf::from(home)
            .join(".config")
            .join("zen")
            .join(CONFIG_FILE_NAME))
    }
}

pub fn load_config_with_fallback() -> ConfigLoad {
    match config_path() {
        Ok(path) => load_config_with_fallback_from_path(&path),
        Err(err) => ConfigLoad {
            config: Config::default(),
            error: Some(err),
        },
    }
}

fn load_config_with_fallback_from_path(path: &Path) -> ConfigLoad {
    if !path.exists() {
        return ConfigLoad {
            config: Config::default(),
            error: None,
        };
    }

    match load_config_from_path(path) {
        Ok(config) => ConfigLoad {
            config,
            error: None,
        },
        Err(err) => ConfigLoad {
            config: Config::default(),
            error: Some(err),
        },
    }
}

fn load_config_from_path(path: &Path) -> Result<Config, AppError> {
    let content = std::fs::read_to_string(path)
        .map_err(|err| AppError::io(format!("{}: {}", path.display(), err)))?;
    let mut config: Config = serde_json::from_str(&content).map_err(|err| {
        AppError::invalid_data(format!("invalid JSON in {}: {}", path.display(), err))
    })?;
    config.theme = config.theme.and_then(|name| canonical_theme_name(&name));
    Ok(config)
}

pub fn merge_overrides(base: &Config, overrides: &ConfigOverrides) -> Config {
    let mut merged = base.clone();
    if let Some(normalized) = overrides
        .theme
        .as_deref()
        .and_then(canonical_theme_name)
    {
        merged.theme = Some(normalized);
    }
    if let Some(language) = overrides.language {
        merged.language = Some(language);
    }
    if let Some(api_url) = overrides.api_url.as_ref() {
        merged.api_url = Some(api_url.clone());
    }
    if let Some(model) = overrides.model.as_ref() {
        merged.model = Some(model.clone());
    }
    if let Some(command) = overrides.stt_command.as_ref() {
        merged.stt_command = command.clone();
    }

    merged
}

/// Interpreter credential, if any. Never read from the config file.
pub fn api_key_from_env() -> Option<String> {
    API_KEY_ENV_VARS.iter().find_map(|name| {
        std::env::var(name)
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    })
}

#[cfg(test)]
mod tests {
    use super::{
        Config, ConfigOverrides, canonical_theme_name, load_config_from_path,
        load_config_with_fallback_from_path, merge_overrides, palette_for_theme,
    };
    use crate::locale::Language;
    use crate::model::Priority;
    use std::fs;
    use std::path::PathBuf;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_path(file_name: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        std::env::temp_dir().join(format!("zen-{nanos}-{file_name}"))
    }

    #[test]
    fn load_config_missing_returns_defaults() {
        let path = temp_path("missing-config.json");
        let result = load_config_with_fallback_from_path(&path);

        assert_eq!(result.config, Config::default());
        assert!(result.error.is_none());
    }

    #[test]
    fn load_config_invalid_returns_defaults_and_error() {
        let path = temp_path("invalid-config.json");
        fs::write(&path, "{ invalid json ").unwrap();

        let result = load_config_with_fallback_from_path(&path);
        fs::remove_file(&path).ok();

        assert_eq!(result.config, Config::default());
        assert_eq!(result.error.unwrap().code(), "invalid_data");
    }

    #[test]
    fn load_config_reads_valid_file() {
        let path = temp_path("valid-config.json");
        let content = serde_json::json!({
            "theme": "Dark Mode",
            "language": "ur",
            "model": "gemini-test",
            "stt_command": ["listen", "--locale", "{locale}"]
        });
        fs::write(&path, serde_json::to_string(&content).unwrap()).unwrap();

        let loaded = load_config_from_path(&path).unwrap();
        fs::remove_file(&path).ok();

        assert_eq!(loaded.theme.as_deref(), Some("noir"));
        assert_eq!(loaded.language, Some(Language::Ur));
        assert_eq!(loaded.model.as_deref(), Some("gemini-test"));
        assert_eq!(loaded.api_url, None);
        assert_eq!(loaded.stt_command.len(), 3);
    }

    #[test]
    fn merge_overrides_replaces_only_given_fields() {
        let base = Config {
            theme: Some("default".into()),
            language: Some(Language::En),
            model: Some("base-model".into()),
            ..Config::default()
        };

        let overrides = ConfigOverrides {
            theme: Some("Calm".into()),
            language: Some(Language::Ur),
            stt_command: Some(vec!["listen".into()]),
            ..ConfigOverrides::default()
        };

        let merged = merge_overrides(&base, &overrides);

        assert_eq!(base.theme.as_deref(), Some("default"));
        assert_eq!(merged.theme.as_deref(), Some("zen"));
        assert_eq!(merged.language, Some(Language::Ur));
        assert_eq!(merged.model.as_deref(), Some("base-model"));
        assert_eq!(merged.stt_command, vec!["listen".to_string()]);
    }

    #[test]
    fn merge_overrides_with_empty_overrides_returns_clone() {
        let base = Config {
            theme: Some("noir".into()),
            api_url: Some("https://api.example.com/v1/chat/completions".into()),
            ..Config::default()
        };

        let merged = merge_overrides(&base, &ConfigOverrides::default());

        assert_eq!(merged, base);
    }

    #[test]
    fn canonical_theme_name_maps_variants() {
        assert_eq!(canonical_theme_name("Light"), Some("default".into()));
        assert_eq!(canonical_theme_name("Noir"), Some("noir".into()));
        assert_eq!(canonical_theme_name("dark-mode"), Some("noir".into()));
        assert_eq!(canonical_theme_name("sky"), Some("zen".into()));
        assert_eq!(canonical_theme_name("  "), Some("default".into()));
    }

    #[test]
    fn palette_colors_priorities_per_theme() {
        let plain = palette_for_theme(Some("light"));
        assert_eq!(plain.priority(Priority::High, "high"), "high");
        assert_eq!(plain.accentize("zen"), "zen");

        let zen = palette_for_theme(Some("zen"));
        assert_eq!(
            zen.priority(Priority::High, "high"),
            "\x1b[38;5;204mhigh\x1b[0m"
        );
        assert_eq!(zen.muted, "\x1b[38;5;245m");

        let unknown = palette_for_theme(Some("oceanic"));
        assert!(unknown.accent.is_empty());
        assert!(palette_for_theme(None).high.is_empty());
    }
}
