use clap::{Parser, Subcommand};
use zen_core::config::ConfigOverrides;
use zen_core::locale::Language;
use zen_core::model::{Frequency, Priority};
use zen_core::store::StatusFilter;

#[derive(Parser, Debug)]
#[command(name = "zen", author, version, about, long_about = None)]
pub struct Cli {
    /// Defaults to the chat transcript when omitted
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Output JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Display language (en or ur)
    #[arg(long, value_name = "LANG", global = true)]
    pub lang: Option<Language>,

    /// Use the built-in rule interpreter even when an API key is set
    #[arg(long, global = true)]
    pub offline: bool,

    /// Override configuration values (format KEY=VALUE)
    #[arg(long = "config-override", value_name = "KEY=VALUE", global = true)]
    pub config_override: Vec<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Sign in locally
    ///
    /// Example: zen login --name Jane --email jane@example.com
    Login {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
    },
    /// Sign out and clear saved tasks
    Logout,
    /// Show the signed-in user
    Whoami,
    /// Add a new task
    ///
    /// Example: zen add "Buy milk" -p high -t errands --due 2026-11-01
    Add {
        title: Option<String>,
        #[arg(short = 'd', long)]
        description: Option<String>,
        #[arg(short = 'p', long)]
        priority: Option<Priority>,
        #[arg(short = 't', long = "tag", value_name = "TAG")]
        tags: Vec<String>,
        /// RFC 3339 timestamp or YYYY-MM-DD
        #[arg(long)]
        due: Option<String>,
        /// daily, weekly or monthly
        #[arg(long)]
        recurring: Option<Frequency>,
    },
    /// List tasks, highest priority first
    ///
    /// Example: zen list --filter active --search eggs
    List {
        #[arg(short = 'f', long, default_value = "all")]
        filter: StatusFilter,
        #[arg(short = 's', long)]
        search: Option<String>,
    },
    /// Show details of a task
    Show {
        id: String,
    },
    /// Flip a task between open and completed
    Toggle {
        id: String,
    },
    /// Edit fields of a task
    ///
    /// Example: zen edit task-1 --title "Buy organic milk" --priority low
    Edit {
        id: String,
        #[arg(long)]
        title: Option<String>,
        /// Empty string clears the description
        #[arg(short = 'd', long)]
        description: Option<String>,
        #[arg(short = 'p', long)]
        priority: Option<Priority>,
        /// Replaces all tags
        #[arg(short = 't', long = "tag", value_name = "TAG")]
        tags: Vec<String>,
        /// Empty string clears the due date
        #[arg(long)]
        due: Option<String>,
        #[arg(long)]
        recurring: Option<Frequency>,
    },
    /// Delete a task
    Delete {
        id: String,
    },
    /// Reopen completed recurring tasks with their next due date
    Recur,
    /// Run one natural-language command
    ///
    /// Example: zen say add buy eggs to my list
    Say {
        #[arg(required = true, num_args = 1.., value_name = "UTTERANCE")]
        utterance: Vec<String>,
    },
    /// Ask the assistant a free-text question
    Ask {
        #[arg(required = true, num_args = 1.., value_name = "QUESTION")]
        question: Vec<String>,
    },
    /// Capture one spoken command
    Voice,
    /// Interactive chat transcript
    Chat,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigOverrideTarget {
    Theme,
    Language,
    ApiUrl,
    Model,
    SttCommand,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedConfigOverride {
    pub target: ConfigOverrideTarget,
    pub value: String,
}

/// Parse a raw `KEY=VALUE` override string into a structured target.
pub fn parse_config_override(raw: &str) -> Result<ParsedConfigOverride, String> {
    let trimmed = raw.trim();
    let (key_raw, value_raw) = trimmed
        .split_once('=')
        .ok_or_else(|| "override must be in KEY=VALUE format".to_string())?;

    let value = value_raw.trim().to_string();
    let canonical_field = canonicalize_flag_name(key_raw)
        .ok_or_else(|| "override key cannot be empty".to_string())?;

    let target = match canonical_field.as_str() {
        "theme" => ConfigOverrideTarget::Theme,
        "language" | "lang" => ConfigOverrideTarget::Language,
        "api_url" => ConfigOverrideTarget::ApiUrl,
        "model" => ConfigOverrideTarget::Model,
        "stt_command" => ConfigOverrideTarget::SttCommand,
        other => return Err(format!("unknown config field '{other}'")),
    };

    Ok(ParsedConfigOverride { target, value })
}

/// Folds every `--config-override` flag into one set of overrides; later
/// flags win.
pub fn collect_overrides(raw: &[String]) -> Result<ConfigOverrides, String> {
    let mut overrides = ConfigOverrides::default();
    for entry in raw {
        let parsed = parse_config_override(entry)?;
        match parsed.target {
            ConfigOverrideTarget::Theme => overrides.theme = Some(parsed.value),
            ConfigOverrideTarget::Language => {
                overrides.language = Some(parsed.value.parse::<Language>()?)
            }
            ConfigOverrideTarget::ApiUrl => overrides.api_url = Some(parsed.value),
            ConfigOverrideTarget::Model => overrides.model = Some(parsed.value),
            ConfigOverrideTarget::SttCommand => {
                overrides.stt_command = Some(
                    parsed
                        .value
                        .split_whitespace()
                        .map(str::to_string)
                        .collect(),
                )
            }
        }
    }
    Ok(overrides)
}

fn canonicalize_flag_name(name: &str) -> Option<String> {
    let mut cleaned = String::new();
    let mut previous_underscore = false;

    for ch in name.chars() {
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
        None
    } else {
        Some(trimmed.to_string())
    }
}
