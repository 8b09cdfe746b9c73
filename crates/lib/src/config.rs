//! Configuration types and loading.
//!
//! Config is loaded from a JSON file (e.g. `~/.doctor-agent/config.json`) and environment.
//! Every field has a default, so an empty `{}` file is a valid configuration.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_MODEL: &str = "gpt-4o";
pub const DEFAULT_LLM_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MAX_ITERATIONS: usize = 10;
pub const DEFAULT_PACING_MS: u64 = 100;
pub const DEFAULT_DRUG_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_LLM_TIMEOUT_SECS: u64 = 120;

/// Top-level application config.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// HTTP server settings.
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Language model settings and loop limits.
    #[serde(default)]
    pub agents: AgentsConfig,

    /// Skill root override.
    #[serde(default)]
    pub skills: SkillsConfig,

    /// Prompt template directory override.
    #[serde(default)]
    pub prompts: PromptsConfig,

    /// Drug terminology lookup (RxNorm).
    #[serde(default)]
    pub drugs: DrugsConfig,

    /// Daily log files.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Gateway bind and port.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayConfig {
    /// HTTP port (default 8000).
    #[serde(default = "default_gateway_port")]
    pub port: u16,

    /// Bind address (default "127.0.0.1").
    #[serde(default = "default_gateway_bind")]
    pub bind: String,
}

fn default_gateway_port() -> u16 {
    8000
}

fn default_gateway_bind() -> String {
    "127.0.0.1".to_string()
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_gateway_port(),
            bind: default_gateway_bind(),
        }
    }
}

/// Model endpoint and agent loop settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentsConfig {
    /// Chat model id (default "gpt-4o"). Overridden by DOCTOR_AGENT_MODEL env.
    pub model: Option<String>,
    /// OpenAI-compatible base URL including the version segment (default https://api.openai.com/v1). Overridden by OPENAI_BASE_URL env.
    pub base_url: Option<String>,
    /// API key. Overridden by OPENAI_API_KEY env.
    pub api_key: Option<String>,
    /// Upper bound on model calls per chat request (default and maximum 10).
    pub max_iterations: Option<usize>,
    /// Per-request timeout for model calls in seconds (default 120).
    pub timeout_secs: Option<u64>,
    /// Delay between streamed events in milliseconds (default 100). Zero disables pacing.
    pub pacing_ms: Option<u64>,
}

/// Skill root override.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillsConfig {
    /// Load skills from this directory instead of the config directory's `skills` subdirectory. Relative paths are resolved against the config file's parent.
    #[serde(default)]
    pub directory: Option<PathBuf>,
}

/// Prompt template directory override.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptsConfig {
    /// Load `system.md` from this directory instead of the config directory's `prompts` subdirectory.
    #[serde(default)]
    pub directory: Option<PathBuf>,
}

/// RxNorm lookup settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DrugsConfig {
    /// When false, medication options always come from the bundled fallback data.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// RxNav REST base URL (default https://rxnav.nlm.nih.gov/REST).
    pub base_url: Option<String>,
    /// Per-request timeout in seconds (default 10).
    pub timeout_secs: Option<u64>,
}

fn default_true() -> bool {
    true
}

impl Default for DrugsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: None,
            timeout_secs: None,
        }
    }
}

/// Daily log files: `doctor-agent-YYYY-MM-DD.log` (debug and above) and `error-YYYY-MM-DD.log`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoggingConfig {
    /// When false, logs go to stderr only.
    #[serde(default = "default_true")]
    pub file: bool,
    /// Log directory (default `logs` beside the config file). Relative paths are resolved against the config file's parent.
    #[serde(default)]
    pub directory: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            file: true,
            directory: None,
        }
    }
}

/// Non-empty trimmed value of an environment variable.
fn env_non_empty(key: &str) -> Option<String> {
    std::env::var(key).ok().and_then(|s| {
        let t = s.trim();
        if t.is_empty() {
            None
        } else {
            Some(t.to_string())
        }
    })
}

fn non_empty(value: Option<&String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Resolve the API key: env OPENAI_API_KEY overrides config.
pub fn resolve_api_key(config: &Config) -> Option<String> {
    env_non_empty("OPENAI_API_KEY").or_else(|| non_empty(config.agents.api_key.as_ref()))
}

/// Resolve the model id: env DOCTOR_AGENT_MODEL, then config, then DEFAULT_MODEL.
pub fn resolve_model(config: &Config) -> String {
    env_non_empty("DOCTOR_AGENT_MODEL")
        .or_else(|| non_empty(config.agents.model.as_ref()))
        .unwrap_or_else(|| DEFAULT_MODEL.to_string())
}

/// Resolve the LLM base URL: env OPENAI_BASE_URL, then config, then DEFAULT_LLM_BASE_URL.
pub fn resolve_llm_base_url(config: &Config) -> String {
    env_non_empty("OPENAI_BASE_URL")
        .or_else(|| non_empty(config.agents.base_url.as_ref()))
        .unwrap_or_else(|| DEFAULT_LLM_BASE_URL.to_string())
}

/// Iteration cap for the agent loop. Config may lower it but never raise it above the default; zero falls back to the default.
pub fn resolve_max_iterations(config: &Config) -> usize {
    config
        .agents
        .max_iterations
        .filter(|n| *n > 0)
        .map(|n| n.min(DEFAULT_MAX_ITERATIONS))
        .unwrap_or(DEFAULT_MAX_ITERATIONS)
}

pub fn resolve_llm_timeout(config: &Config) -> Duration {
    Duration::from_secs(
        config
            .agents
            .timeout_secs
            .filter(|n| *n > 0)
            .unwrap_or(DEFAULT_LLM_TIMEOUT_SECS),
    )
}

pub fn resolve_pacing(config: &Config) -> Duration {
    Duration::from_millis(config.agents.pacing_ms.unwrap_or(DEFAULT_PACING_MS))
}

pub fn resolve_drug_timeout(config: &Config) -> Duration {
    Duration::from_secs(
        config
            .drugs
            .timeout_secs
            .filter(|n| *n > 0)
            .unwrap_or(DEFAULT_DRUG_TIMEOUT_SECS),
    )
}

/// Resolve config path from env or default.
pub fn default_config_path() -> PathBuf {
    std::env::var("DOCTOR_AGENT_CONFIG_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            dirs::home_dir()
                .map(|h| h.join(".doctor-agent").join("config.json"))
                .unwrap_or_else(|| PathBuf::from("config.json"))
        })
}

/// Load config from the given path, or the default path (DOCTOR_AGENT_CONFIG_PATH). Missing file => default config.
/// Returns the config and the path that was used (for resolving the config directory).
pub fn load_config(path: Option<PathBuf>) -> Result<(Config, PathBuf)> {
    let path = path.unwrap_or_else(default_config_path);
    let config = if !path.exists() {
        log::debug!("config file not found, using defaults: {}", path.display());
        Config::default()
    } else {
        let s = std::fs::read_to_string(&path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        serde_json::from_str(&s)
            .with_context(|| format!("parsing config from {}", path.display()))?
    };
    Ok((config, path))
}

fn config_parent(config_path: &Path) -> &Path {
    config_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."))
}

/// `override_dir` when set (relative paths resolved against the config file's parent), else `<config dir>/<default_name>`.
fn resolve_dir(override_dir: Option<&PathBuf>, config_path: &Path, default_name: &str) -> PathBuf {
    let parent = config_parent(config_path);
    match override_dir {
        Some(d) if !d.as_os_str().is_empty() => {
            if d.is_absolute() {
                d.clone()
            } else {
                parent.join(d)
            }
        }
        _ => parent.join(default_name),
    }
}

/// Resolve the skill root: `config.skills.directory` if set, otherwise the `skills` subdirectory of the config directory.
pub fn resolve_skills_dir(config: &Config, config_path: &Path) -> PathBuf {
    resolve_dir(config.skills.directory.as_ref(), config_path, "skills")
}

/// Resolve the prompt template directory: `config.prompts.directory` if set, otherwise `prompts` beside the config file.
pub fn resolve_prompts_dir(config: &Config, config_path: &Path) -> PathBuf {
    resolve_dir(config.prompts.directory.as_ref(), config_path, "prompts")
}

/// Resolve the log directory, or None when file logging is disabled.
pub fn resolve_log_dir(config: &Config, config_path: &Path) -> Option<PathBuf> {
    if !config.logging.file {
        return None;
    }
    Some(resolve_dir(config.logging.directory.as_ref(), config_path, "logs"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_gateway_port_and_bind() {
        let g = GatewayConfig::default();
        assert_eq!(g.port, 8000);
        assert_eq!(g.bind, "127.0.0.1");
    }

    #[test]
    fn empty_object_parses_to_defaults() {
        let config: Config = serde_json::from_str("{}").unwrap();
        assert_eq!(config.gateway.port, 8000);
        assert!(config.drugs.enabled);
        assert_eq!(resolve_max_iterations(&config), DEFAULT_MAX_ITERATIONS);
        assert_eq!(resolve_pacing(&config), Duration::from_millis(100));
        assert_eq!(resolve_drug_timeout(&config), Duration::from_secs(10));
        assert_eq!(resolve_llm_timeout(&config), Duration::from_secs(120));
        assert!(config.logging.file);
    }

    #[test]
    fn camel_case_keys_are_read() {
        let config: Config = serde_json::from_str(
            r#"{"agents":{"maxIterations":3,"pacingMs":0,"timeoutSecs":30},"drugs":{"enabled":false,"timeoutSecs":2}}"#,
        )
        .unwrap();
        assert_eq!(resolve_max_iterations(&config), 3);
        assert_eq!(resolve_pacing(&config), Duration::ZERO);
        assert_eq!(resolve_llm_timeout(&config), Duration::from_secs(30));
        assert!(!config.drugs.enabled);
        assert_eq!(resolve_drug_timeout(&config), Duration::from_secs(2));
    }

    #[test]
    fn zero_iterations_falls_back_to_default() {
        let mut config = Config::default();
        config.agents.max_iterations = Some(0);
        assert_eq!(resolve_max_iterations(&config), DEFAULT_MAX_ITERATIONS);
    }

    #[test]
    fn iterations_above_default_are_capped() {
        let mut config = Config::default();
        config.agents.max_iterations = Some(50);
        assert_eq!(resolve_max_iterations(&config), 10);
        config.agents.max_iterations = Some(10);
        assert_eq!(resolve_max_iterations(&config), 10);
    }

    #[test]
    fn log_dir_defaults_beside_config_and_can_be_disabled() {
        let path = Path::new("/home/user/.doctor-agent/config.json");
        let mut config: Config = serde_json::from_str(r#"{"logging":{"directory":"var/log"}}"#).unwrap();
        assert_eq!(
            resolve_log_dir(&config, path),
            Some(PathBuf::from("/home/user/.doctor-agent/var/log"))
        );
        config.logging.directory = None;
        assert_eq!(
            resolve_log_dir(&config, path),
            Some(PathBuf::from("/home/user/.doctor-agent/logs"))
        );
        config.logging.file = false;
        assert_eq!(resolve_log_dir(&config, path), None);
    }

    #[test]
    fn resolve_skills_dir_default() {
        let config = Config::default();
        let path = Path::new("/home/user/.doctor-agent/config.json");
        assert_eq!(
            resolve_skills_dir(&config, path),
            PathBuf::from("/home/user/.doctor-agent/skills")
        );
        assert_eq!(
            resolve_prompts_dir(&config, path),
            PathBuf::from("/home/user/.doctor-agent/prompts")
        );
    }

    #[test]
    fn resolve_skills_dir_override_relative() {
        let mut config = Config::default();
        config.skills.directory = Some(PathBuf::from("custom/skills"));
        let path = Path::new("/home/user/.doctor-agent/config.json");
        assert_eq!(
            resolve_skills_dir(&config, path),
            PathBuf::from("/home/user/.doctor-agent/custom/skills")
        );
    }

    #[test]
    fn resolve_prompts_dir_override_absolute() {
        let mut config = Config::default();
        config.prompts.directory = Some(PathBuf::from("/repo/prompts"));
        let path = Path::new("/home/user/.doctor-agent/config.json");
        assert_eq!(
            resolve_prompts_dir(&config, path),
            PathBuf::from("/repo/prompts")
        );
    }
}
