//! Initialize the configuration directory: create ~/.doctor-agent, default config, bundled skills and prompts.
//!
//! Layout mirrors `crates/lib/config/`: `config/skills/` → `~/.doctor-agent/skills/`, `config/prompts/` → `~/.doctor-agent/prompts/`.

use anyhow::{Context, Result};
use include_dir::{include_dir, Dir};
use std::path::{Path, PathBuf};

use crate::config;

static BUNDLED_SKILLS: Dir<'_> = include_dir!("$CARGO_MANIFEST_DIR/config/skills");
static BUNDLED_PROMPTS: Dir<'_> = include_dir!("$CARGO_MANIFEST_DIR/config/prompts");
static DEFAULT_CONFIG: &str = include_str!("../config/config.json");

/// Ensure the configuration directory has been initialized (config file, skills and prompts exist).
pub fn require_initialized(config_path: &Path, config: &config::Config) -> Result<()> {
    if !config_path.exists() {
        anyhow::bail!(
            "configuration not initialized; run `doctor-agent init` first (config file not found: {})",
            config_path.display()
        );
    }
    let skills_dir = config::resolve_skills_dir(config, config_path);
    if !skills_dir.exists() {
        anyhow::bail!(
            "configuration not initialized; run `doctor-agent init` first (skills directory not found: {})",
            skills_dir.display()
        );
    }
    let prompts_dir = config::resolve_prompts_dir(config, config_path);
    if !prompts_dir.exists() {
        anyhow::bail!(
            "configuration not initialized; run `doctor-agent init` first (prompts directory not found: {})",
            prompts_dir.display()
        );
    }
    Ok(())
}

fn extract_if_missing(bundle: &Dir<'_>, target: &Path, what: &str) -> Result<()> {
    if target.exists() {
        log::debug!("{} directory already exists at {}, skipping", what, target.display());
        return Ok(());
    }
    std::fs::create_dir_all(target)
        .with_context(|| format!("creating {} directory {}", what, target.display()))?;
    if let Err(e) = bundle.extract(target) {
        anyhow::bail!("extracting bundled {} to {}: {}", what, target.display(), e);
    }
    log::info!("extracted bundled {} to {}", what, target.display());
    Ok(())
}

/// Create the config directory and default files if they do not exist.
/// Existing files and directories are left untouched.
pub fn init_config_dir(config_path: &Path) -> Result<PathBuf> {
    let config_dir = config_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(config_dir)
        .with_context(|| format!("creating config directory {}", config_dir.display()))?;

    if !config_path.exists() {
        std::fs::write(config_path, DEFAULT_CONFIG)
            .with_context(|| format!("writing default config to {}", config_path.display()))?;
        log::info!("created default config at {}", config_path.display());
    }

    extract_if_missing(&BUNDLED_SKILLS, &config_dir.join("skills"), "skills")?;
    extract_if_missing(&BUNDLED_PROMPTS, &config_dir.join("prompts"), "prompts")?;

    Ok(config_dir.to_path_buf())
}
