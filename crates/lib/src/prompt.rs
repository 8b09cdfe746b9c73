//! System prompt templates (`<prompts dir>/<name>.md`).

use anyhow::{Context, Result};
use std::path::Path;

/// Placeholder replaced by the skill catalog's `<available_skills>` block.
pub const AVAILABLE_SKILLS_PLACEHOLDER: &str = "{{available_skills}}";

pub fn load_prompt_template(dir: &Path, name: &str) -> Result<String> {
    let path = dir.join(format!("{}.md", name));
    std::fs::read_to_string(&path)
        .with_context(|| format!("prompt template not found: {}", path.display()))
}

pub fn render_system_prompt(template: &str, skills_markup: &str) -> String {
    template.replace(AVAILABLE_SKILLS_PLACEHOLDER, skills_markup)
}
