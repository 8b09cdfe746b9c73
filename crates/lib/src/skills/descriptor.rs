//! Skill descriptor parsed from the YAML frontmatter at the top of SKILL.md.

use serde::{Deserialize, Serialize};

/// Metadata for one discovered skill. Immutable after discovery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkillDescriptor {
    pub name: String,
    pub description: String,
    /// Absolute path of the SKILL.md the descriptor was read from.
    pub location: String,
    pub license: Option<String>,
    pub allowed_tools: Option<String>,
}

/// Summary entry served by `/skills` and used for prompt injection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillSummary {
    pub name: String,
    pub description: String,
    pub allowed_tools: Option<String>,
}

impl From<&SkillDescriptor> for SkillSummary {
    fn from(d: &SkillDescriptor) -> Self {
        SkillSummary {
            name: d.name.clone(),
            description: d.description.clone(),
            allowed_tools: d.allowed_tools.clone(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct Frontmatter {
    name: Option<String>,
    description: Option<String>,
    #[serde(default)]
    license: Option<String>,
    #[serde(default, rename = "allowed-tools")]
    allowed_tools: Option<String>,
}

/// Return the YAML between the opening `---` and the next `---`, or None when the document has no frontmatter block.
fn frontmatter_block(content: &str) -> Option<&str> {
    let rest = content.strip_prefix("---")?;
    let end = rest.find("---")?;
    Some(&rest[..end])
}

/// Parse SKILL.md content into a descriptor. None when the frontmatter block is absent,
/// is not valid YAML, or lacks a non-empty `name` or `description`.
pub fn parse_descriptor(content: &str, location: &str) -> Option<SkillDescriptor> {
    let yaml = frontmatter_block(content)?;
    let fm: Frontmatter = match serde_yaml::from_str(yaml) {
        Ok(fm) => fm,
        Err(e) => {
            log::debug!("invalid skill frontmatter in {}: {}", location, e);
            return None;
        }
    };
    let name = fm.name.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())?;
    let description = fm
        .description
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())?;
    Some(SkillDescriptor {
        name,
        description,
        location: location.to_string(),
        license: fm.license,
        allowed_tools: fm.allowed_tools,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_required_and_optional_fields() {
        let doc = "---\nname: symptom-analysis\ndescription: Analyze symptoms\nlicense: MIT\nallowed-tools: analyze_symptoms\n---\n# Body\n";
        let d = parse_descriptor(doc, "/skills/symptom-analysis/SKILL.md").unwrap();
        assert_eq!(d.name, "symptom-analysis");
        assert_eq!(d.description, "Analyze symptoms");
        assert_eq!(d.license.as_deref(), Some("MIT"));
        assert_eq!(d.allowed_tools.as_deref(), Some("analyze_symptoms"));
        assert_eq!(d.location, "/skills/symptom-analysis/SKILL.md");
    }

    #[test]
    fn optional_fields_default_to_none() {
        let d = parse_descriptor("---\nname: a\ndescription: b\n---\n", "x").unwrap();
        assert!(d.license.is_none());
        assert!(d.allowed_tools.is_none());
    }

    #[test]
    fn missing_block_or_fields_yield_none() {
        assert!(parse_descriptor("# no frontmatter\n", "x").is_none());
        assert!(parse_descriptor("---\nname: only-name\n", "x").is_none());
        assert!(parse_descriptor("---\nname: only-name\n---\n", "x").is_none());
        assert!(parse_descriptor("---\ndescription: only-desc\n---\n", "x").is_none());
        assert!(parse_descriptor("---\nname: [unclosed\n---\n", "x").is_none());
    }
}
