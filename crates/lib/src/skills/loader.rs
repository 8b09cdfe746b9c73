//! Skill catalog: each skill is a directory with SKILL.md (YAML frontmatter + markdown).
//! Discovery reads only the frontmatter; the full document is read on first activation and cached.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use super::descriptor::{parse_descriptor, SkillDescriptor, SkillSummary};

const SKILL_FILE: &str = "SKILL.md";

/// A discovered skill. `content` stays empty until the skill is activated.
#[derive(Debug)]
pub struct Skill {
    pub descriptor: SkillDescriptor,
    path: PathBuf,
    content: Mutex<Option<String>>,
}

impl Skill {
    fn new(descriptor: SkillDescriptor, path: PathBuf) -> Self {
        Self {
            descriptor,
            path,
            content: Mutex::new(None),
        }
    }

    /// True once the full document has been read.
    pub fn is_loaded(&self) -> bool {
        self.content
            .lock()
            .map(|c| c.is_some())
            .unwrap_or_else(|e| e.into_inner().is_some())
    }
}

/// Skills discovered once at startup, in discovery order (sorted by directory name).
#[derive(Debug, Default)]
pub struct SkillCatalog {
    skills: Vec<Skill>,
    by_name: HashMap<String, usize>,
}

impl SkillCatalog {
    /// Scan the immediate subdirectories of `dir` for SKILL.md files.
    /// Directories without the file, without a frontmatter block, or missing required fields are skipped.
    /// A missing root yields an empty catalog.
    pub fn discover(dir: &Path) -> Self {
        let mut catalog = SkillCatalog::default();
        let read_dir = match std::fs::read_dir(dir) {
            Ok(d) => d,
            Err(e) => {
                log::warn!("skills directory {} not readable: {}", dir.display(), e);
                return catalog;
            }
        };
        let mut skill_dirs: Vec<PathBuf> = read_dir
            .flatten()
            .map(|entry| entry.path())
            .filter(|p| p.is_dir())
            .collect();
        skill_dirs.sort();

        for path in skill_dirs {
            let skill_md = path.join(SKILL_FILE);
            if !skill_md.is_file() {
                continue;
            }
            let content = match std::fs::read_to_string(&skill_md) {
                Ok(c) => c,
                Err(e) => {
                    log::debug!("skipping {}: {}", skill_md.display(), e);
                    continue;
                }
            };
            let location = std::fs::canonicalize(&skill_md).unwrap_or_else(|_| skill_md.clone());
            let Some(descriptor) = parse_descriptor(&content, &location.to_string_lossy()) else {
                log::debug!("skipping {}: no valid frontmatter", skill_md.display());
                continue;
            };
            catalog.insert(Skill::new(descriptor, skill_md));
        }
        log::info!("discovered {} skill(s) in {}", catalog.len(), dir.display());
        catalog
    }

    /// Insert keyed by name; a later skill with the same name replaces the earlier one in place.
    fn insert(&mut self, skill: Skill) {
        let name = skill.descriptor.name.clone();
        match self.by_name.get(&name) {
            Some(&i) => {
                log::warn!("duplicate skill name {}, keeping {}", name, skill.path.display());
                self.skills[i] = skill;
            }
            None => {
                self.by_name.insert(name, self.skills.len());
                self.skills.push(skill);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.skills.len()
    }

    pub fn is_empty(&self) -> bool {
        self.skills.is_empty()
    }

    pub fn names(&self) -> Vec<String> {
        self.skills.iter().map(|s| s.descriptor.name.clone()).collect()
    }

    pub fn get(&self, name: &str) -> Option<&Skill> {
        self.by_name.get(name).map(|&i| &self.skills[i])
    }

    pub fn summaries(&self) -> Vec<SkillSummary> {
        self.skills
            .iter()
            .map(|s| SkillSummary::from(&s.descriptor))
            .collect()
    }

    /// The `<available_skills>` block injected verbatim into the system prompt.
    pub fn render_summary_markup(&self) -> String {
        let mut lines = vec!["<available_skills>".to_string()];
        for skill in &self.skills {
            let d = &skill.descriptor;
            lines.push("  <skill>".to_string());
            lines.push(format!("    <name>{}</name>", d.name));
            lines.push(format!("    <description>{}</description>", d.description));
            lines.push(format!(
                "    <allowed-tools>{}</allowed-tools>",
                d.allowed_tools.as_deref().unwrap_or("all")
            ));
            lines.push("  </skill>".to_string());
        }
        lines.push("</available_skills>".to_string());
        lines.join("\n")
    }

    /// Full SKILL.md text for `name`, read from disk on first access and cached afterwards.
    /// None for unknown names or when the file can no longer be read.
    pub fn activate(&self, name: &str) -> Option<String> {
        let skill = self.get(name)?;
        let mut cached = skill.content.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(content) = cached.as_ref() {
            return Some(content.clone());
        }
        match std::fs::read_to_string(&skill.path) {
            Ok(content) => {
                log::debug!("activated skill {}", name);
                *cached = Some(content.clone());
                Some(content)
            }
            Err(e) => {
                log::warn!("reading skill {} failed: {}", skill.path.display(), e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_skills_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("doctor-skills-test-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn write_skill(root: &Path, dir: &str, content: &str) {
        let d = root.join(dir);
        std::fs::create_dir_all(&d).unwrap();
        std::fs::write(d.join(SKILL_FILE), content).unwrap();
    }

    fn demo_dir() -> PathBuf {
        let root = temp_skills_dir();
        write_skill(&root, "b-imaging", "---\nname: imaging-analysis\ndescription: Read images\nallowed-tools: analyze_xray analyze_mri\n---\n# Imaging\n");
        write_skill(&root, "a-symptoms", "---\nname: symptom-analysis\ndescription: Analyze symptoms\n---\n# Symptoms\nUse analyze_symptoms.\n");
        write_skill(&root, "c-broken", "# no frontmatter here\n");
        write_skill(&root, "d-treatment", "---\nname: treatment-recommendation\ndescription: Recommend treatment\nlicense: MIT\n---\n# Treatment\n");
        std::fs::create_dir_all(root.join("e-empty")).unwrap();
        std::fs::write(root.join("stray.md"), "---\nname: stray\ndescription: not a dir\n---\n").unwrap();
        root
    }

    #[test]
    fn discover_skips_malformed_and_keeps_order() {
        let root = demo_dir();
        let catalog = SkillCatalog::discover(&root);
        assert_eq!(catalog.len(), 3);
        assert_eq!(
            catalog.names(),
            vec!["symptom-analysis", "imaging-analysis", "treatment-recommendation"]
        );
        let d = &catalog.get("imaging-analysis").unwrap().descriptor;
        assert!(d.location.ends_with("SKILL.md"));
        assert!(Path::new(&d.location).is_absolute());
    }

    #[test]
    fn missing_root_is_empty() {
        let catalog = SkillCatalog::discover(Path::new("/definitely/not/here/skills"));
        assert!(catalog.is_empty());
        assert_eq!(
            catalog.render_summary_markup(),
            "<available_skills>\n</available_skills>"
        );
    }

    #[test]
    fn summaries_follow_discovery_order() {
        let catalog = SkillCatalog::discover(&demo_dir());
        let summaries = catalog.summaries();
        assert_eq!(summaries.len(), 3);
        assert_eq!(summaries[0].name, "symptom-analysis");
        assert_eq!(summaries[0].allowed_tools, None);
        assert_eq!(
            summaries[1].allowed_tools.as_deref(),
            Some("analyze_xray analyze_mri")
        );
    }

    #[test]
    fn markup_has_one_element_per_skill_in_order() {
        let catalog = SkillCatalog::discover(&demo_dir());
        let markup = catalog.render_summary_markup();
        assert!(markup.starts_with("<available_skills>\n"));
        assert!(markup.ends_with("\n</available_skills>"));
        assert_eq!(markup.matches("<skill>").count(), 3);
        let first = markup.find("<name>symptom-analysis</name>").unwrap();
        let second = markup.find("<name>imaging-analysis</name>").unwrap();
        let third = markup.find("<name>treatment-recommendation</name>").unwrap();
        assert!(first < second && second < third);
        assert!(markup.contains("<allowed-tools>all</allowed-tools>"));
        assert!(markup.contains("<allowed-tools>analyze_xray analyze_mri</allowed-tools>"));
    }

    #[test]
    fn activate_caches_first_read() {
        let root = demo_dir();
        let catalog = SkillCatalog::discover(&root);
        assert!(!catalog.get("symptom-analysis").unwrap().is_loaded());

        let first = catalog.activate("symptom-analysis").unwrap();
        assert!(first.contains("Use analyze_symptoms."));
        assert!(catalog.get("symptom-analysis").unwrap().is_loaded());

        // The backing file changes (and then disappears); the cached text is still served.
        std::fs::write(root.join("a-symptoms").join(SKILL_FILE), "changed").unwrap();
        let second = catalog.activate("symptom-analysis").unwrap();
        std::fs::remove_dir_all(root.join("a-symptoms")).unwrap();
        let third = catalog.activate("symptom-analysis").unwrap();
        assert_eq!(first, second);
        assert_eq!(first, third);
    }

    #[test]
    fn activate_unknown_is_none() {
        let catalog = SkillCatalog::discover(&demo_dir());
        assert!(catalog.activate("nonexistent-skill").is_none());
    }

    #[test]
    fn duplicate_name_replaces_in_place() {
        let root = temp_skills_dir();
        write_skill(&root, "a", "---\nname: same\ndescription: first\n---\n");
        write_skill(&root, "b", "---\nname: other\ndescription: other\n---\n");
        write_skill(&root, "c", "---\nname: same\ndescription: second\n---\n");
        let catalog = SkillCatalog::discover(&root);
        assert_eq!(catalog.names(), vec!["same", "other"]);
        assert_eq!(catalog.get("same").unwrap().descriptor.description, "second");
    }

    #[test]
    fn bundled_skills_are_discoverable() {
        let manifest_dir = std::env::var("CARGO_MANIFEST_DIR").unwrap();
        let skills_dir: PathBuf = [&manifest_dir, "config", "skills"].iter().collect();
        let catalog = SkillCatalog::discover(&skills_dir);
        for name in [
            "symptom-analysis",
            "imaging-analysis",
            "disease-assessment",
            "treatment-recommendation",
        ] {
            let content = catalog.activate(name).unwrap_or_else(|| panic!("{} missing", name));
            assert!(content.starts_with("---"));
            assert!(content.contains(name));
        }
    }
}
