//! Skills: AgentSkills-compatible SKILL.md documents discovered from a directory.
//!
//! Discovery loads only the frontmatter (name, description, license, allowed-tools) so the
//! system prompt can list skills compactly; the model activates a skill with `read_skill`.

mod descriptor;
mod loader;

pub use descriptor::{parse_descriptor, SkillDescriptor, SkillSummary};
pub use loader::{Skill, SkillCatalog};
