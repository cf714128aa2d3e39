//! User message assembly.

use std::collections::BTreeMap;

use skc_config::Instructions;

use crate::artifact::ArtifactId;

/// Sections the examples artifact reads, in prompt order.
const EXAMPLE_SECTIONS: [&str; 3] = ["Workflows", "Examples", "Common patterns"];

/// Artifacts whose content the changelog compares across runs.
const CHANGELOG_INPUTS: [ArtifactId; 3] =
    [ArtifactId::Skill, ArtifactId::Reference, ArtifactId::Examples];

/// Instruction sections an artifact sees, as `(name, body)` pairs.
///
/// Order is deterministic: sorted by name where every section is used, the
/// fixed list order otherwise. Missing sections are skipped.
pub fn relevant_sections(id: ArtifactId, sections: &BTreeMap<String, String>) -> Vec<(&str, &str)> {
    match id {
        ArtifactId::Skill | ArtifactId::Scripts | ArtifactId::LlmsFull => sections
            .iter()
            .map(|(name, body)| (name.as_str(), body.as_str()))
            .collect(),
        ArtifactId::Examples => pick(sections, &EXAMPLE_SECTIONS),
        ArtifactId::Llms => pick(sections, &["Product"]),
        ArtifactId::Reference | ArtifactId::LlmsApi | ArtifactId::Changelog => Vec::new(),
    }
}

fn pick<'a>(sections: &'a BTreeMap<String, String>, names: &[&'static str]) -> Vec<(&'a str, &'a str)> {
    names
        .iter()
        .filter_map(|name| sections.get(*name).map(|body| (*name, body.as_str())))
        .collect()
}

/// Artifact content the changelog prompt compares.
#[derive(Debug, Clone, Copy)]
pub struct ChangelogInputs<'a> {
    /// Content produced (or kept) by this run.
    pub current: &'a BTreeMap<ArtifactId, String>,
    /// Content from the previous generation.
    pub previous: &'a BTreeMap<ArtifactId, String>,
}

/// Builds the user message for one artifact.
///
/// `ir_pretty` is the pretty-printed IR; `changelog` is only consulted for
/// [`ArtifactId::Changelog`].
pub fn user_message(
    id: ArtifactId,
    instructions: &Instructions,
    ir_pretty: &str,
    changelog: Option<ChangelogInputs<'_>>,
) -> String {
    let frontmatter = &instructions.frontmatter;
    let mut parts = vec![
        format!("Tool/Project Name: {}", instructions.name()),
        format!("Environment Variable Prefix: {}", instructions.env_prefix()),
    ];
    if !frontmatter.skill.env.is_empty() {
        parts.push(format!(
            "Environment Variables: {}",
            frontmatter.skill.env.join(", ")
        ));
    }

    if id == ArtifactId::Skill {
        let skill = &frontmatter.skill;
        let labelled = [
            ("License", &skill.license),
            ("Compatibility", &skill.compatibility),
            ("Allowed Tools", &skill.allowed_tools),
        ];
        for (label, value) in labelled {
            if let Some(value) = value.as_deref().filter(|v| !v.is_empty()) {
                parts.push(format!("{label}: {value}"));
            }
        }
        if !skill.metadata.is_empty() {
            // BTreeMap<String, String> always serializes.
            let json = serde_json::to_string(&skill.metadata).unwrap_or_default();
            parts.push(format!("Metadata: {json}"));
        }
    }

    for (name, body) in relevant_sections(id, &instructions.sections) {
        parts.push(format!("## Instructions: {name}\n{body}"));
    }

    if id == ArtifactId::Changelog {
        if let Some(inputs) = changelog {
            push_changelog_context(&mut parts, inputs);
        }
    }

    parts.push(format!(
        "## Spec (Intermediate Representation)\n```json\n{ir_pretty}\n```"
    ));
    parts.join("\n\n")
}

fn push_changelog_context(parts: &mut Vec<String>, inputs: ChangelogInputs<'_>) {
    for id in CHANGELOG_INPUTS {
        if let Some(content) = inputs.current.get(&id).filter(|c| !c.is_empty()) {
            parts.push(format!("## Current {id}\n{content}"));
        }
    }

    let mut has_previous = false;
    for id in CHANGELOG_INPUTS {
        if let Some(content) = inputs.previous.get(&id).filter(|c| !c.is_empty()) {
            parts.push(format!("## Previous {id}\n{content}"));
            has_previous = true;
        }
    }
    if let Some(content) = inputs
        .previous
        .get(&ArtifactId::Changelog)
        .filter(|c| !c.is_empty())
    {
        parts.push(format!("## Previous CHANGELOG.md\n{content}"));
        has_previous = true;
    }
    if !has_previous {
        parts.push(
            "## Note\nThis is the first generation; no previous artifacts exist.".to_string(),
        );
    }
}

/// Rough input token estimate: four characters per token.
pub fn estimate_tokens(text: &str) -> usize {
    text.chars().count() / 4
}
