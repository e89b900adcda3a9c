//! Section Model — parses résumé free text into an ordered section map,
//! cleans generation artifacts out of section content, and reconstructs
//! free text from the map.
//!
//! Parsing is deliberately tolerant: a résumé with no recognizable headers
//! degrades to a single implicit section instead of failing. Reconstruction
//! after one cleaning pass is a fixed point — running
//! extract/reconstruct again yields byte-identical output.

use serde::{Deserialize, Serialize};

/// Name given to unlabeled text before the first recognized header
/// (typically the candidate's name and contact lines).
pub const IMPLICIT_SECTION: &str = "header";

/// Headers recognized even when not written in all caps.
const KNOWN_HEADERS: &[&str] = &[
    "summary",
    "objective",
    "profile",
    "experience",
    "work experience",
    "professional experience",
    "employment history",
    "education",
    "skills",
    "technical skills",
    "projects",
    "certifications",
    "awards",
    "publications",
    "languages",
    "volunteer experience",
    "interests",
    "contact",
    "references",
];

/// One structured entry inside a section (a job, a degree, a project).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionEntry {
    pub title: String,
    pub organization: String,
    pub dates: String,
    pub bullets: Vec<String>,
}

/// Section content: a free-text block, or structured entries for sections
/// that arrive pre-parsed from the persistence boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SectionContent {
    Text(String),
    Entries(Vec<SectionEntry>),
}

impl SectionContent {
    /// Canonical text form, used both for reconstruction and for the
    /// exact-string comparison the change tracker performs.
    pub fn as_text(&self) -> String {
        match self {
            SectionContent::Text(text) => text.trim().to_string(),
            SectionContent::Entries(entries) => entries
                .iter()
                .map(|entry| {
                    let mut lines = vec![format!(
                        "{} | {} | {}",
                        entry.title, entry.organization, entry.dates
                    )];
                    lines.extend(entry.bullets.iter().map(|b| format!("- {b}")));
                    lines.join("\n")
                })
                .collect::<Vec<_>>()
                .join("\n\n"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    /// Normalized (lowercased) section name used for lookups and diffing.
    pub name: String,
    /// The header token exactly as it appeared in the source, `None` for the
    /// implicit leading section. Reconstruction re-emits it verbatim.
    pub header: Option<String>,
    pub content: SectionContent,
}

/// Ordered mapping of section name to content. Order is first-appearance
/// order in the source text and is preserved through reconstruction.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SectionMap {
    sections: Vec<Section>,
}

impl SectionMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a section, or merges content into an existing section when the
    /// normalized name repeats.
    pub fn push(&mut self, name: &str, header: Option<String>, content: SectionContent) {
        let name = name.trim().to_lowercase();
        if let Some(existing) = self.sections.iter_mut().find(|s| s.name == name) {
            let merged = format!("{}\n\n{}", existing.content.as_text(), content.as_text());
            existing.content = SectionContent::Text(merged);
            return;
        }
        self.sections.push(Section {
            name,
            header,
            content,
        });
    }

    pub fn get(&self, name: &str) -> Option<&SectionContent> {
        let name = name.to_lowercase();
        self.sections
            .iter()
            .find(|s| s.name == name)
            .map(|s| &s.content)
    }

    pub fn names(&self) -> Vec<&str> {
        self.sections.iter().map(|s| s.name.as_str()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Section> {
        self.sections.iter()
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// Runs `clean_section_content` over every text section in place.
    pub fn clean_contents(&mut self) {
        for section in &mut self.sections {
            if let SectionContent::Text(text) = &section.content {
                section.content = SectionContent::Text(clean_section_content(text));
            }
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Extraction
// ────────────────────────────────────────────────────────────────────────────

/// Splits résumé text on recognized header lines. Leading unlabeled text
/// becomes the implicit "header" section; text with no recognizable headers
/// degrades to a single section.
pub fn extract_sections(text: &str) -> SectionMap {
    let mut map = SectionMap::new();
    let mut current_header: Option<String> = None;
    let mut current_lines: Vec<&str> = Vec::new();

    let flush = |map: &mut SectionMap, header: &Option<String>, lines: &mut Vec<&str>| {
        let content = lines.join("\n").trim().to_string();
        lines.clear();
        match header {
            Some(token) => {
                let name = token.trim_end_matches(':').trim().to_lowercase();
                map.push(&name, Some(token.clone()), SectionContent::Text(content));
            }
            None if !content.is_empty() => {
                map.push(IMPLICIT_SECTION, None, SectionContent::Text(content));
            }
            None => {}
        }
    };

    for line in text.lines() {
        if is_header_line(line) {
            flush(&mut map, &current_header, &mut current_lines);
            current_header = Some(line.trim().to_string());
        } else {
            current_lines.push(line);
        }
    }
    flush(&mut map, &current_header, &mut current_lines);

    if map.is_empty() {
        map.push(IMPLICIT_SECTION, None, SectionContent::Text(text.trim().to_string()));
    }

    map
}

/// A line is a section header when it is short, digit-free, and either
/// written entirely in caps or matches a known header label (with an
/// optional trailing colon).
fn is_header_line(line: &str) -> bool {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.len() > 60 {
        return false;
    }
    let label = trimmed.trim_end_matches(':').trim();
    if label.is_empty() || label.chars().any(|c| c.is_ascii_digit()) {
        return false;
    }
    if label.split_whitespace().count() > 5 {
        return false;
    }

    if KNOWN_HEADERS.contains(&label.to_lowercase().as_str()) {
        return true;
    }

    // All-caps heuristic: at least one letter, no lowercase letters, and only
    // header-ish punctuation.
    let has_letter = label.chars().any(|c| c.is_alphabetic());
    let all_caps = label.chars().all(|c| !c.is_lowercase());
    let clean_charset = label
        .chars()
        .all(|c| c.is_alphanumeric() || c.is_whitespace() || matches!(c, '&' | '-' | '/'));
    has_letter && all_caps && clean_charset
}

// ────────────────────────────────────────────────────────────────────────────
// Cleaning
// ────────────────────────────────────────────────────────────────────────────

/// Strips model-added artifacts from section content.
///
/// Pass order matters: marker removal runs first because explanatory
/// sentences are sometimes wrapped in markers ("[I have updated this
/// section]") and must be unwrapped before the sentence pass can see them.
pub fn clean_section_content(text: &str) -> String {
    let mut lines: Vec<String> = Vec::new();
    for line in text.lines() {
        let stripped = strip_markers(line);
        // A line a marker fully consumed is dropped, not kept as a blank.
        if stripped.is_empty() && !line.trim().is_empty() {
            continue;
        }
        lines.push(stripped);
    }
    lines.retain(|line| !is_explanatory_line(line));
    collapse_blank_lines(&lines).trim().to_string()
}

/// Removes bracketed annotation markers from a line.
///
/// Two cases: an inline all-caps annotation like "[MODIFIED]" is deleted
/// outright; a whole line wrapped in brackets is unwrapped so the sentence
/// pass can judge its content.
fn strip_markers(line: &str) -> String {
    let trimmed = line.trim();
    if trimmed.len() > 2 && trimmed.starts_with('[') && trimmed.ends_with(']') {
        let inner = trimmed[1..trimmed.len() - 1].trim();
        // A pure annotation line vanishes; anything else is unwrapped so the
        // explanatory-sentence pass can judge it.
        if is_annotation(inner) {
            return String::new();
        }
        return inner.to_string();
    }

    let mut out = String::with_capacity(line.len());
    let mut rest = line;
    while let Some(open) = rest.find('[') {
        match rest[open..].find(']') {
            Some(offset) => {
                let inner = &rest[open + 1..open + offset];
                if is_annotation(inner) {
                    out.push_str(rest[..open].trim_end());
                } else {
                    out.push_str(&rest[..open + offset + 1]);
                }
                rest = &rest[open + offset + 1..];
            }
            None => break,
        }
    }
    out.push_str(rest);
    out
}

/// An annotation is a short all-caps, digit-free bracket body:
/// "MODIFIED", "UPDATED", "NEW SECTION". Bracketed dates or citations
/// ("[2019-2023]", "[1]") are content, not annotations.
fn is_annotation(inner: &str) -> bool {
    let inner = inner.trim();
    !inner.is_empty()
        && inner.len() <= 40
        && inner.chars().any(|c| c.is_alphabetic())
        && inner
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_whitespace() || matches!(c, '-' | '_'))
}

// Narrow on purpose: "I have 8 years of experience" is legitimate résumé
// content and must survive.
const EXPLANATORY_PREFIXES: &[&str] = &[
    "i have updated",
    "i have modified",
    "i have tailored",
    "i have adjusted",
    "i've updated",
    "i've modified",
    "i've tailored",
    "i updated",
    "i modified",
    "i tailored",
    "i adjusted",
    "here is ",
    "here's ",
    "note:",
    "as requested",
    "this resume has been",
    "this section has been",
];

/// Detects first-person explanatory sentences the model sometimes adds
/// ("I have updated the summary to...").
fn is_explanatory_line(line: &str) -> bool {
    let lower = line.trim().to_lowercase();
    EXPLANATORY_PREFIXES
        .iter()
        .any(|prefix| lower.starts_with(prefix))
}

/// Collapses runs of 3+ blank lines down to 2.
fn collapse_blank_lines(lines: &[String]) -> String {
    let mut out: Vec<&str> = Vec::with_capacity(lines.len());
    let mut blanks = 0;
    for line in lines {
        if line.trim().is_empty() {
            blanks += 1;
            if blanks <= 2 {
                out.push("");
            }
        } else {
            blanks = 0;
            out.push(line);
        }
    }
    out.join("\n")
}

/// True when text still carries generation artifacts after cleaning —
/// used by the golden rule validator.
pub(crate) fn has_generation_artifacts(text: &str) -> bool {
    if text.contains("```") {
        return true;
    }
    text.lines().any(|line| {
        is_explanatory_line(line)
            || line
                .match_indices('[')
                .any(|(open, _)| match line[open..].find(']') {
                    Some(offset) => is_annotation(&line[open + 1..open + offset]),
                    None => false,
                })
    })
}

// ────────────────────────────────────────────────────────────────────────────
// Reconstruction
// ────────────────────────────────────────────────────────────────────────────

/// Emits sections in map order, each preceded by its original header token,
/// with exactly one blank line between sections.
pub fn reconstruct_from_sections(map: &SectionMap) -> String {
    map.iter()
        .map(|section| {
            let body = section.content.as_text();
            match &section.header {
                Some(token) => format!("{token}\n{body}"),
                None => body,
            }
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_RESUME: &str = "\
Jane Doe
jane@example.com | 555-0100

SUMMARY
Backend engineer with 8 years of experience building distributed systems.

EXPERIENCE
Senior Engineer | Acme Corp | 2019-2024
- Led migration to event-driven architecture
- Reduced p99 latency by 40%

SKILLS
Rust, Python, Kubernetes, PostgreSQL";

    #[test]
    fn test_extract_sections_orders_by_first_appearance() {
        let map = extract_sections(SAMPLE_RESUME);
        assert_eq!(map.names(), vec!["header", "summary", "experience", "skills"]);
    }

    #[test]
    fn test_leading_text_becomes_implicit_header_section() {
        let map = extract_sections(SAMPLE_RESUME);
        let header = map.get("header").unwrap().as_text();
        assert!(header.contains("jane@example.com"));
    }

    #[test]
    fn test_headerless_text_degrades_to_single_section() {
        let map = extract_sections("just a plain paragraph about a candidate.");
        assert_eq!(map.len(), 1);
        assert_eq!(map.names(), vec!["header"]);
    }

    #[test]
    fn test_labeled_header_with_colon_is_recognized() {
        let map = extract_sections("Jane\n\nWork Experience:\nAcme Corp, 2020");
        assert!(map.get("work experience").is_some());
    }

    #[test]
    fn test_date_lines_are_not_headers() {
        assert!(!is_header_line("2019 - 2023"));
        assert!(!is_header_line("ACME CORP 2020"));
        assert!(is_header_line("EXPERIENCE"));
        assert!(is_header_line("TECHNICAL SKILLS"));
    }

    #[test]
    fn test_duplicate_section_names_merge() {
        let map = extract_sections("SKILLS\nRust\n\nSKILLS\nPython");
        assert_eq!(map.len(), 1);
        let merged = map.get("skills").unwrap().as_text();
        assert!(merged.contains("Rust"));
        assert!(merged.contains("Python"));
    }

    #[test]
    fn test_clean_removes_inline_annotation_markers() {
        let cleaned = clean_section_content("Led migrations [MODIFIED]\nShipped features");
        assert!(!cleaned.contains("[MODIFIED]"));
        assert!(cleaned.contains("Led migrations"));
        assert!(cleaned.contains("Shipped features"));
    }

    #[test]
    fn test_standalone_marker_line_is_removed() {
        let cleaned = clean_section_content("Built the pipeline.\n[MODIFIED]\nShipped v2.");
        // The marker line vanishes without leaving a paragraph break behind.
        assert_eq!(cleaned, "Built the pipeline.\nShipped v2.");
    }

    #[test]
    fn test_clean_keeps_bracketed_dates() {
        let cleaned = clean_section_content("Engineer [2019-2023] at Acme");
        assert!(cleaned.contains("[2019-2023]"));
    }

    #[test]
    fn test_clean_removes_explanatory_sentences() {
        let cleaned = clean_section_content(
            "I have updated this section to match the role.\nBuilt the billing pipeline.",
        );
        assert!(!cleaned.contains("updated this section"));
        assert!(cleaned.contains("billing pipeline"));
    }

    #[test]
    fn test_marker_wrapped_explanation_is_fully_removed() {
        // Marker pass unwraps, sentence pass deletes. Order matters.
        let cleaned = clean_section_content(
            "[I have updated this section for the new role]\nBuilt the billing pipeline.",
        );
        assert!(!cleaned.contains("updated this section"));
        assert!(cleaned.contains("billing pipeline"));
    }

    #[test]
    fn test_clean_collapses_three_plus_blank_lines_to_two() {
        let cleaned = clean_section_content("first\n\n\n\n\nsecond");
        assert_eq!(cleaned, "first\n\n\nsecond");
        // Idempotent: cleaning again changes nothing.
        assert_eq!(clean_section_content(&cleaned), cleaned);
    }

    #[test]
    fn test_reconstruct_preserves_order_and_header_tokens() {
        let map = extract_sections(SAMPLE_RESUME);
        let text = reconstruct_from_sections(&map);
        let summary_pos = text.find("SUMMARY").unwrap();
        let experience_pos = text.find("EXPERIENCE").unwrap();
        let skills_pos = text.find("SKILLS").unwrap();
        assert!(summary_pos < experience_pos && experience_pos < skills_pos);
        assert!(text.starts_with("Jane Doe"));
    }

    #[test]
    fn test_round_trip_is_fixed_point_after_one_cleaning_pass() {
        let mut map = extract_sections(SAMPLE_RESUME);
        map.clean_contents();
        let first = reconstruct_from_sections(&map);

        let mut second_map = extract_sections(&first);
        second_map.clean_contents();
        let second = reconstruct_from_sections(&second_map);
        assert_eq!(first, second);
    }

    #[test]
    fn test_entries_content_renders_with_bullets() {
        let content = SectionContent::Entries(vec![SectionEntry {
            title: "Senior Engineer".to_string(),
            organization: "Acme Corp".to_string(),
            dates: "2019-2024".to_string(),
            bullets: vec!["Led migration".to_string(), "Cut latency 40%".to_string()],
        }]);
        let text = content.as_text();
        assert!(text.contains("Senior Engineer | Acme Corp | 2019-2024"));
        assert!(text.contains("- Led migration"));
    }

    #[test]
    fn test_has_generation_artifacts() {
        assert!(has_generation_artifacts("text with [UPDATED] marker"));
        assert!(has_generation_artifacts("```\ncode fence\n```"));
        assert!(has_generation_artifacts("I have updated the summary."));
        assert!(!has_generation_artifacts("Engineer [2019-2023] at Acme"));
        assert!(!has_generation_artifacts("Plain resume content"));
    }
}
