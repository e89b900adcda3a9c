//! Change Tracker — diffs the original section map against a tailored one.
//!
//! Deliberately coarse: a section counts as modified when it is absent from
//! the original map or its content differs by exact string comparison.
//! Semantically identical but reworded content counts as modified.

use std::collections::HashMap;

use crate::tailoring::sections::SectionMap;

#[derive(Debug, Clone, Default)]
pub struct ChangeReport {
    /// Names of modified sections, in the new map's order.
    pub modified_sections: Vec<String>,
    /// Human-readable rationale per modified section.
    pub rationale: HashMap<String, String>,
}

/// Compares section content between the original and the tailored résumé.
pub fn track_changes(
    original: &SectionMap,
    tailored: &SectionMap,
    attempt_number: u32,
    is_refinement: bool,
) -> ChangeReport {
    let mut report = ChangeReport::default();

    for section in tailored.iter() {
        let changed = match original.get(&section.name) {
            Some(previous) => previous.as_text() != section.content.as_text(),
            None => true,
        };
        if changed {
            report.modified_sections.push(section.name.clone());
            report
                .rationale
                .insert(section.name.clone(), rationale(attempt_number, is_refinement));
        }
    }

    report
}

fn rationale(attempt_number: u32, is_refinement: bool) -> String {
    if is_refinement {
        format!("Refined in iteration {attempt_number} to better align with job requirements")
    } else {
        format!("Modified in iteration {attempt_number} to improve ATS compatibility and job match")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tailoring::sections::extract_sections;

    const ORIGINAL: &str = "SUMMARY\nBackend engineer.\n\nSKILLS\nRust, Python";

    #[test]
    fn test_identical_maps_report_no_changes() {
        let original = extract_sections(ORIGINAL);
        let report = track_changes(&original, &original.clone(), 1, false);
        assert!(report.modified_sections.is_empty());
        assert!(report.rationale.is_empty());
    }

    #[test]
    fn test_content_change_is_detected() {
        let original = extract_sections(ORIGINAL);
        let tailored = extract_sections("SUMMARY\nCloud-native backend engineer.\n\nSKILLS\nRust, Python");
        let report = track_changes(&original, &tailored, 2, false);
        assert_eq!(report.modified_sections, vec!["summary"]);
        assert_eq!(
            report.rationale["summary"],
            "Modified in iteration 2 to improve ATS compatibility and job match"
        );
    }

    #[test]
    fn test_new_section_counts_as_modified() {
        let original = extract_sections(ORIGINAL);
        let tailored =
            extract_sections("SUMMARY\nBackend engineer.\n\nSKILLS\nRust, Python\n\nPROJECTS\nCLI tool");
        let report = track_changes(&original, &tailored, 1, false);
        assert_eq!(report.modified_sections, vec!["projects"]);
    }

    #[test]
    fn test_refinement_rationale_wording() {
        let original = extract_sections(ORIGINAL);
        let tailored = extract_sections("SUMMARY\nStaff engineer.\n\nSKILLS\nRust, Python");
        let report = track_changes(&original, &tailored, 3, true);
        assert_eq!(
            report.rationale["summary"],
            "Refined in iteration 3 to better align with job requirements"
        );
    }

    #[test]
    fn test_whitespace_only_difference_counts_as_modified() {
        // Exact-string comparison on the canonical text form: an interior
        // whitespace change is a modification.
        let original = extract_sections("SUMMARY\nBackend engineer.");
        let tailored = extract_sections("SUMMARY\nBackend  engineer.");
        let report = track_changes(&original, &tailored, 1, false);
        assert_eq!(report.modified_sections, vec!["summary"]);
    }
}
