//! Instruction document assembly.
//!
//! The fixed answer policy is combined with the clinician feedback block on
//! every request. Assembly is pure: the same feedback text always yields
//! the same document.

use crate::feedback::FeedbackLedger;
use crate::prompts::{
    ANTENATAL_AGENT_PROMPT, FEEDBACK_GUIDANCE_HEADING, FEEDBACK_SECTION_CLOSING,
    FEEDBACK_SECTION_PLACEHOLDER, FEEDBACK_SECTION_PREAMBLE,
};

/// Render the clinician feedback block around pre-rendered ledger text.
pub fn feedback_section(feedback_text: &str) -> String {
    format!(
        "{}\n\n{}\n{}\n\n{}",
        FEEDBACK_SECTION_PREAMBLE, FEEDBACK_GUIDANCE_HEADING, feedback_text, FEEDBACK_SECTION_CLOSING
    )
}

/// Assemble the instruction document from opaque, pre-rendered feedback.
///
/// Without feedback the block is left out entirely.
pub fn assemble_instructions(feedback_text: Option<&str>) -> String {
    let section = match feedback_text {
        Some(text) => feedback_section(text),
        None => String::new(),
    };
    ANTENATAL_AGENT_PROMPT.replacen(FEEDBACK_SECTION_PLACEHOLDER, &section, 1)
}

/// Assemble the instruction document from a ledger, rendered in ledger order.
pub fn assemble(ledger: &FeedbackLedger) -> String {
    assemble_instructions(Some(&ledger.render()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feedback::FeedbackEntry;
    use crate::prompts::{DEFAULT_FEEDBACK, MEDICAL_REDIRECTION, OUT_OF_SCOPE_REFUSAL};

    #[test]
    fn test_assemble_places_feedback_block() {
        let doc = assemble(&FeedbackLedger::new());

        assert!(!doc.contains(FEEDBACK_SECTION_PLACEHOLDER));
        assert!(doc.contains(FEEDBACK_GUIDANCE_HEADING));
        assert!(doc.contains(&format!("- {}", DEFAULT_FEEDBACK)));
        assert!(doc.contains(FEEDBACK_SECTION_CLOSING));
        assert!(doc.contains(OUT_OF_SCOPE_REFUSAL));
        assert!(doc.contains(MEDICAL_REDIRECTION));
    }

    #[test]
    fn test_feedback_rendered_oldest_first_under_recency_label() {
        let mut ledger = FeedbackLedger::with_seed("E1 oldest");
        ledger.append(FeedbackEntry::new("E2 newest"));

        let doc = assemble(&ledger);
        let heading = doc.find(FEEDBACK_GUIDANCE_HEADING).unwrap();
        let e1 = doc.find("- E1 oldest").unwrap();
        let e2 = doc.find("- E2 newest").unwrap();

        assert!(heading < e1);
        assert!(e1 < e2);
    }

    #[test]
    fn test_assemble_is_deterministic() {
        let mut ledger = FeedbackLedger::new();
        ledger.append(FeedbackEntry::new("Keep it short"));
        assert_eq!(assemble(&ledger), assemble(&ledger));
    }

    #[test]
    fn test_feedback_text_is_opaque() {
        let doc = assemble_instructions(Some("anything {at all}"));
        assert!(doc.contains(&format!("{}\nanything {{at all}}\n", FEEDBACK_GUIDANCE_HEADING)));
    }

    #[test]
    fn test_no_feedback_omits_block() {
        let doc = assemble_instructions(None);
        assert!(!doc.contains(FEEDBACK_GUIDANCE_HEADING));
        assert!(!doc.contains(FEEDBACK_SECTION_PLACEHOLDER));
        assert!(doc.starts_with("You are an antenatal care chatbot agent"));
    }
}
