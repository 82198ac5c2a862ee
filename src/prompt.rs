//! Prompt assembly: rendered chains become a structured character prompt.
//!
//! Factual knowledge and relational knowledge go into separate sections so
//! the model can ground answers in facts while keeping relationships
//! available. Sections keep the order chains were produced in.

use crate::retrieve::ChainResult;

/// Assemble the prompt for one question.
pub fn build_prompt(entity_name: &str, chains: &[ChainResult], question: &str) -> String {
    let mut prompt = format!(
        "SYSTEM: You are {entity_name}. Answer briefly and stay in character.\n\n"
    );

    prompt.push_str("YOUR KNOWLEDGE OF THE QUESTION:\n");
    let mut any = false;
    for chain in chains.iter().filter(|c| !c.is_relation) {
        prompt.push_str(&format!("- {}\n", chain.text));
        any = true;
    }
    if !any {
        prompt.push_str("- (No relevant knowledge)\n");
    }

    prompt.push_str("\nYOUR RELATIONS:\n");
    let mut any = false;
    for chain in chains.iter().filter(|c| c.is_relation) {
        prompt.push_str(&format!("- {}\n", chain.text));
        any = true;
    }
    if !any {
        prompt.push_str("- (No relevant relations)\n");
    }

    prompt.push_str(&format!(
        "\nQUESTION: {question}\n{}:",
        entity_name.to_uppercase()
    ));
    prompt
}
