use serde::{Deserialize, Serialize};

/// The model's answer decomposed into reasoning, final code and change metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuredResult {
    pub reasoning: String,
    pub code: String,
    pub changes: Vec<String>,
    pub preserved: Vec<String>,
}

impl StructuredResult {
    /// The compact form kept in conversation history: the change list only,
    /// never the full code.
    pub fn history_summary(&self) -> String {
        if self.changes.is_empty() {
            return "Updated the code.".to_string();
        }
        let mut out = String::from("Changes made:");
        for change in &self.changes {
            out.push_str("\n- ");
            out.push_str(change);
        }
        out
    }
}
