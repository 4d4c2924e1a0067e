use serde_json::{json, Value};
use shared::Mode;

pub const SYSTEM_PROMPT: &str = r#"You are an expert AI coding assistant inside a web development studio.
Reply with a single JSON object containing:
- thinking: your analysis of what needs to be done
- code: the COMPLETE file (never a fragment)
- changes_made: array of the changes you made
- preserved_elements: array of existing elements you kept

MODES:
1. HTML - full documents with CSS in <style> and JavaScript in <script>
2. Three.js - JavaScript against the THREE global; scene, camera, renderer and controls already exist
3. Python - Pyodide scripts with numpy and matplotlib available (call plt.show() for plots)

RULES:
1. NEVER REDECLARE: names listed under "EXISTING IDENTIFIERS" are already declared. Do not declare them again with const, let, var, function, class or def; reuse or reassign them instead.
2. FULL CODE ONLY: always return the whole working file.
3. PRESERVE EVERYTHING: keep all existing functions, variables, styles and elements. Insert new code where it belongs. Do not clean up, rename or refactor existing code.
4. ADDITIVE CHANGES: when asked to "add X", insert X at the right place without restructuring.
5. NO MARKDOWN: the "code" field holds raw code without fences.

For Three.js, just add objects to the pre-configured scene.
For Python, use plt.show() for plots and print() for text output."#;

/// `response_format` value requesting the four-field answer object.
pub fn response_schema() -> Value {
    json!({
        "type": "json_schema",
        "json_schema": {
            "name": "code_generation",
            "strict": true,
            "schema": {
                "type": "object",
                "properties": {
                    "thinking": { "type": "string" },
                    "code": { "type": "string" },
                    "changes_made": { "type": "array", "items": { "type": "string" } },
                    "preserved_elements": { "type": "array", "items": { "type": "string" } }
                },
                "required": ["thinking", "code", "changes_made", "preserved_elements"],
                "additionalProperties": false
            }
        }
    })
}

/// Final user message for one generation: the request plus the current
/// buffer, the declared names to avoid and the preservation rules.
pub fn build_prompt(user_prompt: &str, mode: Mode, buffer: &str, identifiers: &[String]) -> String {
    let mut prompt = format!(
        "[Mode: {}]\n\nUSER REQUEST:\n{}\n\n",
        mode.display_name(),
        user_prompt.trim()
    );

    if buffer.trim().is_empty() {
        prompt.push_str(&format!(
            "CURRENT CODE: none. This is a fresh {} file; write it from scratch.\n",
            mode.display_name()
        ));
        return prompt;
    }

    prompt.push_str(&format!(
        "CURRENT CODE ({}):\n```{}\n",
        mode.file_name(),
        mode.fence_language()
    ));
    prompt.push_str(buffer);
    if !buffer.ends_with('\n') {
        prompt.push('\n');
    }
    prompt.push_str("```\n\n");

    if !identifiers.is_empty() {
        prompt.push_str(&format!(
            "EXISTING IDENTIFIERS (DO NOT REDECLARE): {}\n\n",
            identifiers.join(", ")
        ));
    }

    prompt.push_str(
        "PRESERVATION RULES:\n\
         1. Keep ALL existing code unless the request explicitly removes it.\n\
         2. Insert new code at the appropriate location; do not restructure.\n\
         3. Reuse the existing identifiers above instead of declaring them again.\n\
         4. Return the COMPLETE updated file in the \"code\" field.\n",
    );
    prompt
}

/// Compact history entry for the user side of an exchange.
pub fn history_user_entry(user_prompt: &str, mode: Mode, has_image: bool) -> String {
    let mut entry = format!("[Mode: {}] {}", mode.display_name(), user_prompt.trim());
    if has_image {
        entry.push_str(" [image attached]");
    }
    entry
}

/// Line shown in the transcript for a submitted prompt.
pub fn transcript_summary(user_prompt: &str, has_image: bool) -> String {
    if has_image {
        format!("{} (image attached)", user_prompt.trim())
    } else {
        user_prompt.trim().to_string()
    }
}
