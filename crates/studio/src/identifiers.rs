//! Declared-name scanner.
//!
//! Best-effort regex pass over the editor buffer. The names it finds are
//! listed in the prompt so the model reuses them instead of redeclaring.
//! Missing a declaration hidden inside a string or an unusual construct is
//! acceptable; the list only has to be a useful hint.

use regex::Regex;
use shared::Mode;
use std::collections::HashSet;
use std::sync::LazyLock;

const JS_NAME: &str = r"[A-Za-z_$][\w$]*";

static JS_BINDING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"\b(?:const|let|var)\s+({JS_NAME})")).expect("valid regex")
});
static JS_DESTRUCTURE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:const|let|var)\s*([\{\[])([^\}\]]*)[\}\]]").expect("valid regex")
});
static JS_FUNCTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"\bfunction\s*\*?\s*({JS_NAME})")).expect("valid regex")
});
static JS_CLASS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!(r"\bclass\s+({JS_NAME})")).expect("valid regex"));
static JS_NAME_ONLY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!("^{JS_NAME}$")).expect("valid regex"));

static PY_DEF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^[ \t]*(?:async[ \t]+)?def[ \t]+([A-Za-z_]\w*)").expect("valid regex")
});
static PY_CLASS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^[ \t]*class[ \t]+([A-Za-z_]\w*)").expect("valid regex"));
static PY_ASSIGN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^([A-Za-z_]\w*)[ \t]*(?::[^=\n]+)?=[^=]").expect("valid regex")
});

/// Names declared in JavaScript source (including scripts embedded in HTML),
/// in order of first appearance, without duplicates.
pub fn declared_identifiers(code: &str) -> Vec<String> {
    let mut found: Vec<(usize, String)> = Vec::new();

    for re in [&*JS_BINDING, &*JS_FUNCTION, &*JS_CLASS] {
        for caps in re.captures_iter(code) {
            if let Some(name) = caps.get(1) {
                found.push((name.start(), name.as_str().to_string()));
            }
        }
    }

    for caps in JS_DESTRUCTURE.captures_iter(code) {
        let (Some(open), Some(body)) = (caps.get(1), caps.get(2)) else {
            continue;
        };
        let object = open.as_str() == "{";
        for (offset, name) in destructured_names(body.as_str(), object) {
            found.push((body.start() + offset, name));
        }
    }

    ordered_unique(found)
}

/// Mode-aware variant: Python buffers are scanned for `def`, `class` and
/// top-level assignments, everything else with the JavaScript rules.
pub fn declared_identifiers_for_mode(code: &str, mode: Mode) -> Vec<String> {
    match mode {
        Mode::Script => {
            let mut found = Vec::new();
            for re in [&*PY_DEF, &*PY_CLASS, &*PY_ASSIGN] {
                for caps in re.captures_iter(code) {
                    if let Some(name) = caps.get(1) {
                        found.push((name.start(), name.as_str().to_string()));
                    }
                }
            }
            ordered_unique(found)
        }
        Mode::Markup | Mode::Scene => declared_identifiers(code),
    }
}

/// Bound names inside a destructuring pattern body, with byte offsets.
/// `{a, b: c, d = 1, ...rest}` binds a, c, d and rest.
fn destructured_names(body: &str, object: bool) -> Vec<(usize, String)> {
    let mut names = Vec::new();
    let mut offset = 0;
    for piece in body.split(',') {
        let start = offset;
        offset += piece.len() + 1;

        let mut part = piece;
        if object {
            if let Some((_, renamed)) = part.split_once(':') {
                part = renamed;
            }
        }
        if let Some((target, _)) = part.split_once('=') {
            part = target;
        }
        let name = part.trim().trim_start_matches("...").trim();
        if JS_NAME_ONLY.is_match(name) {
            let at = piece.rfind(name).map_or(start, |i| start + i);
            names.push((at, name.to_string()));
        }
    }
    names
}

fn ordered_unique(mut found: Vec<(usize, String)>) -> Vec<String> {
    found.sort_by_key(|(pos, _)| *pos);
    let mut seen = HashSet::new();
    found
        .into_iter()
        .filter_map(|(_, name)| seen.insert(name.clone()).then_some(name))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_declarations_in_source_order() {
        let code = "const a=1; let b=2; function c(){}";
        assert_eq!(declared_identifiers(code), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_empty_and_declaration_free_input() {
        assert!(declared_identifiers("").is_empty());
        assert!(declared_identifiers("<h1>Hello</h1>\nconsole.log(x);").is_empty());
    }

    #[test]
    fn test_duplicates_collapsed_to_first_occurrence() {
        let code = "var count = 0;\nfunction tick(){}\nvar count = 1;\nclass Box {}";
        assert_eq!(declared_identifiers(code), vec!["count", "tick", "Box"]);
    }

    #[test]
    fn test_scanning_is_idempotent() {
        let code = r#"
            <script>
              const scene = new THREE.Scene();
              let { width, height: h, depth = 2, ...rest } = dims;
              const [x, , y] = pair;
              async function animate() {}
              function* ids() {}
              class Player extends Entity {}
            </script>
        "#;
        let first = declared_identifiers(code);
        assert_eq!(
            first,
            vec!["scene", "width", "h", "depth", "rest", "x", "y", "animate", "ids", "Player"]
        );
        assert_eq!(declared_identifiers(code), first);
    }

    #[test]
    fn test_dollar_and_underscore_names() {
        let code = "const $el = document.body; let _private = 1;";
        assert_eq!(declared_identifiers(code), vec!["$el", "_private"]);
    }

    #[test]
    fn test_python_mode() {
        let code = "import math\n\nWIDTH = 80\nlimit: int = 3\n\nclass Grid:\n    def __init__(self):\n        self.cells = []\n\nasync def main():\n    total = 0\n\nif WIDTH == 80:\n    pass\n";
        assert_eq!(
            declared_identifiers_for_mode(code, Mode::Script),
            vec!["WIDTH", "limit", "Grid", "__init__", "main"]
        );
    }

    #[test]
    fn test_markup_mode_uses_javascript_rules() {
        let code = "<script>const a = 1;</script>";
        assert_eq!(declared_identifiers_for_mode(code, Mode::Markup), vec!["a"]);
        assert_eq!(declared_identifiers_for_mode(code, Mode::Scene), vec!["a"]);
    }
}
