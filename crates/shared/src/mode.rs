//! Target code domain for a generation.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which kind of code the studio is producing. Selects the prompt wording,
/// the code fence language and the conventional output file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mode {
    /// Full HTML document with inline CSS and JS.
    #[serde(rename = "html")]
    Markup,
    /// Three.js scene script; `scene`, `camera`, `renderer`, `controls` are provided.
    #[serde(rename = "three")]
    Scene,
    /// Python script run in the browser (numpy, matplotlib).
    #[serde(rename = "python")]
    Script,
}

impl Mode {
    pub fn all() -> &'static [Mode] {
        &[Mode::Markup, Mode::Scene, Mode::Script]
    }

    /// Stable tag used in persisted state and prompts.
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Markup => "html",
            Mode::Scene => "three",
            Mode::Script => "python",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Mode::Markup => "HTML",
            Mode::Scene => "Three.js",
            Mode::Script => "Python",
        }
    }

    pub fn fence_language(&self) -> &'static str {
        match self {
            Mode::Markup => "html",
            Mode::Scene => "javascript",
            Mode::Script => "python",
        }
    }

    pub fn file_name(&self) -> &'static str {
        match self {
            Mode::Markup => "index.html",
            Mode::Scene => "scene.js",
            Mode::Script => "script.py",
        }
    }
}

impl Default for Mode {
    fn default() -> Self {
        Mode::Markup
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown mode '{0}' (expected html, three or python)")]
pub struct UnknownMode(pub String);

impl FromStr for Mode {
    type Err = UnknownMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "html" | "markup" => Ok(Mode::Markup),
            "three" | "threejs" | "three.js" | "scene" => Ok(Mode::Scene),
            "python" | "py" | "script" => Ok(Mode::Script),
            other => Err(UnknownMode(other.to_string())),
        }
    }
}
