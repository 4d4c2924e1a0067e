//! Preview renderer that writes the current code to an output directory.
//!
//! HTML is written as `index.html`, Python as `script.py`. Three.js code is
//! written as `scene.js` and also embedded in `scene.html`, a standalone page
//! that provides the `scene`, `camera`, `renderer` and `controls` globals
//! the code expects.

use anyhow::{Context, Result};
use shared::events::PreviewRenderer;
use shared::Mode;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub const SCENE_HARNESS_FILE: &str = "scene.html";

const SCENE_HARNESS: &str = r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <style>body { margin: 0; overflow: hidden; }</style>
    <script src="https://cdnjs.cloudflare.com/ajax/libs/three.js/r128/three.min.js"></script>
    <script src="https://cdn.jsdelivr.net/npm/three@0.128.0/examples/js/controls/OrbitControls.js"></script>
</head>
<body>
    <script>
        try {
            const scene = new THREE.Scene();
            const camera = new THREE.PerspectiveCamera(75, window.innerWidth / window.innerHeight, 0.1, 1000);
            const renderer = new THREE.WebGLRenderer({ antialias: true });
            renderer.setSize(window.innerWidth, window.innerHeight);
            document.body.appendChild(renderer.domElement);

            const controls = new THREE.OrbitControls(camera, renderer.domElement);
            camera.position.z = 5;

            (function() {
__USER_CODE__
            })();

            window.addEventListener('resize', () => {
                camera.aspect = window.innerWidth / window.innerHeight;
                camera.updateProjectionMatrix();
                renderer.setSize(window.innerWidth, window.innerHeight);
            });
        } catch (err) {
            const box = document.createElement('pre');
            box.style.cssText = 'color:red; padding:20px;';
            box.textContent = 'Error: ' + err.message + '\n\n' + err.stack;
            document.body.appendChild(box);
        }
    </script>
</body>
</html>
"#;

/// Standalone page running `code` against a pre-built Three.js scene.
pub fn scene_harness(code: &str) -> String {
    // A literal closing tag would end the host <script> early.
    let escaped = code
        .replace("</script", "<\\/script")
        .replace("<script", "\\u003cscript");
    SCENE_HARNESS.replace("__USER_CODE__", &escaped)
}

/// Write `code` under the conventional file name for `mode` in `dir`.
/// Returns the path of the primary file.
pub fn export(dir: &Path, mode: Mode, code: &str) -> Result<PathBuf> {
    fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    let path = dir.join(mode.file_name());
    fs::write(&path, code).with_context(|| format!("writing {}", path.display()))?;
    if mode == Mode::Scene {
        let harness = dir.join(SCENE_HARNESS_FILE);
        fs::write(&harness, scene_harness(code))
            .with_context(|| format!("writing {}", harness.display()))?;
    }
    Ok(path)
}

pub struct FilePreview {
    dir: PathBuf,
}

impl FilePreview {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl PreviewRenderer for FilePreview {
    fn render(&self, code: &str, mode: Mode) {
        match export(&self.dir, mode, code) {
            Ok(path) => debug!("Preview updated: {}", path.display()),
            Err(e) => warn!("Preview write failed: {:#}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_export_uses_mode_file_names() {
        let dir = TempDir::new().unwrap();
        let html = export(dir.path(), Mode::Markup, "<h1>hi</h1>").unwrap();
        assert_eq!(html.file_name().unwrap(), "index.html");
        assert_eq!(fs::read_to_string(&html).unwrap(), "<h1>hi</h1>");

        let py = export(dir.path(), Mode::Script, "print(1)").unwrap();
        assert_eq!(py.file_name().unwrap(), "script.py");
        assert!(!dir.path().join(SCENE_HARNESS_FILE).exists());
    }

    #[test]
    fn test_scene_export_writes_harness() {
        let dir = TempDir::new().unwrap();
        let preview = FilePreview::new(dir.path().join("out"));
        preview.render("scene.add(new THREE.Mesh());", Mode::Scene);

        let script = fs::read_to_string(preview.dir().join("scene.js")).unwrap();
        assert_eq!(script, "scene.add(new THREE.Mesh());");
        let page = fs::read_to_string(preview.dir().join(SCENE_HARNESS_FILE)).unwrap();
        assert!(page.contains("scene.add(new THREE.Mesh());"));
        assert!(page.contains("new THREE.OrbitControls"));
    }

    #[test]
    fn test_harness_neutralizes_script_tags() {
        let page = scene_harness("const s = '</script><script>alert(1)';");
        assert!(!page.contains("'</script>"));
        assert!(page.contains("<\\/script>"));
        assert!(page.contains("\\u003cscript>alert(1)"));
    }
}
