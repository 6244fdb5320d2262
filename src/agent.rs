//! Facade over [`Scene`] for the surrounding generate-and-refine loop.
//!
//! The orchestration layer hands over raw JSON text produced by a language
//! model and wants an image back; this is the whole surface it is allowed to
//! depend on. Input parses with serde_json first and falls back to json5,
//! since model output tends to carry trailing commas and unquoted keys.

use crate::render::Scene;
use anyhow::{anyhow, Result};
use serde_json::Value;
use std::path::Path;

#[derive(Debug, Clone)]
pub struct SvgAgent {
    scene: Scene,
}

impl SvgAgent {
    pub fn new(canvas_width: u32, canvas_height: u32, background: impl Into<String>) -> Self {
        Self {
            scene: Scene::new(canvas_width, canvas_height, background),
        }
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    /// Ingests a JSON shape list (array of attribute maps) or a single shape
    /// object. Returns true when at least one shape was accepted.
    pub fn create_from_json(&mut self, json: &str) -> bool {
        match parse_lenient(json) {
            Ok(value) => self.create_from_value(&value),
            Err(err) => {
                eprintln!("warning: invalid shape JSON: {err}");
                false
            }
        }
    }

    pub fn create_from_value(&mut self, value: &Value) -> bool {
        match value {
            Value::Array(entries) => self.scene.add_shapes(entries) > 0,
            Value::Object(_) => self.scene.add_shape(value),
            _ => {
                eprintln!("warning: shape JSON must be an object or an array of objects");
                false
            }
        }
    }

    pub fn render(&self) -> String {
        self.scene.render_svg()
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        self.scene.save_svg(path)
    }

    pub fn save_png(&self, path: &Path, width: Option<u32>, height: Option<u32>) -> Result<()> {
        self.scene.save_png(path, width, height)
    }

    /// One-shot candidate rendering: clears the canvas, ingests a shape
    /// list, and rasterizes. This is the path the refine loop uses per
    /// candidate, so a stale previous scene must never leak through.
    pub fn save_json_as_png(
        &mut self,
        json: &str,
        path: &Path,
        width: Option<u32>,
        height: Option<u32>,
    ) -> Result<()> {
        self.clear();
        if !self.create_from_json(json) {
            return Err(anyhow!("no valid shapes in JSON input"));
        }
        self.save_png(path, width, height)
    }

    pub fn clear(&mut self) {
        self.scene.clear();
    }
}

impl Default for SvgAgent {
    fn default() -> Self {
        Self::new(800, 600, "white")
    }
}

/// serde_json first for strict inputs, json5 for the sloppy ones.
pub fn parse_lenient(json: &str) -> Result<Value> {
    match serde_json::from_str(json) {
        Ok(value) => Ok(value),
        Err(strict_err) => json5::from_str(json).map_err(|_| anyhow!(strict_err)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ingests_array_and_object() {
        let mut agent = SvgAgent::default();
        assert!(agent.create_from_json(
            r#"[{"shape_kind": "circle", "scale_x": 40}, {"shape_kind": "rectangle"}]"#
        ));
        assert_eq!(agent.scene().shapes().len(), 2);

        assert!(agent.create_from_json(r#"{"shape_kind": "triangle"}"#));
        assert_eq!(agent.scene().shapes().len(), 3);
    }

    #[test]
    fn rejects_non_object_json() {
        let mut agent = SvgAgent::default();
        assert!(!agent.create_from_json("42"));
        assert!(!agent.create_from_json("not json at all"));
        assert!(agent.scene().shapes().is_empty());
    }

    #[test]
    fn lenient_parse_accepts_json5() {
        let mut agent = SvgAgent::default();
        // Trailing comma and unquoted keys, typical model output.
        assert!(agent.create_from_json("[{shape_kind: 'circle', scale_x: 40,},]"));
        assert_eq!(agent.scene().shapes().len(), 1);
    }

    #[test]
    fn partial_batches_still_count_as_success() {
        let mut agent = SvgAgent::default();
        let ok = agent.create_from_json(
            r#"[{"shape_kind": "circle"}, {"shape_kind": "nonsense"}]"#,
        );
        assert!(ok);
        assert_eq!(agent.scene().shapes().len(), 1);
    }

    #[test]
    fn render_returns_document() {
        let mut agent = SvgAgent::new(400, 300, "white");
        agent.create_from_json(r#"[{"shape_kind": "circle", "fill_color": "teal"}]"#);
        let svg = agent.render();
        assert!(svg.contains("viewBox=\"0 0 400 300\""));
        assert!(svg.contains("fill=\"#008080\""));
    }
}
