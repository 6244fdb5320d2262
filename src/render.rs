//! Scene rendering: an ordered shape sequence composed into an SVG document,
//! with optional PNG rasterization via resvg.

use crate::color::normalize_color;
use crate::geometry::{self, fmt_num, outline, Outline};
use crate::shape::{Shape, ShapeError, ShapeKind};
use anyhow::Result;
use serde_json::Value;
use std::path::Path;

/// A canvas plus an ordered shape sequence. Paint order is list order: later
/// shapes occlude earlier ones. Scenes share nothing; render as many in
/// parallel as you like, but serialize access to any one instance.
#[derive(Debug, Clone)]
pub struct Scene {
    width: u32,
    height: u32,
    background: String,
    shapes: Vec<Shape>,
}

impl Scene {
    pub fn new(width: u32, height: u32, background: impl Into<String>) -> Self {
        Self {
            width,
            height,
            background: background.into(),
            shapes: Vec::new(),
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn shapes(&self) -> &[Shape] {
        &self.shapes
    }

    /// Validates and appends one shape from a JSON attribute map. A malformed
    /// shape warns and returns false; it never aborts the rest of the scene.
    pub fn add_shape(&mut self, attrs: &Value) -> bool {
        match self.try_add_shape(attrs) {
            Ok(()) => true,
            Err(err) => {
                eprintln!("warning: skipping shape: {err}");
                false
            }
        }
    }

    pub fn try_add_shape(&mut self, attrs: &Value) -> Result<(), ShapeError> {
        let shape = Shape::from_value(attrs)?;
        self.shapes.push(shape);
        Ok(())
    }

    /// Appends each entry, skip-and-count: returns how many were accepted.
    pub fn add_shapes(&mut self, entries: &[Value]) -> usize {
        entries.iter().filter(|attrs| self.add_shape(attrs)).count()
    }

    /// Appends an already-validated shape.
    pub fn push(&mut self, shape: Shape) {
        self.shapes.push(shape);
    }

    /// Empties the shape sequence; canvas dimensions and background stay.
    pub fn clear(&mut self) {
        self.shapes.clear();
    }

    /// Composes the full SVG document: generated marker defs, background
    /// rect (unless the background is "none"), then every shape in sequence
    /// order. Marker ids restart from zero each call, so two renders of the
    /// same scene are byte-identical.
    pub fn render_svg(&self) -> String {
        let mut defs = String::new();
        let mut body = String::new();
        let mut marker_seq = 0usize;

        if self.background != "none" {
            body.push_str(&format!(
                "<rect width=\"100%\" height=\"100%\" fill=\"{}\"/>",
                normalize_color(&self.background)
            ));
        }

        for shape in &self.shapes {
            body.push_str(&render_shape(shape, &mut defs, &mut marker_seq));
        }

        let mut svg = format!(
            "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{w}\" height=\"{h}\" viewBox=\"0 0 {w} {h}\" preserveAspectRatio=\"xMidYMid meet\">",
            w = self.width,
            h = self.height,
        );
        if !defs.is_empty() {
            svg.push_str("<defs>");
            svg.push_str(&defs);
            svg.push_str("</defs>");
        }
        svg.push_str(&body);
        svg.push_str("</svg>");
        svg
    }

    pub fn save_svg(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.render_svg())?;
        Ok(())
    }

    /// Rasterizes to PNG at the requested pixel dimensions (canvas size when
    /// omitted). Fails recoverably when the raster backend is unavailable;
    /// vector output is unaffected.
    pub fn save_png(&self, path: &Path, width: Option<u32>, height: Option<u32>) -> Result<()> {
        let svg = self.render_svg();
        write_output_png(
            &svg,
            path,
            width.unwrap_or(self.width),
            height.unwrap_or(self.height),
        )
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new(800, 600, "white")
    }
}

fn render_shape(shape: &Shape, defs: &mut String, marker_seq: &mut usize) -> String {
    let transform = transform_attr(shape);
    let style = style_attrs(shape);

    match outline(shape) {
        Outline::Circle { r } => format!(
            "<circle cx=\"0\" cy=\"0\" r=\"{}\"{transform}{style}/>",
            fmt_num(r)
        ),
        Outline::Rect { x, y, width, height } => format!(
            "<rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\"{transform}{style}/>",
            fmt_num(x),
            fmt_num(y),
            fmt_num(width),
            fmt_num(height)
        ),
        Outline::Ellipse { rx, ry } => format!(
            "<ellipse cx=\"0\" cy=\"0\" rx=\"{}\" ry=\"{}\"{transform}{style}/>",
            fmt_num(rx),
            fmt_num(ry)
        ),
        Outline::Polygon { points } => format!(
            "<polygon points=\"{}\"{transform}{style}/>",
            geometry::points_attr(&points)
        ),
        Outline::Label => render_text(shape),
        Outline::Path { points } => render_path(shape, &points, defs, marker_seq),
    }
}

fn render_text(shape: &Shape) -> String {
    // Unrotated text is positioned directly; rotated text goes through the
    // same translate+rotate composition as every other shape.
    let position = if shape.rotation == 0.0 {
        format!(" x=\"{}\" y=\"{}\"", fmt_num(shape.x), fmt_num(shape.y))
    } else {
        format!("{} x=\"0\" y=\"0\"", transform_attr(shape))
    };
    format!(
        "<text{position} font-size=\"{size}\" font-family=\"{family}\" fill=\"{fill}\" text-anchor=\"{anchor}\" dominant-baseline=\"middle\" opacity=\"{opacity}\">{content}</text>",
        size = fmt_num(shape.font_size),
        family = escape_xml(&shape.font_family),
        fill = normalize_color(&shape.text_color),
        anchor = shape.text_anchor.as_str(),
        opacity = fmt_num(shape.opacity),
        content = escape_xml(&shape.text),
    )
}

/// Polyline and arrow share a stroked, never-filled `<polyline>`; arrows add
/// a marker def per flagged end, keyed by the render-pass counter.
fn render_path(
    shape: &Shape,
    points: &[(f64, f64)],
    defs: &mut String,
    marker_seq: &mut usize,
) -> String {
    let stroke = normalize_color(&shape.stroke_color);
    let mut markers = String::new();

    if shape.shape_kind == ShapeKind::Arrow {
        if shape.arrow_start {
            let id = format!("arrow-start-{marker_seq}");
            *marker_seq += 1;
            defs.push_str(&geometry::marker_def(
                &id,
                shape.arrowhead_type,
                &stroke,
                shape.arrowhead_size,
                true,
            ));
            markers.push_str(&format!(" marker-start=\"url(#{id})\""));
        }
        if shape.arrow_end {
            let id = format!("arrow-end-{marker_seq}");
            *marker_seq += 1;
            defs.push_str(&geometry::marker_def(
                &id,
                shape.arrowhead_type,
                &stroke,
                shape.arrowhead_size,
                false,
            ));
            markers.push_str(&format!(" marker-end=\"url(#{id})\""));
        }
    }

    format!(
        "<polyline points=\"{points}\"{transform} fill=\"none\" stroke=\"{stroke}\" stroke-width=\"{width}\" opacity=\"{opacity}\"{markers}/>",
        points = geometry::points_attr(points),
        transform = transform_attr(shape),
        width = fmt_num(shape.stroke_width),
        opacity = fmt_num(shape.opacity),
    )
}

/// `translate(x,y)` then `rotate(deg)`: rotation is always about the shape's
/// own center, independent of position.
fn transform_attr(shape: &Shape) -> String {
    let mut parts = Vec::new();
    if shape.x != 0.0 || shape.y != 0.0 {
        parts.push(format!(
            "translate({},{})",
            fmt_num(shape.x),
            fmt_num(shape.y)
        ));
    }
    if shape.rotation != 0.0 {
        parts.push(format!("rotate({})", fmt_num(shape.rotation)));
    }
    if parts.is_empty() {
        String::new()
    } else {
        format!(" transform=\"{}\"", parts.join(" "))
    }
}

fn style_attrs(shape: &Shape) -> String {
    format!(
        " fill=\"{}\" stroke=\"{}\" stroke-width=\"{}\" opacity=\"{}\"",
        normalize_color(&shape.fill_color),
        normalize_color(&shape.stroke_color),
        fmt_num(shape.stroke_width),
        fmt_num(shape.opacity),
    )
}

pub fn write_output_svg(svg: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, svg)?;
        }
        None => {
            print!("{}", svg);
        }
    }
    Ok(())
}

#[cfg(feature = "png")]
pub fn write_output_png(svg: &str, output: &Path, width: u32, height: u32) -> Result<()> {
    let opt = usvg::Options::default();
    let tree = usvg::Tree::from_str(svg, &opt)?;

    let width = width.max(1);
    let height = height.max(1);
    let mut pixmap = resvg::tiny_skia::Pixmap::new(width, height)
        .ok_or_else(|| anyhow::anyhow!("Failed to allocate pixmap"))?;

    let size = tree.size();
    let scale_x = width as f32 / size.width();
    let scale_y = height as f32 / size.height();
    let mut pixmap_mut = pixmap.as_mut();
    resvg::render(
        &tree,
        resvg::tiny_skia::Transform::from_scale(scale_x, scale_y),
        &mut pixmap_mut,
    );
    pixmap.save_png(output)?;
    Ok(())
}

#[cfg(not(feature = "png"))]
pub fn write_output_png(_svg: &str, _output: &Path, _width: u32, _height: u32) -> Result<()> {
    Err(anyhow::anyhow!(
        "PNG output requires the `png` feature (resvg backend not compiled in)"
    ))
}

fn escape_xml(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn render_svg_basic() {
        let mut scene = Scene::new(800, 600, "white");
        assert!(scene.add_shape(&json!({
            "shape_kind": "rectangle",
            "x": 400, "y": 50, "scale_x": 700, "scale_y": 40,
            "fill_color": "yellow",
        })));
        let svg = scene.render_svg();
        assert!(svg.starts_with("<svg"));
        assert!(svg.contains("viewBox=\"0 0 800 600\""));
        assert!(svg.contains("fill=\"#ffff00\""));
        assert!(svg.contains("translate(400,50)"));
        assert!(svg.ends_with("</svg>"));
    }

    #[test]
    fn background_none_is_skipped() {
        let scene = Scene::new(100, 100, "none");
        assert!(!scene.render_svg().contains("<rect"));
        let scene = Scene::new(100, 100, "white");
        assert!(scene
            .render_svg()
            .contains("<rect width=\"100%\" height=\"100%\" fill=\"#ffffff\"/>"));
    }

    #[test]
    fn element_order_matches_shape_order() {
        let mut scene = Scene::new(200, 200, "white");
        scene.add_shape(&json!({"shape_kind": "circle", "scale_x": 50, "fill_color": "red"}));
        scene.add_shape(&json!({"shape_kind": "ellipse", "scale_x": 50, "scale_y": 30}));
        let svg = scene.render_svg();
        let bg = svg.find("width=\"100%\"").unwrap();
        let circle = svg.find("<circle").unwrap();
        let ellipse = svg.find("<ellipse").unwrap();
        assert!(bg < circle && circle < ellipse);
    }

    #[test]
    fn add_shapes_skips_and_counts() {
        let mut scene = Scene::new(100, 100, "white");
        let entries: Vec<Value> = vec![
            json!({"shape_kind": "circle"}),
            json!({"shape_kind": "rectangle"}),
            json!({"shape_kind": "triangle"}),
            json!({"shape_kind": "ellipse"}),
            json!({"shape_kind": "text", "text": "hi"}),
            json!({"shape_kind": "blob"}),
        ];
        assert_eq!(scene.add_shapes(&entries), 5);
        assert_eq!(scene.shapes().len(), 5);
    }

    #[test]
    fn clear_keeps_canvas() {
        let mut scene = Scene::new(320, 240, "black");
        scene.add_shape(&json!({"shape_kind": "circle"}));
        scene.clear();
        assert!(scene.shapes().is_empty());
        assert_eq!(scene.width(), 320);
        assert_eq!(scene.height(), 240);
        assert!(scene.render_svg().contains("fill=\"#000000\""));
    }

    #[test]
    fn marker_ids_are_reproducible() {
        let mut scene = Scene::new(500, 500, "none");
        scene.add_shape(&json!({
            "shape_kind": "arrow",
            "points": [[0, 0], [100, 0]],
            "arrow_start": "yes",
            "arrow_end": "yes",
        }));
        scene.add_shape(&json!({
            "shape_kind": "arrow",
            "points": [[0, 50], [100, 50]],
            "arrow_end": "yes",
        }));
        let first = scene.render_svg();
        assert_eq!(first, scene.render_svg());
        assert!(first.contains("id=\"arrow-start-0\""));
        assert!(first.contains("id=\"arrow-end-1\""));
        assert!(first.contains("id=\"arrow-end-2\""));
        assert!(first.contains("marker-end=\"url(#arrow-end-2)\""));
    }

    #[test]
    fn arrow_marker_matches_stroke_color() {
        let mut scene = Scene::new(200, 200, "none");
        scene.add_shape(&json!({
            "shape_kind": "arrow",
            "points": [[0, 0], [100, 0]],
            "arrow_end": "yes",
            "stroke_color": "crimson",
        }));
        let svg = scene.render_svg();
        assert!(svg.contains("<defs>"));
        assert!(svg.contains("fill=\"#dc143c\""));
        assert!(svg.contains("stroke=\"#dc143c\""));
    }

    #[test]
    fn text_without_rotation_is_positioned_directly() {
        let mut scene = Scene::new(200, 200, "none");
        scene.add_shape(&json!({
            "shape_kind": "text",
            "x": 50, "y": 60,
            "text": "a < b",
            "text_color": "navy",
        }));
        let svg = scene.render_svg();
        assert!(svg.contains("x=\"50\" y=\"60\""));
        assert!(!svg.contains("transform"));
        assert!(svg.contains("a &lt; b"));
        assert!(svg.contains("fill=\"#000080\""));
        assert!(svg.contains("text-anchor=\"middle\""));
    }

    #[test]
    fn rotated_text_uses_transform() {
        let mut scene = Scene::new(200, 200, "none");
        scene.add_shape(&json!({
            "shape_kind": "text",
            "x": 50, "y": 60,
            "rotation": 45,
            "text": "tilted",
        }));
        let svg = scene.render_svg();
        assert!(svg.contains("transform=\"translate(50,60) rotate(45)\""));
    }

    #[test]
    fn polyline_fill_is_forced_none() {
        let mut scene = Scene::new(200, 200, "none");
        scene.add_shape(&json!({
            "shape_kind": "polyline",
            "points": [[0, 0], [10, 10], [20, 0]],
            "fill_color": "red",
        }));
        let svg = scene.render_svg();
        assert!(svg.contains("fill=\"none\""));
        assert!(!svg.contains("fill=\"#ff0000\""));
    }

    #[test]
    fn rotation_360_is_geometrically_identical_to_zero() {
        let make = |rotation: f64| {
            let mut scene = Scene::new(100, 100, "none");
            scene.add_shape(&json!({
                "shape_kind": "rectangle",
                "x": 50, "y": 50, "scale_x": 20, "scale_y": 10,
                "rotation": rotation,
            }));
            scene.render_svg()
        };
        let at_zero = make(0.0);
        let at_full = make(360.0);
        // Same geometry attributes; only the (no-op) rotate differs.
        assert!(at_zero.contains("x=\"-10\" y=\"-5\" width=\"20\" height=\"10\""));
        assert!(at_full.contains("x=\"-10\" y=\"-5\" width=\"20\" height=\"10\""));
        assert!(at_full.contains("rotate(360)"));
    }

    #[test]
    fn end_to_end_banner_and_arrow() {
        let mut scene = Scene::new(800, 600, "white");
        let count = scene.add_shapes(&[
            json!({
                "shape_kind": "rectangle",
                "x": 400, "y": 50, "scale_x": 700, "scale_y": 40,
                "fill_color": "yellow",
            }),
            json!({
                "shape_kind": "arrow",
                "points": [[370, 300], [490, 300]],
                "arrow_end": "yes",
                "arrowhead_size": 12,
            }),
        ]);
        assert_eq!(count, 2);
        let svg = scene.render_svg();
        // Background + rectangle + polyline, in that order.
        assert_eq!(svg.matches("<rect").count(), 2);
        assert_eq!(svg.matches("<polyline").count(), 1);
        // Shaft stops at the arrowhead base: 490 - 12 = 478.
        assert!(svg.contains("points=\"370,300 478,300\""));
        assert_eq!(svg.matches("<marker").count(), 1);
    }
}
