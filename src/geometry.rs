//! Per-kind local-coordinate geometry and arrowhead marker definitions.
//!
//! Everything here is a pure function of one shape: outlines are computed in
//! the shape's local frame (the renderer applies `translate` + `rotate`),
//! arrow paths are shortened so the line stops at the base of the arrowhead,
//! and marker defs are emitted as reusable `<marker>` elements.

use crate::shape::{ArrowheadType, Shape, ShapeKind};

/// A shape's outline in local coordinates, before transform and style.
#[derive(Debug, Clone, PartialEq)]
pub enum Outline {
    Circle { r: f64 },
    Rect { x: f64, y: f64, width: f64, height: f64 },
    Ellipse { rx: f64, ry: f64 },
    Polygon { points: Vec<(f64, f64)> },
    Path { points: Vec<(f64, f64)> },
    /// Text has no outline; the renderer positions it directly.
    Label,
}

pub fn outline(shape: &Shape) -> Outline {
    match shape.shape_kind {
        ShapeKind::Circle => Outline::Circle { r: shape.scale_x / 2.0 },
        ShapeKind::Rectangle => {
            let width = shape.scale_x;
            let height = shape.scale_y;
            Outline::Rect { x: -width / 2.0, y: -height / 2.0, width, height }
        }
        ShapeKind::Ellipse => Outline::Ellipse { rx: shape.scale_x / 2.0, ry: shape.scale_y / 2.0 },
        ShapeKind::Triangle => {
            // Upward-pointing isoceles: apex top-center, base corners below.
            let half_base = shape.scale_x / 2.0;
            let half_height = shape.scale_y / 2.0;
            Outline::Polygon {
                points: vec![
                    (0.0, -half_height),
                    (-half_base, half_height),
                    (half_base, half_height),
                ],
            }
        }
        ShapeKind::Text => Outline::Label,
        ShapeKind::Polyline => Outline::Path { points: to_pairs(&shape.points) },
        ShapeKind::Arrow => Outline::Path { points: arrow_path(shape) },
    }
}

/// The arrow's path with each flagged end pulled back by `arrowhead_size`
/// along the adjacent segment, so the stroke stops at the arrowhead's base.
/// Zero-length adjacent segments are left untouched.
pub fn arrow_path(shape: &Shape) -> Vec<(f64, f64)> {
    let mut points = to_pairs(&shape.points);
    let size = shape.arrowhead_size;

    if shape.arrow_end && points.len() >= 2 {
        let last = points[points.len() - 1];
        let prev = points[points.len() - 2];
        let dx = last.0 - prev.0;
        let dy = last.1 - prev.1;
        let length = (dx * dx + dy * dy).sqrt();
        if length > 0.0 {
            let ratio = (length - size) / length;
            let n = points.len() - 1;
            points[n] = (prev.0 + dx * ratio, prev.1 + dy * ratio);
        }
    }

    if shape.arrow_start && points.len() >= 2 {
        let first = points[0];
        let next = points[1];
        let dx = next.0 - first.0;
        let dy = next.1 - first.1;
        let length = (dx * dx + dy * dy).sqrt();
        if length > 0.0 {
            let ratio = size / length;
            points[0] = (first.0 + dx * ratio, first.1 + dy * ratio);
        }
    }

    points
}

/// One reusable `<marker>` def for a flagged arrow end. Start markers point
/// backwards via `auto-start-reverse`; end markers follow the path forwards.
pub fn marker_def(
    id: &str,
    arrowhead: ArrowheadType,
    color: &str,
    size: f64,
    is_start: bool,
) -> String {
    let orient = if is_start { "auto-start-reverse" } else { "auto" };
    let mut def = format!(
        "<marker id=\"{id}\" markerWidth=\"{w}\" markerHeight=\"{h}\" refX=\"0\" refY=\"{ref_y}\" orient=\"{orient}\" markerUnits=\"userSpaceOnUse\">",
        w = fmt_num(size),
        h = fmt_num(size),
        ref_y = fmt_num(size / 2.0),
    );

    match arrowhead {
        ArrowheadType::Triangle => {
            def.push_str(&format!(
                "<path d=\"M 0 0 L {tip} {mid} L 0 {base} Z\" fill=\"{color}\"/>",
                tip = fmt_num(size),
                mid = fmt_num(size / 2.0),
                base = fmt_num(size),
            ));
        }
        ArrowheadType::Circle => {
            def.push_str(&format!(
                "<circle cx=\"{cx}\" cy=\"{cy}\" r=\"{r}\" fill=\"{color}\"/>",
                cx = fmt_num(size * 0.5),
                cy = fmt_num(size / 2.0),
                r = fmt_num(size / 3.0),
            ));
        }
        ArrowheadType::Diamond => {
            def.push_str(&format!(
                "<polygon points=\"{p0x},{p0y} {p1x},{p1y} {p2x},{p2y} {p3x},{p3y}\" fill=\"{color}\"/>",
                p0x = fmt_num(size),
                p0y = fmt_num(size / 2.0),
                p1x = fmt_num(size * 0.6),
                p1y = fmt_num(size * 0.2),
                p2x = fmt_num(size * 0.2),
                p2y = fmt_num(size / 2.0),
                p3x = fmt_num(size * 0.6),
                p3y = fmt_num(size * 0.8),
            ));
        }
    }

    def.push_str("</marker>");
    def
}

pub fn points_attr(points: &[(f64, f64)]) -> String {
    points
        .iter()
        .map(|(x, y)| format!("{},{}", fmt_num(*x), fmt_num(*y)))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Formats a coordinate without trailing `.0` noise for whole values.
pub fn fmt_num(value: f64) -> String {
    if value.fract() == 0.0 && value.is_finite() {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}

fn to_pairs(points: &[[f64; 2]]) -> Vec<(f64, f64)> {
    points.iter().map(|p| (p[0], p[1])).collect()
}
