//! Shape model: the validated, typed form of one entry in a shape list.
//!
//! Shapes arrive as JSON attribute maps from an upstream generator. They are
//! validated once at construction: unknown keys are rejected (a misspelled
//! field must not be silently dropped), `shape_kind` is required, everything
//! else takes a documented default. No cross-field validation beyond the
//! polyline/arrow minimum point count; negative scales pass through and
//! render mirrored or degenerate geometry.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ShapeError {
    /// Unknown key, missing `shape_kind`, unrecognized kind or enum value,
    /// or a type mismatch. Carries the serde detail.
    #[error("invalid shape attributes: {0}")]
    InvalidAttributes(#[from] serde_json::Error),

    /// Polyline and arrow shapes need at least two points for a visible path.
    #[error("{kind:?} requires at least 2 points, got {got}")]
    TooFewPoints { kind: ShapeKind, got: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapeKind {
    Rectangle,
    Ellipse,
    Circle,
    Triangle,
    Text,
    Polyline,
    Arrow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAnchor {
    Start,
    Middle,
    End,
}

impl TextAnchor {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Middle => "middle",
            Self::End => "end",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArrowheadType {
    Triangle,
    Circle,
    Diamond,
}

/// One drawable primitive. Immutable once constructed; a scene mutates by
/// replacing its sequence, never by editing shapes in place.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Shape {
    pub shape_kind: ShapeKind,
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    #[serde(default = "default_scale")]
    pub scale_x: f64,
    #[serde(default = "default_scale")]
    pub scale_y: f64,
    /// Degrees, clockwise, about the shape's own center.
    #[serde(default)]
    pub rotation: f64,
    #[serde(default = "default_opacity")]
    pub opacity: f64,
    #[serde(default = "default_fill")]
    pub fill_color: String,
    #[serde(default = "default_black")]
    pub stroke_color: String,
    #[serde(default = "default_stroke_width")]
    pub stroke_width: f64,

    // Text-only attributes.
    #[serde(default)]
    pub text: String,
    #[serde(default = "default_font_size")]
    pub font_size: f64,
    #[serde(default = "default_font_family")]
    pub font_family: String,
    #[serde(default = "default_black")]
    pub text_color: String,
    #[serde(default = "default_anchor")]
    pub text_anchor: TextAnchor,

    // Polyline/arrow-only attributes.
    #[serde(default)]
    pub points: Vec<[f64; 2]>,
    #[serde(default, serialize_with = "ser_yes_no", deserialize_with = "de_yes_no")]
    pub arrow_start: bool,
    #[serde(default, serialize_with = "ser_yes_no", deserialize_with = "de_yes_no")]
    pub arrow_end: bool,
    #[serde(default = "default_arrowhead_type")]
    pub arrowhead_type: ArrowheadType,
    #[serde(default = "default_arrowhead_size")]
    pub arrowhead_size: f64,
}

fn default_scale() -> f64 {
    1.0
}

fn default_opacity() -> f64 {
    1.0
}

fn default_fill() -> String {
    "none".to_string()
}

fn default_black() -> String {
    "black".to_string()
}

fn default_stroke_width() -> f64 {
    1.0
}

fn default_font_size() -> f64 {
    16.0
}

fn default_font_family() -> String {
    "Arial, sans-serif".to_string()
}

fn default_anchor() -> TextAnchor {
    TextAnchor::Middle
}

fn default_arrowhead_type() -> ArrowheadType {
    ArrowheadType::Triangle
}

fn default_arrowhead_size() -> f64 {
    10.0
}

// Arrow flags travel as "yes"/"no" in the wire format; accept plain booleans
// too since some generators emit them.
fn de_yes_no<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Text(String),
        Bool(bool),
    }

    match Flag::deserialize(deserializer)? {
        Flag::Bool(b) => Ok(b),
        Flag::Text(s) => match s.to_lowercase().as_str() {
            "yes" => Ok(true),
            "no" => Ok(false),
            other => Err(D::Error::custom(format!(
                "expected \"yes\" or \"no\", got \"{other}\""
            ))),
        },
    }
}

fn ser_yes_no<S: Serializer>(value: &bool, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(if *value { "yes" } else { "no" })
}

impl Shape {
    /// Validates a JSON attribute map into a typed shape.
    pub fn from_value(attrs: &Value) -> Result<Self, ShapeError> {
        let shape: Shape = serde_json::from_value(attrs.clone())?;
        if matches!(shape.shape_kind, ShapeKind::Polyline | ShapeKind::Arrow)
            && shape.points.len() < 2
        {
            return Err(ShapeError::TooFewPoints {
                kind: shape.shape_kind,
                got: shape.points.len(),
            });
        }
        Ok(shape)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn defaults_are_applied() {
        let shape = Shape::from_value(&json!({"shape_kind": "circle"})).unwrap();
        assert_eq!(shape.shape_kind, ShapeKind::Circle);
        assert_eq!(shape.x, 0.0);
        assert_eq!(shape.scale_x, 1.0);
        assert_eq!(shape.rotation, 0.0);
        assert_eq!(shape.opacity, 1.0);
        assert_eq!(shape.fill_color, "none");
        assert_eq!(shape.stroke_color, "black");
        assert_eq!(shape.stroke_width, 1.0);
        assert_eq!(shape.text_anchor, TextAnchor::Middle);
        assert_eq!(shape.arrowhead_type, ArrowheadType::Triangle);
        assert_eq!(shape.arrowhead_size, 10.0);
        assert!(!shape.arrow_start);
        assert!(!shape.arrow_end);
    }

    #[test]
    fn unknown_field_is_rejected() {
        let err = Shape::from_value(&json!({"shape_kind": "circle", "radius": 10}));
        assert!(matches!(err, Err(ShapeError::InvalidAttributes(_))));
    }

    #[test]
    fn missing_kind_is_rejected() {
        let err = Shape::from_value(&json!({"x": 10}));
        assert!(matches!(err, Err(ShapeError::InvalidAttributes(_))));
    }

    #[test]
    fn unknown_kind_is_rejected() {
        let err = Shape::from_value(&json!({"shape_kind": "hexagon"}));
        assert!(matches!(err, Err(ShapeError::InvalidAttributes(_))));
    }

    #[test]
    fn arrow_flags_accept_yes_no_and_bool() {
        let shape = Shape::from_value(&json!({
            "shape_kind": "arrow",
            "points": [[0, 0], [10, 0]],
            "arrow_start": "yes",
            "arrow_end": true,
        }))
        .unwrap();
        assert!(shape.arrow_start);
        assert!(shape.arrow_end);

        let err = Shape::from_value(&json!({
            "shape_kind": "arrow",
            "points": [[0, 0], [10, 0]],
            "arrow_end": "maybe",
        }));
        assert!(err.is_err());
    }

    #[test]
    fn arrow_flags_serialize_as_yes_no() {
        let shape = Shape::from_value(&json!({
            "shape_kind": "arrow",
            "points": [[0, 0], [10, 0]],
            "arrow_end": "yes",
        }))
        .unwrap();
        let round = serde_json::to_value(&shape).unwrap();
        assert_eq!(round["arrow_end"], "yes");
        assert_eq!(round["arrow_start"], "no");
    }

    #[test]
    fn short_point_list_is_rejected() {
        let err = Shape::from_value(&json!({"shape_kind": "polyline", "points": [[1, 2]]}));
        assert!(matches!(err, Err(ShapeError::TooFewPoints { got: 1, .. })));
        // Rectangles carry no points and are fine without them.
        assert!(Shape::from_value(&json!({"shape_kind": "rectangle"})).is_ok());
    }

    #[test]
    fn negative_scale_passes_through() {
        let shape =
            Shape::from_value(&json!({"shape_kind": "rectangle", "scale_x": -40})).unwrap();
        assert_eq!(shape.scale_x, -40.0);
    }
}
