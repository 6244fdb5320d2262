pub mod agent;
#[cfg(feature = "cli")]
pub mod cli;
pub mod color;
pub mod config;
pub mod geometry;
pub mod render;
pub mod shape;

pub use agent::SvgAgent;
#[cfg(feature = "cli")]
pub use cli::run;
pub use color::{normalize_color, resolve_color};
pub use config::{load_config, Config};
pub use render::Scene;
pub use shape::{ArrowheadType, Shape, ShapeError, ShapeKind, TextAnchor};
