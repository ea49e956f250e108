//! Projection et rendu de la carte choroplèthe

pub mod choropleth;
pub mod palette;
pub mod projection;
pub mod svg;

pub use choropleth::{feature_name, Choropleth, RenderedFeature, NAME_KEYS, UNKNOWN_LABEL};
pub use palette::{Severity, NO_DATA_FILL, STROKE, STROKE_WIDTH};
pub use projection::MercatorFit;

/// Canevas logique de la carte
pub const CANVAS_WIDTH: f64 = 800.0;
pub const CANVAS_HEIGHT: f64 = 600.0;
