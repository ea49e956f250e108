//! # geodepto
//!
//! Lecture des limites départementales depuis les formats publiés par les
//! sources cartographiques.
//!
//! ## Formats
//!
//! - Shapefile ESRI : géométries `.shp`, index `.shx`, attributs `.dbf`
//!   (encodage déduit du Language Driver ID, ou forcé)
//! - GeoJSON : FeatureCollection, Feature ou Geometry seule
//! - TopoJSON : première couche convertie en entités
//!
//! Toutes les sources produisent une [`FeatureCollection`] de types `geo`.
//!
//! ## Usage
//!
//! ```rust,ignore
//! let shp = std::fs::read("departamentos.shp")?;
//! let dbf = std::fs::read("departamentos.dbf")?;
//! let collection = geodepto::read_shapefile(&shp, &dbf, None, None)?;
//! for feature in &collection {
//!     println!("{:?}", feature.property("NOMBRE_DPT"));
//! }
//! ```

pub mod error;
pub mod json;
pub mod parser;
pub mod topology;
pub mod types;

pub use error::GeoError;
pub use json::parse as read_json;
pub use topology::Topology;
pub use types::{Feature, FeatureCollection};

use encoding_rs::Encoding;
use tracing::{debug, warn};

/// Combine les géométries `.shp` et les attributs `.dbf` par position.
///
/// L'enregistrement `i` du `.dbf` porte les attributs de la forme `i` du
/// `.shp`. Une forme sans enregistrement reçoit un sac d'attributs vide.
/// L'index `.shx`, s'il est fourni, sert uniquement de contrôle.
///
/// # Errors
///
/// Retourne `GeoError` si le `.shp` ou le `.dbf` est illisible. Un `.shx`
/// illisible n'est pas bloquant.
pub fn read_shapefile(
    shp: &[u8],
    dbf: &[u8],
    shx: Option<&[u8]>,
    encoding: Option<&'static Encoding>,
) -> Result<FeatureCollection, GeoError> {
    let shapes = parser::shp::parse(shp)?;
    let table = parser::dbf::parse(dbf, encoding)?;

    if let Some(index) = shx {
        match parser::shp::index_len(index) {
            Ok(entries) if entries != shapes.len() => {
                warn!(
                    index = entries,
                    shapes = shapes.len(),
                    "Shape index and geometry disagree on record count"
                );
            }
            Ok(_) => {}
            Err(e) => warn!("Ignoring unreadable shape index: {}", e),
        }
    }

    if table.records.len() != shapes.len() {
        warn!(
            records = table.records.len(),
            shapes = shapes.len(),
            "Attribute table and geometry disagree on record count"
        );
    }

    let mut records = table.records.into_iter();
    let features: Vec<Feature> = shapes
        .into_iter()
        .enumerate()
        .map(|(index, geometry)| Feature {
            index,
            geometry,
            properties: records.next().unwrap_or_default(),
        })
        .collect();

    debug!(
        features = features.len(),
        encoding = table.encoding,
        "Combined shapefile geometry and attributes"
    );

    Ok(FeatureCollection::new(features))
}
