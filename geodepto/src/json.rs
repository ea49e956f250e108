//! Lecture des documents JSON : GeoJSON ou TopoJSON

use std::collections::HashMap;

use geojson::GeoJson;
use serde_json::{Map, Value};
use tracing::debug;

use crate::topology::Topology;
use crate::types::{Feature, FeatureCollection};
use crate::GeoError;

/// Convertit les propriétés JSON en texte (les `null` sont omis)
pub fn properties_to_text(properties: &Map<String, Value>) -> HashMap<String, String> {
    properties
        .iter()
        .filter_map(|(key, value)| {
            let text = match value {
                Value::Null => return None,
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            Some((key.clone(), text))
        })
        .collect()
}

/// Parse un document JSON de géométries
///
/// Un document `{"type": "Topology"}` est converti depuis sa première couche ;
/// sinon il est lu comme GeoJSON (FeatureCollection, Feature ou Geometry seule).
pub fn parse(data: &[u8]) -> Result<FeatureCollection, GeoError> {
    let value: Value = serde_json::from_slice(data)?;

    if value.get("type").and_then(Value::as_str) == Some("Topology") {
        let topology: Topology = serde_json::from_value(value)?;
        return topology.to_feature_collection(None);
    }

    let geojson =
        GeoJson::from_json_value(value).map_err(|e| GeoError::InvalidGeoJson(e.to_string()))?;

    let features = match geojson {
        GeoJson::FeatureCollection(fc) => fc.features,
        GeoJson::Feature(f) => vec![f],
        GeoJson::Geometry(g) => vec![geojson::Feature {
            bbox: None,
            geometry: Some(g),
            id: None,
            properties: None,
            foreign_members: None,
        }],
    };

    let features = features
        .into_iter()
        .enumerate()
        .map(|(index, feature)| {
            let geometry = feature
                .geometry
                .map(|g| {
                    geo::Geometry::<f64>::try_from(g.value)
                        .map_err(|e| GeoError::InvalidGeoJson(format!("feature {}: {}", index, e)))
                })
                .transpose()?;

            Ok(Feature {
                index,
                geometry,
                properties: feature
                    .properties
                    .as_ref()
                    .map(properties_to_text)
                    .unwrap_or_default(),
            })
        })
        .collect::<Result<Vec<_>, GeoError>>()?;

    debug!(features = features.len(), "Parsed GeoJSON document");
    Ok(FeatureCollection::new(features))
}
