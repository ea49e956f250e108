//! Conversion TopoJSON → entités
//!
//! Une topologie partage les arcs entre polygones voisins. Chaque géométrie
//! référence ses arcs par index ; un index négatif `!i` désigne l'arc `i`
//! parcouru à l'envers. Avec un `transform`, les arcs sont quantifiés et
//! encodés en delta.

use geo::{
    Coord, Geometry, GeometryCollection, LineString, MultiLineString, MultiPoint, MultiPolygon,
    Point, Polygon,
};
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::debug;

use crate::json::properties_to_text;
use crate::types::{Feature, FeatureCollection};
use crate::GeoError;

/// Document TopoJSON
#[derive(Debug, Deserialize)]
pub struct Topology {
    #[serde(default)]
    pub transform: Option<Transform>,

    #[serde(default)]
    pub arcs: Vec<Vec<Vec<f64>>>,

    /// Couches nommées, dans l'ordre du document
    pub objects: Map<String, Value>,
}

/// Quantification des positions
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct Transform {
    pub scale: [f64; 2],
    pub translate: [f64; 2],
}

impl Transform {
    fn apply(&self, x: f64, y: f64) -> Coord {
        Coord {
            x: x * self.scale[0] + self.translate[0],
            y: y * self.scale[1] + self.translate[1],
        }
    }
}

/// Objet géométrique d'une couche
#[derive(Debug, Deserialize)]
struct TopoObject {
    #[serde(rename = "type")]
    kind: Option<String>,

    #[serde(default)]
    properties: Option<Map<String, Value>>,

    #[serde(default)]
    arcs: Option<Value>,

    #[serde(default)]
    coordinates: Option<Value>,

    #[serde(default)]
    geometries: Vec<TopoObject>,
}

impl Topology {
    /// Nom de la première couche du document
    pub fn first_object_name(&self) -> Option<&str> {
        self.objects.keys().next().map(String::as_str)
    }

    /// Convertit une couche en collection d'entités
    ///
    /// Sans nom explicite, la première couche est utilisée.
    pub fn to_feature_collection(&self, object: Option<&str>) -> Result<FeatureCollection, GeoError> {
        let name = match object {
            Some(name) => name,
            None => self
                .first_object_name()
                .ok_or_else(|| GeoError::topology("topology has no objects"))?,
        };

        let value = self
            .objects
            .get(name)
            .ok_or_else(|| GeoError::topology(format!("unknown object '{}'", name)))?;
        let root: TopoObject = serde_json::from_value(value.clone())?;

        let arcs = self.decode_arcs()?;

        let objects: Vec<&TopoObject> = if root.kind.as_deref() == Some("GeometryCollection") {
            root.geometries.iter().collect()
        } else {
            vec![&root]
        };

        let mut features = Vec::with_capacity(objects.len());
        for (index, object) in objects.into_iter().enumerate() {
            features.push(Feature {
                index,
                geometry: self.convert(object, &arcs)?,
                properties: object
                    .properties
                    .as_ref()
                    .map(properties_to_text)
                    .unwrap_or_default(),
            });
        }

        debug!(object = name, features = features.len(), "Converted topology layer");
        Ok(FeatureCollection::new(features))
    }

    /// Décode tous les arcs en coordonnées absolues
    fn decode_arcs(&self) -> Result<Vec<Vec<Coord>>, GeoError> {
        self.arcs
            .iter()
            .enumerate()
            .map(|(i, arc)| {
                let mut x = 0.0;
                let mut y = 0.0;
                arc.iter()
                    .map(|position| {
                        let (&px, &py) = match position.as_slice() {
                            [px, py, ..] => (px, py),
                            _ => {
                                return Err(GeoError::topology(format!(
                                    "arc {} has a position with fewer than 2 values",
                                    i
                                )))
                            }
                        };
                        Ok(match &self.transform {
                            Some(t) => {
                                x += px;
                                y += py;
                                t.apply(x, y)
                            }
                            None => Coord { x: px, y: py },
                        })
                    })
                    .collect()
            })
            .collect()
    }

    fn position(&self, value: &[f64]) -> Result<Coord, GeoError> {
        match value {
            [x, y, ..] => Ok(match &self.transform {
                Some(t) => t.apply(*x, *y),
                None => Coord { x: *x, y: *y },
            }),
            _ => Err(GeoError::topology("position with fewer than 2 values")),
        }
    }

    fn convert(&self, object: &TopoObject, arcs: &[Vec<Coord>]) -> Result<Option<Geometry>, GeoError> {
        let Some(kind) = object.kind.as_deref() else {
            return Ok(None);
        };

        let geometry = match kind {
            "Point" => {
                let coords: Vec<f64> = field(&object.coordinates, "coordinates")?;
                Geometry::Point(Point::from(self.position(&coords)?))
            }
            "MultiPoint" => {
                let coords: Vec<Vec<f64>> = field(&object.coordinates, "coordinates")?;
                let points = coords
                    .iter()
                    .map(|c| self.position(c).map(Point::from))
                    .collect::<Result<Vec<_>, _>>()?;
                Geometry::MultiPoint(MultiPoint::new(points))
            }
            "LineString" => {
                let refs: Vec<i64> = field(&object.arcs, "arcs")?;
                Geometry::LineString(line(arcs, &refs)?)
            }
            "MultiLineString" => {
                let refs: Vec<Vec<i64>> = field(&object.arcs, "arcs")?;
                let lines = refs
                    .iter()
                    .map(|r| line(arcs, r))
                    .collect::<Result<Vec<_>, _>>()?;
                Geometry::MultiLineString(MultiLineString::new(lines))
            }
            "Polygon" => {
                let refs: Vec<Vec<i64>> = field(&object.arcs, "arcs")?;
                Geometry::Polygon(polygon(arcs, &refs)?)
            }
            "MultiPolygon" => {
                let refs: Vec<Vec<Vec<i64>>> = field(&object.arcs, "arcs")?;
                let polygons = refs
                    .iter()
                    .map(|p| polygon(arcs, p))
                    .collect::<Result<Vec<_>, _>>()?;
                Geometry::MultiPolygon(MultiPolygon::new(polygons))
            }
            "GeometryCollection" => {
                let mut members = Vec::with_capacity(object.geometries.len());
                for child in &object.geometries {
                    if let Some(g) = self.convert(child, arcs)? {
                        members.push(g);
                    }
                }
                Geometry::GeometryCollection(GeometryCollection::new_from(members))
            }
            other => return Err(GeoError::topology(format!("unknown geometry type '{}'", other))),
        };

        Ok(Some(geometry))
    }
}

fn field<T: serde::de::DeserializeOwned>(value: &Option<Value>, name: &str) -> Result<T, GeoError> {
    let value = value
        .as_ref()
        .ok_or_else(|| GeoError::topology(format!("missing '{}'", name)))?;
    serde_json::from_value(value.clone())
        .map_err(|e| GeoError::topology(format!("invalid '{}': {}", name, e)))
}

/// Enchaîne les arcs référencés ; le point de jonction n'est gardé qu'une fois
fn stitch(arcs: &[Vec<Coord>], refs: &[i64]) -> Result<Vec<Coord>, GeoError> {
    let mut points: Vec<Coord> = Vec::new();

    for &r in refs {
        let (idx, reversed) = if r < 0 { (!r, true) } else { (r, false) };
        let arc = usize::try_from(idx)
            .ok()
            .and_then(|i| arcs.get(i))
            .ok_or_else(|| GeoError::topology(format!("arc index {} out of range", r)))?;

        points.pop();
        if reversed {
            points.extend(arc.iter().rev().copied());
        } else {
            points.extend(arc.iter().copied());
        }
    }

    Ok(points)
}

fn line(arcs: &[Vec<Coord>], refs: &[i64]) -> Result<LineString, GeoError> {
    let mut points = stitch(arcs, refs)?;
    if let Some(&first) = points.first() {
        while points.len() < 2 {
            points.push(first);
        }
    }
    Ok(LineString::new(points))
}

fn ring(arcs: &[Vec<Coord>], refs: &[i64]) -> Result<LineString, GeoError> {
    let mut points = stitch(arcs, refs)?;
    if let Some(&first) = points.first() {
        while points.len() < 4 {
            points.push(first);
        }
    }
    Ok(LineString::new(points))
}

fn polygon(arcs: &[Vec<Coord>], refs: &[Vec<i64>]) -> Result<Polygon, GeoError> {
    let mut rings = refs
        .iter()
        .map(|r| ring(arcs, r))
        .collect::<Result<Vec<_>, _>>()?;
    if rings.is_empty() {
        return Ok(Polygon::new(LineString::new(vec![]), vec![]));
    }
    let exterior = rings.remove(0);
    Ok(Polygon::new(exterior, rings))
}
