//! Choroplèthe : nom, région, couleur et tracé de chaque entité

use std::collections::HashMap;
use std::fmt::Write;

use geo::{Coord, Geometry, LineString, Polygon};
use geodepto::{Feature, FeatureCollection};
use tracing::{debug, trace};

use super::palette::fill_for;
use super::projection::MercatorFit;
use crate::dataset::Region;
use crate::resolver::ResolutionTable;

/// Attributs candidats pour le nom du département, par priorité
pub const NAME_KEYS: &[&str] = &[
    "NOMBRE_DPT",
    "DPTO_CNMBR",
    "DEPARTAMENTO",
    "DEPARTAMEN",
    "DPTO",
    "name",
    "NAME",
];

/// Sélection d'une entité sans nom ni correspondance
pub const UNKNOWN_LABEL: &str = "Desconocido";

/// Rayon des points isolés, en pixels
const POINT_RADIUS: f64 = 4.5;

/// Premier nom non vide parmi [`NAME_KEYS`]
pub fn feature_name(properties: &HashMap<String, String>) -> Option<&str> {
    NAME_KEYS
        .iter()
        .filter_map(|key| properties.get(*key))
        .map(|value| value.trim())
        .find(|value| !value.is_empty())
}

/// Une entité prête à dessiner
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedFeature {
    /// Position dans la collection source
    pub index: usize,
    /// Données de chemin SVG (vide sans géométrie)
    pub path: String,
    pub fill: &'static str,
    /// Nom tel que publié par la source
    pub raw_name: Option<String>,
    /// Région trouvée dans le jeu de données
    pub region: Option<Region>,
}

impl RenderedFeature {
    /// Valeur de sélection au clic, jamais vide
    pub fn selection_label(&self) -> String {
        self.region
            .as_ref()
            .map(|r| r.name.clone())
            .or_else(|| self.raw_name.clone())
            .unwrap_or_else(|| UNKNOWN_LABEL.to_string())
    }

    /// Texte de survol : nom et cas
    pub fn title(&self) -> String {
        match &self.region {
            Some(region) => format!("{}: {} casos", region.name, region.cases),
            None => format!("{}: sin datos", self.selection_label()),
        }
    }
}

/// Rendu d'une collection avec une table et une projection
pub struct Choropleth<'a> {
    table: &'a ResolutionTable,
    projection: MercatorFit,
}

impl<'a> Choropleth<'a> {
    pub fn new(table: &'a ResolutionTable, projection: MercatorFit) -> Self {
        Self { table, projection }
    }

    pub fn projection(&self) -> &MercatorFit {
        &self.projection
    }

    /// Rend chaque entité dans l'ordre de la collection
    pub fn render(&self, collection: &FeatureCollection) -> Vec<RenderedFeature> {
        let rendered: Vec<RenderedFeature> =
            collection.iter().map(|f| self.render_feature(f)).collect();

        let matched = rendered.iter().filter(|f| f.region.is_some()).count();
        debug!(
            features = rendered.len(),
            matched,
            unmatched = rendered.len() - matched,
            "Rendered choropleth"
        );
        rendered
    }

    pub fn render_feature(&self, feature: &Feature) -> RenderedFeature {
        let raw_name = feature_name(&feature.properties).map(str::to_string);
        let region = raw_name
            .as_deref()
            .and_then(|name| self.table.resolve(name))
            .cloned();

        if region.is_none() {
            trace!(index = feature.index, raw_name = ?raw_name, "No region for feature");
        }

        RenderedFeature {
            index: feature.index,
            path: feature
                .geometry
                .as_ref()
                .map(|g| path_data(g, &self.projection))
                .unwrap_or_default(),
            fill: fill_for(region.as_ref().map(|r| r.cases)),
            raw_name,
            region,
        }
    }
}

/// Données de chemin SVG d'une géométrie projetée
pub fn path_data(geometry: &Geometry<f64>, projection: &MercatorFit) -> String {
    let mut out = String::new();
    write_geometry(&mut out, geometry, projection);
    out
}

fn write_geometry(out: &mut String, geometry: &Geometry<f64>, projection: &MercatorFit) {
    match geometry {
        Geometry::Point(p) => write_point(out, p.0, projection),
        Geometry::MultiPoint(mp) => mp.iter().for_each(|p| write_point(out, p.0, projection)),
        Geometry::Line(l) => write_line(out, [l.start, l.end].into_iter(), false, projection),
        Geometry::LineString(ls) => write_line(out, ls.coords().copied(), false, projection),
        Geometry::MultiLineString(mls) => mls
            .iter()
            .for_each(|ls| write_line(out, ls.coords().copied(), false, projection)),
        Geometry::Polygon(p) => write_polygon(out, p, projection),
        Geometry::MultiPolygon(mp) => mp.iter().for_each(|p| write_polygon(out, p, projection)),
        Geometry::Rect(r) => write_polygon(out, &r.to_polygon(), projection),
        Geometry::Triangle(t) => write_polygon(out, &t.to_polygon(), projection),
        Geometry::GeometryCollection(gc) => {
            gc.iter().for_each(|g| write_geometry(out, g, projection))
        }
    }
}

fn write_polygon(out: &mut String, polygon: &Polygon<f64>, projection: &MercatorFit) {
    write_ring(out, polygon.exterior(), projection);
    for hole in polygon.interiors() {
        write_ring(out, hole, projection);
    }
}

fn write_ring(out: &mut String, ring: &LineString<f64>, projection: &MercatorFit) {
    // Le point de fermeture est remplacé par Z
    let coords = ring.0.as_slice();
    let open = match coords {
        [rest @ .., last] if coords.len() > 1 && rest.first() == Some(last) => rest,
        _ => coords,
    };
    write_line(out, open.iter().copied(), true, projection);
}

fn write_line(
    out: &mut String,
    coords: impl Iterator<Item = Coord<f64>>,
    close: bool,
    projection: &MercatorFit,
) {
    let mut empty = true;
    for (i, c) in coords.enumerate() {
        let p = projection.project(c);
        let _ = write!(out, "{}{},{}", if i == 0 { 'M' } else { 'L' }, fmt_num(p.x), fmt_num(p.y));
        empty = false;
    }
    if close && !empty {
        out.push('Z');
    }
}

fn write_point(out: &mut String, c: Coord<f64>, projection: &MercatorFit) {
    let p = projection.project(c);
    let r = fmt_num(POINT_RADIUS);
    let d = fmt_num(2.0 * POINT_RADIUS);
    let _ = write!(
        out,
        "M{},{}m-{},0a{},{} 0 1,1 {},0a{},{} 0 1,1 -{},0z",
        fmt_num(p.x),
        fmt_num(p.y),
        r,
        r,
        r,
        d,
        r,
        r,
        d
    );
}

/// Deux décimales, sans zéros inutiles
fn fmt_num(v: f64) -> String {
    let s = format!("{:.2}", v);
    let s = s.trim_end_matches('0').trim_end_matches('.');
    if s == "-0" {
        "0".to_string()
    } else {
        s.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Dataset;
    use crate::render::palette::NO_DATA_FILL;
    use crate::resolver::build_table;
    use geo::polygon;

    fn props(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_feature_name_priority() {
        let p = props(&[("NAME", "Other"), ("DPTO_CNMBR", "HUILA"), ("NOMBRE_DPT", "  ")]);
        assert_eq!(feature_name(&p), Some("HUILA"));
        assert_eq!(feature_name(&props(&[("DPTO_CCDGO", "41")])), None);
    }

    #[test]
    fn test_fmt_num() {
        assert_eq!(fmt_num(400.0), "400");
        assert_eq!(fmt_num(12.346), "12.35");
        assert_eq!(fmt_num(-0.001), "0");
        assert_eq!(fmt_num(1.5), "1.5");
    }

    #[test]
    fn test_polygon_path() {
        let projection = MercatorFit::fallback(800.0, 600.0);
        let square: Geometry<f64> = polygon![
            (x: -75.0, y: 4.0),
            (x: -73.0, y: 4.0),
            (x: -73.0, y: 5.0),
            (x: -75.0, y: 4.0),
        ]
        .into();
        let d = path_data(&square, &projection);
        assert!(d.starts_with('M'));
        assert!(d.ends_with('Z'));
        assert_eq!(d.matches('L').count(), 2);
    }

    #[test]
    fn test_render_matched_and_unmatched() {
        let table = build_table(Dataset::builtin().regions());
        let choropleth = Choropleth::new(&table, MercatorFit::fallback(800.0, 600.0));

        let matched = Feature {
            index: 0,
            geometry: None,
            properties: props(&[("NOMBRE_DPT", "ANTIOQUIA")]),
        };
        let rendered = choropleth.render_feature(&matched);
        assert_eq!(rendered.fill, "#991b1b");
        assert_eq!(rendered.selection_label(), "Antioquia");
        assert!(rendered.path.is_empty());

        let nameless = Feature {
            index: 1,
            geometry: None,
            properties: HashMap::new(),
        };
        let rendered = choropleth.render_feature(&nameless);
        assert_eq!(rendered.fill, NO_DATA_FILL);
        assert_eq!(rendered.selection_label(), UNKNOWN_LABEL);

        let unknown = Feature {
            index: 2,
            geometry: None,
            properties: props(&[("name", "Atlantis")]),
        };
        assert_eq!(choropleth.render_feature(&unknown).selection_label(), "Atlantis");
    }
}
