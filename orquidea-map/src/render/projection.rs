//! Projection Mercator sphérique ajustée au canevas
//!
//! Coordonnées projetées en unités écran : x vers la droite, y vers le bas.

use std::f64::consts::FRAC_PI_4;

use geo::{Coord, CoordsIter};
use geodepto::FeatureCollection;
use tracing::debug;

/// Limite de latitude pour éviter l'infini
const MAX_LATITUDE: f64 = 85.0;

/// Centre utilisé tant qu'aucune géométrie n'est chargée (lon, lat)
pub const FALLBACK_CENTER: (f64, f64) = (-74.0, 4.5);

/// Échelle utilisée tant qu'aucune géométrie n'est chargée
pub const FALLBACK_SCALE: f64 = 2100.0;

/// Mercator sur la sphère unité, y inversé
fn mercator(lon: f64, lat: f64) -> (f64, f64) {
    let lambda = lon.to_radians();
    let phi = lat.clamp(-MAX_LATITUDE, MAX_LATITUDE).to_radians();
    (lambda, -(FRAC_PI_4 + phi / 2.0).tan().ln())
}

/// Projection : Mercator, puis échelle et translation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MercatorFit {
    scale: f64,
    translate: (f64, f64),
}

impl MercatorFit {
    /// Centre fixe sur la Colombie, pour un canevas jamais vide
    pub fn fallback(width: f64, height: f64) -> Self {
        let (cx, cy) = mercator(FALLBACK_CENTER.0, FALLBACK_CENTER.1);
        Self {
            scale: FALLBACK_SCALE,
            translate: (
                width / 2.0 - FALLBACK_SCALE * cx,
                height / 2.0 - FALLBACK_SCALE * cy,
            ),
        }
    }

    /// Ajuste l'emprise projetée de la collection au canevas
    ///
    /// Sans coordonnée exploitable, retourne [`MercatorFit::fallback`].
    pub fn fit(collection: &FeatureCollection, width: f64, height: f64) -> Self {
        let mut min = (f64::INFINITY, f64::INFINITY);
        let mut max = (f64::NEG_INFINITY, f64::NEG_INFINITY);

        let coords = collection
            .iter()
            .filter_map(|f| f.geometry.as_ref())
            .flat_map(|g| g.coords_iter())
            .filter(|c| c.x.is_finite() && c.y.is_finite());

        for c in coords {
            let (x, y) = mercator(c.x, c.y);
            min = (min.0.min(x), min.1.min(y));
            max = (max.0.max(x), max.1.max(y));
        }

        let dx = max.0 - min.0;
        let dy = max.1 - min.1;
        if !dx.is_finite() || !dy.is_finite() || (dx <= 0.0 && dy <= 0.0) {
            debug!("No extent to fit, using fallback projection");
            return Self::fallback(width, height);
        }

        let scale = match (dx > 0.0, dy > 0.0) {
            (true, true) => (width / dx).min(height / dy),
            (true, false) => width / dx,
            _ => height / dy,
        };

        let fit = Self {
            scale,
            translate: (
                (width - scale * (min.0 + max.0)) / 2.0,
                (height - scale * (min.1 + max.1)) / 2.0,
            ),
        };
        debug!(scale = fit.scale, tx = fit.translate.0, ty = fit.translate.1, "Fitted projection");
        fit
    }

    /// Projette une coordonnée (lon, lat) en degrés
    pub fn project(&self, c: Coord<f64>) -> Coord<f64> {
        let (x, y) = mercator(c.x, c.y);
        Coord {
            x: self.scale * x + self.translate.0,
            y: self.scale * y + self.translate.1,
        }
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn translate(&self) -> (f64, f64) {
        self.translate
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{polygon, Geometry};
    use geodepto::Feature;
    use std::collections::HashMap;

    fn collection(geometries: Vec<Option<Geometry<f64>>>) -> FeatureCollection {
        FeatureCollection::new(
            geometries
                .into_iter()
                .enumerate()
                .map(|(index, geometry)| Feature {
                    index,
                    geometry,
                    properties: HashMap::new(),
                })
                .collect(),
        )
    }

    #[test]
    fn test_fallback_centers_colombia() {
        let p = MercatorFit::fallback(800.0, 600.0);
        assert_eq!(p.scale(), FALLBACK_SCALE);
        let center = p.project(Coord { x: -74.0, y: 4.5 });
        assert!((center.x - 400.0).abs() < 1e-9);
        assert!((center.y - 300.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_collection_uses_fallback() {
        let p = MercatorFit::fit(&collection(vec![None]), 800.0, 600.0);
        assert_eq!(p, MercatorFit::fallback(800.0, 600.0));
    }

    #[test]
    fn test_fit_stays_inside_canvas() {
        let poly = polygon![
            (x: -79.0, y: -4.2),
            (x: -66.8, y: -4.2),
            (x: -66.8, y: 12.5),
            (x: -79.0, y: 12.5),
            (x: -79.0, y: -4.2),
        ];
        let p = MercatorFit::fit(&collection(vec![Some(poly.into())]), 800.0, 600.0);

        let corners = [(-79.0, -4.2), (-66.8, 12.5), (-79.0, 12.5), (-66.8, -4.2)];
        for (x, y) in corners {
            let c = p.project(Coord { x, y });
            assert!(c.x >= -1e-6 && c.x <= 800.0 + 1e-6, "x={}", c.x);
            assert!(c.y >= -1e-6 && c.y <= 600.0 + 1e-6, "y={}", c.y);
        }

        // Le nord est en haut
        let north = p.project(Coord { x: -72.0, y: 12.0 });
        let south = p.project(Coord { x: -72.0, y: -4.0 });
        assert!(north.y < south.y);

        // Colombie plus haute que large : la hauteur est saturée
        let top = p.project(Coord { x: -79.0, y: 12.5 });
        let bottom = p.project(Coord { x: -79.0, y: -4.2 });
        assert!((bottom.y - top.y - 600.0).abs() < 1e-6);
    }

    #[test]
    fn test_latitude_is_clamped() {
        let p = MercatorFit::fallback(800.0, 600.0);
        let pole = p.project(Coord { x: 0.0, y: 90.0 });
        assert!(pole.y.is_finite());
        assert_eq!(pole, p.project(Coord { x: 0.0, y: 85.0 }));
    }
}
