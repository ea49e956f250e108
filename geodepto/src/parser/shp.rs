//! Lecture des géométries ESRI (.shp)

use std::io::Cursor;

use geo::{Geometry, MultiPolygon};
use shapefile::{Shape, ShapeReader};
use tracing::debug;

use crate::GeoError;

/// Taille de l'en-tête commun .shp / .shx
pub const HEADER_LEN: usize = 100;

/// Taille d'une entrée de l'index .shx (décalage + longueur)
const INDEX_ENTRY_LEN: usize = 8;

/// Lit toutes les formes d'un fichier .shp, dans l'ordre du fichier.
///
/// Une forme nulle donne `None`. Les polygones passent par la conversion
/// `geo-types` du crate `shapefile`, qui rattache les trous à leur anneau
/// extérieur ; un multipolygone d'une seule partie est ramené à un polygone.
pub fn parse(data: &[u8]) -> Result<Vec<Option<Geometry<f64>>>, GeoError> {
    let mut reader = ShapeReader::new(Cursor::new(data))?;
    let shape_type = reader.header().shape_type;

    let shapes = reader
        .iter_shapes()
        .collect::<Result<Vec<Shape>, shapefile::Error>>()?;

    debug!(
        shapes = shapes.len(),
        shape_type = ?shape_type,
        "Parsed shapefile geometry"
    );

    shapes
        .into_iter()
        .enumerate()
        .map(|(index, shape)| to_geometry(index, shape))
        .collect()
}

/// Nombre d'entrées déclarées par un index .shx
pub fn index_len(data: &[u8]) -> Result<usize, GeoError> {
    if data.len() < HEADER_LEN || (data.len() - HEADER_LEN) % INDEX_ENTRY_LEN != 0 {
        return Err(GeoError::shapefile(format!(
            "index of {} bytes is not a header plus 8-byte entries",
            data.len()
        )));
    }
    Ok((data.len() - HEADER_LEN) / INDEX_ENTRY_LEN)
}

fn to_geometry(index: usize, shape: Shape) -> Result<Option<Geometry<f64>>, GeoError> {
    if let Shape::NullShape = shape {
        return Ok(None);
    }

    let geometry = Geometry::<f64>::try_from(shape)
        .map_err(|e| GeoError::shapefile(format!("record {}: {}", index, e)))?;

    Ok(Some(match geometry {
        Geometry::MultiPolygon(MultiPolygon(mut polygons)) if polygons.len() == 1 => {
            Geometry::Polygon(polygons.remove(0))
        }
        other => other,
    }))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use shapefile::{Point, Polygon, PolygonRing, ShapeWriter};
    use std::time::{Duration, Instant};

    /// Écrit des polygones avec l'écrivain du crate, retourne (.shp, .shx)
    pub(crate) fn write_polygons(polygons: &[Polygon]) -> (Vec<u8>, Vec<u8>) {
        let mut shp = Cursor::new(Vec::new());
        let mut shx = Cursor::new(Vec::new());
        ShapeWriter::with_shx(&mut shp, &mut shx)
            .write_shapes(polygons)
            .unwrap();
        (shp.into_inner(), shx.into_inner())
    }

    /// Un polygone par enregistrement, chaque anneau étant extérieur
    pub(crate) fn build_shp(records: &[Vec<Vec<(f64, f64)>>]) -> (Vec<u8>, Vec<u8>) {
        let polygons: Vec<Polygon> = records
            .iter()
            .map(|rings| {
                Polygon::with_rings(
                    rings
                        .iter()
                        .map(|ring| PolygonRing::Outer(points(ring)))
                        .collect(),
                )
            })
            .collect();
        write_polygons(&polygons)
    }

    fn points(ring: &[(f64, f64)]) -> Vec<Point> {
        ring.iter().map(|&(x, y)| Point::new(x, y)).collect()
    }

    pub(crate) fn square_cw(x0: f64, y0: f64) -> Vec<(f64, f64)> {
        vec![(x0, y0), (x0, y0 + 1.0), (x0 + 1.0, y0 + 1.0), (x0 + 1.0, y0), (x0, y0)]
    }

    #[test]
    fn test_parse_polygon_and_multipolygon() {
        let (data, _) = build_shp(&[
            vec![square_cw(0.0, 0.0)],
            vec![square_cw(0.0, 0.0), square_cw(5.0, 5.0)],
        ]);

        let shapes = parse(&data).unwrap();
        assert_eq!(shapes.len(), 2);
        assert!(matches!(shapes[0], Some(Geometry::Polygon(_))));
        match &shapes[1] {
            Some(Geometry::MultiPolygon(mp)) => assert_eq!(mp.0.len(), 2),
            other => panic!("expected MultiPolygon, got {:?}", other),
        }
    }

    #[test]
    fn test_hole_attached_to_exterior() {
        let outer = vec![(0.0, 0.0), (0.0, 10.0), (10.0, 10.0), (10.0, 0.0), (0.0, 0.0)];
        let hole = vec![(2.0, 2.0), (4.0, 2.0), (4.0, 4.0), (2.0, 4.0), (2.0, 2.0)];
        let polygon = Polygon::with_rings(vec![
            PolygonRing::Outer(points(&outer)),
            PolygonRing::Inner(points(&hole)),
        ]);
        let (data, _) = write_polygons(&[polygon]);

        match &parse(&data).unwrap()[0] {
            Some(Geometry::Polygon(p)) => assert_eq!(p.interiors().len(), 1),
            other => panic!("expected Polygon with a hole, got {:?}", other),
        }
    }

    #[test]
    fn test_bad_file_code() {
        let (mut data, _) = build_shp(&[vec![square_cw(0.0, 0.0)]]);
        data[3] = 0;
        assert!(matches!(parse(&data), Err(GeoError::InvalidShapefile(_))));
    }

    #[test]
    fn test_truncated_record() {
        let (mut data, _) = build_shp(&[vec![square_cw(0.0, 0.0)]]);
        // Longueur déclarée conservée, contenu coupé
        data.truncate(data.len() - 10);
        assert!(parse(&data).is_err());
    }

    #[test]
    fn test_large_ring_reads_in_linear_time() {
        // Anneau horaire de 60 000 sommets, taille d'une côte détaillée
        let n = 60_000;
        let mut ring: Vec<(f64, f64)> = (0..n)
            .map(|i| {
                let t = -(i as f64) * std::f64::consts::TAU / n as f64;
                (-75.0 + t.cos(), 4.0 + t.sin())
            })
            .collect();
        ring.push(ring[0]);
        let (data, _) = build_shp(&[vec![ring]]);

        let start = Instant::now();
        let shapes = parse(&data).unwrap();
        assert!(start.elapsed() < Duration::from_secs(5));

        match &shapes[0] {
            Some(Geometry::Polygon(p)) => assert_eq!(p.exterior().0.len(), n + 1),
            other => panic!("expected Polygon, got {:?}", other),
        }
    }

    #[test]
    fn test_index_len() {
        let (_, shx) = build_shp(&[vec![square_cw(0.0, 0.0)], vec![square_cw(2.0, 0.0)]]);
        assert_eq!(index_len(&shx).unwrap(), 2);
        assert!(index_len(b"garbage").is_err());
    }
}
