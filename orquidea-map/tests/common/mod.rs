//! Outils partagés par les tests d'intégration

#![allow(dead_code)]

use std::collections::HashMap;
use std::io::Cursor;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;
use dbase::encoding::EncodingRs;
use dbase::{FieldName, FieldValue, Record, TableWriterBuilder};
use orquidea_map::loader::{Fetch, FetchError};
use shapefile::{Point, Polygon, PolygonRing, ShapeWriter};
use tokio::sync::Semaphore;

/// Ressources en mémoire ; un chemin absent répond 404
#[derive(Clone, Default)]
pub struct MemoryFetcher {
    files: HashMap<String, Bytes>,
    gate: Option<Arc<Semaphore>>,
    requests: Arc<Mutex<Vec<String>>>,
}

impl MemoryFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, path: &str, data: impl Into<Bytes>) -> Self {
        self.files.insert(path.to_string(), data.into());
        self
    }

    /// Bloque chaque requête jusqu'à l'ouverture de la barrière
    pub fn gated(mut self, gate: Arc<Semaphore>) -> Self {
        self.gate = Some(gate);
        self
    }

    /// Journal partagé des chemins demandés
    pub fn requests(&self) -> Arc<Mutex<Vec<String>>> {
        Arc::clone(&self.requests)
    }
}

#[async_trait]
impl Fetch for MemoryFetcher {
    async fn get(&self, path: &str) -> Result<Bytes, FetchError> {
        if let Some(gate) = &self.gate {
            let _permit = gate.acquire().await;
        }
        self.requests.lock().unwrap().push(path.to_string());

        self.files.get(path).cloned().ok_or_else(|| FetchError::Status {
            url: self.locate(path),
            status: 404,
        })
    }

    fn locate(&self, path: &str) -> String {
        format!("mem:///{}", path)
    }
}

/// Carré horaire (anneau extérieur)
pub fn square(x0: f64, y0: f64, size: f64) -> Vec<(f64, f64)> {
    vec![
        (x0, y0),
        (x0, y0 + size),
        (x0 + size, y0 + size),
        (x0 + size, y0),
        (x0, y0),
    ]
}

/// Fichiers .shp et .shx de polygones à un anneau
pub fn build_shapefile(rings: &[Vec<(f64, f64)>]) -> (Vec<u8>, Vec<u8>) {
    let polygons: Vec<Polygon> = rings
        .iter()
        .map(|ring| {
            let points = ring.iter().map(|&(x, y)| Point::new(x, y)).collect();
            Polygon::new(PolygonRing::Outer(points))
        })
        .collect();

    let mut shp = Cursor::new(Vec::new());
    let mut shx = Cursor::new(Vec::new());
    ShapeWriter::with_shx(&mut shp, &mut shx)
        .write_shapes(&polygons)
        .unwrap();
    (shp.into_inner(), shx.into_inner())
}

/// Table .dbf à un champ texte écrit en UTF-8, code page déclarée par `ldid`
pub fn build_dbf(field: &str, values: &[&str], ldid: u8) -> Vec<u8> {
    let records: Vec<Record> = values
        .iter()
        .map(|value| {
            let mut record = Record::default();
            record.insert(field.to_string(), FieldValue::Character(Some(value.to_string())));
            record
        })
        .collect();

    let mut dest = Cursor::new(Vec::new());
    TableWriterBuilder::with_encoding(EncodingRs::from(encoding_rs::UTF_8))
        .add_character_field(FieldName::try_from(field).unwrap(), 50)
        .build_with_dest(&mut dest)
        .write_records(&records)
        .unwrap();
    let mut data = dest.into_inner();
    data[29] = ldid;
    data
}

/// FeatureCollection GeoJSON de carrés nommés
pub fn geojson_departments(names: &[&str]) -> String {
    let features: Vec<serde_json::Value> = names
        .iter()
        .enumerate()
        .map(|(i, name)| {
            let x0 = -78.0 + 2.0 * i as f64;
            serde_json::json!({
                "type": "Feature",
                "properties": {"NOMBRE_DPT": name},
                "geometry": {"type": "Polygon", "coordinates": [[
                    [x0, 2.0], [x0 + 1.5, 2.0], [x0 + 1.5, 3.5], [x0, 3.5], [x0, 2.0]
                ]]}
            })
        })
        .collect();
    serde_json::json!({"type": "FeatureCollection", "features": features}).to_string()
}
