//! Types d'erreurs pour le crate geodepto

use thiserror::Error;

/// Erreurs pouvant survenir lors de la lecture des géométries départementales
#[derive(Debug, Error)]
pub enum GeoError {
    /// Erreur d'I/O
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Fichier .shp corrompu, tronqué ou forme non convertible
    #[error("Invalid shapefile: {0}")]
    InvalidShapefile(String),

    /// Table attributaire .dbf illisible
    #[error("Invalid dBASE table: {0}")]
    InvalidDbf(String),

    /// Topologie TopoJSON incohérente
    #[error("Invalid topology: {0}")]
    InvalidTopology(String),

    /// Document GeoJSON inutilisable
    #[error("Invalid GeoJSON: {0}")]
    InvalidGeoJson(String),

    /// JSON mal formé
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl GeoError {
    /// Crée une erreur de shapefile
    pub fn shapefile(reason: impl Into<String>) -> Self {
        Self::InvalidShapefile(reason.into())
    }

    /// Crée une erreur de table dBASE
    pub fn dbf(reason: impl Into<String>) -> Self {
        Self::InvalidDbf(reason.into())
    }

    /// Crée une erreur de topologie
    pub fn topology(reason: impl Into<String>) -> Self {
        Self::InvalidTopology(reason.into())
    }
}

impl From<shapefile::Error> for GeoError {
    fn from(e: shapefile::Error) -> Self {
        Self::shapefile(e.to_string())
    }
}

impl From<dbase::Error> for GeoError {
    fn from(e: dbase::Error) -> Self {
        Self::dbf(e.to_string())
    }
}
