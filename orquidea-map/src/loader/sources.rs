//! Chaîne ordonnée de sources de géométrie

use std::fmt;

use encoding_rs::Encoding;
use geodepto::{FeatureCollection, GeoError};
use thiserror::Error;
use tracing::{debug, info, warn};

use super::fetch::{Fetch, FetchError};

/// Une source de géométrie départementale
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GeometrySource {
    /// Trio `.shp` / `.dbf` / `.shx` partageant un même chemin sans extension
    Shapefile { stem: String },
    /// Document GeoJSON ou TopoJSON
    Json { path: String },
}

impl fmt::Display for GeometrySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Shapefile { stem } => write!(f, "el shapefile (SHP/DBF/SHX) {}", stem),
            Self::Json { path } => write!(f, "el archivo {}", path),
        }
    }
}

/// Échec d'une source
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("{resource} unavailable: {source}")]
    Fetch {
        resource: String,
        #[source]
        source: FetchError,
    },

    #[error("{resource} unreadable: {source}")]
    Parse {
        resource: String,
        #[source]
        source: GeoError,
    },

    #[error("Parser task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Une tentative échouée
#[derive(Debug)]
pub struct Attempt {
    pub source: GeometrySource,
    pub error: SourceError,
}

/// Échec du chargement
#[derive(Error, Debug)]
pub enum LoadError {
    /// Toutes les sources ont échoué, aucune nouvelle tentative
    #[error("{}", terminal_message(.attempts))]
    Exhausted { attempts: Vec<Attempt> },
}

/// Message affiché à la place de la carte
fn terminal_message(attempts: &[Attempt]) -> String {
    if attempts.is_empty() {
        return "No hay fuentes de datos del mapa configuradas.".to_string();
    }
    let tried: Vec<String> = attempts.iter().map(|a| a.source.to_string()).collect();
    format!("No pude cargar {}.", tried.join(" ni "))
}

impl GeometrySource {
    /// Tente de charger cette source
    pub async fn attempt<F: Fetch + ?Sized>(
        &self,
        fetcher: &F,
        encoding: Option<&'static Encoding>,
    ) -> Result<FeatureCollection, SourceError> {
        match self {
            Self::Shapefile { stem } => attempt_shapefile(fetcher, stem, encoding).await,
            Self::Json { path } => attempt_json(fetcher, path).await,
        }
    }
}

async fn attempt_shapefile<F: Fetch + ?Sized>(
    fetcher: &F,
    stem: &str,
    encoding: Option<&'static Encoding>,
) -> Result<FeatureCollection, SourceError> {
    let shp_path = format!("{}.shp", stem);
    let dbf_path = format!("{}.dbf", stem);
    let shx_path = format!("{}.shx", stem);

    // Les trois requêtes partent ensemble
    let (shp, dbf, shx) = futures::join!(
        fetcher.get(&shp_path),
        fetcher.get(&dbf_path),
        fetcher.get(&shx_path)
    );

    let shp = shp.map_err(|source| SourceError::Fetch {
        resource: fetcher.locate(&shp_path),
        source,
    })?;
    let dbf = dbf.map_err(|source| SourceError::Fetch {
        resource: fetcher.locate(&dbf_path),
        source,
    })?;
    let shx = match shx {
        Ok(bytes) => Some(bytes),
        Err(e) => {
            warn!(resource = %fetcher.locate(&shx_path), "Shape index unavailable: {}", e);
            None
        }
    };

    debug!(
        shp = shp.len(),
        dbf = dbf.len(),
        shx = shx.as_ref().map(|b| b.len()),
        "Fetched shapefile resources"
    );

    let resource = fetcher.locate(&shp_path);
    tokio::task::spawn_blocking(move || {
        geodepto::read_shapefile(&shp, &dbf, shx.as_deref(), encoding)
    })
    .await?
    .map_err(|source| SourceError::Parse { resource, source })
}

async fn attempt_json<F: Fetch + ?Sized>(
    fetcher: &F,
    path: &str,
) -> Result<FeatureCollection, SourceError> {
    let resource = fetcher.locate(path);
    let data = fetcher
        .get(path)
        .await
        .map_err(|source| SourceError::Fetch {
            resource: resource.clone(),
            source,
        })?;

    tokio::task::spawn_blocking(move || geodepto::read_json(&data))
        .await?
        .map_err(|source| SourceError::Parse { resource, source })
}

/// Essaie chaque source dans l'ordre jusqu'au premier succès
pub async fn load_chain<F: Fetch + ?Sized>(
    sources: &[GeometrySource],
    fetcher: &F,
    encoding: Option<&'static Encoding>,
) -> Result<FeatureCollection, LoadError> {
    let mut attempts = Vec::new();

    for source in sources {
        match source.attempt(fetcher, encoding).await {
            Ok(collection) => {
                info!(source = %source, features = collection.len(), "Map geometry loaded");
                return Ok(collection);
            }
            Err(error) => {
                warn!(source = %source, "Geometry source failed: {}", error);
                attempts.push(Attempt {
                    source: source.clone(),
                    error,
                });
            }
        }
    }

    Err(LoadError::Exhausted { attempts })
}

/// Sources et options d'un chargement
#[derive(Debug, Clone)]
pub struct GeometryLoader<F> {
    fetcher: F,
    sources: Vec<GeometrySource>,
    encoding: Option<&'static Encoding>,
}

impl<F: Fetch> GeometryLoader<F> {
    pub fn new(fetcher: F, sources: Vec<GeometrySource>) -> Self {
        Self {
            fetcher,
            sources,
            encoding: None,
        }
    }

    /// Force l'encodage du `.dbf` au lieu de le déduire de l'en-tête
    pub fn with_encoding(mut self, encoding: Option<&'static Encoding>) -> Self {
        self.encoding = encoding;
        self
    }

    pub fn sources(&self) -> &[GeometrySource] {
        &self.sources
    }

    pub async fn load(&self) -> Result<FeatureCollection, LoadError> {
        load_chain(&self.sources, &self.fetcher, self.encoding).await
    }
}
