//! Chargement asynchrone des limites départementales
//!
//! Les sources sont essayées dans l'ordre (shapefile, puis JSON) ; la
//! première qui réussit fournit la collection, sinon un message terminal
//! est publié. Aucune nouvelle tentative.

pub mod fetch;
pub mod session;
pub mod sources;

pub use fetch::{join, Fetch, FetchError, FsFetcher, HttpFetcher, SmartFetcher};
pub use session::{MapSession, MapState};
pub use sources::{load_chain, Attempt, GeometryLoader, GeometrySource, LoadError, SourceError};
