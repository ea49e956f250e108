//! # orquidea-map
//!
//! Carte choroplèthe des cas de violence contre les femmes signalés par
//! département en Colombie.
//!
//! ## Pipeline
//!
//! 1. [`dataset`] : tableau des départements (cas, taux)
//! 2. [`resolver`] : normalisation des noms amont et table de résolution
//! 3. [`loader`] : shapefile puis GeoJSON/TopoJSON, avec démontage
//! 4. [`render`] : projection Mercator ajustée, couleurs, SVG
//! 5. [`panel`] : classement et détail de la sélection
//!
//! ## Usage CLI
//!
//! ```bash
//! # Carte depuis un répertoire local
//! orquidea-map render --base ./public --output mapa.svg --select "Chocó"
//!
//! # Classement
//! orquidea-map ranking --top 10
//!
//! # Diagnostic des noms
//! orquidea-map resolve "CHOCÃ“" "BOGOTÁ, D.C."
//! ```

pub mod config;
pub mod dataset;
pub mod loader;
pub mod panel;
pub mod render;
pub mod resolver;

pub use config::MapConfig;
pub use dataset::{Dataset, PopulationGroup, Region};
pub use loader::{GeometryLoader, GeometrySource, LoadError, MapSession, MapState};
pub use panel::PanelState;
pub use resolver::{build_table, normalize, NameKey, ResolutionTable};
