//! Jeu de données départemental : cas signalés et taux par département
//!
//! Le tableau intégré est la référence ; un fichier JSON peut le remplacer
//! (même forme : une liste de régions).

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Catégories de population vulnérable
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PopulationGroup {
    Indigenous,
    AfroColombian,
    Migrant,
    Disability,
    Lgbtiq,
    Rural,
}

impl PopulationGroup {
    /// Libellé affiché dans le panneau
    pub fn label(&self) -> &'static str {
        match self {
            Self::Indigenous => "Indígenas",
            Self::AfroColombian => "Afrocolombianas",
            Self::Migrant => "Migrantes",
            Self::Disability => "Con discapacidad",
            Self::Lgbtiq => "LGBTIQ+",
            Self::Rural => "Rurales",
        }
    }
}

/// Un département et ses chiffres
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Region {
    /// Nom canonique, unique dans le jeu de données
    pub name: String,

    /// Cas signalés
    pub cases: u32,

    /// Taux pour 100 000 femmes
    #[serde(default)]
    pub rate: f64,

    /// Répartition optionnelle par population vulnérable
    ///
    /// La somme n'a pas à correspondre à `cases`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vulnerable_population: Option<BTreeMap<PopulationGroup, u32>>,
}

impl Region {
    pub fn new(name: impl Into<String>, cases: u32, rate: f64) -> Self {
        Self {
            name: name.into(),
            cases,
            rate,
            vulnerable_population: None,
        }
    }
}

/// Erreurs de chargement d'un jeu de données
#[derive(Error, Debug)]
pub enum DatasetError {
    #[error("Cannot read dataset {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid dataset JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Dataset is empty")]
    Empty,

    #[error("Region #{0} has a blank name")]
    BlankName(usize),

    #[error("Duplicate region name: {0}")]
    DuplicateName(String),

    #[error("Region {name} has an invalid rate: {rate}")]
    InvalidRate { name: String, rate: f64 },
}

/// Tableau intégré : nom, cas, taux pour 100 000
const BUILTIN: &[(&str, u32, f64)] = &[
    ("Antioquia", 8245, 52.3),
    ("Bogotá D.C.", 7892, 48.7),
    ("Valle del Cauca", 5634, 55.8),
    ("Cundinamarca", 4123, 45.2),
    ("Atlántico", 3456, 51.9),
    ("Santander", 3287, 47.3),
    ("Córdoba", 2945, 58.7),
    ("Bolívar", 2834, 54.2),
    ("Norte de Santander", 2567, 49.8),
    ("Nariño", 2234, 46.4),
    ("Cauca", 1987, 53.1),
    ("Tolima", 1856, 44.7),
    ("Huila", 1745, 43.2),
    ("Meta", 1634, 50.3),
    ("Cesar", 1523, 48.9),
    ("Magdalena", 1412, 52.6),
    ("La Guajira", 1301, 57.4),
    ("Caldas", 1098, 42.1),
    ("Quindío", 987, 41.8),
    ("Risaralda", 876, 40.5),
    ("Boyacá", 765, 39.2),
    ("Sucre", 654, 45.8),
    ("Casanare", 543, 47.1),
    ("Putumayo", 432, 48.3),
    ("Arauca", 321, 44.9),
    ("Caquetá", 287, 46.7),
    ("Chocó", 234, 59.8),
    ("San Andrés y Providencia", 123, 38.4),
    ("Amazonas", 98, 35.7),
    ("Guainía", 76, 34.2),
    ("Vichada", 65, 36.8),
    ("Vaupés", 43, 33.1),
    ("Guaviare", 32, 37.5),
];

/// Jeu de données immuable, dans l'ordre du tableau
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    regions: Vec<Region>,
}

impl Dataset {
    /// Valide et construit un jeu de données
    ///
    /// # Errors
    ///
    /// Liste vide, nom vide, nom dupliqué ou taux non fini / négatif.
    pub fn new(regions: Vec<Region>) -> Result<Self, DatasetError> {
        if regions.is_empty() {
            return Err(DatasetError::Empty);
        }

        let mut seen = HashSet::with_capacity(regions.len());
        for (i, region) in regions.iter().enumerate() {
            if region.name.trim().is_empty() {
                return Err(DatasetError::BlankName(i));
            }
            if !seen.insert(region.name.as_str()) {
                return Err(DatasetError::DuplicateName(region.name.clone()));
            }
            if !region.rate.is_finite() || region.rate < 0.0 {
                return Err(DatasetError::InvalidRate {
                    name: region.name.clone(),
                    rate: region.rate,
                });
            }
        }

        Ok(Self { regions })
    }

    /// Les 33 départements du tableau intégré
    pub fn builtin() -> Self {
        Self {
            regions: BUILTIN
                .iter()
                .map(|&(name, cases, rate)| Region::new(name, cases, rate))
                .collect(),
        }
    }

    /// Parse une liste de régions JSON
    pub fn from_json(json: &str) -> Result<Self, DatasetError> {
        let regions: Vec<Region> = serde_json::from_str(json)?;
        Self::new(regions)
    }

    /// Charge un fichier JSON de régions
    pub fn load(path: &Path) -> Result<Self, DatasetError> {
        let content = std::fs::read_to_string(path).map_err(|source| DatasetError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let dataset = Self::from_json(&content)?;
        debug!(path = %path.display(), regions = dataset.len(), "Loaded dataset file");
        Ok(dataset)
    }

    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Region> {
        self.regions.iter()
    }

    /// Recherche par nom canonique exact
    pub fn get(&self, name: &str) -> Option<&Region> {
        self.regions.iter().find(|r| r.name == name)
    }

    /// Total des cas signalés
    pub fn total_cases(&self) -> u64 {
        self.regions.iter().map(|r| u64::from(r.cases)).sum()
    }
}

impl<'a> IntoIterator for &'a Dataset {
    type Item = &'a Region;
    type IntoIter = std::slice::Iter<'a, Region>;

    fn into_iter(self) -> Self::IntoIter {
        self.regions.iter()
    }
}
