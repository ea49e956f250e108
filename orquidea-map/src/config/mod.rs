//! Configuration de la carte

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use encoding_rs::Encoding;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::dataset::Dataset;
use crate::loader::GeometrySource;

/// Variables d'environnement reconnues
pub const ENV_BASE_URL: &str = "ORQUIDEA_BASE_URL";
pub const ENV_DATASET: &str = "ORQUIDEA_DATASET";
pub const ENV_DBF_ENCODING: &str = "ORQUIDEA_DBF_ENCODING";

/// Presets embarqués
///
/// `pages` vise le serveur de développement Vite local, qui sert le site
/// sous son chemin de base `/OrquideaProyectWeb/`.
pub const PRESETS: &[&str] = &["default", "pages", "json-only"];

/// Configuration principale
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct MapConfig {
    /// URL HTTP(S) ou répertoire local contenant les ressources
    pub base_url: String,

    /// Chemin du shapefile sans extension, relatif à la base
    #[serde(default)]
    pub shapefile: Option<String>,

    /// Document GeoJSON/TopoJSON de repli, relatif à la base
    #[serde(default)]
    pub fallback_json: Option<String>,

    /// Encodage forcé du `.dbf` (label WHATWG, ex. `utf-8`, `windows-1252`)
    #[serde(default)]
    pub dbf_encoding: Option<String>,

    /// Fichier JSON remplaçant le jeu de données intégré
    #[serde(default)]
    pub dataset: Option<PathBuf>,

    #[serde(default = "default_width")]
    pub width: f64,

    #[serde(default = "default_height")]
    pub height: f64,

    /// Taille du classement
    #[serde(default = "default_top")]
    pub top: usize,
}

fn default_width() -> f64 {
    crate::render::CANVAS_WIDTH
}

fn default_height() -> f64 {
    crate::render::CANVAS_HEIGHT
}

fn default_top() -> usize {
    crate::panel::DEFAULT_TOP
}

impl MapConfig {
    /// Charge une configuration depuis un fichier
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .context(format!("Failed to read config file: {}", path.display()))?;

        serde_json::from_str(&content).context("Failed to parse config JSON")
    }

    /// Charge une configuration depuis un preset embarqué
    pub fn from_preset(preset: &str) -> Result<Self> {
        match preset {
            "default" => Self::load_embedded(include_str!("presets/default.json")),
            "pages" => Self::load_embedded(include_str!("presets/pages.json")),
            "json-only" => Self::load_embedded(include_str!("presets/json-only.json")),
            _ => anyhow::bail!(
                "Unknown preset: {}. Use: {}",
                preset,
                PRESETS.join(", ")
            ),
        }
    }

    fn load_embedded(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Failed to parse embedded config")
    }

    /// Nom de preset ou chemin de fichier
    pub fn resolve(preset_or_path: &str) -> Result<Self> {
        if PRESETS.contains(&preset_or_path) {
            Self::from_preset(preset_or_path)
        } else {
            Self::load(Path::new(preset_or_path))
        }
    }

    /// Applique les variables d'environnement
    pub fn with_env(self) -> Self {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Applique des surcharges lues par `lookup` (valeurs vides ignorées)
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(base) = get(ENV_BASE_URL) {
            debug!(base = %base, "Base URL from environment");
            self.base_url = base;
        }
        if let Some(dataset) = get(ENV_DATASET) {
            self.dataset = Some(PathBuf::from(dataset));
        }
        if let Some(encoding) = get(ENV_DBF_ENCODING) {
            self.dbf_encoding = Some(encoding);
        }
        self
    }

    /// Sources de géométrie dans l'ordre d'essai
    pub fn sources(&self) -> Vec<GeometrySource> {
        let mut sources = Vec::with_capacity(2);
        if let Some(stem) = &self.shapefile {
            sources.push(GeometrySource::Shapefile { stem: stem.clone() });
        }
        if let Some(path) = &self.fallback_json {
            sources.push(GeometrySource::Json { path: path.clone() });
        }
        sources
    }

    /// Encodage `.dbf` forcé, s'il est configuré
    pub fn encoding(&self) -> Result<Option<&'static Encoding>> {
        self.dbf_encoding
            .as_deref()
            .map(|label| {
                Encoding::for_label(label.trim().as_bytes())
                    .with_context(|| format!("Unknown DBF encoding: {}", label))
            })
            .transpose()
    }

    /// Jeu de données configuré, sinon le tableau intégré
    pub fn dataset(&self) -> Result<Dataset> {
        match &self.dataset {
            Some(path) => Dataset::load(path)
                .with_context(|| format!("Failed to load dataset {}", path.display())),
            None => Ok(Dataset::builtin()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_presets_parse() {
        for preset in PRESETS {
            let config = MapConfig::from_preset(preset).unwrap();
            assert_eq!(config.width, 800.0);
            assert_eq!(config.top, 5);
            assert!(config.sources().iter().any(|s| matches!(s, GeometrySource::Json { .. })));
        }
        assert!(MapConfig::from_preset("nope").is_err());
    }

    #[test]
    fn test_pages_preset_targets_dev_server_base_path() {
        let config = MapConfig::from_preset("pages").unwrap();
        assert!(config.base_url.starts_with("http://localhost:"));
        assert!(config.base_url.ends_with("/OrquideaProyectWeb/"));
    }

    #[test]
    fn test_default_sources_order() {
        let config = MapConfig::from_preset("default").unwrap();
        assert_eq!(
            config.sources(),
            vec![
                GeometrySource::Shapefile {
                    stem: "departamentos/departamentos".into()
                },
                GeometrySource::Json {
                    path: "colombia-departments.json".into()
                },
            ]
        );
        assert_eq!(MapConfig::from_preset("json-only").unwrap().sources().len(), 1);
    }

    #[test]
    fn test_overrides() {
        let env: HashMap<&str, &str> = [
            (ENV_BASE_URL, "https://example.org/site/"),
            (ENV_DBF_ENCODING, "utf-8"),
            (ENV_DATASET, " "),
        ]
        .into_iter()
        .collect();

        let config = MapConfig::from_preset("default")
            .unwrap()
            .with_overrides(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.base_url, "https://example.org/site/");
        assert_eq!(config.dataset, None);
        assert_eq!(config.encoding().unwrap(), Some(encoding_rs::UTF_8));
    }

    #[test]
    fn test_unknown_encoding() {
        let mut config = MapConfig::from_preset("default").unwrap();
        config.dbf_encoding = Some("klingon".into());
        assert!(config.encoding().is_err());
    }

    #[test]
    fn test_minimal_file() {
        let config: MapConfig = serde_json::from_str(r#"{"base_url": "data"}"#).unwrap();
        assert_eq!(config.height, 600.0);
        assert!(config.sources().is_empty());
        assert_eq!(config.dataset().unwrap().len(), 33);
    }
}
