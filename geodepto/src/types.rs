//! Types de données pour le crate geodepto

use geo::Geometry;
use std::collections::HashMap;

/// Une entité géographique : une géométrie et son sac d'attributs
#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    /// Position de l'entité dans la source
    pub index: usize,

    /// Géométrie (absente pour un enregistrement shapefile nul)
    pub geometry: Option<Geometry<f64>>,

    /// Attributs de l'entité (clé -> valeur textuelle)
    pub properties: HashMap<String, String>,
}

impl Feature {
    /// Valeur d'un attribut, si présente et non vide
    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties
            .get(key)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }
}

/// Collection ordonnée d'entités
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureCollection {
    pub features: Vec<Feature>,
}

impl FeatureCollection {
    pub fn new(features: Vec<Feature>) -> Self {
        Self { features }
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Feature> {
        self.features.iter()
    }
}

impl<'a> IntoIterator for &'a FeatureCollection {
    type Item = &'a Feature;
    type IntoIter = std::slice::Iter<'a, Feature>;

    fn into_iter(self) -> Self::IntoIter {
        self.features.iter()
    }
}
