//! Résolution des noms de départements
//!
//! Les noms publiés par les sources géographiques arrivent souvent mal
//! encodés (UTF-8 relu en Windows-1252), en majuscules, avec ou sans
//! accents. [`normalize`] les ramène à une clé comparable et
//! [`ResolutionTable`] associe ces clés aux régions du jeu de données.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use tracing::{debug, trace, warn};
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use crate::dataset::Region;

/// Séquences mal encodées et leur correction, appliquées dans l'ordre
const ENCODING_REPAIRS: &[(&str, &str)] = &[
    ("Ã¡", "á"),
    ("Ã©", "é"),
    ("Ã\u{AD}", "í"),
    ("Ã³", "ó"),
    ("Ãº", "ú"),
    ("Ã±", "ñ"),
    ("Ã\u{81}", "Á"),
    ("Ã‰", "É"),
    ("Ã\u{8D}", "Í"),
    ("Ã“", "Ó"),
    ("Ãš", "Ú"),
    ("Ã‘", "Ñ"),
    ("Ã¼", "ü"),
    ("Ãœ", "Ü"),
];

/// Orthographes alternatives par nom canonique
///
/// Les formes corrompues sont recopiées telles qu'observées dans les
/// sources amont.
pub const ALIASES: &[(&str, &[&str])] = &[
    (
        "Bogotá D.C.",
        &[
            "Bogota DC",
            "Bogotá, D.C.",
            "Bogota",
            "Distrito Capital",
            "Distrito Capital de Bogotá",
            "Santafé de Bogotá D.C.",
            "BOGOTÃ\u{81}, D.C.",
        ],
    ),
    (
        "San Andrés y Providencia",
        &[
            "Archipielago de San Andres Providencia y Santa Catalina",
            "Archipiélago de San Andrés, Providencia y Santa Catalina",
            "ARCHIPIÃ‰LAGO DE SAN ANDRÃ‰S, PROVIDENCIA Y SANTA CATALINA",
            "San Andrés",
            "San Andres y Providencia",
        ],
    ),
    ("Valle del Cauca", &["Valle", "Valle del Cauca (Cali)"]),
    ("Norte de Santander", &["N. de Santander", "Norte Santander"]),
    ("La Guajira", &["Guajira"]),
    ("Chocó", &["CHOCÃ“"]),
    ("Nariño", &["NARIÃ‘O", "Narino"]),
    ("Atlántico", &["ATLÃ\u{81}NTICO"]),
    ("Bolívar", &["BOLÃ\u{8D}VAR"]),
    ("Córdoba", &["CÃ“RDOBA"]),
    ("Boyacá", &["BOYACÃ\u{81}"]),
    ("Quindío", &["QUINDÃ\u{8D}O", "Quindio"]),
    ("Caquetá", &["CAQUETÃ\u{81}"]),
    ("Guainía", &["GUAINÃ\u{8D}A"]),
    ("Vaupés", &["VAUPÃ‰S"]),
];

/// Cas particulier : nom amont trop corrompu pour les alias seuls
#[derive(Debug)]
pub struct SpecialCase {
    /// Nom pour les logs
    pub label: &'static str,
    /// Sous-chaînes de clé qui déclenchent le cas
    pub markers: &'static [&'static str],
    /// Variantes essayées dans l'ordre
    pub variations: &'static [&'static str],
    /// Fragment cherché dans les clés en dernier recours
    pub fragment: &'static str,
}

pub const SPECIAL_CASES: &[SpecialCase] = &[SpecialCase {
    label: "archipelago",
    markers: &["archipi", "san andr", "providencia", "catalina"],
    variations: &[
        "San Andrés y Providencia",
        "San Andrés, Providencia y Santa Catalina",
        "Archipiélago de San Andrés, Providencia y Santa Catalina",
        "San Andrés",
    ],
    fragment: "san andres",
}];

/// Clé de recherche normalisée, produite uniquement par [`normalize`]
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NameKey(String);

impl NameKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for NameKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn whitespace() -> &'static Regex {
    static WHITESPACE: OnceLock<Regex> = OnceLock::new();
    WHITESPACE.get_or_init(|| Regex::new(r"\s+").expect("static pattern"))
}

/// Répare l'encodage puis normalise un nom
///
/// Ordre : corrections d'encodage, minuscules, décomposition NFD sans
/// marques combinantes, suppression de `.` et `,`, espaces réduits.
/// Fonction totale et idempotente.
pub fn normalize(raw: &str) -> NameKey {
    let mut repaired = raw.to_string();
    for (broken, fixed) in ENCODING_REPAIRS {
        if repaired.contains(broken) {
            repaired = repaired.replace(broken, fixed);
        }
    }

    let stripped: String = repaired
        .to_lowercase()
        .nfd()
        .filter(|c| !is_combining_mark(*c) && *c != '.' && *c != ',')
        .collect();

    NameKey(whitespace().replace_all(&stripped, " ").trim().to_string())
}

/// Table de résolution immuable, construite une fois
#[derive(Debug, Clone)]
pub struct ResolutionTable {
    regions: Vec<Region>,
    index: BTreeMap<NameKey, usize>,
}

/// Construit la table : nom de chaque région puis ses alias
///
/// En cas de collision entre deux régions différentes, la dernière insérée
/// gagne.
pub fn build_table(regions: &[Region]) -> ResolutionTable {
    let mut table = ResolutionTable {
        regions: regions.to_vec(),
        index: BTreeMap::new(),
    };

    let mut used_aliases = vec![false; ALIASES.len()];

    for (position, region) in regions.iter().enumerate() {
        let key = normalize(&region.name);
        table.insert(key.clone(), position);

        for (i, (canonical, spellings)) in ALIASES.iter().enumerate() {
            if normalize(canonical) != key {
                continue;
            }
            used_aliases[i] = true;
            for spelling in *spellings {
                table.insert(normalize(spelling), position);
            }
        }
    }

    for ((canonical, _), used) in ALIASES.iter().zip(used_aliases) {
        if !used {
            debug!(canonical, "Alias entry has no region in dataset, skipped");
        }
    }

    debug!(
        regions = table.regions.len(),
        keys = table.index.len(),
        "Built name resolution table"
    );
    table
}

impl ResolutionTable {
    fn insert(&mut self, key: NameKey, position: usize) {
        if let Some(previous) = self.index.insert(key.clone(), position) {
            if previous != position {
                warn!(
                    key = %key,
                    previous = %self.regions[previous].name,
                    current = %self.regions[position].name,
                    "Ambiguous name key, last inserted region wins"
                );
            }
        }
    }

    /// Recherche exacte d'une clé déjà normalisée
    pub fn lookup(&self, key: &NameKey) -> Option<&Region> {
        self.index.get(key).map(|&i| &self.regions[i])
    }

    /// Résout un nom brut vers sa région, ou `None`
    pub fn resolve(&self, raw: &str) -> Option<&Region> {
        let key = normalize(raw);
        if let Some(region) = self.lookup(&key) {
            return Some(region);
        }

        let case = SPECIAL_CASES
            .iter()
            .find(|case| case.markers.iter().any(|m| key.as_str().contains(m)))?;

        trace!(raw, case = case.label, "Trying special case variations");
        for variation in case.variations {
            if let Some(region) = self.lookup(&normalize(variation)) {
                return Some(region);
            }
        }

        self.index
            .iter()
            .find(|(candidate, _)| candidate.as_str().contains(case.fragment))
            .map(|(_, &i)| &self.regions[i])
    }

    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    /// Clés connues, triées
    pub fn keys(&self) -> impl Iterator<Item = &NameKey> {
        self.index.keys()
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Dataset;

    #[test]
    fn test_normalize_basic() {
        assert_eq!(normalize("  Bogotá,   D.C. ").as_str(), "bogota dc");
        assert_eq!(normalize("NORTE DE SANTANDER").as_str(), "norte de santander");
        assert_eq!(normalize("").as_str(), "");
        assert_eq!(normalize("\t\n").as_str(), "");
    }

    #[test]
    fn test_normalize_repairs_encoding() {
        assert_eq!(normalize("CHOCÃ“").as_str(), "choco");
        assert_eq!(normalize("NARIÃ‘O").as_str(), "narino");
        assert_eq!(normalize("BOYACÃ\u{81}").as_str(), "boyaca");
        assert_eq!(normalize("QUINDÃ\u{8D}O").as_str(), "quindio");
        assert_eq!(normalize("Ãœber").as_str(), "uber");
    }

    #[test]
    fn test_normalize_idempotent() {
        let inputs = [
            "ARCHIPIÃ‰LAGO DE SAN ANDRÃ‰S, PROVIDENCIA Y SANTA CATALINA",
            "Bogotá D.C.",
            "  Valle   del Cauca ",
            "İstanbul",
            "Ã",
            "ñ̃",
            "",
        ];
        for input in inputs {
            let once = normalize(input);
            assert_eq!(normalize(once.as_str()), once, "input {:?}", input);
        }
    }

    #[test]
    fn test_every_region_resolves_to_itself() {
        let dataset = Dataset::builtin();
        let table = build_table(dataset.regions());
        for region in &dataset {
            assert_eq!(table.resolve(&region.name), Some(region));
        }
    }

    #[test]
    fn test_aliases() {
        let table = build_table(Dataset::builtin().regions());
        let name = |raw: &str| table.resolve(raw).map(|r| r.name.as_str());

        assert_eq!(name("BOGOTÁ, D.C."), Some("Bogotá D.C."));
        assert_eq!(name("Distrito Capital"), Some("Bogotá D.C."));
        assert_eq!(name("N. DE SANTANDER"), Some("Norte de Santander"));
        assert_eq!(name("CHOCÃ“"), Some("Chocó"));
        assert_eq!(name("GUAJIRA"), Some("La Guajira"));
    }

    #[test]
    fn test_archipelago_special_case() {
        let table = build_table(Dataset::builtin().regions());
        let name = |raw: &str| table.resolve(raw).map(|r| r.name.as_str());

        assert_eq!(
            name("ARCHIPIÃ‰LAGO DE SAN ANDRÃ‰S, PROVIDENCIA Y SANTA CATALINA"),
            Some("San Andrés y Providencia")
        );
        // Forme inconnue : le fragment suffit
        assert_eq!(
            name("Archipiélago San Andrés - Providencia"),
            Some("San Andrés y Providencia")
        );
    }

    #[test]
    fn test_special_case_partial_scan() {
        // Sans alias applicable, seul le balayage partiel trouve la région
        let regions = vec![Region::new("Depto San Andres Islas", 10, 1.0)];
        let table = build_table(&regions);
        assert_eq!(
            table.resolve("Providencia").map(|r| r.name.as_str()),
            Some("Depto San Andres Islas")
        );
    }

    #[test]
    fn test_no_match() {
        let table = build_table(Dataset::builtin().regions());
        assert!(table.resolve("Atlantis").is_none());
        assert!(table.resolve("").is_none());
        // Ni préfixe ni premier mot
        assert!(table.resolve("Valle Alto").is_none());
    }

    #[test]
    fn test_collision_last_wins() {
        let regions = vec![Region::new("Meta", 1, 1.0), Region::new("META.", 2, 2.0)];
        let table = build_table(&regions);
        assert_eq!(table.resolve("meta").map(|r| r.cases), Some(2));
    }

    #[test]
    fn test_aliases_skipped_without_region() {
        let regions = vec![Region::new("Meta", 1, 1.0)];
        let table = build_table(&regions);
        assert_eq!(table.len(), 1);
        assert!(table.resolve("Distrito Capital").is_none());
    }
}
