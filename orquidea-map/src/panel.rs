//! Panneau latéral : classement et détail de la sélection

use std::fmt;

use tracing::debug;

use crate::dataset::{Dataset, Region};
use crate::render::RenderedFeature;
use crate::resolver::ResolutionTable;

/// Taille du classement affiché par défaut
pub const DEFAULT_TOP: usize = 5;

pub const RANKING_TITLE: &str = "Departamentos Más Afectados";
pub const PROMPT: &str = "Haz clic en un departamento para ver información detallada";
pub const NO_DATA: &str = "Sin datos para esta región.";

/// Les `n` régions avec le plus de cas, ordre du tableau en cas d'égalité
pub fn ranked(dataset: &Dataset, n: usize) -> Vec<&Region> {
    let mut regions: Vec<&Region> = dataset.iter().collect();
    // Tri stable : les égalités gardent l'ordre du tableau
    regions.sort_by(|a, b| b.cases.cmp(&a.cases));
    regions.truncate(n);
    regions
}

/// Entier avec séparateur de milliers
pub fn format_count(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Contenu du panneau de détail
#[derive(Debug, Clone, PartialEq)]
pub enum Detail<'a> {
    /// Aucune sélection pour l'instant
    Prompt,
    /// Sélection sans région correspondante
    NoData { name: String },
    /// Sélection avec ses chiffres
    Region { name: String, region: &'a Region },
}

impl fmt::Display for Detail<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Prompt => writeln!(f, "{}", PROMPT),
            Self::NoData { name } => {
                writeln!(f, "{}", name)?;
                writeln!(f, "  {}", NO_DATA)
            }
            Self::Region { name, region } => {
                writeln!(f, "{}", name)?;
                writeln!(f, "  Casos Reportados: {}", format_count(u64::from(region.cases)))?;
                writeln!(f, "  Tasa por 100,000: {}", region.rate)?;
                if let Some(groups) = &region.vulnerable_population {
                    writeln!(f, "  Población vulnerable:")?;
                    for (group, count) in groups {
                        writeln!(f, "    {}: {}", group.label(), format_count(u64::from(*count)))?;
                    }
                }
                Ok(())
            }
        }
    }
}

/// Sélection courante, remplacée à chaque clic, jamais effacée
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PanelState {
    selection: Option<String>,
}

impl PanelState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn select(&mut self, label: impl Into<String>) {
        let label = label.into();
        debug!(selection = %label, "Selection changed");
        self.selection = Some(label);
    }

    /// Clic sur une entité de la carte
    pub fn select_feature(&mut self, feature: &RenderedFeature) {
        self.select(feature.selection_label());
    }

    /// Clic sur une entrée du classement
    pub fn select_region(&mut self, region: &Region) {
        self.select(region.name.clone());
    }

    pub fn selection(&self) -> Option<&str> {
        self.selection.as_deref()
    }

    /// Détail de la sélection, résolue dans la table
    pub fn detail<'a>(&self, table: &'a ResolutionTable) -> Detail<'a> {
        match &self.selection {
            None => Detail::Prompt,
            Some(name) => match table.resolve(name) {
                Some(region) => Detail::Region {
                    name: name.clone(),
                    region,
                },
                None => Detail::NoData { name: name.clone() },
            },
        }
    }
}

/// Texte du classement
pub fn ranking_text(regions: &[&Region]) -> String {
    let mut out = format!("{}\n", RANKING_TITLE);
    for (i, region) in regions.iter().enumerate() {
        out.push_str(&format!(
            "{:>2}. {:<28} {:>7} casos  {:>5} por 100k\n",
            i + 1,
            region.name,
            format_count(u64::from(region.cases)),
            region.rate
        ));
    }
    out
}
