//! Palette de sévérité selon le nombre de cas

/// Remplissage des départements sans correspondance
pub const NO_DATA_FILL: &str = "#e5e7eb";

/// Contour commun à tous les départements
pub const STROKE: &str = "#374151";
pub const STROKE_WIDTH: f64 = 0.7;

/// Classes de sévérité, de la plus basse à la plus haute
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    VeryLow,
    Low,
    Medium,
    MediumHigh,
    High,
    Critical,
}

impl Severity {
    /// Toutes les classes, de la plus haute à la plus basse (ordre de la légende)
    pub const ALL: [Severity; 6] = [
        Self::Critical,
        Self::High,
        Self::MediumHigh,
        Self::Medium,
        Self::Low,
        Self::VeryLow,
    ];

    /// Seuil minimal de cas de la classe
    pub fn threshold(&self) -> u32 {
        match self {
            Self::Critical => 5000,
            Self::High => 3000,
            Self::MediumHigh => 2000,
            Self::Medium => 1000,
            Self::Low => 500,
            Self::VeryLow => 0,
        }
    }

    /// Classe d'un nombre de cas, seuils testés du plus haut au plus bas
    pub fn for_cases(cases: u32) -> Self {
        Self::ALL
            .into_iter()
            .find(|s| cases >= s.threshold())
            .unwrap_or(Self::VeryLow)
    }

    pub fn color(&self) -> &'static str {
        match self {
            Self::Critical => "#991b1b",
            Self::High => "#dc2626",
            Self::MediumHigh => "#f97316",
            Self::Medium => "#fb923c",
            Self::Low => "#fed7aa",
            Self::VeryLow => "#fef3e2",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Critical => "Crítico",
            Self::High => "Alto",
            Self::MediumHigh => "Medio-alto",
            Self::Medium => "Medio",
            Self::Low => "Bajo",
            Self::VeryLow => "Muy bajo",
        }
    }

    /// Libellé de légende, ex. `3000-4999 (Alto)`
    pub fn legend_label(&self) -> String {
        let upper = Self::ALL
            .iter()
            .rev()
            .find(|s| s.threshold() > self.threshold())
            .map(|s| s.threshold() - 1);

        match upper {
            Some(upper) if self.threshold() == 0 => format!("<{} ({})", upper + 1, self.name()),
            Some(upper) => format!("{}-{} ({})", self.threshold(), upper, self.name()),
            None => format!("{}+ ({})", self.threshold(), self.name()),
        }
    }
}

/// Remplissage d'un département : sévérité si trouvé, gris sinon
pub fn fill_for(cases: Option<u32>) -> &'static str {
    cases.map_or(NO_DATA_FILL, |c| Severity::for_cases(c).color())
}
