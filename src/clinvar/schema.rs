//! Enumerations and small value types derived from ClinVar submissions.

/// Pathogenicity bucket of a single submission.
///
/// The five known buckets are ordered by severity (see [`Pathogenicity::severity`]);
/// `Other` collects everything that cannot be mapped and is not part of that order.
#[derive(
    enum_map::Enum,
    strum::Display,
    strum::EnumIter,
    PartialEq,
    Eq,
    Hash,
    Clone,
    Copy,
    Debug,
    Default,
)]
pub enum Pathogenicity {
    /// benign
    #[strum(serialize = "Benign")]
    Benign,
    /// likely benign, also benign/likely benign
    #[strum(serialize = "Likely Benign")]
    LikelyBenign,
    /// uncertain significance
    #[strum(serialize = "VUS")]
    Vus,
    /// likely pathogenic, also pathogenic/likely pathogenic
    #[strum(serialize = "Likely Pathogenic")]
    LikelyPathogenic,
    /// pathogenic
    #[strum(serialize = "Pathogenic")]
    Pathogenic,
    /// anything else, e.g., "drug response" or "not provided"
    #[default]
    #[strum(serialize = "Other")]
    Other,
}

impl Pathogenicity {
    /// Resolve the free-text clinical significance of a submission.
    ///
    /// Only the first `,`-separated term is considered; it is lower-cased and `_` is
    /// replaced by a space before lookup.
    pub fn from_clinical_significance(label: &str) -> Self {
        let first = label.split(',').next().unwrap_or_default();
        let normalized = first.to_lowercase().replace('_', " ");
        match normalized.as_str() {
            "benign" => Pathogenicity::Benign,
            "benign/likely benign" | "likely benign" => Pathogenicity::LikelyBenign,
            "uncertain significance" => Pathogenicity::Vus,
            "likely pathogenic" | "pathogenic/likely pathogenic" => {
                Pathogenicity::LikelyPathogenic
            }
            "pathogenic" => Pathogenicity::Pathogenic,
            _ => Pathogenicity::Other,
        }
    }

    /// Rank in the order benign < ... < pathogenic, `None` for `Other`.
    pub fn severity(self) -> Option<u8> {
        match self {
            Pathogenicity::Benign => Some(0),
            Pathogenicity::LikelyBenign => Some(1),
            Pathogenicity::Vus => Some(2),
            Pathogenicity::LikelyPathogenic => Some(3),
            Pathogenicity::Pathogenic => Some(4),
            Pathogenicity::Other => None,
        }
    }

    /// Whether `self` is strictly more severe than `other`.
    ///
    /// Always `false` if either side is `Other`.
    pub fn is_more_severe_than(self, other: Self) -> bool {
        match (self.severity(), other.severity()) {
            (Some(lhs), Some(rhs)) => lhs > rhs,
            _ => false,
        }
    }
}

/// Disease from the reported phenotype of a submission.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Disease {
    /// MedGen identifier, e.g., `C0023976`.
    #[allow(dead_code)]
    pub medgen_id: String,
    /// Disease name.
    pub name: String,
}

impl Disease {
    /// Parse `"<MedGen ID>:<name>"`; anything not splitting into exactly two parts gives
    /// the empty disease.
    pub fn from_reported_phenotype(phenotype: &str) -> Self {
        let parts = phenotype.split(':').collect::<Vec<_>>();
        match parts.as_slice() {
            [medgen_id, name] => Self {
                medgen_id: medgen_id.to_string(),
                name: name.to_string(),
            },
            _ => {
                tracing::trace!("no disease in reported phenotype {:?}", phenotype);
                Self::default()
            }
        }
    }
}
