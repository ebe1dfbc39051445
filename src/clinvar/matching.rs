//! Matching of variants against the ClinVar knowledge base and summarizing submissions.

use std::collections::BTreeSet;

use enum_map::EnumMap;

use crate::vcf::VariantRecord;

use super::{schema::Pathogenicity, submission::AssessmentRecord, ClinvarDb};

/// Summary of all ClinVar submissions for one matched variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchResult<'a> {
    /// The ClinVar VCF record.
    pub variant: &'a VariantRecord,
    /// All submissions for the variation ID of `variant`, in file order.
    #[allow(dead_code)]
    pub assessments: &'a [AssessmentRecord],
    /// Number of submissions.
    pub assessment_count: usize,
    /// Number of submissions per pathogenicity bucket.
    pub pathogenicity_counts: EnumMap<Pathogenicity, usize>,
    /// Most severe pathogenicity over all submissions.
    pub pathogenicity: Pathogenicity,
    /// Distinct disease names, sorted.
    pub diseases: Vec<String>,
    /// Distinct submitted gene symbols, sorted.
    pub genes: Vec<String>,
}

impl<'a> MatchResult<'a> {
    /// Summarize the `assessments` of `variant`.
    ///
    /// The headline pathogenicity starts out as `Benign` and is only raised by more
    /// severe known buckets, so a list of `Other` submissions is headlined `Benign`.
    pub fn summarize(variant: &'a VariantRecord, assessments: &'a [AssessmentRecord]) -> Self {
        let mut pathogenicity_counts = EnumMap::default();
        let mut pathogenicity = Pathogenicity::Benign;
        let mut diseases = BTreeSet::new();
        let mut genes = BTreeSet::new();

        for assessment in assessments {
            pathogenicity_counts[assessment.pathogenicity] += 1;
            if assessment.pathogenicity.is_more_severe_than(pathogenicity) {
                pathogenicity = assessment.pathogenicity;
            }
            if !assessment.disease.name.is_empty() {
                diseases.insert(assessment.disease.name.as_str());
            }
            if let Some(gene) = assessment.gene_symbol() {
                genes.insert(gene);
            }
        }

        Self {
            variant,
            assessments,
            assessment_count: assessments.len(),
            pathogenicity_counts,
            pathogenicity,
            diseases: diseases.into_iter().map(String::from).collect(),
            genes: genes.into_iter().map(String::from).collect(),
        }
    }
}

impl ClinvarDb {
    /// Look up the variant with the given [`super::clinvar_key`].
    ///
    /// Returns `None` if the key is unknown and also if the ClinVar variant has no
    /// submissions at all.
    pub fn lookup(&self, key: &str) -> Option<MatchResult<'_>> {
        let variant = self.variants_by_key.get(key)?;
        let assessments = self.assessments_by_id.get(&variant.id)?;
        Some(MatchResult::summarize(variant, assessments))
    }
}
