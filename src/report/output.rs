//! Rows of the assessment report.

use serde::Serialize;

use crate::{
    clinvar::{schema::Pathogenicity, MatchResult},
    vcf::VariantRecord,
};

/// `INFO` key of the ClinVar clinical significance.
pub const KEY_CLNSIG: &str = "CLNSIG";
/// `INFO` key of the dbSNP number, without `rs` prefix.
pub const KEY_RS: &str = "RS";
/// `INFO` key of the variant type.
pub const KEY_CLNVC: &str = "CLNVC";
/// `INFO` key of the ESP allele frequency.
pub const KEY_AF_ESP: &str = "AF_ESP";
/// `INFO` key of the ExAC allele frequency.
pub const KEY_AF_EXAC: &str = "AF_EXAC";
/// `INFO` key of the 1000 Genomes allele frequency.
pub const KEY_AF_TGP: &str = "AF_TGP";

/// Placeholder for a missing VCF identifier.
const MISSING_ID: &str = ".";

/// Separator of list-valued columns.
const LIST_SEPARATOR: &str = ",";

/// Header line of the report, in the order of the fields of [`Record`].
pub const HEADER: [&str; 25] = [
    "Chromosome",
    "Begin",
    "End",
    "Var Type",
    "Ref",
    "Alt",
    "Rsid",
    "Zygosity",
    "Clinvar ID",
    "Assessment Count",
    "Max Pathogenicity",
    "# Benign",
    "# Likely Benign",
    "# VUS",
    "# Likely Path",
    "# Pathogenic",
    "# Other",
    "Diseases",
    "Genes",
    "Clinvar Link",
    "dbSNP Link",
    "Snpedia Link",
    "AF_ESP",
    "AF_EXAC",
    "AF_TGP",
];

/// External resources a report row links to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Xref {
    /// ClinVar variation page, by variation ID.
    Clinvar,
    /// dbSNP page, by `rs` identifier.
    DbSnp,
    /// SNPedia page, by `rs` identifier.
    Snpedia,
}

impl Xref {
    /// URL of the page for `id`; empty if `id` is empty.
    pub fn url(self, id: &str) -> String {
        if id.is_empty() {
            return String::new();
        }
        match self {
            Xref::Clinvar => format!("https://www.ncbi.nlm.nih.gov/clinvar/variation/{}/", id),
            Xref::DbSnp => format!("https://www.ncbi.nlm.nih.gov/snp/{}", id),
            Xref::Snpedia => format!("https://www.snpedia.com/index.php/{}", id),
        }
    }
}

/// The `rs` identifier of a match.
///
/// Prefers the `RS` annotation of the ClinVar record and falls back to the identifier
/// of the patient variant; `.` counts as no identifier.
pub fn resolve_rsid(variant: &VariantRecord, clinvar: &VariantRecord) -> String {
    let rs = clinvar.info_value(KEY_RS);
    if !rs.is_empty() {
        format!("rs{}", rs)
    } else if variant.id == MISSING_ID {
        String::new()
    } else {
        variant.id.clone()
    }
}

/// One line of the report.
#[derive(Serialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct Record {
    pub chromosome: String,
    pub begin: i64,
    pub end: i64,
    pub var_type: String,
    pub reference: String,
    pub alternative: String,
    pub rsid: String,
    pub zygosity: String,
    pub clinvar_id: String,
    pub assessment_count: usize,
    pub max_pathogenicity: String,
    pub count_benign: usize,
    pub count_likely_benign: usize,
    pub count_vus: usize,
    pub count_likely_pathogenic: usize,
    pub count_pathogenic: usize,
    pub count_other: usize,
    pub diseases: String,
    pub genes: String,
    pub clinvar_link: String,
    pub dbsnp_link: String,
    pub snpedia_link: String,
    pub af_esp: String,
    pub af_exac: String,
    pub af_tgp: String,
}

impl Record {
    /// Build the row for patient `variant` matched to `result`.
    pub fn from_match(variant: &VariantRecord, result: &MatchResult) -> Self {
        let clinvar = result.variant;
        let rsid = resolve_rsid(variant, clinvar);
        let counts = &result.pathogenicity_counts;
        Self {
            chromosome: variant.chrom.clone(),
            begin: variant.pos,
            end: variant.end(),
            var_type: clinvar.info_value(KEY_CLNVC).to_string(),
            reference: variant.reference.clone(),
            alternative: variant.alternative.clone(),
            zygosity: variant.genotype().to_string(),
            clinvar_id: clinvar.id.clone(),
            assessment_count: result.assessment_count,
            max_pathogenicity: result.pathogenicity.to_string(),
            count_benign: counts[Pathogenicity::Benign],
            count_likely_benign: counts[Pathogenicity::LikelyBenign],
            count_vus: counts[Pathogenicity::Vus],
            count_likely_pathogenic: counts[Pathogenicity::LikelyPathogenic],
            count_pathogenic: counts[Pathogenicity::Pathogenic],
            count_other: counts[Pathogenicity::Other],
            diseases: result.diseases.join(LIST_SEPARATOR),
            genes: result.genes.join(LIST_SEPARATOR),
            clinvar_link: Xref::Clinvar.url(&clinvar.id),
            dbsnp_link: Xref::DbSnp.url(&rsid),
            snpedia_link: Xref::Snpedia.url(&rsid),
            af_esp: clinvar.info_value(KEY_AF_ESP).to_string(),
            af_exac: clinvar.info_value(KEY_AF_EXAC).to_string(),
            af_tgp: clinvar.info_value(KEY_AF_TGP).to_string(),
            rsid,
        }
    }
}
