//! Parsing of the ClinVar `submission_summary.txt` file.

use std::{io::BufRead, path::Path, time::Instant};

use thousands::Separable;

use crate::common::io::{open_read_maybe_gz, read_lines_lossy};

use super::schema::{Disease, Pathogenicity};

/// Minimal number of tab-separated columns in a submission line.
pub const MIN_COLUMNS: usize = 13;

/// Gene symbol used by ClinVar if the submitter gave none.
pub const NO_GENE: &str = "-";

/// One submission (SCV) from the submission summary.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AssessmentRecord {
    /// ClinVar variation ID, joins with the `ID` column of the ClinVar VCF.
    pub variation_id: String,
    /// Clinical significance as submitted, possibly several `,`-separated terms.
    pub clinical_significance: String,
    /// Date of last evaluation.
    #[allow(dead_code)]
    pub date_last_evaluated: String,
    /// Free-text description.
    #[allow(dead_code)]
    pub description: String,
    /// Phenotype as submitted.
    #[allow(dead_code)]
    pub submitted_phenotype_info: String,
    /// Phenotype as reported by ClinVar, `"<MedGen ID>:<name>"`.
    #[allow(dead_code)]
    pub reported_phenotype_info: String,
    /// Review status.
    #[allow(dead_code)]
    pub review_status: String,
    /// Collection method.
    #[allow(dead_code)]
    pub collection_method: String,
    /// Origin counts.
    #[allow(dead_code)]
    pub origin_counts: String,
    /// Name of the submitter.
    #[allow(dead_code)]
    pub submitter: String,
    /// SCV accession.
    #[allow(dead_code)]
    pub scv: String,
    /// Submitted gene symbol, [`NO_GENE`] if none.
    pub submitted_gene_symbol: String,
    /// Explanation of the interpretation.
    #[allow(dead_code)]
    pub explanation_of_interpretation: String,
    /// Resolved from `clinical_significance`.
    pub pathogenicity: Pathogenicity,
    /// Resolved from `reported_phenotype_info`.
    pub disease: Disease,
}

impl AssessmentRecord {
    /// Parse one line; comments and lines with too few columns yield `None`.
    pub fn from_line(line: &str) -> Option<Self> {
        if line.is_empty() || line.starts_with('#') {
            return None;
        }
        let parts = line.split('\t').collect::<Vec<_>>();
        if parts.len() < MIN_COLUMNS {
            tracing::debug!(
                "skipping submission with {} < {} columns",
                parts.len(),
                MIN_COLUMNS
            );
            return None;
        }

        Some(Self {
            variation_id: parts[0].to_string(),
            clinical_significance: parts[1].to_string(),
            date_last_evaluated: parts[2].to_string(),
            description: parts[3].to_string(),
            submitted_phenotype_info: parts[4].to_string(),
            reported_phenotype_info: parts[5].to_string(),
            review_status: parts[6].to_string(),
            collection_method: parts[7].to_string(),
            origin_counts: parts[8].to_string(),
            submitter: parts[9].to_string(),
            scv: parts[10].to_string(),
            submitted_gene_symbol: parts[11].to_string(),
            explanation_of_interpretation: parts[12].to_string(),
            pathogenicity: Pathogenicity::from_clinical_significance(parts[1]),
            disease: Disease::from_reported_phenotype(parts[5]),
        })
    }

    /// The submitted gene symbol unless it is the "no gene" sentinel.
    pub fn gene_symbol(&self) -> Option<&str> {
        if self.submitted_gene_symbol == NO_GENE {
            None
        } else {
            Some(self.submitted_gene_symbol.as_str())
        }
    }
}

/// Read all submissions from `reader` in source order.
pub fn read_records<R: BufRead>(reader: R) -> Result<Vec<AssessmentRecord>, anyhow::Error> {
    let mut records = Vec::new();
    for line in read_lines_lossy(reader) {
        if let Some(record) = AssessmentRecord::from_line(&line?) {
            records.push(record);
        }
    }
    Ok(records)
}

/// Read the submission summary at `path`, gzip-compressed if it ends in `.gz`.
pub fn read_path<P: AsRef<Path>>(path: P) -> Result<Vec<AssessmentRecord>, anyhow::Error> {
    let path = path.as_ref();
    tracing::info!("Loading ClinVar submission summary from {:?}", path);
    let before_loading = Instant::now();
    let reader = open_read_maybe_gz(path)
        .map_err(|e| anyhow::anyhow!("could not open file {:?} for reading: {}", path, e))?;
    let records = read_records(reader)?;
    tracing::debug!(
        "read {} submissions from {:?} in {:?}",
        records.len().separate_with_commas(),
        path,
        before_loading.elapsed()
    );

    Ok(records)
}

#[cfg(test)]
pub(crate) mod test {
    use std::io::Write;

    use pretty_assertions::assert_eq;

    use super::*;

    pub const SUBMISSIONS_TXT: &str = "tests/clinvar/submission_summary.txt";

    /// Write `SUBMISSIONS_TXT` gzip-compressed to `path`.
    pub fn write_submissions_gz(path: &Path) -> Result<(), anyhow::Error> {
        let contents = std::fs::read(SUBMISSIONS_TXT)?;
        let mut f = crate::common::io::open_write_maybe_gz(path)?;
        f.write_all(&contents)?;
        f.flush()?;
        Ok(())
    }

    #[test]
    fn from_line_example() {
        let line = "5\tPathogenic\t-\t-\t-\tMedGen1:LongQTSyndrome\tcriteria provided, single \
                    submitter\tclinical testing\tgermline:na\tSome Lab\tSCV000000001\tKCNQ1\t-";
        let record = AssessmentRecord::from_line(line).expect("valid line");

        assert_eq!(record.variation_id, "5");
        assert_eq!(record.pathogenicity, Pathogenicity::Pathogenic);
        assert_eq!(record.disease.medgen_id, "MedGen1");
        assert_eq!(record.disease.name, "LongQTSyndrome");
        assert_eq!(record.submitted_gene_symbol, "KCNQ1");
        assert_eq!(record.gene_symbol(), Some("KCNQ1"));
        assert_eq!(record.submitter, "Some Lab");
        assert_eq!(record.scv, "SCV000000001");
    }

    #[test]
    fn from_line_without_gene() {
        let line = "7\tdrug response\t-\t-\t-\tnot provided\t-\t-\t-\t-\t-\t-\t-";
        let record = AssessmentRecord::from_line(line).expect("valid line");

        assert_eq!(record.pathogenicity, Pathogenicity::Other);
        assert_eq!(record.disease, Disease::default());
        assert_eq!(record.gene_symbol(), None);
    }

    #[rstest::rstest]
    #[case("#VariationID\tClinicalSignificance")]
    #[case("5\tPathogenic\t-\t-\t-\tMedGen1:X\t-\t-\t-\t-\t-\tKCNQ1")]
    #[case("")]
    fn skipped_lines(#[case] line: &str) {
        assert_eq!(AssessmentRecord::from_line(line), None);
    }

    #[test]
    fn read_path_plain() -> Result<(), anyhow::Error> {
        let records = read_path(SUBMISSIONS_TXT)?;

        assert_eq!(records.len(), 9);
        assert_eq!(
            records
                .iter()
                .map(|r| r.scv.as_str())
                .take(3)
                .collect::<Vec<_>>(),
            vec!["SCV000000101", "SCV000000102", "SCV000000103"]
        );

        Ok(())
    }

    #[test]
    fn read_path_gz() -> Result<(), anyhow::Error> {
        let tmp_dir = temp_testdir::TempDir::default();
        let path = tmp_dir.join("submission_summary.txt.gz");
        write_submissions_gz(&path)?;

        assert_eq!(read_path(&path)?, read_path(SUBMISSIONS_TXT)?);

        Ok(())
    }

    #[test]
    fn read_path_gz_corrupt() -> Result<(), anyhow::Error> {
        let tmp_dir = temp_testdir::TempDir::default();
        let path = tmp_dir.join("submission_summary.txt.gz");
        std::fs::write(&path, b"this is not gzip")?;

        assert!(read_path(&path).is_err());

        Ok(())
    }

    #[test]
    fn read_records_tolerates_invalid_utf8() -> Result<(), anyhow::Error> {
        let mut data = std::fs::read(SUBMISSIONS_TXT)?;
        data.extend_from_slice(
            b"100\tBenign\t-\t-\t-\tC1:Caf\xe9 syndrome\t-\t-\t-\tLab\xe9\tSCV1\tGENEX\t-\n",
        );

        let records = read_records(data.as_slice())?;

        assert_eq!(records.len(), 10);
        let last = &records[9];
        assert_eq!(last.pathogenicity, Pathogenicity::Benign);
        assert_eq!(last.disease.name, "Caf\u{fffd} syndrome");
        assert_eq!(last.submitter, "Lab\u{fffd}");
        assert_eq!(last.gene_symbol(), Some("GENEX"));

        Ok(())
    }
}
