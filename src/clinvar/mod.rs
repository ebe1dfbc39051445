//! In-memory ClinVar knowledge base built from the ClinVar VCF and submission summary.

use std::{collections::HashMap, path::Path, time::Instant};

use thousands::Separable;

use crate::{common::trace_rss_now, vcf::VariantRecord};

pub mod matching;
pub mod schema;
pub mod submission;

pub use matching::MatchResult;
use submission::AssessmentRecord;

/// Default location of the ClinVar VCF (GRCh37).
pub const DEFAULT_VCF_URL: &str =
    "https://ftp.ncbi.nlm.nih.gov/pub/clinvar/vcf_GRCh37/clinvar.vcf.gz";

/// Default location of the ClinVar submission summary.
pub const DEFAULT_SUBMISSIONS_URL: &str =
    "https://ftp.ncbi.nlm.nih.gov/pub/clinvar/tab_delimited/submission_summary.txt.gz";

/// Key joining a variant to the ClinVar VCF, `"<chrom>:<pos> <ref>:<alt>"`.
pub fn clinvar_key(record: &VariantRecord) -> String {
    format!(
        "{}:{} {}:{}",
        record.chrom, record.pos, record.reference, record.alternative
    )
}

/// ClinVar variants by [`clinvar_key`] and submissions by variation ID.
///
/// Filled once when loading and only read afterwards.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ClinvarDb {
    /// ClinVar VCF records; later duplicates of a key replace earlier ones.
    pub variants_by_key: HashMap<String, VariantRecord>,
    /// Submissions grouped by variation ID, in file order.
    pub assessments_by_id: HashMap<String, Vec<AssessmentRecord>>,
}

impl ClinvarDb {
    /// Build the lookup tables from already parsed records.
    pub fn from_records(variants: Vec<VariantRecord>, assessments: Vec<AssessmentRecord>) -> Self {
        let mut variants_by_key = HashMap::with_capacity(variants.len());
        for variant in variants {
            variants_by_key.insert(clinvar_key(&variant), variant);
        }

        let mut assessments_by_id: HashMap<String, Vec<AssessmentRecord>> = HashMap::new();
        for assessment in assessments {
            assessments_by_id
                .entry(assessment.variation_id.clone())
                .or_default()
                .push(assessment);
        }

        Self {
            variants_by_key,
            assessments_by_id,
        }
    }

    /// Parse the ClinVar VCF and submission summary in parallel and build the tables.
    ///
    /// Both parses always run to completion; an error of the VCF parse is reported in
    /// preference to one of the submission parse.
    pub fn load<P, Q>(path_vcf: P, path_submissions: Q) -> Result<Self, anyhow::Error>
    where
        P: AsRef<Path> + Sync,
        Q: AsRef<Path> + Sync,
    {
        tracing::info!("Loading ClinVar ...");
        let before_loading = Instant::now();
        // Worker threads do not inherit the thread-local subscriber of the caller.
        let dispatch = tracing::dispatcher::get_default(|dispatch| dispatch.clone());
        let (variants, assessments) = rayon::join(
            || {
                tracing::dispatcher::with_default(&dispatch, || {
                    crate::vcf::read_path(path_vcf.as_ref())
                })
            },
            || {
                tracing::dispatcher::with_default(&dispatch, || {
                    submission::read_path(path_submissions.as_ref())
                })
            },
        );
        let variants = variants.map_err(|e| {
            anyhow::anyhow!(
                "problem loading ClinVar VCF {:?}: {}",
                path_vcf.as_ref(),
                e
            )
        })?;
        let assessments = assessments.map_err(|e| {
            anyhow::anyhow!(
                "problem loading ClinVar submissions {:?}: {}",
                path_submissions.as_ref(),
                e
            )
        })?;
        tracing::info!(
            "... done loading {} ClinVar variants and {} submissions in {:?}",
            variants.len().separate_with_commas(),
            assessments.len().separate_with_commas(),
            before_loading.elapsed()
        );

        let result = Self::from_records(variants, assessments);
        tracing::debug!(
            "indexed {} distinct variant keys and {} variation IDs",
            result.variants_by_key.len().separate_with_commas(),
            result.assessments_by_id.len().separate_with_commas()
        );
        trace_rss_now();

        Ok(result)
    }
}

#[cfg(test)]
pub(crate) mod test {
    use std::{
        io::Write,
        sync::{Arc, Mutex},
    };

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::clinvar::submission::test::{write_submissions_gz, SUBMISSIONS_TXT};

    pub const CLINVAR_VCF: &str = "tests/clinvar/clinvar.vcf";

    pub fn load_test_db() -> Result<ClinvarDb, anyhow::Error> {
        ClinvarDb::load(CLINVAR_VCF, SUBMISSIONS_TXT)
    }

    fn variant(chrom: &str, pos: i64, id: &str, reference: &str, alternative: &str) -> VariantRecord {
        VariantRecord {
            chrom: chrom.into(),
            pos,
            id: id.into(),
            reference: reference.into(),
            alternative: alternative.into(),
            ..Default::default()
        }
    }

    fn assessment(variation_id: &str, scv: &str) -> AssessmentRecord {
        AssessmentRecord {
            variation_id: variation_id.into(),
            scv: scv.into(),
            ..Default::default()
        }
    }

    #[rstest::rstest]
    #[case(variant("1", 1000, ".", "A", "G"), "1:1000 A:G")]
    #[case(variant("chrX", 5, ".", "TA", "T"), "chrX:5 TA:T")]
    fn clinvar_key_format(#[case] record: VariantRecord, #[case] expected: &str) {
        assert_eq!(clinvar_key(&record), expected);
    }

    #[test]
    fn from_records_duplicate_key_last_wins() {
        let db = ClinvarDb::from_records(
            vec![
                variant("1", 10, "first", "A", "C"),
                variant("1", 10, "second", "A", "C"),
            ],
            vec![],
        );

        assert_eq!(db.variants_by_key.len(), 1);
        assert_eq!(db.variants_by_key["1:10 A:C"].id, "second");
    }

    #[test]
    fn from_records_groups_in_source_order() {
        let db = ClinvarDb::from_records(
            vec![],
            vec![
                assessment("1", "SCV1"),
                assessment("2", "SCV2"),
                assessment("1", "SCV3"),
                assessment("1", "SCV4"),
            ],
        );

        let scvs = db.assessments_by_id["1"]
            .iter()
            .map(|a| a.scv.as_str())
            .collect::<Vec<_>>();
        assert_eq!(scvs, vec!["SCV1", "SCV3", "SCV4"]);
        assert_eq!(db.assessments_by_id["2"].len(), 1);
        assert_eq!(db.assessments_by_id.values().map(Vec::len).sum::<usize>(), 4);
    }

    #[test]
    fn load_test_files() -> Result<(), anyhow::Error> {
        let db = load_test_db()?;

        assert_eq!(db.variants_by_key.len(), 5);
        assert_eq!(db.variants_by_key["X:4000 TA:T"].id, "400");
        assert_eq!(db.assessments_by_id.len(), 5);
        assert_eq!(db.assessments_by_id["100"].len(), 3);
        assert_eq!(db.assessments_by_id.values().map(Vec::len).sum::<usize>(), 9);

        Ok(())
    }

    #[test]
    fn concurrent_load_equals_sequential_load() -> Result<(), anyhow::Error> {
        let tmp_dir = temp_testdir::TempDir::default();
        let path_gz = tmp_dir.join("submission_summary.txt.gz");
        write_submissions_gz(&path_gz)?;

        let concurrent = ClinvarDb::load(CLINVAR_VCF, &path_gz)?;
        let sequential = ClinvarDb::from_records(
            crate::vcf::read_path(CLINVAR_VCF)?,
            submission::read_path(SUBMISSIONS_TXT)?,
        );

        assert_eq!(concurrent, sequential);

        Ok(())
    }

    #[test]
    fn load_fails_on_missing_vcf() {
        assert!(ClinvarDb::load("tests/clinvar/missing.vcf", SUBMISSIONS_TXT).is_err());
    }

    #[test]
    fn load_fails_on_missing_submissions() {
        assert!(ClinvarDb::load(CLINVAR_VCF, "tests/clinvar/missing.txt.gz").is_err());
    }

    #[test]
    fn load_fails_on_invalid_position() -> Result<(), anyhow::Error> {
        let tmp_dir = temp_testdir::TempDir::default();
        let path = tmp_dir.join("broken.vcf");
        std::fs::write(&path, "1\tnope\t1\tA\tC\t.\t.\tRS=1\n")?;

        let err = ClinvarDb::load(&path, SUBMISSIONS_TXT).expect_err("invalid position");
        assert!(err.to_string().contains("invalid position \"nope\""));

        Ok(())
    }

    #[derive(Clone, Default)]
    struct SharedBuf(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().expect("poisoned").write(buf)
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn load_logs_from_worker_threads() -> Result<(), anyhow::Error> {
        let tmp_dir = temp_testdir::TempDir::default();
        let path = tmp_dir.join("mismatch.vcf");
        std::fs::write(&path, "3\t5\t9\tA\tT\t.\tPASS\t.\tGT:DP:GQ\t1/1:3\n")?;

        let buf = SharedBuf::default();
        let writer = buf.clone();
        let collector = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_max_level(tracing::Level::DEBUG)
            .with_ansi(false)
            .finish();
        let db = tracing::subscriber::with_default(collector, || {
            ClinvarDb::load(&path, SUBMISSIONS_TXT)
        })?;

        assert_eq!(db.variants_by_key.len(), 1);
        let logs = String::from_utf8(buf.0.lock().expect("poisoned").clone())?;
        assert!(logs.contains("Format/Sample length mismatch for variant: 3:5"));
        assert!(logs.contains("Loading VCF from"));
        assert!(logs.contains("Loading ClinVar submission summary from"));

        Ok(())
    }
}
