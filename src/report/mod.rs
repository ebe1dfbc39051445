//! Implementation of the `report` sub command.

pub mod output;

use std::{collections::BTreeMap, path::Path, time::Instant};

use clap::Parser;
use thousands::Separable;

use crate::{
    clinvar::{self, clinvar_key, ClinvarDb},
    common::{self, io::open_write_maybe_gz, trace_rss_now},
    download::{self, LocalFile},
    vcf,
};

use self::output::{Record, HEADER, KEY_CLNSIG};

/// Command line arguments for `report` sub command.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about = "Report ClinVar assessments of VCF variants", long_about = None)]
pub struct Args {
    /// Path to the patient VCF file (`.vcf`, `.vcf.gz` or `.vcf.zip`).
    #[arg(value_name = "INPUT")]
    pub path_input: String,
    /// Path or URL of the ClinVar VCF.
    #[arg(short = 'c', long, default_value = clinvar::DEFAULT_VCF_URL)]
    pub clinvar_vcf: String,
    /// Path or URL of the ClinVar submission summary.
    #[arg(short = 's', long, default_value = clinvar::DEFAULT_SUBMISSIONS_URL)]
    pub clinvar_submissions: String,
    /// Path to the output CSV file, gzip-compressed if ending in `.gz`.
    #[arg(short = 'o', long, default_value = "clinvar_assessments.csv")]
    pub output_file: String,
    /// Report variants regardless of their `FILTER` value.
    #[arg(short = 'a', long)]
    pub include_all: bool,
    /// Keep downloaded ClinVar files.
    #[arg(short = 'k', long)]
    pub keep_downloads: bool,
    /// Check downloaded ClinVar files against their `.md5` file.
    #[arg(long)]
    pub verify_downloads: bool,
}

/// Counters of a report run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReportStats {
    /// Variants in the input file.
    pub count_variants: usize,
    /// Variants that were looked up.
    pub count_considered: usize,
    /// Variants with a ClinVar match, one report row each.
    pub count_matched: usize,
}

/// Match the `variants` against `db` and build the report rows in input order.
///
/// Only variants passing the `FILTER` are considered unless `include_all` is set.
pub fn build_records(
    variants: &[vcf::VariantRecord],
    db: &ClinvarDb,
    include_all: bool,
) -> (Vec<Record>, ReportStats) {
    let mut stats = ReportStats {
        count_variants: variants.len(),
        ..Default::default()
    };
    let mut clnsig_tally: BTreeMap<&str, usize> = BTreeMap::new();

    let mut records = Vec::new();
    for variant in variants
        .iter()
        .filter(|variant| include_all || variant.is_pass())
    {
        stats.count_considered += 1;
        if let Some(result) = db.lookup(&clinvar_key(variant)) {
            *clnsig_tally
                .entry(result.variant.info_value(KEY_CLNSIG))
                .or_default() += 1;
            records.push(Record::from_match(variant, &result));
        }
    }
    stats.count_matched = records.len();

    for (clnsig, count) in &clnsig_tally {
        tracing::debug!("  {}: {}", clnsig, count.separate_with_commas());
    }

    (records, stats)
}

/// Write the `records` as CSV with header to `path_output`.
pub fn write_records<P: AsRef<Path>>(path_output: P, records: &[Record]) -> Result<(), anyhow::Error> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(open_write_maybe_gz(path_output.as_ref()).map_err(|e| {
            anyhow::anyhow!("Cannot open {:?} for writing: {:?}", path_output.as_ref(), e)
        })?);
    writer.write_record(HEADER)?;
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;

    Ok(())
}

/// Load everything, match, and write the report.
///
/// The output file is only created once both inputs have been read successfully.
pub fn write_report(
    path_input: &Path,
    path_clinvar_vcf: &Path,
    path_clinvar_submissions: &Path,
    path_output: &Path,
    include_all: bool,
) -> Result<ReportStats, anyhow::Error> {
    tracing::info!("Loading input VCF {:?} ...", path_input);
    let variants = vcf::read_path(path_input)
        .map_err(|e| anyhow::anyhow!("problem loading input VCF {:?}: {}", path_input, e))?;
    tracing::info!(
        "... done loading {} variants",
        variants.len().separate_with_commas()
    );

    let db = ClinvarDb::load(path_clinvar_vcf, path_clinvar_submissions)?;

    tracing::info!("Matching variants ...");
    let (records, stats) = build_records(&variants, &db, include_all);
    tracing::info!(
        "... matched {} of {} considered variants",
        stats.count_matched.separate_with_commas(),
        stats.count_considered.separate_with_commas()
    );

    write_records(path_output, &records)?;
    tracing::info!(
        "Wrote {} records to {:?}",
        records.len().separate_with_commas(),
        path_output
    );

    Ok(stats)
}

/// Main entry point for `report` sub command.
pub fn run(args_common: &common::Args, args: &Args) -> Result<(), anyhow::Error> {
    let before_anything = Instant::now();
    tracing::info!("clinvar-matcher {}", common::matcher_version());
    tracing::info!("args_common = {:?}", &args_common);
    tracing::info!("args = {:?}", &args);

    let mut local_files: Vec<LocalFile> = Vec::new();
    let result = download::ensure_local(&args.clinvar_vcf, args.verify_downloads)
        .and_then(|clinvar_vcf| {
            local_files.push(clinvar_vcf);
            download::ensure_local(&args.clinvar_submissions, args.verify_downloads)
        })
        .and_then(|clinvar_submissions| {
            local_files.push(clinvar_submissions);
            write_report(
                Path::new(&args.path_input),
                &local_files[0].path,
                &local_files[1].path,
                Path::new(&args.output_file),
                args.include_all,
            )
        });

    if args.keep_downloads {
        tracing::info!("Keeping downloaded files");
    } else {
        download::cleanup(&local_files);
    }
    let stats = result?;

    trace_rss_now();
    tracing::info!(
        "All of `report` completed in {:?} with {} matches",
        before_anything.elapsed(),
        stats.count_matched.separate_with_commas()
    );
    Ok(())
}
