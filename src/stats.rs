//! Implementation of the `stats` sub command.

use std::{io::Write, time::Instant};

use clap::Parser;
use itertools::Itertools;
use thousands::Separable;

use crate::{
    clinvar::{self, submission::AssessmentRecord},
    common, download,
};

/// Command line arguments for `stats` sub command.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about = "Count clinical significance labels in ClinVar submissions", long_about = None)]
pub struct Args {
    /// Path or URL of the ClinVar submission summary.
    #[arg(short = 's', long, default_value = clinvar::DEFAULT_SUBMISSIONS_URL)]
    pub clinvar_submissions: String,
    /// Keep the downloaded submission summary.
    #[arg(short = 'k', long)]
    pub keep_downloads: bool,
    /// Check the downloaded file against its `.md5` file.
    #[arg(long)]
    pub verify_downloads: bool,
}

/// Number of submissions per raw clinical significance label, sorted by label.
pub fn tally_clinical_significance(assessments: &[AssessmentRecord]) -> Vec<(&str, usize)> {
    assessments
        .iter()
        .map(|a| a.clinical_significance.as_str())
        .counts()
        .into_iter()
        .sorted()
        .collect()
}

/// Write the tally as `label,count` lines.
pub fn write_tally<W: Write>(writer: W, tally: &[(&str, usize)]) -> Result<(), anyhow::Error> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);
    for (label, count) in tally {
        writer.write_record([label.to_string(), count.to_string()])?;
    }
    writer.flush()?;

    Ok(())
}

/// Main entry point for `stats` sub command.
pub fn run(args_common: &common::Args, args: &Args) -> Result<(), anyhow::Error> {
    let before_anything = Instant::now();
    tracing::info!("args_common = {:?}", &args_common);
    tracing::info!("args = {:?}", &args);

    let local = download::ensure_local(&args.clinvar_submissions, args.verify_downloads)?;
    let assessments = clinvar::submission::read_path(&local.path);
    if !args.keep_downloads {
        download::cleanup(std::slice::from_ref(&local));
    }
    let assessments = assessments?;
    tracing::info!(
        "Counting labels of {} submissions",
        assessments.len().separate_with_commas()
    );

    let tally = tally_clinical_significance(&assessments);
    write_tally(std::io::stdout().lock(), &tally)?;

    tracing::info!(
        "All of `stats` completed in {:?}",
        before_anything.elapsed()
    );
    Ok(())
}
