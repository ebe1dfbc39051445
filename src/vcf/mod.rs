//! Reading of VCF files into memory.
//!
//! Line-based; only the fixed columns, `INFO` and a single sample are interpreted.  Used
//! for both the patient VCF and the ClinVar VCF.

use std::{io::BufRead, path::Path, time::Instant};

use thousands::Separable;

use crate::{
    common::io::{open_read_maybe_compressed, read_lines_lossy},
    err::ParseError,
};

pub mod record;

pub use record::VariantRecord;

/// Read all records from `reader`.
///
/// Header lines and lines with too few columns are skipped, an invalid position aborts
/// reading with an error.
pub fn read_records<R: BufRead>(reader: R) -> Result<Vec<VariantRecord>, anyhow::Error> {
    let mut records = Vec::new();
    for (i, line) in read_lines_lossy(reader).enumerate() {
        let line = line?;
        if let Some(record) = VariantRecord::from_line(&line, i + 1)? {
            records.push(record);
        }
    }
    Ok(records)
}

/// Read all records from the VCF file at `path`.
///
/// The file name must end in `vcf`, `vcf.gz`, or `vcf.zip`; in the latter case the archive
/// must hold exactly one `*vcf` entry.
pub fn read_path<P: AsRef<Path>>(path: P) -> Result<Vec<VariantRecord>, anyhow::Error> {
    let path = path.as_ref();
    let name = path.to_string_lossy();
    if !(name.ends_with("vcf") || name.ends_with("vcf.gz") || name.ends_with("vcf.zip")) {
        return Err(ParseError::UnsupportedFormat(path.to_path_buf()).into());
    }

    tracing::info!("Loading VCF from {:?}", path);
    let before_loading = Instant::now();
    let reader = open_read_maybe_compressed(path, "vcf")
        .map_err(|e| anyhow::anyhow!("could not open file {:?} for reading: {}", path, e))?;
    let records = read_records(reader)?;
    tracing::debug!(
        "read {} records from {:?} in {:?}",
        records.len().separate_with_commas(),
        path,
        before_loading.elapsed()
    );

    Ok(records)
}
