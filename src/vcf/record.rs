//! Representation of a single VCF data line.

use indexmap::IndexMap;

use crate::err::ParseError;

/// Minimal number of tab-separated columns for a usable line.
pub const MIN_COLUMNS: usize = 7;

/// Number of columns when exactly one sample is present.
pub const SINGLE_SAMPLE_COLUMNS: usize = 10;

/// Key of the genotype value in the sample map.
pub const GENOTYPE_KEY: &str = "GT";

/// One record from a VCF file.
///
/// Only the fixed columns and a single sample are interpreted, everything is kept as
/// string as e.g. `QUAL` is not always numeric.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct VariantRecord {
    /// Chromosome name.
    pub chrom: String,
    /// 1-based position.
    pub pos: i64,
    /// Identifier, `.` if missing.
    pub id: String,
    /// Reference allele.
    pub reference: String,
    /// Alternative allele.
    pub alternative: String,
    /// Quality, verbatim.
    #[allow(dead_code)]
    pub qual: String,
    /// Filter value, verbatim.
    pub filter: String,
    /// The `INFO` key/value pairs.
    pub info: IndexMap<String, String>,
    /// `FORMAT` keys zipped with the sample values; `None` unless exactly one sample
    /// column is present.
    pub sample_data: Option<IndexMap<String, String>>,
}

impl VariantRecord {
    /// Parse one data line; header lines and lines with too few columns yield `None`.
    ///
    /// `line_no` is only used for error and log messages.
    pub fn from_line(line: &str, line_no: usize) -> Result<Option<Self>, ParseError> {
        if line.is_empty() || line.starts_with('#') {
            return Ok(None);
        }
        let parts = line.split('\t').collect::<Vec<_>>();
        if parts.len() < MIN_COLUMNS {
            tracing::debug!(
                "skipping line {} with {} < {} columns",
                line_no,
                parts.len(),
                MIN_COLUMNS
            );
            return Ok(None);
        }

        let pos = parts[1]
            .parse::<i64>()
            .map_err(|source| ParseError::InvalidPosition {
                line_no,
                value: parts[1].to_string(),
                source,
            })?;

        let sample_data = if parts.len() == SINGLE_SAMPLE_COLUMNS {
            Some(zip_sample_data(parts[8], parts[9]).unwrap_or_else(|| {
                tracing::warn!(
                    "Format/Sample length mismatch for variant: {}:{}",
                    parts[0],
                    pos
                );
                IndexMap::new()
            }))
        } else {
            None
        };

        Ok(Some(Self {
            chrom: parts[0].to_string(),
            pos,
            id: parts[2].to_string(),
            reference: parts[3].to_string(),
            alternative: parts[4].to_string(),
            qual: parts[5].to_string(),
            filter: parts[6].to_string(),
            info: parts.get(7).map(|s| parse_info(s)).unwrap_or_default(),
            sample_data,
        }))
    }

    /// Whether the `FILTER` column says `PASS`, ignoring case.
    pub fn is_pass(&self) -> bool {
        self.filter.eq_ignore_ascii_case("pass")
    }

    /// Value of the given `INFO` key, empty if not present.
    pub fn info_value(&self, key: &str) -> &str {
        self.info.get(key).map(String::as_str).unwrap_or_default()
    }

    /// Value of the given sample field, empty if not present.
    pub fn sample_value(&self, key: &str) -> &str {
        self.sample_data
            .as_ref()
            .and_then(|data| data.get(key))
            .map(String::as_str)
            .unwrap_or_default()
    }

    /// The called genotype of the single sample, e.g. `0/1`.
    pub fn genotype(&self) -> &str {
        self.sample_value(GENOTYPE_KEY)
    }

    /// 1-based position after the reference allele.
    pub fn end(&self) -> i64 {
        self.pos + self.reference.len() as i64
    }
}

/// Parse the `INFO` column.
///
/// Each `;`-separated part is split at the first `=`, parts without `=` become flags with
/// an empty value.  Later duplicates overwrite earlier values.
pub fn parse_info(info: &str) -> IndexMap<String, String> {
    info.split(';')
        .map(|part| match part.split_once('=') {
            Some((key, value)) => (key.to_string(), value.to_string()),
            None => (part.to_string(), String::new()),
        })
        .collect()
}

/// Zip the `:`-separated `FORMAT` keys with the sample values, `None` on length mismatch.
fn zip_sample_data(format: &str, sample: &str) -> Option<IndexMap<String, String>> {
    let keys = format.split(':').collect::<Vec<_>>();
    let values = sample.split(':').collect::<Vec<_>>();
    if keys.len() != values.len() {
        return None;
    }
    Some(
        keys.into_iter()
            .zip(values)
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect(),
    )
}
