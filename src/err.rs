use std::{num::ParseIntError, path::PathBuf};

/// Structural problems that abort reading a whole input file.
#[derive(thiserror::Error, Debug)]
pub enum ParseError {
    #[error("invalid position {value:?} in line {line_no}")]
    InvalidPosition {
        line_no: usize,
        value: String,
        #[source]
        source: ParseIntError,
    },
    #[error("please supply a .vcf, .vcf.gz or .vcf.zip file, got {0:?}")]
    UnsupportedFormat(PathBuf),
    #[error("expected exactly one entry ending in {suffix:?} in archive {path:?}, found {entries:?}")]
    ArchiveLayout {
        path: PathBuf,
        suffix: String,
        entries: Vec<String>,
    },
}

#[derive(thiserror::Error, Debug)]
pub enum DownloadError {
    #[error("HTTP {status} for {url}")]
    HttpStatus { url: String, status: u16 },
    #[error("md5 mismatch on {path:?}: {local}(local) != {remote}(remote)")]
    ChecksumMismatch {
        path: PathBuf,
        local: String,
        remote: String,
    },
}
