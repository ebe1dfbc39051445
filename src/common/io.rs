//! Common, IO-related code.

use std::{
    fs::File,
    io::{BufRead, BufReader, BufWriter, Cursor, Read, Write},
    path::Path,
};

use flate2::{bufread::MultiGzDecoder, write::GzEncoder, Compression};

use crate::err::ParseError;

/// Whether the file name of `path` has the given extension.
fn has_extension<P: AsRef<Path>>(path: P, ext: &str) -> bool {
    path.as_ref().extension().map(|s| s.to_str()) == Some(Some(ext))
}

/// Transparently open a file with gzip decoder.
pub fn open_read_maybe_gz<P>(path: P) -> Result<Box<dyn BufRead>, anyhow::Error>
where
    P: AsRef<Path>,
{
    if has_extension(&path, "gz") {
        tracing::trace!("Opening {:?} as gzip for reading", path.as_ref());
        let file = File::open(path)?;
        let bufreader = BufReader::new(file);
        let decoder = MultiGzDecoder::new(bufreader);
        Ok(Box::new(BufReader::new(decoder)))
    } else {
        tracing::trace!("Opening {:?} as plain text for reading", path.as_ref());
        let file = File::open(path).map(BufReader::new)?;
        Ok(Box::new(file))
    }
}

/// Open a file that may be plain, gzip-compressed, or a zip archive.
///
/// A zip archive must contain exactly one entry and the name of that entry must end in
/// `entry_suffix`.  The entry is decompressed into memory.
pub fn open_read_maybe_compressed<P>(
    path: P,
    entry_suffix: &str,
) -> Result<Box<dyn BufRead>, anyhow::Error>
where
    P: AsRef<Path>,
{
    if !has_extension(&path, "zip") {
        return open_read_maybe_gz(path);
    }

    tracing::trace!("Opening {:?} as zip archive for reading", path.as_ref());
    let file = File::open(path.as_ref()).map(BufReader::new)?;
    let mut archive = zip::ZipArchive::new(file)
        .map_err(|e| anyhow::anyhow!("could not open zip archive {:?}: {}", path.as_ref(), e))?;
    let entries = archive
        .file_names()
        .map(|name| name.to_string())
        .collect::<Vec<_>>();
    if entries.len() != 1 || !entries[0].ends_with(entry_suffix) {
        return Err(ParseError::ArchiveLayout {
            path: path.as_ref().to_path_buf(),
            suffix: entry_suffix.to_string(),
            entries,
        }
        .into());
    }

    let mut entry = archive.by_index(0)?;
    let mut buf = Vec::with_capacity(entry.size() as usize);
    entry.read_to_end(&mut buf)?;
    Ok(Box::new(Cursor::new(buf)))
}

/// Transparently open a file with gzip encoder.
pub fn open_write_maybe_gz<P>(path: P) -> Result<Box<dyn Write>, anyhow::Error>
where
    P: AsRef<Path>,
{
    if has_extension(&path, "gz") {
        tracing::trace!("Opening {:?} as gzip for writing", path.as_ref());
        let file = File::create(path)?;
        let bufwriter = BufWriter::new(file);
        let encoder = GzEncoder::new(bufwriter, Compression::default());
        Ok(Box::new(encoder))
    } else {
        tracing::trace!("Opening {:?} as plain text for writing", path.as_ref());
        let file = File::create(path)?;
        Ok(Box::new(BufWriter::new(file)))
    }
}

/// Iterate over the lines of `reader` without their line terminator.
///
/// Bytes that are not valid UTF-8 are replaced by `U+FFFD` instead of failing the read.
pub fn read_lines_lossy<R: BufRead>(
    mut reader: R,
) -> impl Iterator<Item = Result<String, std::io::Error>> {
    let mut buf = Vec::new();
    std::iter::from_fn(move || {
        buf.clear();
        match reader.read_until(b'\n', &mut buf) {
            Ok(0) => None,
            Ok(_) => {
                if buf.ends_with(b"\n") {
                    buf.pop();
                    if buf.ends_with(b"\r") {
                        buf.pop();
                    }
                }
                Some(Ok(String::from_utf8_lossy(&buf).into_owned()))
            }
            Err(e) => Some(Err(e)),
        }
    })
}

#[cfg(test)]
pub(crate) mod test {
    use std::io::{BufRead, Write};

    use pretty_assertions::assert_eq;

    use crate::err::ParseError;

    /// Write a zip archive with the given `(name, contents)` entries.
    pub fn write_zip(
        path: &std::path::Path,
        entries: &[(&str, &str)],
    ) -> Result<(), anyhow::Error> {
        let mut writer = zip::ZipWriter::new(std::fs::File::create(path)?);
        let options =
            zip::write::FileOptions::default().compression_method(zip::CompressionMethod::Stored);
        for (name, contents) in entries {
            writer.start_file(*name, options)?;
            writer.write_all(contents.as_bytes())?;
        }
        writer.finish()?;
        Ok(())
    }

    fn read_all(reader: Box<dyn BufRead>) -> Result<Vec<String>, anyhow::Error> {
        Ok(reader.lines().collect::<Result<Vec<_>, _>>()?)
    }

    #[rstest::rstest]
    #[case("test.txt")]
    #[case("test.txt.gz")]
    fn write_then_read_maybe_gz(#[case] filename: &str) -> Result<(), anyhow::Error> {
        let tmp_dir = temp_testdir::TempDir::default();

        {
            let mut f = super::open_write_maybe_gz(tmp_dir.join(filename))?;
            writeln!(f, "first")?;
            writeln!(f, "second")?;
            f.flush()?;
        }

        let lines = read_all(super::open_read_maybe_gz(tmp_dir.join(filename))?)?;
        assert_eq!(lines, vec!["first".to_string(), "second".to_string()]);

        Ok(())
    }

    #[test]
    fn gz_output_is_compressed() -> Result<(), anyhow::Error> {
        let tmp_dir = temp_testdir::TempDir::default();
        {
            let mut f = super::open_write_maybe_gz(tmp_dir.join("out.csv.gz"))?;
            writeln!(f, "payload")?;
        }

        let raw = std::fs::read(tmp_dir.join("out.csv.gz"))?;
        assert_eq!(&raw[..2], &[0x1f, 0x8b]);

        Ok(())
    }

    #[test]
    fn read_single_entry_zip() -> Result<(), anyhow::Error> {
        let tmp_dir = temp_testdir::TempDir::default();
        let path = tmp_dir.join("sample.vcf.zip");
        write_zip(&path, &[("sample.vcf", "line1\nline2\n")])?;

        let lines = read_all(super::open_read_maybe_compressed(&path, "vcf")?)?;
        assert_eq!(lines, vec!["line1".to_string(), "line2".to_string()]);

        Ok(())
    }

    #[rstest::rstest]
    #[case(&[("a.vcf", "x\n"), ("b.vcf", "y\n")])]
    #[case(&[("readme.txt", "x\n")])]
    #[case(&[])]
    fn reject_zip_layout(#[case] entries: &[(&str, &str)]) -> Result<(), anyhow::Error> {
        let tmp_dir = temp_testdir::TempDir::default();
        let path = tmp_dir.join("sample.vcf.zip");
        write_zip(&path, entries)?;

        let err = match super::open_read_maybe_compressed(&path, "vcf") {
            Ok(_) => anyhow::bail!("expected archive layout error"),
            Err(err) => err,
        };
        assert!(matches!(
            err.downcast_ref::<ParseError>(),
            Some(ParseError::ArchiveLayout { .. })
        ));

        Ok(())
    }

    #[rstest::rstest]
    #[case(b"a\nb\n".as_slice(), &["a", "b"])]
    #[case(b"a\r\nb".as_slice(), &["a", "b"])]
    #[case(b"Caf\xe9\tx\n".as_slice(), &["Caf\u{fffd}\tx"])]
    #[case(b"\n\n".as_slice(), &["", ""])]
    #[case(b"".as_slice(), &[])]
    fn read_lines_lossy_cases(
        #[case] input: &[u8],
        #[case] expected: &[&str],
    ) -> Result<(), anyhow::Error> {
        let lines = super::read_lines_lossy(input).collect::<Result<Vec<_>, _>>()?;

        assert_eq!(lines, expected);

        Ok(())
    }

    #[test]
    fn missing_file_is_error() {
        assert!(super::open_read_maybe_gz("tests/does/not/exist.txt").is_err());
    }
}
