//! Discovery and decompression of `*.xml.gz` input files.

use std::fs::File;
use std::hash::{Hash, Hasher};
use std::io::BufReader;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use flate2::read::GzDecoder;
use rustc_hash::FxHasher;

/// All `*.xml.gz` files in `folder`, sorted by file name.
pub fn list_xml_gz(folder: &Path) -> Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = std::fs::read_dir(folder)
        .with_context(|| format!("failed to read folder: {}", folder.display()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| {
            p.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.ends_with(".xml.gz"))
        })
        .collect();
    files.sort();
    Ok(files)
}

/// At most `max` files from `folder`, in a deterministic pseudo-random
/// order (sorted by hash of the file name), so repeated analysis runs over
/// the same corpus sample the same files.
pub fn sample_xml_gz(folder: &Path, max: usize) -> Result<Vec<PathBuf>> {
    let mut files = list_xml_gz(folder)?;
    files.sort_by_key(|p| {
        let mut hasher = FxHasher::default();
        p.file_name().hash(&mut hasher);
        hasher.finish()
    });
    files.truncate(max);
    Ok(files)
}

/// Open a gzip-compressed XML file for buffered reading.
pub fn open_xml_gz(path: &Path) -> Result<BufReader<GzDecoder<File>>> {
    let file =
        File::open(path).with_context(|| format!("failed to open: {}", path.display()))?;
    Ok(BufReader::new(GzDecoder::new(file)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn touch(dir: &Path, name: &str) {
        File::create(dir.join(name)).unwrap();
    }

    #[test]
    fn list_filters_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "b.xml.gz");
        touch(dir.path(), "a.xml.gz");
        touch(dir.path(), "notes.txt");
        touch(dir.path(), "c.xml");

        let files = list_xml_gz(dir.path()).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["a.xml.gz", "b.xml.gz"]);
    }

    #[test]
    fn sample_is_deterministic_and_bounded() {
        let dir = tempfile::tempdir().unwrap();
        for i in 0..10 {
            touch(dir.path(), &format!("f{i:02}.xml.gz"));
        }
        let first = sample_xml_gz(dir.path(), 4).unwrap();
        let second = sample_xml_gz(dir.path(), 4).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.len(), 4);
    }

    #[test]
    fn open_round_trips_gzip() {
        use flate2::Compression;
        use flate2::write::GzEncoder;
        use std::io::Read;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.xml.gz");
        let mut enc = GzEncoder::new(File::create(&path).unwrap(), Compression::default());
        enc.write_all(b"<A>x</A>").unwrap();
        enc.finish().unwrap();

        let mut out = String::new();
        open_xml_gz(&path).unwrap().read_to_string(&mut out).unwrap();
        assert_eq!(out, "<A>x</A>");
    }
}
