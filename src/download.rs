use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use std::fs::File;
use std::path::Path;
use tracing::warn;
use zip::ZipArchive;

use crate::dataset::Subset;

pub(crate) fn progress_bar(total: Option<u64>) -> ProgressBar {
    match total {
        Some(len) => {
            let pb = ProgressBar::new(len);
            pb.set_style(
                ProgressStyle::with_template(
                    "{spinner:.green} {bytes}/{total_bytes} ({bytes_per_sec}) {wide_bar} {eta}",
                )
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=>-"),
            );
            pb
        }
        None => {
            let pb = ProgressBar::new_spinner();
            pb.set_style(
                ProgressStyle::with_template("{spinner:.green} {bytes} ({bytes_per_sec})")
                    .unwrap_or_else(|_| ProgressStyle::default_spinner()),
            );
            pb
        }
    }
}

/// True when `location` already holds at least one subset directory.
pub(crate) fn has_existing_download(location: &Path) -> bool {
    Subset::ALL
        .iter()
        .any(|s| location.join(s.dir_name()).is_dir())
}

/// Unpacks `archive` under `destination` and returns the number of files written.
///
/// Entries whose names would land outside `destination` are skipped.
pub(crate) fn extract_zip(archive: &Path, destination: &Path) -> Result<usize> {
    let file =
        File::open(archive).with_context(|| format!("failed to open {}", archive.display()))?;
    let mut zip = ZipArchive::new(file)
        .with_context(|| format!("{} is not a valid zip archive", archive.display()))?;

    let mut written = 0usize;
    for i in 0..zip.len() {
        let mut entry = zip.by_index(i)?;
        let outpath = match entry.enclosed_name() {
            Some(path) => destination.join(path),
            None => {
                warn!(name = entry.name(), "skipping archive entry outside the target directory");
                continue;
            }
        };

        if entry.is_dir() {
            std::fs::create_dir_all(&outpath)
                .with_context(|| format!("failed to create directory {}", outpath.display()))?;
            continue;
        }

        if let Some(parent) = outpath.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create directory {}", parent.display()))?;
        }
        let mut out = File::create(&outpath)
            .with_context(|| format!("failed to create {}", outpath.display()))?;
        std::io::copy(&mut entry, &mut out)
            .with_context(|| format!("failed to extract {}", outpath.display()))?;
        written += 1;
    }

    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;
    use zip::write::SimpleFileOptions;

    fn write_zip(path: &Path, entries: &[(&str, &[u8])]) {
        let file = File::create(path).unwrap();
        let mut zip = zip::ZipWriter::new(file);
        for (name, body) in entries {
            zip.start_file(*name, SimpleFileOptions::default()).unwrap();
            zip.write_all(body).unwrap();
        }
        zip.finish().unwrap();
    }

    #[test]
    fn extracts_nested_subsets() {
        let dir = TempDir::new().unwrap();
        let archive = dir.path().join("ds.zip");
        write_zip(
            &archive,
            &[
                ("train/_annotations.coco.json", b"{}"),
                ("train/img1.jpg", b"jpg"),
                ("valid/_annotations.coco.json", b"{}"),
                ("README.roboflow.txt", b"hi"),
            ],
        );

        let out = dir.path().join("out");
        let n = extract_zip(&archive, &out).unwrap();
        assert_eq!(n, 4);
        assert_eq!(
            std::fs::read(out.join("train/img1.jpg")).unwrap(),
            b"jpg".to_vec()
        );
        assert!(out.join("valid/_annotations.coco.json").is_file());
    }

    #[test]
    fn skips_entries_escaping_the_destination() {
        let dir = TempDir::new().unwrap();
        let archive = dir.path().join("evil.zip");
        write_zip(&archive, &[("../escape.txt", b"x"), ("ok.txt", b"y")]);

        let out = dir.path().join("out");
        let n = extract_zip(&archive, &out).unwrap();
        assert_eq!(n, 1);
        assert!(out.join("ok.txt").is_file());
        assert!(!dir.path().join("escape.txt").exists());
    }

    #[test]
    fn rejects_non_zip_payload() {
        let dir = TempDir::new().unwrap();
        let archive = dir.path().join("bad.zip");
        std::fs::write(&archive, b"<html>error</html>").unwrap();
        let err = extract_zip(&archive, dir.path()).unwrap_err();
        assert!(err.to_string().contains("not a valid zip archive"));
    }

    #[test]
    fn existing_download_needs_a_subset() {
        let dir = TempDir::new().unwrap();
        assert!(!has_existing_download(&dir.path().join("missing")));
        assert!(!has_existing_download(dir.path()));

        // Leftovers of an aborted run are not a dataset.
        std::fs::write(dir.path().join("roboflow.zip"), b"<html>").unwrap();
        std::fs::write(dir.path().join("train"), b"not a dir").unwrap();
        assert!(!has_existing_download(dir.path()));

        std::fs::create_dir(dir.path().join("valid")).unwrap();
        assert!(has_existing_download(dir.path()));
    }
}
