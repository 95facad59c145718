//! Recursive converter for a directory of HTML files.
//!
//! Every candidate file is copied into a mirrored backup tree before it is
//! decoded with the fallback chain, given a canonical charset meta tag and
//! rewritten as UTF-8.

use crate::config::TreeConfig;
use crate::core::meta_charset::{self, MetaStrategy};
use crate::error::ConvertError;
use crate::utils::encoding::{self, Codec, DecodeChain};
use crate::utils::file_helper;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// What happened to one converted file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileOutcome {
    pub path: PathBuf,
    pub codec: Codec,
    pub strategy: MetaStrategy,
}

/// Summary of a tree run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TreeReport {
    pub processed: usize,
    pub outcomes: Vec<FileOutcome>,
    /// Symlinked candidates, left untouched because links are not followed.
    pub skipped_links: Vec<PathBuf>,
}

pub struct TreeConverter {
    root: PathBuf,
    backup_root: PathBuf,
    extensions: Vec<String>,
    chain: DecodeChain,
}

impl TreeConverter {
    pub fn new(config: &TreeConfig) -> Result<Self, ConvertError> {
        let root = PathBuf::from(&config.root);
        let chain = DecodeChain::from_labels(&config.decode_chain)?;
        debug!(
            "Decode chain: {}",
            chain
                .codecs()
                .iter()
                .map(|c| c.name())
                .collect::<Vec<_>>()
                .join(" -> ")
        );

        Ok(Self {
            backup_root: root.join(&config.backup_dir_name),
            root,
            extensions: config.extensions.clone(),
            chain,
        })
    }

    pub fn backup_root(&self) -> &Path {
        &self.backup_root
    }

    /// True for files whose extension is in the configured list.
    pub fn is_candidate(&self, path: &Path) -> bool {
        file_helper::has_extension(path, &self.extensions)
    }

    /// Location of the backup copy of `path`, mirroring its path relative to the root.
    pub fn backup_path(&self, path: &Path) -> Result<PathBuf, ConvertError> {
        path.strip_prefix(&self.root)
            .map(|relative| self.backup_root.join(relative))
            .map_err(|_| ConvertError::OutsideRoot {
                path: path.to_path_buf(),
                root: self.root.clone(),
            })
    }

    /// Back up `path`, then rewrite it in place as UTF-8 with a canonical charset tag.
    ///
    /// An existing backup is left alone so it always holds the pre-conversion bytes.
    pub fn backup_then_convert(&self, path: &Path) -> Result<FileOutcome, ConvertError> {
        let backup = self.backup_path(path)?;
        if file_helper::file_exists(&backup) {
            info!(
                "Keeping existing backup {} (not refreshed)",
                backup.display()
            );
        } else {
            file_helper::copy_preserving_times(path, &backup)
                .map_err(|e| ConvertError::io(&backup, e))?;
        }

        let decoded = encoding::read_file_with_fallback(path, &self.chain)?;
        let outcome = meta_charset::normalize_charset_meta(&decoded.text);
        encoding::write_utf8(path, &outcome.html)?;

        Ok(FileOutcome {
            path: path.to_path_buf(),
            codec: decoded.codec,
            strategy: outcome.strategy,
        })
    }

    /// Walk the root and convert every candidate file, in file name order.
    ///
    /// A missing root aborts before anything is written. Any other error
    /// aborts the walk at the file where it happened.
    pub fn run(&self) -> Result<TreeReport, ConvertError> {
        if !file_helper::directory_exists(&self.root) {
            return Err(ConvertError::MissingRoot(self.root.clone()));
        }

        info!("Converting HTML files under {}", self.root.display());
        info!("Originals are backed up to {}", self.backup_root().display());

        let mut report = TreeReport::default();
        let walker = WalkDir::new(&self.root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| entry.path() != self.backup_root);

        for entry in walker {
            let entry = entry.map_err(|e| {
                let path = e.path().map(Path::to_path_buf).unwrap_or_else(|| self.root.clone());
                ConvertError::io(path, e.into())
            })?;

            if !self.is_candidate(entry.path()) {
                continue;
            }
            if entry.path_is_symlink() {
                warn!("SKIP: {} is a symbolic link", entry.path().display());
                report.skipped_links.push(entry.path().to_path_buf());
                continue;
            }
            if !entry.file_type().is_file() {
                continue;
            }

            info!("Processing {}", entry.path().display());
            let outcome = self.backup_then_convert(entry.path())?;
            debug!(
                "{}: decoded as {}, {}",
                outcome.path.display(),
                outcome.codec.name(),
                outcome.strategy
            );

            report.processed += 1;
            report.outcomes.push(outcome);
        }

        info!(
            "Done. {} file(s) processed, {} link(s) skipped",
            report.processed,
            report.skipped_links.len()
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;
    use std::time::{Duration, SystemTime};

    fn config_for(root: &Path) -> TreeConfig {
        TreeConfig {
            root: root.to_string_lossy().into_owned(),
            ..TreeConfig::default()
        }
    }

    fn snapshot(root: &Path) -> Vec<(PathBuf, Vec<u8>)> {
        WalkDir::new(root)
            .sort_by_file_name()
            .into_iter()
            .map(|e| e.unwrap())
            .filter(|e| e.file_type().is_file())
            .map(|e| (e.path().to_path_buf(), fs::read(e.path()).unwrap()))
            .collect()
    }

    #[test]
    fn test_windows_1252_page_is_converted_and_backed_up() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("page.htm");
        let mut original = b"<head><meta charset=\"windows-1252\"></head><p>caf".to_vec();
        original.extend_from_slice(&[0xE9, 0x20, 0x96, 0x20, 0x80]);
        original.extend_from_slice(b"</p>");
        fs::write(&path, &original).unwrap();

        let converter = TreeConverter::new(&config_for(dir.path())).unwrap();
        let report = converter.run().unwrap();

        assert_eq!(report.processed, 1);
        assert_eq!(report.outcomes[0].codec, Codec::Windows1252);
        assert_eq!(report.outcomes[0].strategy, MetaStrategy::ReplacedMetaCharset);

        let converted = String::from_utf8(fs::read(&path).unwrap()).unwrap();
        assert_eq!(
            converted,
            "<head>\n  <meta charset=\"UTF-8\"></head><p>café – €</p>"
        );

        let backup = converter.backup_path(&path).unwrap();
        assert_eq!(backup, dir.path().join("_backup_before_utf8").join("page.htm"));
        assert_eq!(fs::read(&backup).unwrap(), original);
    }

    #[test]
    fn test_page_without_head_gets_no_meta() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fragment.html");
        fs::write(&path, [b'<', b'p', b'>', 0xFC, b'<', b'/', b'p', b'>']).unwrap();

        let report = TreeConverter::new(&config_for(dir.path())).unwrap().run().unwrap();
        assert_eq!(report.outcomes[0].strategy, MetaStrategy::NoHead);
        assert_eq!(fs::read_to_string(&path).unwrap(), "<p>ü</p>");
    }

    #[test]
    fn test_only_html_files_are_processed() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("sub")).unwrap();
        fs::write(root.join("a.htm"), b"<head></head>").unwrap();
        fs::write(root.join("B.HTML"), b"<head></head>").unwrap();
        fs::write(root.join("sub").join("c.html"), b"<p>x</p>").unwrap();
        fs::write(root.join("notes.txt"), [0xE9, b'\r', b'\n']).unwrap();
        fs::write(root.join("sub").join("readme.txt"), b"<head></head>").unwrap();

        let converter = TreeConverter::new(&config_for(root)).unwrap();
        let report = converter.run().unwrap();

        assert_eq!(report.processed, 3);
        assert_eq!(fs::read(root.join("notes.txt")).unwrap(), vec![0xE9, b'\r', b'\n']);
        assert_eq!(fs::read(root.join("sub").join("readme.txt")).unwrap(), b"<head></head>");
        assert!(converter.backup_root().join("sub").join("c.html").is_file());
        assert!(!converter.backup_root().join("notes.txt").exists());
    }

    #[test]
    fn test_second_run_is_byte_identical() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::write(
            root.join("a.htm"),
            b"<html>\r\n<head>\r\n<meta http-equiv=\"Content-Type\" content=\"text/html; charset=windows-1252\">\r\n</head>\r\n<body>\x93hi\x94</body></html>",
        )
        .unwrap();
        fs::write(root.join("b.html"), b"<html><head><title>t</title></head></html>").unwrap();
        fs::write(root.join("c.htm"), b"<p>\xE9</p>").unwrap();

        let converter = TreeConverter::new(&config_for(root)).unwrap();
        converter.run().unwrap();
        let first = snapshot(root);

        let report = converter.run().unwrap();
        assert_eq!(report.processed, 3);
        assert!(report.outcomes.iter().all(|o| o.codec == Codec::Utf8));
        assert_eq!(snapshot(root), first);
    }

    #[test]
    fn test_existing_backup_is_not_overwritten() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.htm");
        fs::write(&path, b"<head></head>\xE9").unwrap();

        let converter = TreeConverter::new(&config_for(dir.path())).unwrap();
        converter.run().unwrap();
        converter.run().unwrap();

        let backup = converter.backup_path(&path).unwrap();
        assert_eq!(fs::read(&backup).unwrap(), b"<head></head>\xE9");
    }

    #[test]
    fn test_edited_original_keeps_first_backup() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.htm");
        fs::write(&path, b"<p>\xE9</p>").unwrap();

        let converter = TreeConverter::new(&config_for(dir.path())).unwrap();
        converter.run().unwrap();

        fs::write(&path, "<p>edited</p>").unwrap();
        let report = converter.run().unwrap();
        assert_eq!(report.processed, 1);

        let backup = converter.backup_path(&path).unwrap();
        assert_eq!(fs::read(&backup).unwrap(), b"<p>\xE9</p>");
        assert_eq!(fs::read_to_string(&path).unwrap(), "<p>edited</p>");
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinked_page_is_reported_and_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let outside = tempfile::tempdir().unwrap();
        let target = outside.path().join("target.htm");
        fs::write(&target, b"<head></head>\xE9").unwrap();

        let root = dir.path();
        fs::write(root.join("a.htm"), b"<head></head>").unwrap();
        std::os::unix::fs::symlink(&target, root.join("link.htm")).unwrap();

        let converter = TreeConverter::new(&config_for(root)).unwrap();
        let report = converter.run().unwrap();

        assert_eq!(report.processed, 1);
        assert_eq!(report.skipped_links, vec![root.join("link.htm")]);
        assert_eq!(fs::read(&target).unwrap(), b"<head></head>\xE9");
        assert!(!converter.backup_root().join("link.htm").exists());
    }

    #[test]
    fn test_backup_keeps_modified_time() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.htm");
        fs::write(&path, b"<head></head>").unwrap();

        let stamp = SystemTime::UNIX_EPOCH + Duration::from_secs(1_234_567_890);
        fs::File::options()
            .write(true)
            .open(&path)
            .unwrap()
            .set_modified(stamp)
            .unwrap();

        let converter = TreeConverter::new(&config_for(dir.path())).unwrap();
        converter.run().unwrap();

        let backup = converter.backup_path(&path).unwrap();
        assert_eq!(fs::metadata(&backup).unwrap().modified().unwrap(), stamp);
    }

    #[test]
    fn test_missing_root_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("missing");

        let converter = TreeConverter::new(&config_for(&root)).unwrap();
        let err = converter.run().unwrap_err();

        assert!(matches!(err, ConvertError::MissingRoot(ref p) if *p == root));
        assert!(!root.exists());
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_custom_decode_chain() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.htm");
        fs::write(&path, b"<p>\x80</p>").unwrap();

        let config = TreeConfig {
            decode_chain: vec!["UTF-8".to_string()],
            ..config_for(dir.path())
        };
        let report = TreeConverter::new(&config).unwrap().run().unwrap();

        // Latin-1 is appended as the last resort
        assert_eq!(report.outcomes[0].codec, Codec::Latin1);
        assert_eq!(fs::read_to_string(&path).unwrap(), "<p>\u{80}</p>");
    }

    #[test]
    fn test_path_outside_root() {
        let dir = tempfile::tempdir().unwrap();
        let converter = TreeConverter::new(&config_for(&dir.path().join("root"))).unwrap();
        let err = converter.backup_path(&dir.path().join("other.htm")).unwrap_err();
        assert!(matches!(err, ConvertError::OutsideRoot { .. }));
    }
}
