//! Converter for a fixed list of Word-exported pages.
//!
//! Each listed file is read strictly as Windows-1252, its charset labels are
//! rewritten to utf-8, and the text is saved back as UTF-8. Newlines are kept
//! exactly as they were.

use crate::config::FixedListConfig;
use crate::core::meta_charset;
use crate::error::ConvertError;
use crate::utils::encoding::{self, Codec};
use crate::utils::file_helper;
use std::path::PathBuf;
use tracing::{info, warn};

/// Files converted and skipped in one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FixedListReport {
    pub converted: Vec<PathBuf>,
    pub skipped: Vec<PathBuf>,
}

pub struct FixedListConverter {
    directory: PathBuf,
    files: Vec<String>,
}

impl FixedListConverter {
    pub fn new(config: &FixedListConfig) -> Self {
        Self {
            directory: PathBuf::from(&config.directory),
            files: config.files.clone(),
        }
    }

    /// Convert every listed file that exists. Stops at the first decode or I/O error.
    pub fn run(&self) -> Result<FixedListReport, ConvertError> {
        let mut report = FixedListReport::default();

        for name in &self.files {
            let path = self.directory.join(name);

            if !file_helper::file_exists(&path) {
                warn!("SKIP: {} not found", path.display());
                report.skipped.push(path);
                continue;
            }

            info!("Converting {}...", path.display());

            let text = encoding::read_file_strict(&path, Codec::Windows1252)?;
            let text = meta_charset::rewrite_legacy_charset(&text);
            encoding::write_utf8(&path, &text)?;

            info!("Converted {} to UTF-8", path.display());
            report.converted.push(path);
        }

        Ok(report)
    }
}
