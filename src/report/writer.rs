use log::{debug, info};
use std::fs;
use std::path::{Path, PathBuf};

use super::{GenerationReport, ReportError};

/// Writer for generation reports
pub struct ReportWriter {
    /// Report file, replaced on every write
    destination: PathBuf,
}

impl ReportWriter {
    pub fn new<P: AsRef<Path>>(destination: P) -> Self {
        ReportWriter {
            destination: destination.as_ref().to_path_buf(),
        }
    }

    /// Write `report` as pretty JSON, creating the parent directory if needed
    pub fn write_report(&self, report: &GenerationReport) -> Result<(), ReportError> {
        if let Some(parent) = self.destination.parent() {
            fs::create_dir_all(parent)?;
        }

        debug!("Writing report: {}", self.destination.display());
        fs::write(&self.destination, report.to_json()?)?;
        info!(
            "Wrote report for {} proto files to {}",
            report.files.len(),
            self.destination.display()
        );

        Ok(())
    }

    pub fn destination(&self) -> &Path {
        &self.destination
    }
}
