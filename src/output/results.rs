use crate::api::SpiderResponse;
use crate::output::OutputResult;
use chrono::{DateTime, Local};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Timestamped file names for one job's output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPaths {
    pub results: PathBuf,
    pub sitemap: PathBuf,
}

impl OutputPaths {
    /// `spider_results_<ts>.json` and `sitemap_<ts>.txt` inside `dir`
    pub fn new(dir: &Path, at: DateTime<Local>) -> Self {
        let stamp = at.format("%Y%m%d_%H%M%S");
        Self {
            results: dir.join(format!("spider_results_{}.json", stamp)),
            sitemap: dir.join(format!("sitemap_{}.txt", stamp)),
        }
    }
}

/// Writes the response body as pretty-printed JSON
///
/// Parent directories are created as needed.
///
/// # Arguments
///
/// * `response` - The job summary
/// * `path` - Destination file
pub fn write_results_json(response: &SpiderResponse, path: &Path) -> OutputResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, response)?;
    writer.write_all(b"\n")?;
    writer.flush()?;

    tracing::info!("Results written to {}", path.display());
    Ok(())
}
