use std::path::PathBuf;

use harvest_logging::{harvest_info, harvest_warn};

use crate::persist::AtomicFileWriter;
use crate::Driver;

/// Best-effort markup and screenshot dumps for offline inspection.
///
/// Capturing never fails the caller; problems are only logged.
#[derive(Debug, Clone)]
pub struct Diagnostics {
    dir: Option<PathBuf>,
}

impl Diagnostics {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir: Some(dir) }
    }

    pub fn disabled() -> Self {
        Self { dir: None }
    }

    /// Write `{label}.html` and `{label}.png`; returns the files that were written.
    pub async fn capture(&self, driver: &dyn Driver, label: &str) -> Vec<PathBuf> {
        let Some(dir) = &self.dir else {
            return Vec::new();
        };
        let mut written = Vec::new();

        match driver.content().await {
            Ok(html) => {
                let writer = AtomicFileWriter::new(dir.clone());
                match writer.write(&format!("{label}.html"), html) {
                    Ok(path) => written.push(path),
                    Err(err) => harvest_warn!("Failed to write {} markup dump: {}", label, err),
                }
            }
            Err(err) => harvest_warn!("Failed to read page markup for {}: {}", label, err),
        }

        let image = dir.join(format!("{label}.png"));
        match driver.screenshot(&image).await {
            Ok(()) => written.push(image),
            Err(err) => harvest_warn!("Failed to capture {} screenshot: {}", label, err),
        }

        if !written.is_empty() {
            harvest_info!("Diagnostics for {} written to {:?}", label, dir);
        }
        written
    }
}
