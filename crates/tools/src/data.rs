use std::path::Path;

use anyhow::{Context, Result};
use hollow_core::content::ContentCatalog;
use hollow_core::tuning::Tuning;
use tracing::info;

/// Loads external catalog and tuning files, falling back to the built-ins.
pub fn load_data(
    content: Option<&Path>,
    tuning: Option<&Path>,
) -> Result<(ContentCatalog, Tuning)> {
    let catalog = match content {
        Some(path) => ContentCatalog::load_over_default(path)
            .with_context(|| format!("failed to load content from {}", path.display()))?,
        None => ContentCatalog::build_default(),
    };
    let tuning = match tuning {
        Some(path) => Tuning::load(path)
            .with_context(|| format!("failed to load tuning from {}", path.display()))?,
        None => Tuning::default(),
    };
    info!(content_hash = catalog.content_hash(), "data loaded");
    Ok((catalog, tuning))
}
