//! Link rehydrator stage: rewrite cross-references in the vendored documents
//! and record which files changed.

use std::path::{Path, PathBuf};
use std::time::Instant;

use tracing::{debug, info, instrument};

use docvendor_markdown::LinkRewriter;
use docvendor_shared::{ChangeRecord, DocVendorError, RehydrateConfig, Result};

use crate::pipeline::ProgressReporter;

/// Result of a rehydrator run.
#[derive(Debug)]
pub struct RehydrateResult {
    /// Documents that matched the prefix/extension filter.
    pub scanned: usize,
    /// Link targets whose value changed, across all documents.
    pub links_rewritten: usize,
    /// The change record written for this run.
    pub record: ChangeRecord,
    /// Where the change record was written.
    pub record_path: PathBuf,
    /// Total elapsed time.
    pub elapsed: std::time::Duration,
}

/// Rewrite every internal link in the candidate documents.
///
/// Files are written only when their text changes, and the change record is
/// regenerated from scratch, so a second run reports nothing modified.
#[instrument(skip_all, fields(docs_dir = %config.docs_dir.display()))]
pub fn rehydrate_docs(
    config: &RehydrateConfig,
    progress: &dyn ProgressReporter,
) -> Result<RehydrateResult> {
    let start = Instant::now();
    let rewriter = LinkRewriter::new(&config.site_base, &config.docs_base, &config.subfolder);

    progress.phase("Scanning documents");
    let candidates = candidate_files(config)?;
    info!(count = candidates.len(), "rehydrating links");

    progress.phase("Rewriting links");
    let total = candidates.len();
    let mut modified = Vec::new();
    let mut links_rewritten = 0;

    for (i, path) in candidates.iter().enumerate() {
        let rel_path = record_path(&config.root, path);
        progress.file_processed(&rel_path, i + 1, total);

        let raw = std::fs::read_to_string(path).map_err(|e| DocVendorError::io(path, e))?;
        let outcome = rewriter.rewrite_links(&raw);
        links_rewritten += outcome.rewritten;

        if outcome.text != raw {
            std::fs::write(path, &outcome.text).map_err(|e| DocVendorError::io(path, e))?;
            debug!(path = %rel_path, links = outcome.rewritten, "rewrote document");
            modified.push(rel_path);
        }
    }

    let record = ChangeRecord::now(modified);
    record.save(&config.change_record)?;

    info!(
        scanned = total,
        modified = record.modified.len(),
        links_rewritten,
        "rehydration complete"
    );

    Ok(RehydrateResult {
        scanned: total,
        links_rewritten,
        record,
        record_path: config.change_record.clone(),
        elapsed: start.elapsed(),
    })
}

/// Files directly inside `docs_dir` named `<prefix>*.<extension>`, sorted.
fn candidate_files(config: &RehydrateConfig) -> Result<Vec<PathBuf>> {
    let dir = &config.docs_dir;
    let suffix = format!(".{}", config.extension);

    let entries = std::fs::read_dir(dir).map_err(|e| DocVendorError::io(dir, e))?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| DocVendorError::io(dir, e))?;
        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            continue;
        };
        if !name.starts_with(&config.file_prefix) || !name.ends_with(&suffix) {
            continue;
        }

        let path = entry.path();
        if path.is_file() {
            files.push(path);
        }
    }

    files.sort();
    Ok(files)
}

/// `path` relative to `root`, with forward slashes.
fn record_path(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .to_string_lossy()
        .replace('\\', "/")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
