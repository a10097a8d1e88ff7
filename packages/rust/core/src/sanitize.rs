//! Sanitizer stage: normalize each registered document's preamble and
//! write cleaned titles back into the registry.

use std::path::PathBuf;
use std::time::Instant;

use tracing::{debug, info, instrument, warn};

use docvendor_markdown::{Sanitizer, clean_title};
use docvendor_shared::{DocVendorError, Registry, Result, SanitizeConfig};

use crate::pipeline::ProgressReporter;

/// Result of a sanitizer run.
#[derive(Debug)]
pub struct SanitizeResult {
    /// Registry file that was rewritten.
    pub registry: PathBuf,
    /// Number of registry entries.
    pub entries: usize,
    /// Documents rewritten.
    pub sanitized: usize,
    /// Ids whose document file does not exist.
    pub missing: Vec<String>,
    /// Total elapsed time.
    pub elapsed: std::time::Duration,
}

/// Run the sanitizer over every registry entry.
///
/// A missing registry aborts before any document is touched. A missing
/// document only skips its own entry.
#[instrument(skip_all, fields(registry = %config.registry.display()))]
pub fn sanitize_docs(
    config: &SanitizeConfig,
    progress: &dyn ProgressReporter,
) -> Result<SanitizeResult> {
    let start = Instant::now();

    progress.phase("Loading registry");
    let mut registry = Registry::load(&config.registry)?;
    let sanitizer = Sanitizer::new(&config.metadata_marker)?;

    info!(entries = registry.len(), "sanitizing registered documents");
    progress.phase("Sanitizing documents");

    let total = registry.len();
    let mut sanitized = 0;
    let mut missing = Vec::new();

    for (i, entry) in registry.entries.iter().enumerate() {
        let path = config
            .docs_dir
            .join(format!("{}.{}", entry.id, config.extension));
        progress.file_processed(&path.display().to_string(), i + 1, total);

        if !path.is_file() {
            warn!(id = %entry.id, path = %path.display(), "document not found, skipping entry");
            missing.push(entry.id.clone());
            continue;
        }

        let raw = std::fs::read_to_string(&path).map_err(|e| DocVendorError::io(&path, e))?;
        let cleaned = sanitizer.sanitize(&raw, &entry.title);
        std::fs::write(&path, cleaned).map_err(|e| DocVendorError::io(&path, e))?;

        debug!(id = %entry.id, "sanitized document");
        sanitized += 1;
    }

    for entry in &mut registry.entries {
        entry.title = clean_title(&entry.title);
    }
    registry.save(&config.registry)?;

    info!(
        sanitized,
        missing = missing.len(),
        "sanitizer complete"
    );

    Ok(SanitizeResult {
        registry: config.registry.clone(),
        entries: total,
        sanitized,
        missing,
        elapsed: start.elapsed(),
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;
    use crate::pipeline::SilentProgress;

    fn make_config(root: &Path) -> SanitizeConfig {
        SanitizeConfig {
            docs_dir: root.join("docs"),
            registry: root.join("docs/registry.json"),
            extension: "mdx".into(),
            metadata_marker: "---".into(),
        }
    }

    fn write_fixture(root: &Path) {
        let docs = root.join("docs");
        std::fs::create_dir_all(&docs).unwrap();
        std::fs::write(
            docs.join("registry.json"),
            r##"[
  {"id": "alphatex-bar-metadata", "title": "# Bar Metadata", "order": 2},
  {"id": "alphatex-missing", "title": "  # Missing  "},
  {"id": "alphatex-intro", "title": "Introduction"}
]"##,
        )
        .unwrap();
        std::fs::write(
            docs.join("alphatex-bar-metadata.mdx"),
            "---\ntitle: Bar Metadata\n---\n# # Bar Metadata\n\nBars carry metadata.\n",
        )
        .unwrap();
        std::fs::write(
            docs.join("alphatex-intro.mdx"),
            "# Intro\n\n\nWelcome to alphaTex.\n\n## Basics\n",
        )
        .unwrap();
    }

    #[test]
    fn normalizes_heading_and_metadata() {
        let tmp = tempfile::tempdir().unwrap();
        write_fixture(tmp.path());
        let config = make_config(tmp.path());

        sanitize_docs(&config, &SilentProgress).unwrap();

        let doc =
            std::fs::read_to_string(config.docs_dir.join("alphatex-bar-metadata.mdx")).unwrap();
        assert_eq!(doc, "# Bar Metadata\n\nBars carry metadata.\n");

        let intro = std::fs::read_to_string(config.docs_dir.join("alphatex-intro.mdx")).unwrap();
        assert_eq!(intro, "# Introduction\n\nWelcome to alphaTex.\n\n## Basics\n");
    }

    #[test]
    fn missing_document_is_isolated() {
        let tmp = tempfile::tempdir().unwrap();
        write_fixture(tmp.path());
        let config = make_config(tmp.path());

        let result = sanitize_docs(&config, &SilentProgress).unwrap();

        assert_eq!(result.entries, 3);
        assert_eq!(result.sanitized, 2);
        assert_eq!(result.missing, vec!["alphatex-missing".to_string()]);
        assert!(!config.docs_dir.join("alphatex-missing.mdx").exists());
    }

    #[test]
    fn registry_titles_are_cleaned_in_place() {
        let tmp = tempfile::tempdir().unwrap();
        write_fixture(tmp.path());
        let config = make_config(tmp.path());

        sanitize_docs(&config, &SilentProgress).unwrap();

        let registry = Registry::load(&config.registry).unwrap();
        let ids: Vec<_> = registry.entries.iter().map(|e| e.id.as_str()).collect();
        let titles: Vec<_> = registry.entries.iter().map(|e| e.title.as_str()).collect();
        assert_eq!(
            ids,
            ["alphatex-bar-metadata", "alphatex-missing", "alphatex-intro"]
        );
        assert_eq!(titles, ["Bar Metadata", "Missing", "Introduction"]);
        assert_eq!(registry.entries[0].extra["order"], 2);
    }

    #[test]
    fn missing_registry_aborts_before_touching_documents() {
        let tmp = tempfile::tempdir().unwrap();
        let config = make_config(tmp.path());
        std::fs::create_dir_all(&config.docs_dir).unwrap();
        let doc = config.docs_dir.join("alphatex-a.mdx");
        std::fs::write(&doc, "---\nx: 1\n---\n# A\n").unwrap();

        let err = sanitize_docs(&config, &SilentProgress).unwrap_err();

        assert!(matches!(err, DocVendorError::MissingRegistry { .. }));
        assert_eq!(std::fs::read_to_string(&doc).unwrap(), "---\nx: 1\n---\n# A\n");
    }

    #[test]
    fn rerun_is_stable() {
        let tmp = tempfile::tempdir().unwrap();
        write_fixture(tmp.path());
        let config = make_config(tmp.path());

        sanitize_docs(&config, &SilentProgress).unwrap();
        let first = std::fs::read_to_string(config.docs_dir.join("alphatex-intro.mdx")).unwrap();
        let first_registry = std::fs::read_to_string(&config.registry).unwrap();

        sanitize_docs(&config, &SilentProgress).unwrap();
        let second = std::fs::read_to_string(config.docs_dir.join("alphatex-intro.mdx")).unwrap();
        let second_registry = std::fs::read_to_string(&config.registry).unwrap();

        assert_eq!(first, second);
        assert_eq!(first_registry, second_registry);
    }
}
