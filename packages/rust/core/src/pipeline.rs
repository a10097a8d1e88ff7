//! Progress reporting and the end-to-end pipeline: vendor → sanitize → rehydrate.

use std::time::Instant;

use tracing::{info, instrument};

use docvendor_shared::{RehydrateConfig, Result, SanitizeConfig, VendorConfig};

use crate::rehydrate::{self, RehydrateResult};
use crate::sanitize::{self, SanitizeResult};
use crate::vendor::{self, VendorResult};

/// Progress callback for reporting stage status.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called after each file a stage handles.
    fn file_processed(&self, path: &str, current: usize, total: usize);
    /// Called when the command completes.
    fn done(&self);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn file_processed(&self, _path: &str, _current: usize, _total: usize) {}
    fn done(&self) {}
}

/// Configuration for [`run_all`]: one runtime config per stage.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub vendor: VendorConfig,
    pub sanitize: SanitizeConfig,
    pub rehydrate: RehydrateConfig,
}

/// Results of every stage of a full pipeline run.
#[derive(Debug)]
pub struct PipelineResult {
    pub vendor: VendorResult,
    pub sanitize: SanitizeResult,
    pub rehydrate: RehydrateResult,
    /// Total elapsed time.
    pub elapsed: std::time::Duration,
}

/// Run the three stages in order, stopping at the first fatal error.
#[instrument(skip_all)]
pub async fn run_all(
    config: &PipelineConfig,
    progress: &dyn ProgressReporter,
) -> Result<PipelineResult> {
    let start = Instant::now();

    info!("stage 1/3: vendor sync");
    let vendor = vendor::vendor_sync(&config.vendor, progress).await?;

    info!("stage 2/3: sanitize");
    let sanitize = sanitize::sanitize_docs(&config.sanitize, progress)?;

    info!("stage 3/3: rehydrate");
    let rehydrate = rehydrate::rehydrate_docs(&config.rehydrate, progress)?;

    Ok(PipelineResult {
        vendor,
        sanitize,
        rehydrate,
        elapsed: start.elapsed(),
    })
}

#[cfg(test)]
mod tests {
    use std::path::{Path, PathBuf};
    use std::time::Duration;

    use url::Url;

    use super::*;

    /// Upstream tree vendored straight into the documents directory.
    fn make_config(root: &Path) -> PipelineConfig {
        PipelineConfig {
            vendor: VendorConfig {
                source_root: root.join("upstream"),
                source_subdir: PathBuf::from("alphatex"),
                dest: root.join("content"),
                upstream_url: "https://github.com/CoderLine/alphaTabWebsite".into(),
                license_file: "LICENSE".into(),
                upstream_readme: "README.md".into(),
                refresh: false,
                refresh_timeout: Duration::from_secs(5),
            },
            sanitize: SanitizeConfig {
                docs_dir: root.join("content/alphatex"),
                registry: root.join("registry.json"),
                extension: "mdx".into(),
                metadata_marker: "---".into(),
            },
            rehydrate: RehydrateConfig {
                root: root.to_path_buf(),
                docs_dir: root.join("content/alphatex"),
                file_prefix: "alphatex-".into(),
                extension: "mdx".into(),
                site_base: Url::parse("https://alphatab.net").unwrap(),
                docs_base: "docs".into(),
                subfolder: "alphatex".into(),
                change_record: root.join("rehydrate-report.json"),
            },
        }
    }

    #[tokio::test]
    async fn full_pipeline_is_repeatable() {
        let tmp = tempfile::tempdir().unwrap();
        let config = make_config(tmp.path());

        let upstream = tmp.path().join("upstream/alphatex");
        std::fs::create_dir_all(&upstream).unwrap();
        std::fs::write(
            upstream.join("alphatex-bars.mdx"),
            "---\nsidebar_position: 1\n---\n# # Bars\n\nSee [metadata](./_bar-metadata.mdx#top).\n",
        )
        .unwrap();
        std::fs::write(
            tmp.path().join("registry.json"),
            r##"[{"id": "alphatex-bars", "title": "# Bars"}]"##,
        )
        .unwrap();

        let first = run_all(&config, &SilentProgress).await.unwrap();
        assert_eq!(first.vendor.files_copied, 1);
        assert_eq!(first.sanitize.sanitized, 1);
        assert_eq!(first.rehydrate.record.modified.len(), 1);

        let doc = std::fs::read_to_string(tmp.path().join("content/alphatex/alphatex-bars.mdx"))
            .unwrap();
        assert_eq!(
            doc,
            "# Bars\n\nSee [metadata](https://alphatab.net/docs/alphatex/bar-metadata#top).\n"
        );

        // Stage 3 alone is a fixed point.
        let again = rehydrate::rehydrate_docs(&config.rehydrate, &SilentProgress).unwrap();
        assert!(again.record.modified.is_empty());
    }
}
