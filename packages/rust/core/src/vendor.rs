//! Vendor sync stage: mirror an upstream document tree into the vendor
//! directory, with its license and readme, and regenerate a provenance README.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, Instant};

use tokio::process::Command;
use tracing::{debug, info, instrument, warn};
use walkdir::WalkDir;

use docvendor_shared::{DocVendorError, Result, VendorConfig};

use crate::pipeline::ProgressReporter;

/// Name the upstream readme is stored under, next to the generated `README.md`.
pub const UPSTREAM_README_NAME: &str = "UPSTREAM_README.md";

/// Name of the generated provenance readme.
pub const LOCAL_README_NAME: &str = "README.md";

/// Result of a vendor sync run.
#[derive(Debug)]
pub struct VendorResult {
    /// Vendor directory.
    pub dest: PathBuf,
    /// Whether the upstream checkout was refreshed.
    pub refreshed: bool,
    /// Upstream commit the copy was taken from, when known.
    pub revision: Option<String>,
    /// Number of document files copied.
    pub files_copied: usize,
    /// Provenance files copied from the upstream root (license, readme).
    pub provenance: Vec<String>,
    /// Total elapsed time.
    pub elapsed: std::time::Duration,
}

/// Mirror the upstream document subtree into the vendor directory.
///
/// 1. Best-effort refresh of the upstream checkout
/// 2. Fail if the source document directory is missing
/// 3. Copy the subtree, overwriting existing files
/// 4. Copy license and upstream readme if present
/// 5. Regenerate the local README
#[instrument(skip_all, fields(source = %config.source_root.display(), dest = %config.dest.display()))]
pub async fn vendor_sync(
    config: &VendorConfig,
    progress: &dyn ProgressReporter,
) -> Result<VendorResult> {
    let start = Instant::now();

    let refreshed = if config.refresh {
        progress.phase("Refreshing upstream checkout");
        refresh_source(&config.source_root, config.refresh_timeout).await
    } else {
        debug!("refresh disabled");
        false
    };

    let source_docs = config.source_root.join(&config.source_subdir);
    if !source_docs.is_dir() {
        return Err(DocVendorError::MissingSource { path: source_docs });
    }

    progress.phase("Copying documents");
    let target_docs = config.dest.join(&config.source_subdir);
    let files_copied = copy_tree(&source_docs, &target_docs, progress)?;

    let provenance = copy_provenance(config)?;
    let revision = current_revision(&config.source_root, config.refresh_timeout).await;
    write_readme(config, revision.as_deref(), &provenance)?;

    info!(
        files_copied,
        refreshed,
        revision = revision.as_deref().unwrap_or("unknown"),
        "vendor sync complete"
    );

    Ok(VendorResult {
        dest: config.dest.clone(),
        refreshed,
        revision,
        files_copied,
        provenance,
        elapsed: start.elapsed(),
    })
}

// ---------------------------------------------------------------------------
// Upstream refresh
// ---------------------------------------------------------------------------

/// `git pull --ff-only` in `root`. Never fails: any problem is logged and
/// the local checkout is used as-is.
async fn refresh_source(root: &Path, timeout: Duration) -> bool {
    match run_git(root, &["pull", "--ff-only"], timeout).await {
        Ok(_) => {
            info!(path = %root.display(), "refreshed upstream checkout");
            true
        }
        Err(reason) => {
            warn!(path = %root.display(), %reason, "upstream refresh failed, using local copy");
            false
        }
    }
}

/// `git rev-parse HEAD` in `root`, if it is a git checkout.
async fn current_revision(root: &Path, timeout: Duration) -> Option<String> {
    match run_git(root, &["rev-parse", "HEAD"], timeout).await {
        Ok(stdout) => Some(stdout.trim().to_string()).filter(|rev| !rev.is_empty()),
        Err(reason) => {
            debug!(%reason, "could not read upstream revision");
            None
        }
    }
}

/// Run git in `root`, returning stdout, or a description of what went wrong.
async fn run_git(
    root: &Path,
    args: &[&str],
    timeout: Duration,
) -> std::result::Result<String, String> {
    let mut command = Command::new("git");
    command
        .arg("-C")
        .arg(root)
        .args(args)
        .stdin(Stdio::null())
        .kill_on_drop(true);

    let output = match tokio::time::timeout(timeout, command.output()).await {
        Ok(Ok(output)) => output,
        Ok(Err(e)) => return Err(format!("failed to run git: {e}")),
        Err(_) => return Err(format!("git {} timed out after {timeout:?}", args.join(" "))),
    };

    if !output.status.success() {
        let code = output
            .status
            .code()
            .map_or_else(|| "signal".to_string(), |value| value.to_string());
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(format!("git exited with {code}: {}", stderr.trim()));
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

// ---------------------------------------------------------------------------
// Copying
// ---------------------------------------------------------------------------

/// Recursively copy `src` into `dest`, overwriting files. Returns the file count.
fn copy_tree(src: &Path, dest: &Path, progress: &dyn ProgressReporter) -> Result<usize> {
    let entries = WalkDir::new(src)
        .sort_by_file_name()
        .into_iter()
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| {
            let path = e.path().unwrap_or(src).to_path_buf();
            DocVendorError::io(path, e.into())
        })?;

    let total = entries.iter().filter(|e| !e.file_type().is_dir()).count();
    let mut copied = 0;

    for entry in &entries {
        let Ok(rel) = entry.path().strip_prefix(src) else {
            continue;
        };
        let target = dest.join(rel);

        if entry.file_type().is_dir() {
            std::fs::create_dir_all(&target).map_err(|e| DocVendorError::io(&target, e))?;
            continue;
        }

        if !entry.path().is_file() {
            debug!(path = %entry.path().display(), "skipping non-file entry");
            continue;
        }

        force_copy(entry.path(), &target)?;
        copied += 1;
        progress.file_processed(&rel.display().to_string(), copied, total);
    }

    debug!(copied, dest = %dest.display(), "copied document tree");
    Ok(copied)
}

/// Copy a file, replacing a read-only destination if needed.
fn force_copy(src: &Path, dest: &Path) -> Result<()> {
    if let Some(parent) = dest.parent() {
        std::fs::create_dir_all(parent).map_err(|e| DocVendorError::io(parent, e))?;
    }

    match std::fs::copy(src, dest) {
        Ok(_) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied && dest.exists() => {
            std::fs::remove_file(dest).map_err(|e| DocVendorError::io(dest, e))?;
            std::fs::copy(src, dest).map_err(|e| DocVendorError::io(dest, e))?;
            Ok(())
        }
        Err(e) => Err(DocVendorError::io(dest, e)),
    }
}

/// Copy the license and upstream readme when they exist. Absence is not an error.
fn copy_provenance(config: &VendorConfig) -> Result<Vec<String>> {
    let files = [
        (config.license_file.as_str(), config.license_file.as_str()),
        (config.upstream_readme.as_str(), UPSTREAM_README_NAME),
    ];

    let mut copied = Vec::new();
    for (from, to) in files {
        let src = config.source_root.join(from);
        if !src.is_file() {
            continue;
        }
        force_copy(&src, &config.dest.join(to))?;
        copied.push(to.to_string());
    }

    Ok(copied)
}

/// Overwrite the vendor directory's README with provenance details.
fn write_readme(
    config: &VendorConfig,
    revision: Option<&str>,
    provenance: &[String],
) -> Result<()> {
    let subdir = config.source_subdir.to_string_lossy().replace('\\', "/");

    let mut readme = String::new();
    readme.push_str("# Vendored documentation\n\n");
    readme.push_str(&format!(
        "This directory is a verbatim copy of `{subdir}` from {}.\n\n",
        config.upstream_url
    ));
    readme.push_str(&format!("- Upstream: {}\n", config.upstream_url));
    readme.push_str(&format!("- Source path: `{subdir}`\n"));
    if let Some(rev) = revision {
        readme.push_str(&format!("- Revision: `{rev}`\n"));
    }
    for name in provenance {
        readme.push_str(&format!("- Copied from upstream: `{name}`\n"));
    }
    readme.push_str(
        "\nDo not edit these files by hand. They are regenerated by `docvendor vendor`.\n",
    );

    std::fs::create_dir_all(&config.dest).map_err(|e| DocVendorError::io(&config.dest, e))?;
    let path = config.dest.join(LOCAL_README_NAME);
    std::fs::write(&path, readme).map_err(|e| DocVendorError::io(&path, e))?;
    debug!(path = %path.display(), "wrote provenance README");
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::SilentProgress;

    fn make_config(root: &Path) -> VendorConfig {
        VendorConfig {
            source_root: root.join("upstream"),
            source_subdir: PathBuf::from("docs/alphatex"),
            dest: root.join("vendor"),
            upstream_url: "https://github.com/CoderLine/alphaTabWebsite".into(),
            license_file: "LICENSE".into(),
            upstream_readme: "README.md".into(),
            refresh: false,
            refresh_timeout: Duration::from_secs(5),
        }
    }

    fn write_upstream(config: &VendorConfig) {
        let docs = config.source_root.join(&config.source_subdir);
        std::fs::create_dir_all(docs.join("nested")).unwrap();
        std::fs::write(docs.join("alphatex-bars.mdx"), "# Bars\n").unwrap();
        std::fs::write(docs.join("nested/_partial.mdx"), "partial\n").unwrap();
        std::fs::write(config.source_root.join("LICENSE"), "MPL-2.0\n").unwrap();
        std::fs::write(config.source_root.join("README.md"), "# alphaTab website\n").unwrap();
    }

    #[tokio::test]
    async fn mirrors_tree_and_provenance() {
        let tmp = tempfile::tempdir().unwrap();
        let config = make_config(tmp.path());
        write_upstream(&config);

        let result = vendor_sync(&config, &SilentProgress).await.unwrap();

        assert_eq!(result.files_copied, 2);
        assert!(!result.refreshed);
        assert_eq!(result.provenance, vec!["LICENSE", UPSTREAM_README_NAME]);

        let vendored = config.dest.join("docs/alphatex");
        assert_eq!(
            std::fs::read_to_string(vendored.join("alphatex-bars.mdx")).unwrap(),
            "# Bars\n"
        );
        assert!(vendored.join("nested/_partial.mdx").exists());
        assert_eq!(
            std::fs::read_to_string(config.dest.join("LICENSE")).unwrap(),
            "MPL-2.0\n"
        );
        assert_eq!(
            std::fs::read_to_string(config.dest.join(UPSTREAM_README_NAME)).unwrap(),
            "# alphaTab website\n"
        );

        let readme = std::fs::read_to_string(config.dest.join(LOCAL_README_NAME)).unwrap();
        assert!(readme.contains("https://github.com/CoderLine/alphaTabWebsite"));
        assert!(readme.contains("`docs/alphatex`"));
        assert!(readme.contains("docvendor vendor"));
    }

    #[tokio::test]
    async fn overwrites_existing_files() {
        let tmp = tempfile::tempdir().unwrap();
        let config = make_config(tmp.path());
        write_upstream(&config);

        let stale = config.dest.join("docs/alphatex/alphatex-bars.mdx");
        std::fs::create_dir_all(stale.parent().unwrap()).unwrap();
        std::fs::write(&stale, "locally edited\n").unwrap();
        std::fs::write(config.dest.join(LOCAL_README_NAME), "old readme\n").unwrap();

        vendor_sync(&config, &SilentProgress).await.unwrap();
        vendor_sync(&config, &SilentProgress).await.unwrap();

        assert_eq!(std::fs::read_to_string(&stale).unwrap(), "# Bars\n");
        let readme = std::fs::read_to_string(config.dest.join(LOCAL_README_NAME)).unwrap();
        assert!(!readme.contains("old readme"));
        assert_eq!(readme.matches("# Vendored documentation").count(), 1);
    }

    #[tokio::test]
    async fn missing_provenance_files_are_skipped() {
        let tmp = tempfile::tempdir().unwrap();
        let config = make_config(tmp.path());
        write_upstream(&config);
        std::fs::remove_file(config.source_root.join("LICENSE")).unwrap();
        std::fs::remove_file(config.source_root.join("README.md")).unwrap();

        let result = vendor_sync(&config, &SilentProgress).await.unwrap();

        assert!(result.provenance.is_empty());
        assert!(!config.dest.join("LICENSE").exists());
        assert!(config.dest.join(LOCAL_README_NAME).exists());
    }

    #[tokio::test]
    async fn missing_source_is_fatal() {
        let tmp = tempfile::tempdir().unwrap();
        let config = make_config(tmp.path());

        let err = vendor_sync(&config, &SilentProgress).await.unwrap_err();

        assert!(matches!(err, DocVendorError::MissingSource { .. }));
        assert!(!config.dest.exists());
    }

    #[tokio::test]
    async fn failed_refresh_is_not_fatal() {
        let tmp = tempfile::tempdir().unwrap();
        let mut config = make_config(tmp.path());
        config.refresh = true;
        write_upstream(&config);

        // The upstream directory is not a git checkout, so the pull fails.
        let result = vendor_sync(&config, &SilentProgress).await.unwrap();

        assert!(!result.refreshed);
        assert_eq!(result.files_copied, 2);
    }
}
