//! Application configuration for docvendor.
//!
//! Project config lives at `./docvendor.toml`, with a user-level fallback at
//! `~/.docvendor/docvendor.toml`. CLI flags override config file values,
//! which override defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{DocVendorError, Result};

/// Default configuration file name.
pub const CONFIG_FILE_NAME: &str = "docvendor.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".docvendor";

// ---------------------------------------------------------------------------
// Config structs (matching docvendor.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Upstream checkout and vendor destination.
    #[serde(default)]
    pub vendor: VendorSection,

    /// Document corpus and registry.
    #[serde(default)]
    pub docs: DocsSection,

    /// Link rehydration targets.
    #[serde(default)]
    pub links: LinksSection,
}

/// `[vendor]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VendorSection {
    /// Local checkout of the upstream repository.
    #[serde(default = "default_source_root")]
    pub source_root: String,

    /// Document subtree inside `source_root` that gets vendored.
    #[serde(default = "default_source_subdir")]
    pub source_subdir: String,

    /// Destination vendor directory.
    #[serde(default = "default_dest")]
    pub dest: String,

    /// Public location of the upstream repository, recorded in the generated README.
    #[serde(default = "default_upstream_url")]
    pub upstream_url: String,

    /// License file name in the upstream root.
    #[serde(default = "default_license_file")]
    pub license_file: String,

    /// Readme file name in the upstream root.
    #[serde(default = "default_upstream_readme")]
    pub upstream_readme: String,

    /// Try `git pull --ff-only` in the source root before copying.
    #[serde(default = "default_true")]
    pub refresh: bool,

    /// Upper bound for the refresh, in seconds.
    #[serde(default = "default_refresh_timeout")]
    pub refresh_timeout_secs: u64,
}

impl Default for VendorSection {
    fn default() -> Self {
        Self {
            source_root: default_source_root(),
            source_subdir: default_source_subdir(),
            dest: default_dest(),
            upstream_url: default_upstream_url(),
            license_file: default_license_file(),
            upstream_readme: default_upstream_readme(),
            refresh: true,
            refresh_timeout_secs: default_refresh_timeout(),
        }
    }
}

fn default_source_root() -> String {
    "../alphaTabWebsite".into()
}
fn default_source_subdir() -> String {
    "docs/alphatex".into()
}
fn default_dest() -> String {
    "vendor/alphatab-docs".into()
}
fn default_upstream_url() -> String {
    "https://github.com/CoderLine/alphaTabWebsite".into()
}
fn default_license_file() -> String {
    "LICENSE".into()
}
fn default_upstream_readme() -> String {
    "README.md".into()
}
fn default_true() -> bool {
    true
}
fn default_refresh_timeout() -> u64 {
    60
}

/// `[docs]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocsSection {
    /// Directory holding the `<id>.<extension>` documents.
    #[serde(default = "default_docs_dir")]
    pub dir: String,

    /// JSON registry of `{id, title}` entries.
    #[serde(default = "default_registry")]
    pub registry: String,

    /// Document file extension, without the dot.
    #[serde(default = "default_extension")]
    pub extension: String,

    /// Marker line delimiting the leading metadata block.
    #[serde(default = "default_metadata_marker")]
    pub metadata_marker: String,
}

impl Default for DocsSection {
    fn default() -> Self {
        Self {
            dir: default_docs_dir(),
            registry: default_registry(),
            extension: default_extension(),
            metadata_marker: default_metadata_marker(),
        }
    }
}

fn default_docs_dir() -> String {
    "vendor/alphatab-docs/docs/alphatex".into()
}
fn default_registry() -> String {
    "vendor/alphatab-docs/registry.json".into()
}
fn default_extension() -> String {
    "mdx".into()
}
fn default_metadata_marker() -> String {
    "---".into()
}

/// `[links]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinksSection {
    /// Public documentation site origin.
    #[serde(default = "default_site_base")]
    pub site_base: String,

    /// Path segment under which the site serves documentation.
    #[serde(default = "default_docs_base")]
    pub docs_base: String,

    /// Folder that same-directory and bare references live in.
    #[serde(default = "default_subfolder")]
    pub subfolder: String,

    /// Only documents whose file name starts with this prefix are rehydrated.
    #[serde(default = "default_file_prefix")]
    pub file_prefix: String,

    /// Where the change record of the last rehydration is written.
    #[serde(default = "default_change_record")]
    pub change_record: String,
}

impl Default for LinksSection {
    fn default() -> Self {
        Self {
            site_base: default_site_base(),
            docs_base: default_docs_base(),
            subfolder: default_subfolder(),
            file_prefix: default_file_prefix(),
            change_record: default_change_record(),
        }
    }
}

fn default_site_base() -> String {
    "https://alphatab.net".into()
}
fn default_docs_base() -> String {
    "docs".into()
}
fn default_subfolder() -> String {
    "alphatex".into()
}
fn default_file_prefix() -> String {
    "alphatex-".into()
}
fn default_change_record() -> String {
    "vendor/alphatab-docs/rehydrate-report.json".into()
}

// ---------------------------------------------------------------------------
// Runtime configs (resolved against the project root)
// ---------------------------------------------------------------------------

/// Runtime configuration for the vendor sync stage.
#[derive(Debug, Clone)]
pub struct VendorConfig {
    /// Upstream checkout.
    pub source_root: PathBuf,
    /// Document subtree, relative to `source_root`.
    pub source_subdir: PathBuf,
    /// Vendor directory.
    pub dest: PathBuf,
    /// Upstream repository URL.
    pub upstream_url: String,
    /// License file name.
    pub license_file: String,
    /// Upstream readme file name.
    pub upstream_readme: String,
    /// Whether to attempt a refresh of the checkout.
    pub refresh: bool,
    /// Upper bound for the refresh.
    pub refresh_timeout: Duration,
}

/// Runtime configuration for the sanitizer stage.
#[derive(Debug, Clone)]
pub struct SanitizeConfig {
    /// Document directory.
    pub docs_dir: PathBuf,
    /// Registry file.
    pub registry: PathBuf,
    /// Document extension, without the dot.
    pub extension: String,
    /// Metadata block marker line.
    pub metadata_marker: String,
}

/// Runtime configuration for the link rehydrator stage.
#[derive(Debug, Clone)]
pub struct RehydrateConfig {
    /// Project root; change record paths are written relative to it.
    pub root: PathBuf,
    /// Document directory.
    pub docs_dir: PathBuf,
    /// File name prefix of rehydrated documents.
    pub file_prefix: String,
    /// Document extension, without the dot.
    pub extension: String,
    /// Public site origin.
    pub site_base: Url,
    /// Docs path segment.
    pub docs_base: String,
    /// Folder for same-directory and bare references.
    pub subfolder: String,
    /// Change record output.
    pub change_record: PathBuf,
}

impl AppConfig {
    /// Resolve the `[vendor]` section against `root`.
    pub fn vendor(&self, root: &Path) -> VendorConfig {
        let v = &self.vendor;
        VendorConfig {
            source_root: root.join(&v.source_root),
            source_subdir: PathBuf::from(&v.source_subdir),
            dest: root.join(&v.dest),
            upstream_url: v.upstream_url.clone(),
            license_file: v.license_file.clone(),
            upstream_readme: v.upstream_readme.clone(),
            refresh: v.refresh,
            refresh_timeout: Duration::from_secs(v.refresh_timeout_secs),
        }
    }

    /// Resolve the `[docs]` section against `root`.
    pub fn sanitize(&self, root: &Path) -> SanitizeConfig {
        SanitizeConfig {
            docs_dir: root.join(&self.docs.dir),
            registry: root.join(&self.docs.registry),
            extension: self.docs.extension.clone(),
            metadata_marker: self.docs.metadata_marker.clone(),
        }
    }

    /// Resolve the `[links]` section against `root`, validating the site URL.
    pub fn rehydrate(&self, root: &Path) -> Result<RehydrateConfig> {
        let site_base = Url::parse(&self.links.site_base).map_err(|e| {
            DocVendorError::config(format!(
                "links.site_base '{}' is not a valid URL: {e}",
                self.links.site_base
            ))
        })?;
        if site_base.cannot_be_a_base() {
            return Err(DocVendorError::config(format!(
                "links.site_base '{}' cannot be used as a base URL",
                self.links.site_base
            )));
        }

        Ok(RehydrateConfig {
            root: root.to_path_buf(),
            docs_dir: root.join(&self.docs.dir),
            file_prefix: self.links.file_prefix.clone(),
            extension: self.docs.extension.clone(),
            site_base,
            docs_base: self.links.docs_base.clone(),
            subfolder: self.links.subfolder.clone(),
            change_record: root.join(&self.links.change_record),
        })
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the user config directory (`~/.docvendor/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| DocVendorError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Pick the config file to load.
///
/// An explicit path always wins (even if missing, so the error is reported).
/// Otherwise `<root>/docvendor.toml`, then `~/.docvendor/docvendor.toml`.
pub fn resolve_config_path(explicit: Option<&Path>, root: &Path) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }

    let project = root.join(CONFIG_FILE_NAME);
    if project.is_file() {
        return Some(project);
    }

    config_dir()
        .ok()
        .map(|dir| dir.join(CONFIG_FILE_NAME))
        .filter(|p| p.is_file())
}

/// Load the application config. Returns defaults if no config file is found.
pub fn load_config(explicit: Option<&Path>, root: &Path) -> Result<AppConfig> {
    match resolve_config_path(explicit, root) {
        Some(path) => load_config_from(&path),
        None => {
            tracing::debug!(root = %root.display(), "no config file found, using defaults");
            Ok(AppConfig::default())
        }
    }
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| DocVendorError::io(path, e))?;

    toml::from_str(&content).map_err(|e| {
        DocVendorError::config(format!("failed to parse {}: {e}", path.display()))
    })
}

/// Write a default config file into `root`. Refuses to overwrite an existing one.
/// Returns the path to the created file.
pub fn init_config(root: &Path) -> Result<PathBuf> {
    let path = root.join(CONFIG_FILE_NAME);
    if path.exists() {
        return Err(DocVendorError::config(format!(
            "{} already exists",
            path.display()
        )));
    }

    let content = toml::to_string_pretty(&AppConfig::default())
        .map_err(|e| DocVendorError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| DocVendorError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}
