//! Shared types, error model, and configuration for docvendor.
//!
//! This crate is the foundation depended on by all other docvendor crates.
//! It provides:
//! - The unified error type ([`DocVendorError`])
//! - Domain types ([`Registry`], [`RegistryEntry`], [`ChangeRecord`])
//! - Configuration ([`AppConfig`], the per-stage runtime configs, config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, DocsSection, LinksSection, RehydrateConfig, SanitizeConfig, VendorConfig,
    VendorSection, config_dir, init_config, load_config, load_config_from, resolve_config_path,
};
pub use error::{DocVendorError, Result};
pub use types::{ChangeRecord, Registry, RegistryEntry};
