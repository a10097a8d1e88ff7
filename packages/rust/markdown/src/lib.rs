//! Text passes over vendored documents.
//!
//! - [`Sanitizer`] normalizes a document's metadata block and title heading.
//! - [`LinkRewriter`] turns internal cross-references into absolute site URLs.
//!
//! Everything here is a pure `&str -> String` transformation; reading and
//! writing files is the job of `docvendor-core`.

pub mod links;
pub mod sanitize;

pub use links::{LinkRewriter, LinkTarget, RewriteOutcome};
pub use sanitize::{Sanitizer, clean_title};
