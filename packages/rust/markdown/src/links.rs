//! Link rehydration: rewrite internal cross-references into absolute site URLs.
//!
//! Targets are pulled from markdown links (`[label](target)`) and HTML
//! attributes (`href="target"` / `href='target'`), classified into a
//! [`LinkTarget`], and rewritten by one rule per variant. Absolute URLs are
//! never touched, so rewritten output is a fixed point.

use std::sync::LazyLock;

use regex::{Captures, Regex};
use tracing::trace;
use url::Url;

/// Extensions stripped from document references, longest first.
const DOC_EXTENSIONS: [&str; 2] = [".mdx", ".md"];

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

/// The shape of a raw link target.
///
/// `suffix` is the fragment/query tail starting at the first `#` or `?`,
/// kept verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkTarget<'a> {
    /// `http://…` or `https://…`.
    Absolute(&'a str),
    /// `/reference/score.md`
    SiteRooted { path: &'a str, suffix: &'a str },
    /// `./_bar-metadata.mdx#anchor`
    SameDirectory { file: &'a str, suffix: &'a str },
    /// `../reference/score.mdx`
    ParentRelative { file: &'a str, suffix: &'a str },
    /// `bar-metadata`
    Bare { file: &'a str, suffix: &'a str },
    /// Anything else: in-page anchors, other schemes, protocol-relative URLs.
    Other(&'a str),
}

impl<'a> LinkTarget<'a> {
    /// Classify `raw`. The checks run in priority order; the first match wins.
    pub fn classify(raw: &'a str) -> Self {
        if is_web_url(raw) {
            return Self::Absolute(raw);
        }

        if raw.starts_with("//") {
            return Self::Other(raw);
        }

        if raw.starts_with('/') {
            let (path, suffix) = split_suffix(raw);
            return Self::SiteRooted { path, suffix };
        }

        if let Some(rest) = raw.strip_prefix("./") {
            let (file, suffix) = split_suffix(rest);
            if file.is_empty() {
                return Self::Other(raw);
            }
            return Self::SameDirectory { file, suffix };
        }

        if raw.starts_with("../") {
            let mut rest = raw;
            while let Some(stripped) = rest.strip_prefix("../") {
                rest = stripped;
            }
            let (file, suffix) = split_suffix(rest);
            if file.is_empty() {
                return Self::Other(raw);
            }
            return Self::ParentRelative { file, suffix };
        }

        if raw.starts_with(['.', '#', '?', '<']) || has_scheme(raw) {
            return Self::Other(raw);
        }

        let (file, suffix) = split_suffix(raw);
        if file.is_empty() {
            return Self::Other(raw);
        }
        Self::Bare { file, suffix }
    }
}

fn is_web_url(raw: &str) -> bool {
    let starts_with = |prefix: &str| {
        raw.get(..prefix.len())
            .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
    };
    starts_with("http://") || starts_with("https://")
}

/// `mailto:`, `tel:`, `data:` and friends: a scheme before any `/`, `#` or `?`.
fn has_scheme(raw: &str) -> bool {
    let Some(colon) = raw.find(':') else {
        return false;
    };
    let scheme = &raw[..colon];
    let mut chars = scheme.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

/// Split at the first `#` or `?`.
fn split_suffix(s: &str) -> (&str, &str) {
    match s.find(['#', '?']) {
        Some(i) => s.split_at(i),
        None => (s, ""),
    }
}

fn strip_doc_extension(file: &str) -> &str {
    DOC_EXTENSIONS
        .iter()
        .find_map(|ext| file.strip_suffix(ext))
        .unwrap_or(file)
}

/// Drop one leading `_` from the last path segment (partials are served without it).
fn strip_leading_underscore(file: &str) -> String {
    let (dir, name) = match file.rfind('/') {
        Some(i) => file.split_at(i + 1),
        None => ("", file),
    };
    let name = name.strip_prefix('_').unwrap_or(name);
    format!("{dir}{name}")
}

// ---------------------------------------------------------------------------
// Rewriting
// ---------------------------------------------------------------------------

/// Result of rewriting one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewriteOutcome {
    /// The rewritten text.
    pub text: String,
    /// Number of link targets whose value changed.
    pub rewritten: usize,
}

/// Builds canonical site URLs from link targets.
#[derive(Debug, Clone)]
pub struct LinkRewriter {
    site_base: String,
    docs_base: String,
    subfolder: String,
}

impl LinkRewriter {
    pub fn new(site_base: &Url, docs_base: &str, subfolder: &str) -> Self {
        Self {
            site_base: site_base.as_str().trim_end_matches('/').to_string(),
            docs_base: docs_base.trim_matches('/').to_string(),
            subfolder: subfolder.trim_matches('/').to_string(),
        }
    }

    /// Rewrite a single raw target.
    pub fn rewrite_target(&self, raw: &str) -> String {
        match LinkTarget::classify(raw) {
            LinkTarget::Absolute(t) | LinkTarget::Other(t) => t.to_string(),
            LinkTarget::SiteRooted { path, suffix } => {
                let url = self.url(&[
                    self.docs_base.as_str(),
                    strip_doc_extension(path.trim_start_matches('/')),
                ]);
                format!("{url}{suffix}")
            }
            LinkTarget::SameDirectory { file, suffix } | LinkTarget::Bare { file, suffix } => {
                let file = strip_leading_underscore(file);
                let url = self.url(&[
                    self.docs_base.as_str(),
                    self.subfolder.as_str(),
                    strip_doc_extension(&file),
                ]);
                format!("{url}{suffix}")
            }
            LinkTarget::ParentRelative { file, suffix } => {
                let url = self.url(&[self.docs_base.as_str(), strip_doc_extension(file)]);
                format!("{url}{suffix}")
            }
        }
    }

    /// Run the markdown pass, then the HTML pass, over a whole document.
    pub fn rewrite_links(&self, text: &str) -> RewriteOutcome {
        static MD_LINK_RE: LazyLock<Regex> = LazyLock::new(|| {
            // `](target)` or `](target "title")`; target ends at whitespace or `)`
            Regex::new(r"\]\(([^)\s]+)([^)]*)\)").expect("valid regex")
        });
        static HREF_RE: LazyLock<Regex> = LazyLock::new(|| {
            Regex::new(r#"((?i:href)\s*=\s*)(?:"([^"]*)"|'([^']*)')"#).expect("valid regex")
        });

        let mut rewritten = 0;

        let text = MD_LINK_RE.replace_all(text, |caps: &Captures| {
            let target = &caps[1];
            let new = self.rewrite_target(target);
            if new != target {
                trace!(from = target, to = %new, "rewrote markdown link");
                rewritten += 1;
            }
            format!("]({new}{})", &caps[2])
        });

        let text = HREF_RE.replace_all(&text, |caps: &Captures| {
            let attr = &caps[1];
            let (target, quote) = match (caps.get(2), caps.get(3)) {
                (Some(m), _) => (m.as_str(), '"'),
                (None, Some(m)) => (m.as_str(), '\''),
                (None, None) => return caps[0].to_string(),
            };
            let new = self.rewrite_target(target);
            if new != target {
                trace!(from = target, to = %new, "rewrote href");
                rewritten += 1;
            }
            format!("{attr}{quote}{new}{quote}")
        });

        RewriteOutcome {
            text: text.into_owned(),
            rewritten,
        }
    }

    fn url(&self, segments: &[&str]) -> String {
        let mut url = self.site_base.clone();
        for segment in segments.iter().filter(|s| !s.is_empty()) {
            url.push('/');
            url.push_str(segment);
        }
        url
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
