//! Preamble normalization for vendored documents.
//!
//! Each pass is a function `&str -> String` applied once, in sequence. Every
//! removal touches the first match only; later occurrences are body content.

use std::sync::LazyLock;

use regex::Regex;

use docvendor_shared::{DocVendorError, Result};

/// Rewrites a document so it starts with a single heading taken from the registry.
#[derive(Debug, Clone)]
pub struct Sanitizer {
    metadata_block: Regex,
}

impl Sanitizer {
    /// Build a sanitizer whose metadata block is delimited by `marker` lines.
    pub fn new(marker: &str) -> Result<Self> {
        let marker = marker.trim();
        if marker.is_empty() {
            return Err(DocVendorError::config("docs.metadata_marker must not be empty"));
        }

        let m = regex::escape(marker);
        let pattern = format!(r"(?m)\A{m}[ \t]*\r?\n(?s:.*?)^{m}[ \t]*(?:\r?\n|\z)");
        let metadata_block = Regex::new(&pattern).map_err(|e| {
            DocVendorError::config(format!("invalid metadata marker '{marker}': {e}"))
        })?;

        Ok(Self { metadata_block })
    }

    /// Run every pass over `raw`, using `title` from the registry for the new heading.
    pub fn sanitize(&self, raw: &str, title: &str) -> String {
        let mut result = self.strip_metadata_block(raw);

        result = collapse_doubled_heading(&result);
        result = remove_first_heading(&result);

        render_document(&clean_title(title), &result)
    }

    /// Pass 1: drop the metadata block when it opens the file.
    fn strip_metadata_block(&self, md: &str) -> String {
        self.metadata_block.replacen(md, 1, "").into_owned()
    }
}

// ---------------------------------------------------------------------------
// Pass 2: Collapse `# # Title`
// ---------------------------------------------------------------------------

fn collapse_doubled_heading(md: &str) -> String {
    static DOUBLED_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"(?m)^#[ \t]+#[ \t]+").expect("valid regex"));

    DOUBLED_RE.replacen(md, 1, "# ").into_owned()
}

// ---------------------------------------------------------------------------
// Pass 3: Remove the first H1 and the blank lines under it
// ---------------------------------------------------------------------------

fn remove_first_heading(md: &str) -> String {
    static H1_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"(?m)^#[ \t]+[^\r\n]*(?:\r?\n)?(?:[ \t]*\r?\n)*").expect("valid regex")
    });

    H1_RE.replacen(md, 1, "").into_owned()
}

// ---------------------------------------------------------------------------
// Titles and final layout
// ---------------------------------------------------------------------------

/// Strip leading `#` markers and surrounding whitespace from a registry title.
pub fn clean_title(title: &str) -> String {
    title.trim().trim_start_matches('#').trim().to_string()
}

/// `# <title>`, a blank line, the trimmed body, and exactly one trailing newline.
fn render_document(title: &str, body: &str) -> String {
    let body = body.trim();
    if body.is_empty() {
        format!("# {title}\n")
    } else {
        format!("# {title}\n\n{body}\n")
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn sanitizer() -> Sanitizer {
        Sanitizer::new("---").unwrap()
    }

    #[test]
    fn strips_leading_metadata_block() {
        let input = "---\ntitle: Bars\nsidebar_position: 2\n---\n# Bars\n\nBody";
        assert_eq!(sanitizer().strip_metadata_block(input), "# Bars\n\nBody");
    }

    #[test]
    fn strips_empty_metadata_block() {
        let input = "---\n---\nBody";
        assert_eq!(sanitizer().strip_metadata_block(input), "Body");
    }

    #[test]
    fn metadata_block_must_open_the_file() {
        let input = "Intro\n\n---\nkey: value\n---\n";
        assert_eq!(sanitizer().strip_metadata_block(input), input);
    }

    #[test]
    fn only_first_metadata_block_is_removed() {
        let input = "---\na: 1\n---\nText\n\n---\nb: 2\n---\n";
        assert_eq!(
            sanitizer().strip_metadata_block(input),
            "Text\n\n---\nb: 2\n---\n"
        );
    }

    #[test]
    fn custom_marker() {
        let s = Sanitizer::new("+++").unwrap();
        assert_eq!(s.strip_metadata_block("+++\nx = 1\n+++\nBody"), "Body");
        assert!(Sanitizer::new("  ").is_err());
    }

    #[test]
    fn collapses_first_doubled_heading_only() {
        let input = "# # Title\n\n# # Other";
        assert_eq!(collapse_doubled_heading(input), "# Title\n\n# # Other");
    }

    #[test]
    fn removes_first_h1_and_following_blanks() {
        let input = "# Title\n\n\nFirst paragraph\n\n# Second";
        assert_eq!(remove_first_heading(input), "First paragraph\n\n# Second");
    }

    #[test]
    fn remove_first_heading_ignores_subheadings() {
        let input = "Intro\n\n## Sub\n\n# Late\n\nText";
        assert_eq!(remove_first_heading(input), "Intro\n\n## Sub\n\nText");
    }

    #[test]
    fn clean_title_strips_hashes() {
        assert_eq!(clean_title("# Bar Metadata "), "Bar Metadata");
        assert_eq!(clean_title("  ##  Notes"), "Notes");
        assert_eq!(clean_title("Plain"), "Plain");
    }

    #[test]
    fn render_with_empty_body() {
        assert_eq!(render_document("Title", "\n\n"), "# Title\n");
    }

    #[test]
    fn full_sanitize_normalizes_preamble() {
        let input = "---\ntitle: x\n---\n# # Bar Metadata\n\n\nBars carry **metadata**.\n\n## Syntax\n\n";
        let result = sanitizer().sanitize(input, "# Bar Metadata");
        assert_eq!(
            result,
            "# Bar Metadata\n\nBars carry **metadata**.\n\n## Syntax\n"
        );
    }

    #[test]
    fn sanitize_is_idempotent() {
        let input = "---\nid: a\n---\n# Old Title\n\nBody text\n";
        let once = sanitizer().sanitize(input, "New Title");
        let twice = sanitizer().sanitize(&once, "New Title");
        assert_eq!(once, "# New Title\n\nBody text\n");
        assert_eq!(once, twice);
    }

    #[test]
    fn sanitize_without_heading_prepends_one() {
        let result = sanitizer().sanitize("Just text.", "Intro");
        assert_eq!(result, "# Intro\n\nJust text.\n");
    }
}
