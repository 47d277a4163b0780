//! File naming for downloaded papers and their sidecars.
//!
//! Paths derive deterministically from the paper title, so the existence of
//! the PDF on disk can double as an "already downloaded" marker.

use std::path::{Path, PathBuf};

/// Maximum number of characters kept from a sanitized title.
pub const MAX_TITLE_CHARS: usize = 150;

/// Suffix appended to the sanitized title for the metadata sidecar.
const SIDECAR_SUFFIX: &str = "_info.txt";

/// Reduces a title to a safe file stem.
///
/// Keeps alphanumerics, space, `.`, `_` and `-`, trims surrounding
/// whitespace and truncates to [`MAX_TITLE_CHARS`] characters.
#[must_use]
pub fn sanitize_title(title: &str) -> String {
    let kept: String = title
        .chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, ' ' | '.' | '_' | '-'))
        .collect();
    kept.trim().chars().take(MAX_TITLE_CHARS).collect()
}

/// File stem for a paper: the sanitized title, or the sanitized identifier
/// when nothing of the title survives.
#[must_use]
pub fn file_stem(title: &str, id: &str) -> String {
    let stem = sanitize_title(title);
    if !stem.is_empty() {
        return stem;
    }
    let fallback = sanitize_title(id);
    if fallback.is_empty() {
        "untitled".to_string()
    } else {
        fallback
    }
}

/// Destination of the PDF for the given file stem.
#[must_use]
pub fn pdf_path(base_dir: &Path, stem: &str) -> PathBuf {
    base_dir.join(format!("{stem}.pdf"))
}

/// Destination of the metadata sidecar for the given file stem.
#[must_use]
pub fn sidecar_path(base_dir: &Path, stem: &str) -> PathBuf {
    base_dir.join(format!("{stem}{SIDECAR_SUFFIX}"))
}
