//! Normalization of paper locators into direct PDF URLs.

use url::Url;

use super::DownloadError;
use super::constants::PDF_SUFFIX;

/// Path segment of an arXiv abstract page.
const ABSTRACT_SEGMENT: &str = "abs";

/// Path segment of an arXiv document.
const DOCUMENT_SEGMENT: &str = "pdf";

/// Rewrites a paper locator into the URL of its PDF document.
///
/// - `https://arxiv.org/abs/2401.00001v1` → `https://arxiv.org/pdf/2401.00001v1.pdf`
/// - `https://arxiv.org/pdf/2401.00001v1` → `https://arxiv.org/pdf/2401.00001v1.pdf`
/// - `https://arxiv.org/pdf/2401.00001v1.pdf` is returned unchanged
///
/// # Errors
///
/// Returns [`DownloadError::InvalidUrl`] when the locator is not an absolute URL.
pub fn normalize_locator(locator: &str) -> Result<String, DownloadError> {
    let trimmed = locator.trim();
    let mut url = Url::parse(trimmed).map_err(|_| DownloadError::invalid_url(trimmed))?;
    if url.cannot_be_a_base() {
        return Err(DownloadError::invalid_url(trimmed));
    }

    let segments: Vec<String> = url
        .path_segments()
        .map(|segments| segments.map(str::to_string).collect())
        .unwrap_or_default();

    let mut rewritten: Vec<String> = segments
        .into_iter()
        .map(|segment| {
            if segment == ABSTRACT_SEGMENT {
                DOCUMENT_SEGMENT.to_string()
            } else {
                segment
            }
        })
        .collect();

    // A trailing slash leaves an empty final segment.
    while rewritten.len() > 1 && rewritten.last().is_some_and(String::is_empty) {
        rewritten.pop();
    }

    if let Some(last) = rewritten.last_mut()
        && !last.is_empty()
        && !last.to_ascii_lowercase().ends_with(PDF_SUFFIX)
    {
        last.push_str(PDF_SUFFIX);
    }

    url.set_path(&format!("/{}", rewritten.join("/")));
    Ok(url.to_string())
}
