//! Plain-text metadata sidecars written next to downloaded papers.
//!
//! Each sidecar holds the title, identifier and abstract of the paper plus
//! two search links into Chinese tech-news sites, so coverage of the paper
//! can be looked up later. The links are built from fixed templates and
//! never fetched.

use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, instrument};

use crate::search::CandidateItem;

/// Label and search template for the Synced (机器之心) site search.
const JIQIZHIXIN_LABEL: &str = "机器之心";
const JIQIZHIXIN_SEARCH: &str = "https://www.jiqizhixin.com/search?q=";

/// Label and search template for the 新智元 WeChat account via Sogou.
const XINZHIYUAN_LABEL: &str = "新智元";
const SOGOU_WEIXIN_SEARCH: &str = "https://weixin.sogou.com/weixin?type=2&query=";

/// Errors produced by sidecar generation.
#[derive(Debug, Error)]
pub enum SidecarError {
    /// I/O error writing the sidecar file to disk.
    #[error("I/O error writing sidecar {path}: {source}")]
    Io {
        /// Sidecar path.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },
}

/// A labeled external search link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchLink {
    /// Site label shown in the sidecar.
    pub label: &'static str,
    /// Full search URL.
    pub url: String,
}

/// Builds the two external search links for a paper title.
#[must_use]
pub fn blog_search_links(title: &str) -> [SearchLink; 2] {
    let xinzhiyuan_query = format!("{XINZHIYUAN_LABEL} {title}");
    [
        SearchLink {
            label: JIQIZHIXIN_LABEL,
            url: format!("{JIQIZHIXIN_SEARCH}{}", urlencoding::encode(title)),
        },
        SearchLink {
            label: XINZHIYUAN_LABEL,
            url: format!(
                "{SOGOU_WEIXIN_SEARCH}{}",
                urlencoding::encode(&xinzhiyuan_query)
            ),
        },
    ]
}

/// Renders the sidecar text for `item`.
#[must_use]
pub fn render_info(item: &CandidateItem) -> String {
    let mut text = format!(
        "Title: {}\nID: {}\nSummary:\n{}\n\n",
        item.title, item.id, item.summary
    );
    let links = blog_search_links(&item.title);
    let rendered: Vec<String> = links
        .iter()
        .map(|link| format!("{}: {}", link.label, link.url))
        .collect();
    text.push_str(&rendered.join("\n"));
    text
}

/// Writes the sidecar for `item` to `path`, replacing any previous one.
///
/// Returns the path written. A partially written file is removed before an
/// error is returned.
///
/// # Errors
///
/// Returns [`SidecarError`] when the file cannot be created or written.
#[instrument(skip(item), fields(id = %item.id, path = %path.display()))]
pub fn write_info_sidecar(path: &Path, item: &CandidateItem) -> Result<PathBuf, SidecarError> {
    let io_error = |source| SidecarError::Io {
        path: path.to_path_buf(),
        source,
    };

    let file = fs::File::create(path).map_err(io_error)?;
    let write_result = {
        let mut writer = BufWriter::new(file);
        writer
            .write_all(render_info(item).as_bytes())
            .and_then(|()| writer.flush())
    };
    if let Err(err) = write_result {
        // Best-effort cleanup so a truncated sidecar is not left behind.
        let _ = fs::remove_file(path);
        return Err(io_error(err));
    }

    debug!("sidecar written");
    Ok(path.to_path_buf())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    fn item() -> CandidateItem {
        CandidateItem {
            id: "2401.00001v1".to_string(),
            title: "Humanoid Control with Transformers".to_string(),
            published_year: 2024,
            summary: "We study humanoid robots.".to_string(),
            locator: "http://arxiv.org/abs/2401.00001v1".to_string(),
        }
    }

    #[test]
    fn test_blog_search_links_interpolate_title() {
        let [first, second] = blog_search_links("Embodied AI");
        assert_eq!(first.label, "机器之心");
        assert_eq!(first.url, "https://www.jiqizhixin.com/search?q=Embodied%20AI");
        assert_eq!(second.label, "新智元");
        assert!(second.url.starts_with("https://weixin.sogou.com/weixin?type=2&query="));
        assert!(second.url.ends_with("%20Embodied%20AI"), "got {}", second.url);
    }

    #[test]
    fn test_blog_search_links_escape_query_separators() {
        let [first, _] = blog_search_links("A&B?C");
        assert_eq!(first.url, "https://www.jiqizhixin.com/search?q=A%26B%3FC");
    }

    #[test]
    fn test_render_info_layout() {
        let text = render_info(&item());
        let expected_prefix = "Title: Humanoid Control with Transformers\n\
                               ID: 2401.00001v1\n\
                               Summary:\n\
                               We study humanoid robots.\n\n";
        assert!(text.starts_with(expected_prefix), "got:\n{text}");
        for link in blog_search_links(&item().title) {
            assert!(text.contains(&format!("{}: {}", link.label, link.url)));
        }
    }

    #[test]
    fn test_write_info_sidecar_creates_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("Humanoid_info.txt");

        let written = write_info_sidecar(&path, &item()).unwrap();

        assert_eq!(written, path);
        assert_eq!(fs::read_to_string(&path).unwrap(), render_info(&item()));
    }

    #[test]
    fn test_write_info_sidecar_into_missing_directory_fails() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("missing").join("x_info.txt");

        let err = write_info_sidecar(&path, &item()).unwrap_err();

        assert!(matches!(err, SidecarError::Io { .. }));
        assert!(!path.exists());
    }
}
