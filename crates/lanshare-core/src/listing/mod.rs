//! Directory listing pages.
//!
//! A listing is a single HTML form: one checkbox and link per entry, plus
//! `Download` and `Delete` submit buttons. Submitting the form re-requests
//! the same directory with the selection in the query string.

pub mod entry;

pub use entry::DirectoryEntry;

use crate::Result;
use crate::ShareError;
use crate::encoding;
use crate::query::Action;
use log::debug;
use std::fs;
use std::path::Path;

/// `Content-Type` of every listing page.
pub const CONTENT_TYPE: &str = "text/html; charset=utf-8";

/// A rendered listing page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingPage {
    body: Vec<u8>,
}

impl ListingPage {
    /// Page bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.body
    }

    /// Exact byte length, for `Content-Length`.
    #[must_use]
    pub fn len(&self) -> usize {
        self.body.len()
    }

    /// Always `false`; a page has at least its skeleton.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }

    /// Consumes the page and returns its bytes.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.body
    }
}

/// Reads the immediate children of `dir` in listing order.
///
/// # Errors
///
/// Returns `ShareError::NotFound` if the directory cannot be read, including
/// when it disappears or becomes unreadable while being enumerated.
pub fn read_entries(dir: &Path) -> Result<Vec<DirectoryEntry>> {
    let not_found = |err: std::io::Error| {
        debug!("cannot list {}: {err}", dir.display());
        ShareError::NotFound {
            path: dir.to_path_buf(),
        }
    };

    let mut entries = Vec::new();
    for item in fs::read_dir(dir).map_err(not_found)? {
        let item = item.map_err(not_found)?;
        entries.push(DirectoryEntry::from_dir_entry(&item));
    }

    sort_entries(&mut entries);
    Ok(entries)
}

/// Sorts entries case-insensitively, ascending.
pub fn sort_entries(entries: &mut [DirectoryEntry]) {
    entries.sort_by(DirectoryEntry::listing_cmp);
}

/// Lists `dir` and renders its page.
///
/// `request_path` is the URL path the client asked for; it becomes the page
/// title.
///
/// # Errors
///
/// Returns `ShareError::NotFound` if the directory cannot be listed.
pub fn render_listing(dir: &Path, request_path: &str, signature: &str) -> Result<ListingPage> {
    let entries = read_entries(dir)?;
    debug!("listing {} ({} entries)", dir.display(), entries.len());
    Ok(render_page(&entries, request_path, signature))
}

/// Renders already sorted entries.
///
/// # Examples
///
/// ```
/// use lanshare_core::listing::DirectoryEntry;
/// use lanshare_core::listing::render_page;
///
/// let entries = [DirectoryEntry::new("docs", true, false)];
/// let page = render_page(&entries, "/shared/", "lanshare");
/// let html = String::from_utf8_lossy(page.as_bytes());
/// assert!(html.contains(r#"<a href="docs/">docs/</a>"#));
/// ```
#[must_use]
pub fn render_page(entries: &[DirectoryEntry], request_path: &str, signature: &str) -> ListingPage {
    let title = escape_text(request_path);
    let mut page = PageWriter::default();

    page.line(
        r#"<!DOCTYPE HTML PUBLIC "-//W3C//DTD HTML 4.01//EN" "http://www.w3.org/TR/html4/strict.dtd">"#,
    );
    page.line("<html>");
    page.line("<head>");
    page.line(&format!(
        r#"<meta http-equiv="Content-Type" content="{CONTENT_TYPE}">"#
    ));
    page.line(&format!("<title>Directory listing for {title}</title>"));
    page.line("</head>");
    page.line("<body>");
    page.line(&format!("<h1>Directory listing for {title}</h1>"));
    page.line("<hr>");
    page.line(r#"<form action="." method="GET">"#);
    page.line("<ul>");

    for entry in entries {
        let link = encoding::encode_link(&entry.link_target());
        page.line("<li>");
        page.line(&format!(
            r#"<input type="checkbox" name="files" value="{link}">"#
        ));
        page.text(&format!(r#"<a href="{link}">"#));
        page.bytes(&encoding::escape_html(&entry.label()));
        page.line("</a>");
        page.line("</li>");
    }

    page.line("</ul>");
    for action in [Action::Download, Action::Delete] {
        page.line(&format!(
            r#"<input type="submit" name="action" value="{action}">"#
        ));
    }
    page.line("</form>");
    page.line("<hr>");
    page.line(&format!("<em>{}</em>", escape_text(signature)));
    page.line("</body>");
    page.line("</html>");

    ListingPage { body: page.buf }
}

fn escape_text(text: &str) -> String {
    String::from_utf8_lossy(&encoding::escape_html(text.as_bytes())).into_owned()
}

#[derive(Default)]
struct PageWriter {
    buf: Vec<u8>,
}

impl PageWriter {
    fn text(&mut self, text: &str) {
        self.buf.extend_from_slice(text.as_bytes());
    }

    fn bytes(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    fn line(&mut self, text: &str) {
        self.text(text);
        self.buf.push(b'\n');
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn html(page: &ListingPage) -> String {
        String::from_utf8_lossy(page.as_bytes()).into_owned()
    }

    #[test]
    fn test_sort_case_insensitive() {
        let mut entries = vec![
            DirectoryEntry::new("b", false, false),
            DirectoryEntry::new("A", false, false),
            DirectoryEntry::new("c", false, false),
        ];
        sort_entries(&mut entries);
        let names: Vec<_> = entries.iter().map(|e| e.name.clone()).collect();
        assert_eq!(names, ["A", "b", "c"]);
    }

    #[test]
    fn test_render_entry_markup() {
        let entries = [DirectoryEntry::new("my file.txt", false, false)];
        let page = render_page(&entries, "/", "sig");
        let html = html(&page);

        assert!(html.contains(r#"<input type="checkbox" name="files" value="my%20file.txt">"#));
        assert!(html.contains(r#"<a href="my%20file.txt">my file.txt</a>"#));
    }

    #[test]
    fn test_render_form_controls() {
        let page = render_page(&[], "/", "sig");
        let html = html(&page);

        assert!(html.contains(r#"<form action="." method="GET">"#));
        assert!(html.contains(r#"<input type="submit" name="action" value="Download">"#));
        assert!(html.contains(r#"<input type="submit" name="action" value="Delete">"#));
        assert!(html.contains("<em>sig</em>"));
    }

    #[test]
    fn test_render_escapes_label_and_title() {
        let entries = [DirectoryEntry::new("<b>&co", false, false)];
        let page = render_page(&entries, "/a&b/", "sig");
        let html = html(&page);

        assert!(html.contains("&lt;b&gt;&amp;co</a>"));
        assert!(html.contains("<title>Directory listing for /a&amp;b/</title>"));
        assert!(html.contains(r#"href="%3Cb%3E%26co""#));
    }

    #[test]
    fn test_page_length_matches_body() {
        let entries = [DirectoryEntry::new("é", false, false)];
        let page = render_page(&entries, "/", "sig");
        assert_eq!(page.len(), page.as_bytes().len());
        assert!(!page.is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn test_render_non_utf8_name() {
        use crate::encoding::os_string_from_bytes;

        let entries = [DirectoryEntry::new(
            os_string_from_bytes(vec![b'x', 0xff]),
            false,
            false,
        )];
        let page = render_page(&entries, "/", "sig");
        let body = page.as_bytes();

        assert!(body.windows(2).any(|w| w == [b'x', 0xff].as_slice()));
        assert!(html(&page).contains(r#"href="x%FF""#));
    }

    #[test]
    fn test_read_entries_classifies() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("file.txt"), "x").unwrap();
        fs::create_dir(temp.path().join("Docs")).unwrap();

        let entries = read_entries(temp.path()).unwrap();
        assert_eq!(
            entries,
            [
                DirectoryEntry::new("Docs", true, false),
                DirectoryEntry::new("file.txt", false, false),
            ]
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_read_entries_symlinks() {
        let temp = TempDir::new().unwrap();
        fs::create_dir(temp.path().join("target")).unwrap();
        std::os::unix::fs::symlink(temp.path().join("target"), temp.path().join("link")).unwrap();
        std::os::unix::fs::symlink(temp.path().join("nowhere"), temp.path().join("dangling"))
            .unwrap();

        let entries = read_entries(temp.path()).unwrap();
        assert_eq!(
            entries,
            [
                DirectoryEntry::new("dangling", false, true),
                DirectoryEntry::new("link", true, true),
                DirectoryEntry::new("target", true, false),
            ]
        );
    }

    #[test]
    fn test_read_entries_missing_directory() {
        let temp = TempDir::new().unwrap();
        let result = read_entries(&temp.path().join("gone"));
        assert!(matches!(result, Err(ShareError::NotFound { .. })));
    }

    #[test]
    fn test_render_listing_deterministic() {
        let temp = TempDir::new().unwrap();
        for name in ["b", "A", "c", "a"] {
            fs::write(temp.path().join(name), name).unwrap();
        }

        let first = render_listing(temp.path(), "/", "sig").unwrap();
        let second = render_listing(temp.path(), "/", "sig").unwrap();
        assert_eq!(first, second);
    }
}
