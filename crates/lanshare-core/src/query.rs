//! Query string interpretation.
//!
//! A listing page submits its form back to the same directory with GET, so
//! an action arrives as `?files=a&files=b&action=Download`. Each `files`
//! value is the percent-encoded link target the page rendered for that entry.

use crate::encoding;
use std::ffi::OsStr;
use std::ffi::OsString;
use std::fmt;

/// A bulk operation requested through the listing form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Bundle the selection into a `.tar.xz` archive and send it.
    Download,
    /// Remove the selection from disk.
    Delete,
}

impl Action {
    /// Parses a submitted `action` value. Matching is case-sensitive.
    ///
    /// # Examples
    ///
    /// ```
    /// use lanshare_core::Action;
    ///
    /// assert_eq!(Action::from_bytes(b"Delete"), Some(Action::Delete));
    /// assert_eq!(Action::from_bytes(b"delete"), None);
    /// ```
    #[must_use]
    pub fn from_bytes(value: &[u8]) -> Option<Self> {
        match value {
            b"Download" => Some(Self::Download),
            b"Delete" => Some(Self::Delete),
            _ => None,
        }
    }

    /// Label used on the submit button.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Download => "Download",
            Self::Delete => "Delete",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Entry names selected by the client, in submission order, without
/// duplicates.
///
/// Names are not checked against the directory: they may be stale or point
/// somewhere unexpected.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    names: Vec<OsString>,
}

impl Selection {
    /// Creates an empty selection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a name unless it is already selected.
    pub fn insert(&mut self, name: OsString) {
        if !self.names.contains(&name) {
            self.names.push(name);
        }
    }

    /// Iterates over the selected names.
    pub fn iter(&self) -> impl Iterator<Item = &OsStr> {
        self.names.iter().map(OsString::as_os_str)
    }

    /// Number of selected names.
    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Returns `true` if nothing was selected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl<S: Into<OsString>> FromIterator<S> for Selection {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut selection = Self::new();
        for name in iter {
            selection.insert(name.into());
        }
        selection
    }
}

/// An interpreted form submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionRequest {
    /// What to do.
    pub action: Action,
    /// What to do it to.
    pub selection: Selection,
}

/// Interprets a raw query string.
///
/// Returns `None` when there is no `action` parameter or when its first
/// value is not a known action. Unknown actions are ignored rather than
/// reported.
///
/// Each `files` value is a link target as rendered on the listing page, so
/// it is percent-decoded once more after form decoding. A bare name sent by
/// hand decodes to itself unless it contains `%XX`: a file literally named
/// `a%41` must be sent as `a%2541` (form-encoded `a%252541`), otherwise it
/// selects `aA`.
///
/// # Examples
///
/// ```
/// use lanshare_core::Action;
/// use lanshare_core::query::parse_query;
///
/// let request = parse_query(Some("files=a.txt&files=docs%2F&action=Download")).unwrap();
/// assert_eq!(request.action, Action::Download);
/// let names: Vec<_> = request.selection.iter().collect();
/// assert_eq!(names, ["a.txt", "docs"]);
///
/// assert!(parse_query(Some("action=Rename&files=a.txt")).is_none());
/// assert!(parse_query(None).is_none());
/// ```
#[must_use]
pub fn parse_query(query: Option<&str>) -> Option<ActionRequest> {
    let query = query?;
    let mut action = None;
    let mut selection = Selection::new();

    for (key, value) in form_pairs(query) {
        match key.as_slice() {
            b"action" if action.is_none() => action = Some(value),
            b"files" => {
                if let Some(name) = selected_name(&value) {
                    selection.insert(name);
                }
            }
            _ => {}
        }
    }

    let action = Action::from_bytes(&action?)?;
    Some(ActionRequest { action, selection })
}

/// Splits a query string into decoded key/value pairs.
fn form_pairs(query: &str) -> impl Iterator<Item = (Vec<u8>, Vec<u8>)> + '_ {
    query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            (encoding::decode_form(key), encoding::decode_form(value))
        })
}

/// Turns a submitted link target back into an entry name.
fn selected_name(link: &[u8]) -> Option<OsString> {
    let mut raw = encoding::decode_percent(link);
    while raw.last() == Some(&b'/') {
        raw.pop();
    }
    if raw.is_empty() {
        return None;
    }
    Some(encoding::os_string_from_bytes(raw))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn names(request: &ActionRequest) -> Vec<String> {
        request
            .selection
            .iter()
            .map(|n| n.to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn test_percent_in_name_needs_link_encoding() {
        let request = parse_query(Some("action=Delete&files=a%41")).unwrap();
        assert_eq!(names(&request), ["aA"]);

        let request = parse_query(Some("action=Delete&files=a%252541")).unwrap();
        assert_eq!(names(&request), ["a%41"]);
    }

    #[test]
    fn test_no_query() {
        assert!(parse_query(None).is_none());
        assert!(parse_query(Some("")).is_none());
    }

    #[test]
    fn test_files_without_action() {
        assert!(parse_query(Some("files=a.txt&files=b.txt")).is_none());
    }

    #[test]
    fn test_delete_request() {
        let request = parse_query(Some("action=Delete&files=x&files=y")).unwrap();
        assert_eq!(request.action, Action::Delete);
        assert_eq!(names(&request), ["x", "y"]);
    }

    #[test]
    fn test_first_action_wins() {
        let request = parse_query(Some("action=Delete&action=Download")).unwrap();
        assert_eq!(request.action, Action::Delete);

        assert!(parse_query(Some("action=Bogus&action=Delete")).is_none());
    }

    #[test]
    fn test_action_is_case_sensitive() {
        assert!(parse_query(Some("action=download&files=a")).is_none());
    }

    #[test]
    fn test_empty_and_duplicate_files() {
        let request = parse_query(Some("action=Download&files=&files=a&files=a&files=b")).unwrap();
        assert_eq!(names(&request), ["a", "b"]);
    }

    #[test]
    fn test_form_encoded_link_target() {
        // Browser form-encodes the rendered value "my%20file.txt".
        let request = parse_query(Some("action=Delete&files=my%2520file.txt")).unwrap();
        assert_eq!(names(&request), ["my file.txt"]);
    }

    #[test]
    fn test_plus_is_space() {
        let request = parse_query(Some("action=Delete&files=a+b")).unwrap();
        assert_eq!(names(&request), ["a b"]);
    }

    #[test]
    fn test_directory_suffix_stripped() {
        let request = parse_query(Some("action=Download&files=docs%2F&files=%2F")).unwrap();
        assert_eq!(names(&request), ["docs"]);
    }

    #[cfg(unix)]
    #[test]
    fn test_non_utf8_name() {
        use std::os::unix::ffi::OsStrExt;

        let request = parse_query(Some("action=Delete&files=%25FFname")).unwrap();
        let name = request.selection.iter().next().unwrap();
        assert_eq!(name.as_bytes(), &[0xff, b'n', b'a', b'm', b'e']);
    }

    #[test]
    fn test_action_display() {
        assert_eq!(Action::Download.to_string(), "Download");
        assert_eq!(Action::Delete.label(), "Delete");
    }

    #[test]
    fn test_selection_from_iter() {
        let selection: Selection = ["a", "b", "a"].into_iter().collect();
        assert_eq!(selection.len(), 2);
        assert!(!selection.is_empty());
    }
}
