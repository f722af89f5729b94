//! Directory entries as shown on a listing page.

use crate::encoding;
use std::cmp::Ordering;
use std::ffi::OsString;
use std::fs;

/// One immediate child of a listed directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryEntry {
    /// File name, a single path segment.
    pub name: OsString,

    /// The entry is a directory, or a symlink resolving to one.
    pub is_dir: bool,

    /// The entry itself is a symbolic link.
    pub is_symlink: bool,
}

impl DirectoryEntry {
    /// Creates an entry from its parts.
    #[must_use]
    pub fn new(name: impl Into<OsString>, is_dir: bool, is_symlink: bool) -> Self {
        Self {
            name: name.into(),
            is_dir,
            is_symlink,
        }
    }

    /// Classifies a `read_dir` item.
    ///
    /// The symlink flag comes from the entry itself; the directory flag
    /// follows links. A dangling link is a non-directory symlink.
    #[must_use]
    pub fn from_dir_entry(item: &fs::DirEntry) -> Self {
        let is_symlink = item.file_type().is_ok_and(|t| t.is_symlink());
        let is_dir = fs::metadata(item.path()).is_ok_and(|m| m.is_dir());
        Self::new(item.file_name(), is_dir, is_symlink)
    }

    /// Visible label: `name/` for directories, `name@` for symlinks.
    #[must_use]
    pub fn label(&self) -> Vec<u8> {
        let mut label = encoding::os_str_bytes(&self.name).into_owned();
        if self.is_symlink {
            label.push(b'@');
        } else if self.is_dir {
            label.push(b'/');
        }
        label
    }

    /// Raw link target: `name/` for anything that resolves to a directory.
    #[must_use]
    pub fn link_target(&self) -> Vec<u8> {
        let mut link = encoding::os_str_bytes(&self.name).into_owned();
        if self.is_dir {
            link.push(b'/');
        }
        link
    }

    /// Listing order: case-insensitive, ties broken by the raw bytes.
    #[must_use]
    pub fn listing_cmp(&self, other: &Self) -> Ordering {
        sort_key(self)
            .cmp(&sort_key(other))
            .then_with(|| encoding::os_str_bytes(&self.name).cmp(&encoding::os_str_bytes(&other.name)))
    }
}

fn sort_key(entry: &DirectoryEntry) -> String {
    entry.name.to_string_lossy().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_file() {
        let entry = DirectoryEntry::new("notes.txt", false, false);
        assert_eq!(entry.label(), b"notes.txt");
        assert_eq!(entry.link_target(), b"notes.txt");
    }

    #[test]
    fn test_directory() {
        let entry = DirectoryEntry::new("docs", true, false);
        assert_eq!(entry.label(), b"docs/");
        assert_eq!(entry.link_target(), b"docs/");
    }

    #[test]
    fn test_symlink_to_directory() {
        let entry = DirectoryEntry::new("link", true, true);
        assert_eq!(entry.label(), b"link@");
        assert_eq!(entry.link_target(), b"link/");
    }

    #[test]
    fn test_symlink_to_file() {
        let entry = DirectoryEntry::new("latest", false, true);
        assert_eq!(entry.label(), b"latest@");
        assert_eq!(entry.link_target(), b"latest");
    }

    #[test]
    fn test_listing_cmp() {
        let upper = DirectoryEntry::new("A", false, false);
        let lower = DirectoryEntry::new("a", false, false);
        let b = DirectoryEntry::new("b", false, false);

        assert_eq!(upper.listing_cmp(&b), Ordering::Less);
        assert_eq!(b.listing_cmp(&upper), Ordering::Greater);
        // Same key, raw bytes decide: 'A' < 'a'.
        assert_eq!(upper.listing_cmp(&lower), Ordering::Less);
    }
}
