//! `.tar.xz` archives of a selection.
//!
//! Every selected name is stored under its own name at the top of the
//! archive. Directories are walked recursively, symlinks are stored as
//! symlinks.

use crate::Result;
use crate::ShareConfig;
use crate::ShareError;
use crate::actions::resolve_entry;
use crate::query::Selection;
use chrono::Local;
use log::debug;
use std::fs;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;
use std::time::Instant;
use tar::Builder;
use tar::Header;
use tempfile::TempPath;
use walkdir::WalkDir;
use xz2::write::XzEncoder;

/// File name suffix of every archive.
pub const ARCHIVE_SUFFIX: &str = ".tar.xz";

/// `Content-Type` of archive downloads.
pub const CONTENT_TYPE: &str = "application/octet-stream";

/// One selected entry, resolved against the listed directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveSource {
    /// Location on disk.
    pub path: PathBuf,

    /// Name inside the archive.
    pub archive_path: PathBuf,
}

/// Statistics about a finished archive.
#[derive(Debug, Clone, Default)]
pub struct ArchiveReport {
    /// Regular files added.
    pub files_added: usize,

    /// Directory entries added.
    pub directories_added: usize,

    /// Symlinks added.
    pub symlinks_added: usize,

    /// File content read from disk (uncompressed).
    pub bytes_read: u64,

    /// Size of the compressed archive.
    pub bytes_compressed: u64,

    /// Time spent building the archive.
    pub duration: Duration,
}

impl ArchiveReport {
    /// Total number of entries in the archive.
    #[must_use]
    pub fn entries(&self) -> usize {
        self.files_added + self.directories_added + self.symlinks_added
    }
}

/// An archive written to the staging directory.
///
/// Unless the configuration keeps archives, the file is removed when the
/// value holding its [`TempPath`] is dropped.
#[derive(Debug)]
pub struct StagedArchive {
    file_name: String,
    path: PathBuf,
    cleanup: Option<TempPath>,
    report: ArchiveReport,
}

impl StagedArchive {
    /// Name sent in `Content-Disposition`.
    #[must_use]
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Location of the archive on disk.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Build statistics.
    #[must_use]
    pub const fn report(&self) -> &ArchiveReport {
        &self.report
    }

    /// Returns `true` if the archive is removed once dropped.
    #[must_use]
    pub const fn is_temporary(&self) -> bool {
        self.cleanup.is_some()
    }

    /// Splits the archive into its name, location and cleanup guard.
    #[must_use]
    pub fn into_parts(self) -> (String, PathBuf, Option<TempPath>) {
        (self.file_name, self.path, self.cleanup)
    }
}

/// Timestamp prefix for archive names, e.g. `2026-10-18T14:03:11`.
#[must_use]
pub fn timestamp() -> String {
    Local::now().format("%Y-%m-%dT%H:%M:%S").to_string()
}

/// Resolves every selected name against `base_dir`.
///
/// All names are checked before anything is written so that a stale
/// selection fails the whole batch up front.
///
/// # Errors
///
/// Returns `ShareError::InvalidPath` for a name that does not stay below
/// `base_dir`, and `ShareError::SourceNotFound` for the first name that does
/// not exist.
pub fn resolve_sources(selection: &Selection, base_dir: &Path) -> Result<Vec<ArchiveSource>> {
    selection
        .iter()
        .map(|name| {
            let (path, archive_path) = resolve_entry(base_dir, name)?;
            if fs::symlink_metadata(&path).is_err() {
                return Err(ShareError::SourceNotFound { path });
            }
            Ok(ArchiveSource { path, archive_path })
        })
        .collect()
}

/// Builds the archive for `selection` in the staging directory.
///
/// The file is created exclusively with a random suffix after the
/// timestamp, so an existing archive is never overwritten.
///
/// # Errors
///
/// Returns `ShareError::SourceNotFound` if a selected entry is missing, or an
/// I/O error if the archive cannot be written. No archive is left behind on
/// error.
pub fn stage_archive(
    selection: &Selection,
    base_dir: &Path,
    config: &ShareConfig,
) -> Result<StagedArchive> {
    let sources = resolve_sources(selection, base_dir)?;

    let staged = tempfile::Builder::new()
        .prefix(&format!("{}-", timestamp()))
        .suffix(ARCHIVE_SUFFIX)
        .rand_bytes(6)
        .tempfile_in(config.staging_dir())?;

    let report = write_archive(staged.as_file(), &sources, config.compression_level)?;

    let (path, cleanup) = if config.keep_archives {
        let (_, path) = staged.keep().map_err(|e| ShareError::Io(e.error))?;
        (path, None)
    } else {
        let temp = staged.into_temp_path();
        (temp.to_path_buf(), Some(temp))
    };

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    debug!(
        "staged {} ({} entries, {} bytes)",
        path.display(),
        report.entries(),
        report.bytes_compressed
    );

    Ok(StagedArchive {
        file_name,
        path,
        cleanup,
        report,
    })
}

/// Writes a `.tar.xz` archive of `sources` to `writer`.
///
/// On error nothing more is written, so the output is never a complete
/// archive.
///
/// # Errors
///
/// Returns an error if a source cannot be read or the writer fails.
pub fn write_archive<W: Write>(
    writer: W,
    sources: &[ArchiveSource],
    compression_level: u8,
) -> Result<ArchiveReport> {
    let start = Instant::now();
    let encoder = XzEncoder::new(CountingWriter::new(writer), u32::from(compression_level));
    let mut builder = Builder::new(encoder);
    builder.follow_symlinks(false);
    let mut report = ArchiveReport::default();

    let written = sources
        .iter()
        .try_for_each(|source| add_source(&mut builder, source, &mut report))
        .and_then(|()| builder.finish().map_err(ShareError::from));
    if let Err(err) = written {
        // Dropping the builder and encoder would otherwise write valid trailers.
        builder.get_mut().get_mut().abort();
        return Err(err);
    }

    let encoder = builder.into_inner()?;
    let mut counting_writer = encoder.finish()?;
    counting_writer.flush()?;

    report.bytes_compressed = counting_writer.total_bytes();
    report.duration = start.elapsed();

    Ok(report)
}

/// Adds one selected entry, recursing into directories.
fn add_source<W: Write>(
    builder: &mut Builder<W>,
    source: &ArchiveSource,
    report: &mut ArchiveReport,
) -> Result<()> {
    let walker = WalkDir::new(&source.path)
        .follow_links(false)
        .sort_by_file_name();

    for entry in walker {
        let entry = entry.map_err(|e| {
            ShareError::Io(std::io::Error::other(format!("walkdir error: {e}")))
        })?;

        let relative = entry
            .path()
            .strip_prefix(&source.path)
            .unwrap_or_else(|_| Path::new(""));
        let archive_path = if relative.as_os_str().is_empty() {
            source.archive_path.clone()
        } else {
            source.archive_path.join(relative)
        };

        let file_type = entry.file_type();
        if file_type.is_symlink() {
            let target = fs::read_link(entry.path())?;
            add_symlink(builder, &archive_path, &target, report)?;
        } else if file_type.is_dir() {
            add_directory(builder, entry.path(), &archive_path, report)?;
        } else {
            add_file(builder, entry.path(), &archive_path, report)?;
        }
    }

    Ok(())
}

fn add_file<W: Write>(
    builder: &mut Builder<W>,
    file_path: &Path,
    archive_path: &Path,
    report: &mut ArchiveReport,
) -> Result<()> {
    let mut file = File::open(file_path)?;
    let metadata = file.metadata()?;
    let size = metadata.len();

    let mut header = Header::new_gnu();
    header.set_size(size);
    set_permissions(&mut header, &metadata);
    header.set_cksum();

    builder.append_data(&mut header, archive_path, &mut file)?;

    report.files_added += 1;
    report.bytes_read += size;

    Ok(())
}

fn add_directory<W: Write>(
    builder: &mut Builder<W>,
    dir_path: &Path,
    archive_path: &Path,
    report: &mut ArchiveReport,
) -> Result<()> {
    let metadata = fs::metadata(dir_path)?;

    let mut header = Header::new_gnu();
    header.set_entry_type(tar::EntryType::Directory);
    header.set_size(0);
    set_permissions(&mut header, &metadata);
    header.set_cksum();

    builder.append_data(&mut header, archive_path, std::io::empty())?;

    report.directories_added += 1;

    Ok(())
}

fn add_symlink<W: Write>(
    builder: &mut Builder<W>,
    link_path: &Path,
    target: &Path,
    report: &mut ArchiveReport,
) -> Result<()> {
    let mut header = Header::new_gnu();
    header.set_entry_type(tar::EntryType::Symlink);
    header.set_size(0);
    header.set_mode(0o777);
    header.set_cksum();

    builder.append_link(&mut header, link_path, target)?;

    report.symlinks_added += 1;

    Ok(())
}

#[cfg(unix)]
fn set_permissions(header: &mut Header, metadata: &fs::Metadata) {
    use std::os::unix::fs::MetadataExt;
    header.set_mode(metadata.mode());
    header.set_uid(u64::from(metadata.uid()));
    header.set_gid(u64::from(metadata.gid()));
    // mtime can be negative for dates before epoch, clamp to 0
    #[allow(clippy::cast_sign_loss)]
    let mtime = metadata.mtime().max(0) as u64;
    header.set_mtime(mtime);
}

#[cfg(not(unix))]
fn set_permissions(header: &mut Header, metadata: &fs::Metadata) {
    let mode = if metadata.is_dir() {
        0o755
    } else if metadata.permissions().readonly() {
        0o444
    } else {
        0o644
    };
    header.set_mode(mode);

    if let Ok(modified) = metadata.modified()
        && let Ok(duration) = modified.duration_since(std::time::UNIX_EPOCH)
    {
        header.set_mtime(duration.as_secs());
    }
}

/// Counts bytes written to the inner writer.
///
/// Once aborted, every write fails and nothing reaches the inner writer.
struct CountingWriter<W> {
    inner: W,
    bytes_written: u64,
    aborted: bool,
}

impl<W> CountingWriter<W> {
    fn new(inner: W) -> Self {
        Self {
            inner,
            bytes_written: 0,
            aborted: false,
        }
    }

    fn total_bytes(&self) -> u64 {
        self.bytes_written
    }

    fn abort(&mut self) {
        self.aborted = true;
    }

    fn check(&self) -> std::io::Result<()> {
        if self.aborted {
            return Err(std::io::Error::other("archive aborted"));
        }
        Ok(())
    }
}

impl<W: Write> Write for CountingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.check()?;
        let bytes = self.inner.write(buf)?;
        self.bytes_written += bytes as u64;
        Ok(bytes)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.check()?;
        self.inner.flush()
    }
}
