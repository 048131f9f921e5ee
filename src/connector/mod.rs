//! Path-based operation surface
//!
//! The FUSE adapter speaks inodes; connectors speak paths. Each operation
//! receives an absolute path and answers from live state.

pub mod accounts;

use std::ffi::OsString;
use std::path::Path;
use std::time::SystemTime;

use bytes::Bytes;

use crate::error::Result;

pub use accounts::AccountConnector;

/// File type enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
    File,
    Directory,
}

/// Default file mode (rw-r--r--)
pub const DEFAULT_FILE_MODE: u32 = 0o644;
/// Default directory mode (rwxr-xr-x)
pub const DEFAULT_DIR_MODE: u32 = 0o755;

/// Synthetic metadata for a file or directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Metadata {
    pub file_type: FileType,
    pub size: u64,
    pub mtime: SystemTime,
    /// POSIX permission bits
    pub mode: u32,
    pub uid: u32,
    pub gid: u32,
}

impl Metadata {
    pub fn file(size: u64, mtime: SystemTime, uid: u32, gid: u32) -> Self {
        Self {
            file_type: FileType::File,
            size,
            mtime,
            mode: DEFAULT_FILE_MODE,
            uid,
            gid,
        }
    }

    pub fn directory(mtime: SystemTime, uid: u32, gid: u32) -> Self {
        Self {
            file_type: FileType::Directory,
            size: 0,
            mtime,
            mode: DEFAULT_DIR_MODE,
            uid,
            gid,
        }
    }

    pub fn is_file(&self) -> bool {
        matches!(self.file_type, FileType::File)
    }

    pub fn is_dir(&self) -> bool {
        matches!(self.file_type, FileType::Directory)
    }
}

/// Directory entry returned by list_dir
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub name: OsString,
    pub file_type: FileType,
}

impl DirEntry {
    pub fn file(name: impl Into<OsString>) -> Self {
        Self {
            name: name.into(),
            file_type: FileType::File,
        }
    }

    pub fn directory(name: impl Into<OsString>) -> Self {
        Self {
            name: name.into(),
            file_type: FileType::Directory,
        }
    }
}

/// Core connector trait
///
/// Every call is synchronous and blocks the caller for its full duration.
pub trait Connector: Send + Sync {
    /// Get metadata for a path
    fn stat(&self, path: &Path) -> Result<Metadata>;

    /// Read bytes from a file
    ///
    /// # Arguments
    /// * `path` - Path to the file
    /// * `offset` - Byte offset to start reading from
    /// * `size` - Maximum number of bytes to read
    fn read(&self, path: &Path, offset: u64, size: u32) -> Result<Bytes>;

    /// List directory contents, starting with `.` and `..`
    fn list_dir(&self, path: &Path) -> Result<Vec<DirEntry>>;

    /// Create a directory
    fn create_dir(&self, path: &Path) -> Result<()>;

    /// Remove a directory
    fn remove_dir(&self, path: &Path) -> Result<()>;
}
