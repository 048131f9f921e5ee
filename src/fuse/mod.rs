pub mod inode;

use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use fuser::{
    FileAttr, FileType as FuseFileType, Filesystem, ReplyAttr, ReplyData, ReplyDirectory,
    ReplyEmpty, ReplyEntry, ReplyOpen, Request,
};
use tracing::{debug, error, trace};

use crate::connector::{Connector, FileType, Metadata};
use crate::error::AccountFsError;

use self::inode::{InodeTable, ROOT_INODE};

/// Attributes and entries are never cached by the kernel; every lookup
/// reaches the account database
const ATTR_TTL: Duration = Duration::ZERO;

/// Generation number (not used, always 0)
const GENERATION: u64 = 0;

/// Block size for reporting
const BLOCK_SIZE: u32 = 4096;

/// Longest name the path grammar accepts
const MAX_NAME_LEN: u32 = crate::path::MAX_TOKEN_LEN as u32;

/// Convert our FileType to FUSE FileType
fn to_fuse_file_type(ft: FileType) -> FuseFileType {
    match ft {
        FileType::File => FuseFileType::RegularFile,
        FileType::Directory => FuseFileType::Directory,
    }
}

/// Convert Metadata to FileAttr
fn metadata_to_attr(ino: u64, meta: &Metadata) -> FileAttr {
    let kind = to_fuse_file_type(meta.file_type);
    let nlink = if meta.is_dir() { 2 } else { 1 };
    let blocks = meta.size.div_ceil(BLOCK_SIZE as u64);

    FileAttr {
        ino,
        size: meta.size,
        blocks,
        atime: meta.mtime,
        mtime: meta.mtime,
        ctime: meta.mtime,
        crtime: meta.mtime,
        kind,
        perm: meta.mode as u16,
        nlink,
        uid: meta.uid,
        gid: meta.gid,
        rdev: 0,
        blksize: BLOCK_SIZE,
        flags: 0,
    }
}

/// Log a failed operation and turn it into an errno.
///
/// Missing entries are routine (shells probe paths all the time) and only
/// show up at debug level.
fn errno_for(op: &str, path: &Path, err: &AccountFsError) -> i32 {
    match err {
        AccountFsError::NotFound(_) => debug!("{} {:?}: not found", op, path),
        AccountFsError::AlreadyExists(_)
        | AccountFsError::PermissionDenied(_)
        | AccountFsError::NotADirectory(_)
        | AccountFsError::IsADirectory(_) => debug!("{} {:?}: {}", op, path, err),
        _ => error!("{} error for {:?}: {}", op, path, err),
    }
    err.to_errno()
}

/// FUSE filesystem implementation that delegates to a Connector
pub struct FuseAdapter {
    connector: Arc<dyn Connector>,
    inodes: InodeTable,
}

impl FuseAdapter {
    /// Create a new FuseAdapter wrapping the given connector
    pub fn new(connector: Arc<dyn Connector>) -> Self {
        Self {
            connector,
            inodes: InodeTable::new(),
        }
    }

    /// Get path for inode, returning ENOENT if not found
    fn inode_to_path(&self, ino: u64) -> Result<PathBuf, i32> {
        self.inodes.get_path(ino).ok_or(libc::ENOENT)
    }

    /// Inode of the directory containing `ino`
    fn parent_inode(&self, ino: u64, path: &Path) -> u64 {
        if ino == ROOT_INODE {
            return ROOT_INODE;
        }
        path.parent()
            .map(|p| self.inodes.get_or_create_inode(p))
            .unwrap_or(ROOT_INODE)
    }
}

impl Filesystem for FuseAdapter {
    fn lookup(&mut self, _req: &Request<'_>, parent: u64, name: &OsStr, reply: ReplyEntry) {
        let parent_path = match self.inode_to_path(parent) {
            Ok(p) => p,
            Err(e) => {
                reply.error(e);
                return;
            }
        };

        let path = parent_path.join(name);
        trace!("lookup: {:?}", path);

        match self.connector.stat(&path) {
            Ok(meta) => {
                let ino = self.inodes.get_or_create_inode(&path);
                let attr = metadata_to_attr(ino, &meta);
                reply.entry(&ATTR_TTL, &attr, GENERATION);
            }
            Err(e) => reply.error(errno_for("lookup", &path, &e)),
        }
    }

    fn getattr(&mut self, _req: &Request<'_>, ino: u64, reply: ReplyAttr) {
        let path = match self.inode_to_path(ino) {
            Ok(p) => p,
            Err(e) => {
                reply.error(e);
                return;
            }
        };

        trace!("getattr: {:?} (ino={})", path, ino);

        match self.connector.stat(&path) {
            Ok(meta) => {
                let attr = metadata_to_attr(ino, &meta);
                reply.attr(&ATTR_TTL, &attr);
            }
            Err(e) => reply.error(errno_for("getattr", &path, &e)),
        }
    }

    fn read(
        &mut self,
        _req: &Request<'_>,
        ino: u64,
        _fh: u64,
        offset: i64,
        size: u32,
        _flags: i32,
        _lock_owner: Option<u64>,
        reply: ReplyData,
    ) {
        let path = match self.inode_to_path(ino) {
            Ok(p) => p,
            Err(e) => {
                reply.error(e);
                return;
            }
        };

        let offset = match u64::try_from(offset) {
            Ok(o) => o,
            Err(_) => {
                reply.error(libc::EINVAL);
                return;
            }
        };

        trace!("read: {:?} offset={} size={}", path, offset, size);

        match self.connector.read(&path, offset, size) {
            Ok(data) => reply.data(&data),
            Err(e) => reply.error(errno_for("read", &path, &e)),
        }
    }

    fn mkdir(
        &mut self,
        _req: &Request<'_>,
        parent: u64,
        name: &OsStr,
        _mode: u32,
        _umask: u32,
        reply: ReplyEntry,
    ) {
        let parent_path = match self.inode_to_path(parent) {
            Ok(p) => p,
            Err(e) => {
                reply.error(e);
                return;
            }
        };

        let path = parent_path.join(name);
        debug!("mkdir: {:?}", path);

        // The directory only exists through the account database, so the
        // entry is built from a fresh lookup once the account is there
        match self
            .connector
            .create_dir(&path)
            .and_then(|()| self.connector.stat(&path))
        {
            Ok(meta) => {
                let ino = self.inodes.get_or_create_inode(&path);
                let attr = metadata_to_attr(ino, &meta);
                reply.entry(&ATTR_TTL, &attr, GENERATION);
            }
            Err(e) => reply.error(errno_for("mkdir", &path, &e)),
        }
    }

    fn rmdir(&mut self, _req: &Request<'_>, parent: u64, name: &OsStr, reply: ReplyEmpty) {
        let parent_path = match self.inode_to_path(parent) {
            Ok(p) => p,
            Err(e) => {
                reply.error(e);
                return;
            }
        };

        let path = parent_path.join(name);
        debug!("rmdir: {:?}", path);

        match self.connector.remove_dir(&path) {
            Ok(()) => {
                self.inodes.remove_tree(&path);
                trace!("rmdir: {} inodes still mapped", self.inodes.len());
                reply.ok();
            }
            Err(e) => reply.error(errno_for("rmdir", &path, &e)),
        }
    }

    fn open(&mut self, _req: &Request<'_>, _ino: u64, _flags: i32, reply: ReplyOpen) {
        // Stateless - just return success with a dummy file handle
        reply.opened(0, 0);
    }

    fn release(
        &mut self,
        _req: &Request<'_>,
        _ino: u64,
        _fh: u64,
        _flags: i32,
        _lock_owner: Option<u64>,
        _flush: bool,
        reply: ReplyEmpty,
    ) {
        reply.ok();
    }

    fn opendir(&mut self, _req: &Request<'_>, _ino: u64, _flags: i32, reply: ReplyOpen) {
        reply.opened(0, 0);
    }

    fn releasedir(
        &mut self,
        _req: &Request<'_>,
        _ino: u64,
        _fh: u64,
        _flags: i32,
        reply: ReplyEmpty,
    ) {
        reply.ok();
    }

    fn readdir(
        &mut self,
        _req: &Request<'_>,
        ino: u64,
        _fh: u64,
        offset: i64,
        mut reply: ReplyDirectory,
    ) {
        let path = match self.inode_to_path(ino) {
            Ok(p) => p,
            Err(e) => {
                reply.error(e);
                return;
            }
        };

        trace!("readdir: {:?} offset={}", path, offset);

        let entries = match self.connector.list_dir(&path) {
            Ok(entries) => entries,
            Err(e) => {
                reply.error(errno_for("readdir", &path, &e));
                return;
            }
        };

        // Offsets are 1-based positions in the listing, so a resumed call
        // skips everything already returned
        let skip = usize::try_from(offset).unwrap_or(0);
        for (idx, entry) in entries.iter().enumerate().skip(skip) {
            let entry_ino = match entry.name.to_str() {
                Some(".") => ino,
                Some("..") => self.parent_inode(ino, &path),
                _ => self.inodes.get_or_create_inode(&path.join(&entry.name)),
            };
            let ft = to_fuse_file_type(entry.file_type);

            if reply.add(entry_ino, (idx + 1) as i64, ft, &entry.name) {
                // Buffer full
                break;
            }
        }

        reply.ok();
    }

    fn statfs(&mut self, _req: &Request<'_>, _ino: u64, reply: fuser::ReplyStatfs) {
        reply.statfs(
            0,            // blocks
            0,            // bfree
            0,            // bavail
            0,            // files
            0,            // ffree
            BLOCK_SIZE,   // bsize
            MAX_NAME_LEN, // namelen
            BLOCK_SIZE,   // frsize
        );
    }
}
