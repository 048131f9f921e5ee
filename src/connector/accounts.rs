//! Account-backed connector
//!
//! Maps the path grammar in [`crate::path`] onto the account database:
//!
//! - `/` lists every account with an interactive shell
//! - `/<name>` is a directory owned by the account
//! - `/<name>/{id,home,shell}` are read-only files with the uid, home
//!   directory and login shell
//!
//! Creating a top-level directory creates the account and removing it
//! deletes the account. Nothing is cached: each call asks the database.

use std::os::unix::ffi::OsStrExt;
use std::path::Path;
use std::sync::Arc;
use std::time::SystemTime;

use bytes::Bytes;
use tracing::{debug, info, trace};

use super::{Connector, DirEntry, Metadata};
use crate::accounts::{AccountDatabase, AccountRecord};
use crate::error::{AccountFsError, Result};
use crate::path::{valid_token, AccountField, PathEntity, PathShape};
use crate::process::{self, CommandRunner};

/// Size reported for every account file.
///
/// This is a fixed placeholder, not the length of the content. Readers that
/// trust it see a short read followed by end-of-file.
pub const ACCOUNT_FILE_SIZE: u64 = 256;

/// Connector exposing the account database as a directory tree
pub struct AccountConnector {
    accounts: Arc<dyn AccountDatabase>,
    runner: Arc<dyn CommandRunner>,
    /// Owner reported for the root directory
    uid: u32,
    gid: u32,
}

impl AccountConnector {
    /// Create a connector whose root is owned by the running process
    pub fn new(accounts: Arc<dyn AccountDatabase>, runner: Arc<dyn CommandRunner>) -> Self {
        let uid = nix::unistd::getuid().as_raw();
        let gid = nix::unistd::getgid().as_raw();
        Self::with_root_owner(accounts, runner, uid, gid)
    }

    pub fn with_root_owner(
        accounts: Arc<dyn AccountDatabase>,
        runner: Arc<dyn CommandRunner>,
        uid: u32,
        gid: u32,
    ) -> Self {
        Self {
            accounts,
            runner,
            uid,
            gid,
        }
    }

    /// Fetch an account or fail with NotFound for `path`
    fn require(&self, name: &str, path: &str) -> Result<AccountRecord> {
        self.accounts
            .lookup(name)?
            .ok_or_else(|| AccountFsError::NotFound(path.to_string()))
    }

    /// Account name targeted by a mutation on `path`.
    ///
    /// Only a bare top-level segment may be mutated; root and anything with a
    /// further separator is refused before the database is consulted.
    fn mutation_target(path: &str) -> Result<&str> {
        match PathShape::of(path) {
            PathShape::Top(name) => {
                valid_token(name).ok_or_else(|| AccountFsError::NotFound(path.to_string()))
            }
            PathShape::Root | PathShape::Nested(..) | PathShape::Deep => {
                Err(AccountFsError::PermissionDenied(path.to_string()))
            }
            PathShape::Malformed => Err(AccountFsError::NotFound(path.to_string())),
        }
    }
}

/// Refuse names the account tools would parse as an option
fn reject_option_like(name: &str, path: &str) -> Result<()> {
    if name.starts_with('-') {
        return Err(AccountFsError::PermissionDenied(path.to_string()));
    }
    Ok(())
}

/// Paths that are not valid UTF-8 cannot name an account
fn path_str(path: &Path) -> Result<&str> {
    path.to_str()
        .ok_or_else(|| AccountFsError::NotFound(path.to_string_lossy().into_owned()))
}

/// Full content of an account file, minus one trailing newline if present
pub fn field_content(record: &AccountRecord, field: AccountField) -> Vec<u8> {
    let mut content = match field {
        AccountField::Id => record.uid.to_string().into_bytes(),
        AccountField::Home => record.home.as_os_str().as_bytes().to_vec(),
        AccountField::Shell => record.shell.as_os_str().as_bytes().to_vec(),
    };
    if content.last() == Some(&b'\n') {
        content.pop();
    }
    content
}

/// Bytes of `content` in `[offset, offset + size)`, clamped to its end.
/// Reading at or past the end yields nothing.
pub fn read_range(content: Vec<u8>, offset: u64, size: u32) -> Bytes {
    let len = content.len() as u64;
    if offset >= len {
        return Bytes::new();
    }

    let start = offset as usize;
    let end = start + (size as usize).min(content.len() - start);
    Bytes::from(content).slice(start..end)
}

impl Connector for AccountConnector {
    fn stat(&self, path: &Path) -> Result<Metadata> {
        let path = path_str(path)?;
        let now = SystemTime::now();

        // Field names are checked while resolving, before any lookup
        match PathEntity::resolve(path)? {
            PathEntity::Root => Ok(Metadata::directory(now, self.uid, self.gid)),
            PathEntity::AccountDir { name } => {
                let record = self.require(name, path)?;
                Ok(Metadata::directory(now, record.uid, record.gid))
            }
            PathEntity::AccountFile { name, .. } => {
                let record = self.require(name, path)?;
                Ok(Metadata::file(
                    ACCOUNT_FILE_SIZE,
                    now,
                    record.uid,
                    record.gid,
                ))
            }
        }
    }

    fn read(&self, path: &Path, offset: u64, size: u32) -> Result<Bytes> {
        let path = path_str(path)?;

        match PathEntity::resolve(path)? {
            PathEntity::AccountFile { name, field } => {
                let record = self.require(name, path)?;
                let content = field_content(&record, field);
                trace!("read {} -> {} bytes of content", path, content.len());
                Ok(read_range(content, offset, size))
            }
            PathEntity::Root | PathEntity::AccountDir { .. } => {
                Err(AccountFsError::IsADirectory(path.to_string()))
            }
        }
    }

    fn list_dir(&self, path: &Path) -> Result<Vec<DirEntry>> {
        let path = path_str(path)?;
        let mut entries = vec![DirEntry::directory("."), DirEntry::directory("..")];

        match PathEntity::resolve(path)? {
            PathEntity::Root => {
                self.accounts.for_each(&mut |record| {
                    if record.has_interactive_shell() {
                        entries.push(DirEntry::directory(&record.name));
                    }
                })?;
            }
            PathEntity::AccountDir { name } => {
                self.require(name, path)?;
                entries.extend(AccountField::ALL.iter().map(|f| DirEntry::file(f.name())));
            }
            PathEntity::AccountFile { name, .. } => {
                self.require(name, path)?;
                return Err(AccountFsError::NotADirectory(path.to_string()));
            }
        }

        Ok(entries)
    }

    fn create_dir(&self, path: &Path) -> Result<()> {
        let path = path_str(path)?;
        let name = Self::mutation_target(path)?;

        if self.accounts.exists(name)? {
            return Err(AccountFsError::AlreadyExists(name.to_string()));
        }

        reject_option_like(name, path)?;
        debug!("creating account {}", name);
        self.runner
            .run(process::CREATE_PROGRAM, &process::create_args(name))?;
        info!("created account {}", name);
        Ok(())
    }

    fn remove_dir(&self, path: &Path) -> Result<()> {
        let path = path_str(path)?;
        let name = Self::mutation_target(path)?;

        if !self.accounts.exists(name)? {
            return Err(AccountFsError::NotFound(path.to_string()));
        }

        reject_option_like(name, path)?;
        debug!("deleting account {}", name);
        self.runner
            .run(process::DELETE_PROGRAM, &process::delete_args(name))?;
        info!("deleted account {}", name);
        Ok(())
    }
}
