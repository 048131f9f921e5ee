//! Account database collaborator
//!
//! Every operation of the filesystem asks the database afresh; records are
//! plain snapshots and are never cached between calls.

pub mod memory;
pub mod system;

use std::os::unix::ffi::OsStrExt;
use std::path::PathBuf;

use crate::error::Result;

pub use memory::MemoryAccounts;
pub use system::SystemAccounts;

/// Snapshot of one row of the account database
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountRecord {
    pub name: String,
    pub uid: u32,
    pub gid: u32,
    pub home: PathBuf,
    pub shell: PathBuf,
}

impl AccountRecord {
    pub fn new(
        name: impl Into<String>,
        uid: u32,
        gid: u32,
        home: impl Into<PathBuf>,
        shell: impl Into<PathBuf>,
    ) -> Self {
        Self {
            name: name.into(),
            uid,
            gid,
            home: home.into(),
            shell: shell.into(),
        }
    }

    /// Whether the login shell looks interactive, i.e. its path ends in `sh`.
    ///
    /// Only these accounts show up in the root listing; the others can
    /// still be addressed directly.
    pub fn has_interactive_shell(&self) -> bool {
        self.shell.as_os_str().as_bytes().ends_with(b"sh")
    }
}

/// Read-only view of the host account database
pub trait AccountDatabase: Send + Sync {
    /// Look up a single account by name
    fn lookup(&self, name: &str) -> Result<Option<AccountRecord>>;

    /// Visit every account in database order.
    ///
    /// Implementations open their iteration state before the first record
    /// and close it before returning, including on error.
    fn for_each(&self, visit: &mut dyn FnMut(&AccountRecord)) -> Result<()>;

    /// Whether an account with this name exists right now
    fn exists(&self, name: &str) -> Result<bool> {
        Ok(self.lookup(name)?.is_some())
    }
}
