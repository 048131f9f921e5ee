//! Live OS account database (`getpwnam_r` / `getpwent`)

use std::ffi::{CStr, OsStr};
use std::os::unix::ffi::OsStrExt;
use std::path::PathBuf;

use nix::errno::Errno;
use nix::unistd::User;
use parking_lot::Mutex;
use scopeguard::defer;
use tracing::{trace, warn};

use super::{AccountDatabase, AccountRecord};
use crate::error::Result;

/// `setpwent`/`getpwent`/`endpwent` share hidden process-wide state
static PWENT_LOCK: Mutex<()> = parking_lot::const_mutex(());

/// Account database backed by the host's name service
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemAccounts;

impl SystemAccounts {
    pub fn new() -> Self {
        Self
    }
}

impl From<User> for AccountRecord {
    fn from(user: User) -> Self {
        AccountRecord {
            name: user.name,
            uid: user.uid.as_raw(),
            gid: user.gid.as_raw(),
            home: user.dir,
            shell: user.shell,
        }
    }
}

/// Copy a `passwd` entry returned by `getpwent`.
///
/// Returns `None` for entries whose name is not valid UTF-8; those cannot
/// be addressed through a path anyway.
///
/// # Safety
/// The string pointers in `pw` must be valid NUL-terminated strings (or null
/// for `pw_dir`/`pw_shell`).
unsafe fn record_from_passwd(pw: &libc::passwd) -> Option<AccountRecord> {
    let name = CStr::from_ptr(pw.pw_name).to_str().ok()?.to_string();

    Some(AccountRecord {
        name,
        uid: pw.pw_uid,
        gid: pw.pw_gid,
        home: path_from_ptr(pw.pw_dir),
        shell: path_from_ptr(pw.pw_shell),
    })
}

unsafe fn path_from_ptr(ptr: *const libc::c_char) -> PathBuf {
    if ptr.is_null() {
        return PathBuf::new();
    }
    PathBuf::from(OsStr::from_bytes(CStr::from_ptr(ptr).to_bytes()))
}

impl AccountDatabase for SystemAccounts {
    fn lookup(&self, name: &str) -> Result<Option<AccountRecord>> {
        match User::from_name(name) {
            Ok(user) => Ok(user.map(AccountRecord::from)),
            // getpwnam_r(3) lists these as "name not found"
            Err(Errno::ENOENT | Errno::ESRCH | Errno::EBADF | Errno::EPERM) => Ok(None),
            Err(e) => {
                warn!("account lookup for {:?} failed: {}", name, e);
                Err(e.into())
            }
        }
    }

    fn for_each(&self, visit: &mut dyn FnMut(&AccountRecord)) -> Result<()> {
        let _guard = PWENT_LOCK.lock();

        unsafe { libc::setpwent() };
        defer! {
            unsafe { libc::endpwent() };
        }

        loop {
            Errno::clear();
            let entry = unsafe { libc::getpwent() };
            if entry.is_null() {
                return end_of_entries(Errno::last());
            }

            match unsafe { record_from_passwd(&*entry) } {
                Some(record) => visit(&record),
                None => trace!("skipping account with non UTF-8 name"),
            }
        }
    }
}

/// Interpret errno after `getpwent` returned NULL.
///
/// End of data leaves errno untouched; some NSS backends report it as ENOENT.
fn end_of_entries(errno: Errno) -> Result<()> {
    match errno {
        Errno::UnknownErrno | Errno::ENOENT => Ok(()),
        e => {
            warn!("account iteration failed: {}", e);
            Err(e.into())
        }
    }
}
