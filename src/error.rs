use std::io;
use thiserror::Error;

/// Main error type for accountfs operations
#[derive(Error, Debug)]
pub enum AccountFsError {
    #[error("Path not found: {0}")]
    NotFound(String),

    #[error("Account already exists: {0}")]
    AlreadyExists(String),

    #[error("Operation not permitted: {0}")]
    PermissionDenied(String),

    #[error("Not a directory: {0}")]
    NotADirectory(String),

    #[error("Is a directory: {0}")]
    IsADirectory(String),

    #[error("{program} exited with {status}")]
    CommandFailed {
        program: String,
        status: std::process::ExitStatus,
    },

    #[error("Failed to run {program}: {source}")]
    CommandSpawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl AccountFsError {
    /// Convert error to libc errno for FUSE responses
    ///
    /// Every external-command failure collapses to EIO, whatever the cause.
    pub fn to_errno(&self) -> i32 {
        match self {
            AccountFsError::NotFound(_) => libc::ENOENT,
            AccountFsError::AlreadyExists(_) => libc::EEXIST,
            AccountFsError::PermissionDenied(_) => libc::EPERM,
            AccountFsError::NotADirectory(_) => libc::ENOTDIR,
            AccountFsError::IsADirectory(_) => libc::EISDIR,
            AccountFsError::CommandFailed { .. } => libc::EIO,
            AccountFsError::CommandSpawn { .. } => libc::EIO,
            AccountFsError::Io(_) => libc::EIO,
        }
    }
}

impl From<nix::Error> for AccountFsError {
    fn from(err: nix::Error) -> Self {
        AccountFsError::Io(io::Error::from(err))
    }
}

/// Result type alias for accountfs operations
pub type Result<T> = std::result::Result<T, AccountFsError>;
