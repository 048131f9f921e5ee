//! accountfs: the host user-account database as a filesystem
//!
//! Listing the mount root shows account names, reading files under an
//! account directory reveals its uid, home directory and login shell, and
//! creating or removing a top-level directory creates or deletes the
//! account through the host's `adduser`/`userdel`.
//!
//! # Architecture
//!
//! - **Path grammar** ([`path`]): turns a path into root / account
//!   directory / account file.
//! - **Collaborators**: the account database ([`accounts`]) and the
//!   external command runner ([`process`]).
//! - **Connector** ([`connector`]): path-based stat, list, read, mkdir and
//!   rmdir over live account data. Nothing is cached.
//! - **FUSE Adapter** ([`fuse`]): translates FUSE callbacks to connector
//!   calls and keeps the inode mapping.
//! - **Mount Manager** ([`mount`]): runs the session loop on a dedicated
//!   worker with a start/stop handle.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use accountfs::accounts::SystemAccounts;
//! use accountfs::config::MountConfig;
//! use accountfs::connector::AccountConnector;
//! use accountfs::mount::MountManager;
//! use accountfs::process::SystemRunner;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let connector = AccountConnector::new(
//!     Arc::new(SystemAccounts::new()),
//!     Arc::new(SystemRunner::new()),
//! );
//!
//! let manager = MountManager::new();
//! manager.mount(&MountConfig::default(), Arc::new(connector))?;
//! // ... /opt/users is served until the manager is dropped ...
//! # Ok(())
//! # }
//! ```

pub mod accounts;
pub mod config;
pub mod connector;
pub mod env;
pub mod error;
pub mod fuse;
pub mod mount;
pub mod path;
pub mod process;

pub use error::{AccountFsError, Result};
