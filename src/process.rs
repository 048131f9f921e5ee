//! External command runner
//!
//! Account creation and deletion are delegated to the host's own tools.
//! A command succeeds if and only if it exits with status zero; there is no
//! timeout and no output capture.

use std::process::{Command, Stdio};

use tracing::debug;

use crate::error::{AccountFsError, Result};

/// Program used to create an account
pub const CREATE_PROGRAM: &str = "adduser";
/// Program used to delete an account
pub const DELETE_PROGRAM: &str = "userdel";

/// Arguments for a non-interactive, passwordless account with an empty
/// description field
pub fn create_args(name: &str) -> Vec<&str> {
    vec!["--disabled-password", "--gecos", "", name]
}

/// Arguments for removing an account together with its home directory
pub fn delete_args(name: &str) -> Vec<&str> {
    vec!["--remove", name]
}

/// Runs a program to completion and reports whether it succeeded
pub trait CommandRunner: Send + Sync {
    fn run(&self, program: &str, args: &[&str]) -> Result<()>;
}

/// Runs commands on the host, blocking until the child exits
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl SystemRunner {
    pub fn new() -> Self {
        Self
    }
}

impl CommandRunner for SystemRunner {
    fn run(&self, program: &str, args: &[&str]) -> Result<()> {
        debug!("running {} {:?}", program, args);

        let status = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map_err(|source| AccountFsError::CommandSpawn {
                program: program.to_string(),
                source,
            })?;

        if !status.success() {
            return Err(AccountFsError::CommandFailed {
                program: program.to_string(),
                status,
            });
        }

        Ok(())
    }
}
