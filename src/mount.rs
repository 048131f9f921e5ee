//! Mount management and lifecycle
//!
//! Each mount runs the blocking FUSE session loop on its own worker thread.
//! While the loop runs, process stderr points at `/dev/null` so libfuse
//! diagnostics never land in the middle of whatever else owns the console.

use std::fs::OpenOptions;
use std::io;
use std::os::fd::{AsRawFd, FromRawFd, OwnedFd};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use fuser::{MountOption, SessionUnmounter};
use parking_lot::Mutex;
use tracing::{error, info, warn};

use crate::config::MountConfig;
use crate::connector::Connector;
use crate::error::{AccountFsError, Result};
use crate::fuse::FuseAdapter;

/// Name of the worker thread running the session loop
const WORKER_NAME: &str = "accountfs-fuse";

/// Fixed mount options: the kernel enforces permission bits and the mount
/// goes away with the process
pub fn mount_options(fsname: &str) -> Vec<MountOption> {
    vec![
        MountOption::FSName(fsname.to_string()),
        MountOption::DefaultPermissions,
        MountOption::AutoUnmount,
        MountOption::AllowOther,
    ]
}

/// Points stderr at `/dev/null` until dropped
struct StderrSilencer {
    saved: OwnedFd,
}

impl StderrSilencer {
    fn engage() -> io::Result<Self> {
        let devnull = OpenOptions::new().write(true).open("/dev/null")?;

        let saved = unsafe { libc::dup(libc::STDERR_FILENO) };
        if saved < 0 {
            return Err(io::Error::last_os_error());
        }
        let saved = unsafe { OwnedFd::from_raw_fd(saved) };

        if unsafe { libc::dup2(devnull.as_raw_fd(), libc::STDERR_FILENO) } < 0 {
            return Err(io::Error::last_os_error());
        }

        Ok(Self { saved })
    }
}

impl Drop for StderrSilencer {
    fn drop(&mut self) {
        unsafe { libc::dup2(self.saved.as_raw_fd(), libc::STDERR_FILENO) };
    }
}

/// Represents an active mount and the worker serving it
pub struct ActiveMount {
    /// Mount path
    pub path: PathBuf,
    /// Unmount handle; taking it is how the worker is asked to stop
    unmounter: Option<SessionUnmounter>,
    worker: Option<JoinHandle<()>>,
    /// Set before unmounting so the worker knows the loop ending is expected
    stopping: Arc<AtomicBool>,
}

impl ActiveMount {
    /// Mount `connector` at `path` and start serving it.
    ///
    /// Returns once the kernel mount is in place, or with the mount error.
    pub fn start(
        path: PathBuf,
        connector: Arc<dyn Connector>,
        options: Vec<MountOption>,
    ) -> Result<Self> {
        let (ready_tx, ready_rx) = mpsc::sync_channel(1);
        let stopping = Arc::new(AtomicBool::new(false));

        let worker_path = path.clone();
        let worker_stopping = stopping.clone();
        let worker = thread::Builder::new()
            .name(WORKER_NAME.to_string())
            .spawn(move || {
                let silencer = match StderrSilencer::engage() {
                    Ok(s) => Some(s),
                    Err(e) => {
                        warn!("Could not silence stderr: {}", e);
                        None
                    }
                };

                let adapter = FuseAdapter::new(connector);
                let mut session = match fuser::Session::new(adapter, &worker_path, &options) {
                    Ok(session) => session,
                    Err(e) => {
                        drop(silencer);
                        let _ = ready_tx.send(Err(e));
                        return;
                    }
                };

                if ready_tx.send(Ok(session.unmount_callable())).is_err() {
                    return;
                }

                let result = session.run();
                drop(silencer);

                match result {
                    Err(e) if !worker_stopping.load(Ordering::SeqCst) => {
                        error!("FUSE session at {:?} ended: {}", worker_path, e)
                    }
                    _ => info!("FUSE session at {:?} finished", worker_path),
                }
            })?;

        let unmounter = match ready_rx.recv() {
            Ok(Ok(unmounter)) => unmounter,
            Ok(Err(e)) => {
                let _ = worker.join();
                return Err(AccountFsError::Io(e));
            }
            Err(_) => {
                let _ = worker.join();
                return Err(AccountFsError::Io(io::Error::new(
                    io::ErrorKind::Other,
                    "FUSE worker exited before mounting",
                )));
            }
        };

        Ok(Self {
            path,
            unmounter: Some(unmounter),
            worker: Some(worker),
            stopping,
        })
    }

    /// Whether the worker is still serving requests
    pub fn is_running(&self) -> bool {
        self.worker.as_ref().is_some_and(|w| !w.is_finished())
    }

    /// Unmount and wait for the worker to finish
    pub fn stop(&mut self) {
        let Some(mut unmounter) = self.unmounter.take() else {
            return;
        };

        info!("Unmounting {:?}", self.path);
        self.stopping.store(true, Ordering::SeqCst);

        if let Err(e) = unmounter.unmount() {
            // The loop is still running; joining would block forever
            warn!("Failed to unmount {:?}: {}", self.path, e);
            self.worker.take();
            return;
        }

        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                error!("FUSE worker for {:?} panicked", self.path);
            }
        }
    }
}

impl Drop for ActiveMount {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Mount manager - handles lifecycle of all mounts
pub struct MountManager {
    mounts: Mutex<Vec<ActiveMount>>,
}

impl MountManager {
    pub fn new() -> Self {
        Self {
            mounts: Mutex::new(Vec::new()),
        }
    }

    /// Mount a connector as described by `config`
    pub fn mount(&self, config: &MountConfig, connector: Arc<dyn Connector>) -> Result<()> {
        let path = &config.path;
        info!("Mounting at {:?}", path);

        if !path.exists() {
            return Err(AccountFsError::NotFound(format!(
                "Mount point does not exist: {:?}",
                path
            )));
        }

        if !path.is_dir() {
            return Err(AccountFsError::NotADirectory(format!(
                "Mount point is not a directory: {:?}",
                path
            )));
        }

        let active = ActiveMount::start(path.clone(), connector, mount_options(&config.fsname))?;
        self.mounts.lock().push(active);

        info!("Successfully mounted at {:?}", path);
        Ok(())
    }

    /// Unmount a specific path
    pub fn unmount(&self, path: &Path) -> Result<()> {
        let mut mounts = self.mounts.lock();
        if let Some(pos) = mounts.iter().position(|m| m.path == path) {
            let mut mount = mounts.remove(pos);
            mount.stop();
            Ok(())
        } else {
            Err(AccountFsError::NotFound(format!("No mount at {:?}", path)))
        }
    }

    /// Unmount all filesystems
    pub fn unmount_all(&self) {
        let mut mounts = self.mounts.lock();
        for mut mount in mounts.drain(..) {
            mount.stop();
        }
    }

    /// Whether every mount still has a live worker
    pub fn all_running(&self) -> bool {
        self.mounts.lock().iter().all(ActiveMount::is_running)
    }

    /// Get list of active mount paths
    pub fn list_mounts(&self) -> Vec<PathBuf> {
        self.mounts.lock().iter().map(|m| m.path.clone()).collect()
    }
}

impl Default for MountManager {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for MountManager {
    fn drop(&mut self) {
        self.unmount_all();
    }
}
