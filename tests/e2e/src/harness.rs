//! Test harness for e2e tests
//!
//! Writes a config into a temporary directory, mounts accountfs there and
//! tears everything down again.

use crate::mount::MountedAccountFs;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tempfile::TempDir;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Opt-in switch for tests that add and remove host accounts
pub const MUTATE_ENV: &str = "ACCOUNTFS_E2E_MUTATE";

static NAME_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Initialize logging for tests (call once per test run)
pub fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_test_writer()
        .try_init();
}

/// Mounting needs `/dev/fuse`, and the account database is only writable
/// (and fully readable) as root
pub fn fuse_supported() -> bool {
    Path::new("/dev/fuse").exists() && nix::unistd::geteuid().is_root()
}

/// Whether tests may create and delete accounts on this host
pub fn mutations_enabled() -> bool {
    std::env::var(MUTATE_ENV).is_ok_and(|v| v == "1")
}

/// A short, lowercase account name unlikely to collide with a real user
pub fn unique_account_name() -> String {
    let n = NAME_COUNTER.fetch_add(1, Ordering::SeqCst);
    format!("afs{}x{}", std::process::id(), n)
}

/// A mounted accountfs with its scratch directory
pub struct TestHarness {
    adapter: MountedAccountFs,
    config_path: PathBuf,
    log_path: PathBuf,
    _temp_dir: TempDir,
}

impl TestHarness {
    /// Mount with the default test configuration
    pub async fn new() -> Result<Self> {
        Self::with_fsname("accountfs-e2e").await
    }

    /// Mount with a specific filesystem name
    pub async fn with_fsname(fsname: &str) -> Result<Self> {
        init_logging();

        let temp_dir = TempDir::new().context("Failed to create temp dir")?;
        let mount_point = temp_dir.path().join("users");
        let config_path = temp_dir.path().join("accountfs.yaml");
        let log_path = temp_dir.path().join("accountfs.log");

        let config = format!(
            "logging:\n  level: debug\n  file: {}\nmount:\n  path: {}\n  fsname: {}\n  create_mount_point: true\n",
            log_path.display(),
            mount_point.display(),
            fsname,
        );
        std::fs::write(&config_path, config).context("Failed to write config")?;

        let adapter = MountedAccountFs::start(&config_path, &mount_point).await?;
        info!("accountfs mounted at {:?}", mount_point);

        Ok(Self {
            adapter,
            config_path,
            log_path,
            _temp_dir: temp_dir,
        })
    }

    /// Mount, or return `None` when this host cannot run FUSE tests
    pub async fn start_if_supported() -> Result<Option<Self>> {
        if !fuse_supported() {
            warn!("Skipping: requires root and /dev/fuse");
            return Ok(None);
        }
        Self::new().await.map(Some)
    }

    /// The mount root
    pub fn mount(&self) -> &Path {
        self.adapter.mount()
    }

    /// Path of an entry below the mount root
    pub fn path(&self, relative: &str) -> PathBuf {
        self.mount().join(relative)
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Contents of the daemon's log file so far
    pub fn log(&self) -> String {
        std::fs::read_to_string(&self.log_path).unwrap_or_default()
    }

    pub fn adapter_mut(&mut self) -> &mut MountedAccountFs {
        &mut self.adapter
    }

    /// Stop accountfs and remove the scratch directory
    pub async fn cleanup(mut self) -> Result<()> {
        self.adapter.stop().await
    }
}
