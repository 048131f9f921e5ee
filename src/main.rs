//! accountfs daemon entry point

use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

use accountfs::accounts::SystemAccounts;
use accountfs::config::{Config, LoggingConfig};
use accountfs::connector::{AccountConnector, Connector};
use accountfs::mount::MountManager;
use accountfs::process::SystemRunner;

/// Print usage information
fn print_usage() {
    eprintln!("Usage: accountfs [config.yaml]");
    eprintln!();
    eprintln!("accountfs - browse and manage user accounts as a filesystem");
    eprintln!();
    eprintln!("Arguments:");
    eprintln!("  config.yaml    Optional path to configuration file");
    eprintln!();
    eprintln!("Without a configuration file the account tree is mounted at /opt/users.");
}

/// Initialize logging to stderr, or to the configured file
fn init_logging(logging: &LoggingConfig) -> Result<(), Box<dyn std::error::Error>> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));

    match &logging.file {
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .init();
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Parse arguments
    let args: Vec<String> = std::env::args().collect();
    let config_path = match args.as_slice() {
        [_] => None,
        [_, flag] if flag == "-h" || flag == "--help" => {
            print_usage();
            return Ok(());
        }
        [_, path] => Some(PathBuf::from(path)),
        _ => {
            print_usage();
            std::process::exit(1);
        }
    };

    // Load configuration
    let config = match &config_path {
        Some(path) => match Config::from_file(path) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Failed to load config: {}", e);
                std::process::exit(1);
            }
        },
        None => Config::default(),
    };

    if let Err(e) = config.validate() {
        eprintln!("Configuration error: {}", e);
        std::process::exit(1);
    }

    init_logging(&config.logging)?;

    info!("accountfs starting");
    match &config_path {
        Some(path) => info!("Loaded configuration from {:?}", path),
        None => info!("No configuration file given, using defaults"),
    }

    let mount_path = &config.mount.path;
    if !mount_path.exists() && config.mount.create_mount_point {
        debug!("Creating mount point directory {:?}", mount_path);
        if let Err(e) = std::fs::create_dir_all(mount_path) {
            error!("Failed to create mount point {:?}: {}", mount_path, e);
            std::process::exit(1);
        }
    }

    let connector: Arc<dyn Connector> = Arc::new(AccountConnector::new(
        Arc::new(SystemAccounts::new()),
        Arc::new(SystemRunner::new()),
    ));

    let manager = Arc::new(MountManager::new());

    // Set up signal handling for graceful shutdown
    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    let m = manager.clone();

    ctrlc::set_handler(move || {
        info!("Received shutdown signal");
        r.store(false, Ordering::SeqCst);
        m.unmount_all();
    })?;

    if let Err(e) = manager.mount(&config.mount, connector) {
        error!("Failed to mount {:?}: {}", mount_path, e);
        std::process::exit(1);
    }

    info!("Account tree mounted at {:?}", manager.list_mounts());
    info!("Press Ctrl+C to unmount and exit");

    // Wait for a shutdown signal, or for the session to end on its own
    // (e.g. `fusermount -u` from outside)
    while running.load(Ordering::SeqCst) && manager.all_running() {
        tokio::time::sleep(tokio::time::Duration::from_secs(1)).await;
    }

    if running.load(Ordering::SeqCst) {
        warn!("FUSE session ended without a shutdown signal");
    }

    info!("Shutting down");
    manager.unmount_all();
    info!("Unmounted, exiting");

    Ok(())
}
