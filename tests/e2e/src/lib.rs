//! E2E test harness for accountfs
//!
//! Starts the real `accountfs` binary against a temporary mount point and
//! drives it through ordinary filesystem calls. The host's account database
//! is the backend, so these tests need root and `/dev/fuse`; without them
//! every test skips itself.
//!
//! Tests that create or delete accounts additionally require
//! `ACCOUNTFS_E2E_MUTATE=1`.
//!
//! ## Quick Start
//!
//! ```ignore
//! use accountfs_e2e::TestHarness;
//!
//! #[tokio::test]
//! async fn my_test() -> anyhow::Result<()> {
//!     let Some(harness) = TestHarness::start_if_supported().await? else {
//!         return Ok(());
//!     };
//!     // ... test using harness.mount() ...
//!     harness.cleanup().await
//! }
//! ```

pub mod assertions;
pub mod harness;

pub use assertions::*;
pub use harness::{fuse_supported, init_logging, mutations_enabled, unique_account_name, TestHarness};
pub use mount::MountedAccountFs;
