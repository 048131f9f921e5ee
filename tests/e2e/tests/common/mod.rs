//! Common test utilities and fixtures

pub use accountfs_e2e::*;

/// A test against a freshly mounted accountfs.
///
/// Skips (passes) on hosts without root or `/dev/fuse`.
///
/// # Example
/// ```ignore
/// fuse_test!(test_root_is_listed, |h| async move {
///     assert!(list_names(h.mount()).contains(&"root".to_string()));
///     Ok(())
/// });
/// ```
#[macro_export]
macro_rules! fuse_test {
    ($test_name:ident, $body:expr) => {
        #[tokio::test]
        async fn $test_name() -> anyhow::Result<()> {
            let Some(harness) = $crate::common::TestHarness::start_if_supported().await? else {
                return Ok(());
            };
            let result: anyhow::Result<()> = ($body)(&harness).await;
            harness.cleanup().await?;
            result
        }
    };
}

/// Like [`fuse_test!`], but also requires `ACCOUNTFS_E2E_MUTATE=1` since
/// the body adds or removes host accounts.
#[macro_export]
macro_rules! mutating_test {
    ($test_name:ident, $body:expr) => {
        #[tokio::test]
        async fn $test_name() -> anyhow::Result<()> {
            if !$crate::common::mutations_enabled() {
                return Ok(());
            }
            let Some(harness) = $crate::common::TestHarness::start_if_supported().await? else {
                return Ok(());
            };
            let result: anyhow::Result<()> = ($body)(&harness).await;
            harness.cleanup().await?;
            result
        }
    };
}
