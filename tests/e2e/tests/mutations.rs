//! Creating and deleting directories

mod common;

use common::*;
use std::fs;

fuse_test!(test_mkdir_inside_account_is_rejected, |h: &TestHarness| {
    let path = h.path("root/extra");
    async move {
        assert_errno(fs::create_dir(&path), libc::EPERM);
        Ok(())
    }
});

fuse_test!(test_mkdir_existing_account_fails, |h: &TestHarness| {
    let path = h.path("root");
    async move {
        assert_errno(fs::create_dir(&path), libc::EEXIST);
        Ok(())
    }
});

fuse_test!(test_rmdir_missing_account_fails, |h: &TestHarness| {
    let path = h.path("accountfs-no-such-user");
    async move {
        assert_errno(fs::remove_dir(&path), libc::ENOENT);
        Ok(())
    }
});

fuse_test!(test_files_cannot_be_created, |h: &TestHarness| {
    let path = h.path("root/notes");
    async move {
        assert!(fs::write(&path, b"hello").is_err());
        assert_errno(fs::metadata(&path), libc::ENOENT);
        Ok(())
    }
});

mutating_test!(test_mkdir_creates_account, |h: &TestHarness| {
    let name = unique_account_name();
    let dir = h.path(&name);
    async move {
        fs::create_dir(&dir)?;

        assert_dir_exists(&dir);
        let user = nix::unistd::User::from_name(&name)?
            .ok_or_else(|| anyhow::anyhow!("{} was not created", name))?;
        assert_field(&dir.join("id"), &user.uid.to_string());
        assert_field(&dir.join("home"), &user.dir.to_string_lossy());

        fs::remove_dir(&dir)?;
        Ok(())
    }
});

mutating_test!(test_rmdir_deletes_account, |h: &TestHarness| {
    let name = unique_account_name();
    let dir = h.path(&name);
    async move {
        fs::create_dir(&dir)?;
        fs::remove_dir(&dir)?;

        assert_not_exists(&dir);
        assert!(nix::unistd::User::from_name(&name)?.is_none());
        assert_errno(fs::remove_dir(&dir), libc::ENOENT);
        Ok(())
    }
});

mutating_test!(test_external_changes_are_visible, |h: &TestHarness| {
    // Nothing is cached, so an account added behind our back shows up
    // on the next lookup
    let name = unique_account_name();
    let dir = h.path(&name);
    async move {
        assert_not_exists(&dir);

        let status = std::process::Command::new("adduser")
            .args(["--disabled-password", "--gecos", "", &name])
            .stdout(std::process::Stdio::null())
            .stderr(std::process::Stdio::null())
            .status()?;
        anyhow::ensure!(status.success(), "adduser {} failed", name);

        assert_dir_exists(&dir);

        std::process::Command::new("userdel")
            .args(["--remove", &name])
            .status()?;
        assert_not_exists(&dir);
        Ok(())
    }
});
