//! Read-only browsing of the account tree

mod common;

use common::*;
use std::fs;
use std::os::unix::fs::PermissionsExt;

fuse_test!(test_root_lists_root_account, |h: &TestHarness| {
    let names = list_names(h.mount());
    async move {
        assert!(names.contains(&"root".to_string()), "listing: {:?}", names);
        Ok(())
    }
});

fuse_test!(test_root_listing_only_has_interactive_shells, |h: &TestHarness| {
    let mount = h.mount().to_path_buf();
    async move {
        for name in list_names(&mount) {
            let shell = read_field(&mount.join(&name).join("shell"));
            assert!(shell.ends_with("sh"), "{} has shell {:?}", name, shell);
        }
        Ok(())
    }
});

fuse_test!(test_account_directory_has_three_fields, |h: &TestHarness| {
    let root = h.path("root");
    async move {
        assert_dir_exists(&root);
        assert_eq!(list_names_in_order(&root), ["id", "home", "shell"]);
        Ok(())
    }
});

fuse_test!(test_root_account_fields, |h: &TestHarness| {
    let root = h.path("root");
    async move {
        assert_field(&root.join("id"), "0");
        assert_field(&root.join("home"), "/root");
        assert!(read_field(&root.join("shell")).starts_with('/'));
        Ok(())
    }
});

fuse_test!(test_field_attributes, |h: &TestHarness| {
    let id = h.path("root/id");
    async move {
        assert_file_exists(&id);
        let meta = fs::metadata(&id)?;
        assert_eq!(meta.len(), 256);
        assert_eq!(meta.permissions().mode() & 0o777, 0o644);

        let dir = fs::metadata(id.parent().unwrap())?;
        assert_eq!(dir.permissions().mode() & 0o777, 0o755);
        Ok(())
    }
});

fuse_test!(test_unknown_account_is_missing, |h: &TestHarness| {
    let path = h.path("accountfs-no-such-user");
    async move {
        assert_not_exists(&path);
        assert_errno(fs::metadata(&path), libc::ENOENT);
        Ok(())
    }
});

fuse_test!(test_unknown_field_is_missing, |h: &TestHarness| {
    let path = h.path("root/password");
    async move {
        assert_errno(fs::metadata(&path), libc::ENOENT);
        Ok(())
    }
});

fuse_test!(test_field_is_not_a_directory, |h: &TestHarness| {
    let path = h.path("root/id");
    async move {
        assert_errno(fs::read_dir(&path), libc::ENOTDIR);
        Ok(())
    }
});

fuse_test!(test_account_not_listed_is_still_reachable, |h: &TestHarness| {
    // Service accounts with a nologin shell are hidden from the listing
    // but can be looked up by name
    let mount = h.mount().to_path_buf();
    async move {
        let listed = list_names(&mount);
        if let Ok(Some(daemon)) = nix::unistd::User::from_name("daemon") {
            if !daemon.shell.to_string_lossy().ends_with("sh") {
                assert!(!listed.contains(&"daemon".to_string()));
                assert_field(&mount.join("daemon/id"), &daemon.uid.to_string());
            }
        }
        Ok(())
    }
});
