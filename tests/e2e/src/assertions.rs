//! Filesystem assertions for e2e tests

use std::fs;
use std::io;
use std::path::Path;

/// Assert that a directory exists at the given path
pub fn assert_dir_exists(path: &Path) {
    assert!(
        path.is_dir(),
        "Expected directory to exist at {:?}, but it doesn't or is not a directory",
        path
    );
}

/// Assert that a file exists at the given path
pub fn assert_file_exists(path: &Path) {
    assert!(
        path.is_file(),
        "Expected file to exist at {:?}, but it doesn't or is not a file",
        path
    );
}

/// Assert that a path does not exist at all
pub fn assert_not_exists(path: &Path) {
    assert!(
        fs::symlink_metadata(path).is_err(),
        "Expected path {:?} to not exist, but it does",
        path
    );
}

/// Read an account field file as text
pub fn read_field(path: &Path) -> String {
    let bytes = fs::read(path).unwrap_or_else(|e| panic!("Failed to read {:?}: {}", path, e));
    String::from_utf8(bytes).unwrap_or_else(|e| panic!("{:?} is not UTF-8: {}", path, e))
}

/// Assert that a field file holds exactly `expected`
pub fn assert_field(path: &Path, expected: &str) {
    assert_eq!(read_field(path), expected, "Field mismatch at {:?}", path);
}

/// Names listed in a directory, sorted
pub fn list_names(path: &Path) -> Vec<String> {
    let mut names = list_names_in_order(path);
    names.sort();
    names
}

/// Names listed in a directory, in the order the filesystem returned them
pub fn list_names_in_order(path: &Path) -> Vec<String> {
    fs::read_dir(path)
        .unwrap_or_else(|e| panic!("Failed to list {:?}: {}", path, e))
        .map(|entry| {
            entry
                .unwrap_or_else(|e| panic!("Failed to read entry in {:?}: {}", path, e))
                .file_name()
                .to_string_lossy()
                .into_owned()
        })
        .collect()
}

/// Assert that an operation failed with the given errno
pub fn assert_errno<T: std::fmt::Debug>(result: io::Result<T>, errno: i32) {
    match result {
        Ok(value) => panic!("Expected errno {}, but the call succeeded with {:?}", errno, value),
        Err(e) => assert_eq!(
            e.raw_os_error(),
            Some(errno),
            "Expected errno {}, got {}",
            errno,
            e
        ),
    }
}
