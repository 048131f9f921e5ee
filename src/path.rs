//! Path grammar for the account tree
//!
//! `/` is the root, `/<name>` is an account directory and `/<name>/<field>`
//! is one of the per-account files (`id`, `home`, `shell`). Nothing deeper
//! ever resolves. Tokens are never truncated: a token that is empty, longer
//! than [`MAX_TOKEN_LEN`] bytes or contains a NUL byte is malformed and the
//! whole path fails to resolve.

use std::fmt;

use crate::error::{AccountFsError, Result};

/// Maximum length in bytes of an account name or field name
pub const MAX_TOKEN_LEN: usize = 255;

/// Files present under every account directory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccountField {
    Id,
    Home,
    Shell,
}

impl AccountField {
    /// All fields, in listing order
    pub const ALL: [AccountField; 3] = [AccountField::Id, AccountField::Home, AccountField::Shell];

    /// Parse a file name; anything other than `id`, `home` or `shell` is `None`
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "id" => Some(AccountField::Id),
            "home" => Some(AccountField::Home),
            "shell" => Some(AccountField::Shell),
            _ => None,
        }
    }

    /// File name of this field
    pub fn name(self) -> &'static str {
        match self {
            AccountField::Id => "id",
            AccountField::Home => "home",
            AccountField::Shell => "shell",
        }
    }
}

impl fmt::Display for AccountField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Structural shape of a path, before any token is validated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathShape<'a> {
    /// `/`
    Root,
    /// `/<a>`
    Top(&'a str),
    /// `/<a>/<b>`
    Nested(&'a str, &'a str),
    /// Three or more segments
    Deep,
    /// Not an absolute path
    Malformed,
}

impl<'a> PathShape<'a> {
    /// Split a path on `/` without looking at what the segments contain
    pub fn of(path: &'a str) -> Self {
        let Some(rest) = path.strip_prefix('/') else {
            return PathShape::Malformed;
        };
        if rest.is_empty() {
            return PathShape::Root;
        }

        let mut segments = rest.splitn(3, '/');
        match (segments.next(), segments.next(), segments.next()) {
            (Some(name), None, _) => PathShape::Top(name),
            (Some(name), Some(field), None) => PathShape::Nested(name, field),
            _ => PathShape::Deep,
        }
    }
}

/// Resolved entity an incoming path refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathEntity<'a> {
    Root,
    AccountDir { name: &'a str },
    AccountFile { name: &'a str, field: AccountField },
}

impl<'a> PathEntity<'a> {
    /// Resolve a path string. Malformed, overlong or deeper-than-two-segment
    /// paths and unknown field names are all `NotFound`.
    pub fn resolve(path: &'a str) -> Result<Self> {
        let not_found = || AccountFsError::NotFound(path.to_string());

        match PathShape::of(path) {
            PathShape::Root => Ok(PathEntity::Root),
            PathShape::Top(name) => {
                let name = valid_token(name).ok_or_else(not_found)?;
                Ok(PathEntity::AccountDir { name })
            }
            PathShape::Nested(name, field) => {
                let name = valid_token(name).ok_or_else(not_found)?;
                let field = valid_token(field)
                    .and_then(AccountField::from_name)
                    .ok_or_else(not_found)?;
                Ok(PathEntity::AccountFile { name, field })
            }
            PathShape::Deep | PathShape::Malformed => Err(not_found()),
        }
    }
}

/// Check a single name or field token
pub fn valid_token(token: &str) -> Option<&str> {
    if token.is_empty() || token.len() > MAX_TOKEN_LEN || token.contains('\0') {
        return None;
    }
    Some(token)
}
