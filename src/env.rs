//! Environment variable substitution for configuration text
//!
//! `${VAR_NAME}` anywhere in the configuration is replaced with the value
//! of the environment variable before the YAML is parsed, so a deployment
//! can set the mount point with e.g. `path: ${ACCOUNTFS_MOUNT}`.

use std::env;

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use crate::config::ConfigError;

/// Matches `${NAME}` where NAME is a portable shell variable name
static VAR_REF: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("variable pattern is valid")
});

/// Replace every `${VAR}` reference in `input`.
///
/// Fails with a validation error naming every variable that is not set;
/// nothing is substituted with an empty string silently.
pub fn substitute_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut missing: Vec<String> = Vec::new();

    let output = VAR_REF.replace_all(input, |caps: &Captures| {
        let name = &caps[1];
        env::var(name).unwrap_or_else(|_| {
            if !missing.iter().any(|m| m == name) {
                missing.push(name.to_string());
            }
            String::new()
        })
    });

    if !missing.is_empty() {
        return Err(ConfigError::ValidationError(format!(
            "Missing environment variables: {}",
            missing.join(", ")
        )));
    }

    Ok(output.into_owned())
}
