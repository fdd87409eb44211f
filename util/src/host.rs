//! Host platform (linux for example) utility functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::path::PathBuf;
use thiserror::Error;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Environment variable pointing at the root of the software installation.
/// Parameter files and session directories are resolved relative to it.
pub const SW_ROOT_ENV: &str = "ROVER_SW_ROOT";

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum HostError {
    #[error("The software root environment variable ({0}) is not set")]
    SwRootNotSet(&'static str),
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Get the software root directory from the environment.
pub fn get_sw_root() -> Result<PathBuf, HostError> {
    std::env::var_os(SW_ROOT_ENV)
        .map(PathBuf::from)
        .ok_or(HostError::SwRootNotSet(SW_ROOT_ENV))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_sw_root_error_names_variable() {
        let e = HostError::SwRootNotSet(SW_ROOT_ENV);
        assert!(e.to_string().contains("ROVER_SW_ROOT"));
    }
}
