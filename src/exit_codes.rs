//! Exit code standardization for rmon
//!
//! ## Exit Code Convention
//!
//! - `0` = Success
//! - `1` = User error (invalid filter input, unknown category or region)
//! - `2` = System error (API failure, network error, I/O)
//! - `3` = Configuration or authentication error (bad config, not logged in)

use crate::error::RmonError;

/// Standard exit codes for rmon
pub mod codes {
    /// Success
    pub const SUCCESS: i32 = 0;
    /// User error (invalid input, validation failure)
    pub const USER_ERROR: i32 = 1;
    /// System error (API failure, network error)
    pub const SYSTEM_ERROR: i32 = 2;
    /// Configuration error (missing config, invalid credentials)
    pub const CONFIG_ERROR: i32 = 3;
}

/// Map an RmonError to an appropriate exit code
pub fn exit_code_for_error(error: &RmonError) -> i32 {
    use RmonError::*;
    match error {
        Config(_) | Auth(_) => codes::CONFIG_ERROR,

        Validation { .. } => codes::USER_ERROR,

        Api { status: 401 | 403, .. } => codes::CONFIG_ERROR,
        Api { .. } => codes::SYSTEM_ERROR,
        Network(_) => codes::SYSTEM_ERROR,
        SourceUnavailable { .. } => codes::SYSTEM_ERROR,
        Retryable { .. } => codes::SYSTEM_ERROR,
        Io(_) => codes::SYSTEM_ERROR,
        Json(_) => codes::SYSTEM_ERROR,
    }
}

/// Exit code for an error bubbled up through `anyhow` in `main`
pub fn exit_code_for_anyhow(error: &anyhow::Error) -> i32 {
    if let Some(err) = error.downcast_ref::<RmonError>() {
        return exit_code_for_error(err);
    }
    if error.downcast_ref::<crate::error::ConfigError>().is_some()
        || error.downcast_ref::<toml::de::Error>().is_some()
    {
        return codes::CONFIG_ERROR;
    }
    codes::SYSTEM_ERROR
}
