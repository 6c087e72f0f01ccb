//! Exit codes for the CLI

use liftoff_core::LiftoffError;

/// Success
pub const SUCCESS: u8 = 0;

/// General error
pub const ERROR: u8 = 1;

/// Configuration error
pub const CONFIG_ERROR: u8 = 2;

/// Hosting or git error
pub const HOSTING_ERROR: u8 = 3;

/// Version error
pub const VERSION_ERROR: u8 = 4;

/// A release could not be built
pub const RELEASE_ERROR: u8 = 5;

/// Exit code for an error returned by a command
pub fn for_error(error: &anyhow::Error) -> u8 {
    match error.downcast_ref::<LiftoffError>() {
        Some(LiftoffError::Config(_)) => CONFIG_ERROR,
        Some(LiftoffError::Hosting(_)) => HOSTING_ERROR,
        Some(LiftoffError::Version(_)) => VERSION_ERROR,
        Some(LiftoffError::Release(_) | LiftoffError::Workspace(_) | LiftoffError::Updater(_)) => {
            RELEASE_ERROR
        }
        _ => ERROR,
    }
}
