//! # Failure Reporter
//!
//! Fire-and-forget notifications to the user. Controllers call the reporter
//! after a store call settles; nothing they do depends on it.

use tracing::{info, warn};

/// Messages shown to the user.
pub mod messages {
    /// Initial page fetch failed.
    pub const FETCH_INITIAL_FAILED: &str = "Couldn't find listings";

    /// Load-more fetch failed.
    pub const FETCH_MORE_FAILED: &str = "Could not fetch listings";

    /// Listing removed from the store and the page.
    pub const DELETE_SUCCEEDED: &str = "Listing deleted successfully";

    /// Remote delete failed.
    pub const DELETE_FAILED: &str = "Could not delete listing";

    /// Profile update failed before anything was written.
    pub const PROFILE_UPDATE_FAILED: &str = "Error updating profile";

    /// Identity store updated, profile document not.
    pub const PROFILE_PARTIAL_SYNC: &str =
        "Profile name saved, but your public profile could not be updated";
}

/// Surfaces failures and successes to the user.
pub trait FailureReporter: Send + Sync {
    /// Reports a failed user action.
    fn report_error(&self, message: &str);

    /// Reports a completed user action.
    fn report_success(&self, message: &str);
}

/// Writes reports to the `estate::reporter` tracing target.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl FailureReporter for TracingReporter {
    fn report_error(&self, message: &str) {
        warn!(target: "estate::reporter", report = %message, "Reported error");
    }

    fn report_success(&self, message: &str) {
        info!(target: "estate::reporter", report = %message, "Reported success");
    }
}

/// Drops every report.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpReporter;

impl FailureReporter for NoOpReporter {
    fn report_error(&self, _message: &str) {}
    fn report_success(&self, _message: &str) {}
}
