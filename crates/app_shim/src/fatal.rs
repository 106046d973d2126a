//! Fatal error escalation
//!
//! Failed OS or GPU calls are not retried. Under [`FatalPolicy::Terminate`]
//! the error is formatted with its source chain, logged, written to stderr
//! and the process exits with status 1. [`FatalPolicy::Propagate`] hands
//! the error back unchanged instead.

use std::error::Error;
use std::fmt::Write as _;

use crate::config::FatalPolicy;
use crate::error::{FrameworkError, FrameworkResult};

/// Exit status used when terminating on a fatal error
pub const FATAL_EXIT_CODE: i32 = 1;

/// Apply the fatal policy to an error
///
/// Errors outside the fatal category (see [`FrameworkError::is_fatal`]) are
/// returned unchanged under either policy.
pub fn escalate<T>(policy: FatalPolicy, error: FrameworkError) -> FrameworkResult<T> {
    if !error.is_fatal() {
        return Err(error);
    }
    match policy {
        FatalPolicy::Propagate => {
            log::error!("{}", diagnostic(&error));
            Err(error)
        }
        FatalPolicy::Terminate => terminate(&error),
    }
}

/// Report a fatal error and end the process
pub fn terminate(error: &dyn Error) -> ! {
    let report = diagnostic(error);
    log::error!("{report}");
    log::logger().flush();
    eprintln!("{report}");
    std::process::exit(FATAL_EXIT_CODE)
}

/// Format an error and its source chain
pub fn diagnostic(error: &dyn Error) -> String {
    let mut report = format!("Fatal error: {error}");
    let mut source = error.source();
    while let Some(cause) = source {
        let _ = write!(report, "\n  caused by: {cause}");
        source = cause.source();
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::PlatformError;

    #[test]
    fn test_diagnostic_includes_source_chain() {
        let error = FrameworkError::from(PlatformError::InitializationFailed("no display".into()));
        let report = diagnostic(&error);
        assert!(report.starts_with("Fatal error: Platform error"));
        assert!(report.contains("no display"));
    }

    #[test]
    fn test_propagate_returns_error() {
        let result: FrameworkResult<()> =
            escalate(FatalPolicy::Propagate, PlatformError::Disconnected.into());
        assert!(matches!(result, Err(FrameworkError::Platform(PlatformError::Disconnected))));
    }

    #[test]
    fn test_non_fatal_errors_never_terminate() {
        let result: FrameworkResult<()> =
            escalate(FatalPolicy::Terminate, FrameworkError::HandleSpaceExhausted);
        assert!(matches!(result, Err(FrameworkError::HandleSpaceExhausted)));
    }
}
