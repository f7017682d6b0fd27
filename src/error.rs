//! Error reporting bridge between the provider and its host.
//!
//! Failures that the host is expected to display travel through two channels:
//! the `Result` returned to the immediate caller, and the host's own error
//! facility reached through an [`ErrorReporter`] upcall. [`ErrorBridge::raise`]
//! feeds the second channel, tagging each report with the source location of
//! the raising call. The bridge only surfaces; it never recovers.

use std::fmt;
use std::panic::Location;
use std::sync::Arc;

use log::debug;
use thiserror::Error;

use crate::params::ParamKind;

/// Reason codes surfaced to the host, with the wire values the host displays.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ReasonCode {
    /// Init requested an unspecified key length with none previously configured.
    NoKeyLengthSet,
    /// Key length reconfiguration was attempted while a transform is mid-stream.
    OngoingOperation,
    /// Reserved for future key-length validation; never raised today.
    IncorrectKeyLength,
}

impl ReasonCode {
    pub const fn code(self) -> u32 {
        match self {
            ReasonCode::NoKeyLengthSet => 1,
            ReasonCode::OngoingOperation => 2,
            ReasonCode::IncorrectKeyLength => 3,
        }
    }

    pub const fn message(self) -> &'static str {
        match self {
            ReasonCode::NoKeyLengthSet => "no key length has been set",
            ReasonCode::OngoingOperation => "an operation is underway",
            ReasonCode::IncorrectKeyLength => "incorrect key length",
        }
    }
}

/// One entry of the static reason table handed to the host.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReasonString {
    pub code: u32,
    pub text: &'static str,
}

static REASON_STRINGS: [ReasonString; 3] = [
    ReasonString {
        code: ReasonCode::NoKeyLengthSet.code(),
        text: ReasonCode::NoKeyLengthSet.message(),
    },
    ReasonString {
        code: ReasonCode::OngoingOperation.code(),
        text: ReasonCode::OngoingOperation.message(),
    },
    ReasonString {
        code: ReasonCode::IncorrectKeyLength.code(),
        text: ReasonCode::IncorrectKeyLength.message(),
    },
];

/// Returns the static mapping of reason codes to display text.
pub fn reason_strings() -> &'static [ReasonString] {
    &REASON_STRINGS
}

/// Source position attached to a raised error for diagnostics.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SourceLocation {
    pub file: &'static str,
    pub line: u32,
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file, self.line)
    }
}

/// Host-supplied sink for raised errors.
pub trait ErrorReporter: Send + Sync {
    fn report(&self, reason: ReasonCode, location: Option<SourceLocation>);
}

/// Records provider errors against the host's error facility.
#[derive(Clone)]
pub struct ErrorBridge {
    reporter: Arc<dyn ErrorReporter>,
}

impl ErrorBridge {
    pub fn new(reporter: Arc<dyn ErrorReporter>) -> Self {
        Self { reporter }
    }

    /// Records `reason` with the caller's source location attached.
    #[track_caller]
    pub fn raise(&self, reason: ReasonCode) {
        let caller = Location::caller();
        let location = SourceLocation {
            file: caller.file(),
            line: caller.line(),
        };
        debug!(
            "raising reason {} ({}) at {}",
            reason.code(),
            reason.message(),
            location
        );
        self.reporter.report(reason, Some(location));
    }
}

impl fmt::Debug for ErrorBridge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ErrorBridge").finish_non_exhaustive()
    }
}

/// Errors returned by provider, parameter, and cipher operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProviderError {
    #[error("no key length has been set")]
    NoKeyLengthSet,

    #[error("an operation is underway")]
    OngoingOperation,

    #[error("incorrect key length")]
    IncorrectKeyLength,

    #[error("output buffer of {capacity} bytes cannot hold {needed} bytes")]
    OutputBufferTooSmall { needed: usize, capacity: usize },

    #[error("no key material has been established")]
    KeyNotSet,

    #[error("parameter {name:?} expects {expected:?}, found {found:?}")]
    ParamKindMismatch {
        name: String,
        expected: ParamKind,
        found: ParamKind,
    },

    #[error("parameter {name:?} carries no value to apply")]
    ParamMissingValue { name: String },

    #[error("parameter {name:?} value does not fit the target range")]
    ParamValueOutOfRange { name: String },
}

impl From<ReasonCode> for ProviderError {
    fn from(reason: ReasonCode) -> Self {
        match reason {
            ReasonCode::NoKeyLengthSet => ProviderError::NoKeyLengthSet,
            ReasonCode::OngoingOperation => ProviderError::OngoingOperation,
            ReasonCode::IncorrectKeyLength => ProviderError::IncorrectKeyLength,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingReporter {
        seen: Mutex<Vec<(ReasonCode, Option<SourceLocation>)>>,
    }

    impl ErrorReporter for RecordingReporter {
        fn report(&self, reason: ReasonCode, location: Option<SourceLocation>) {
            self.seen.lock().unwrap().push((reason, location));
        }
    }

    #[test]
    fn reason_table_matches_codes() {
        let table = reason_strings();
        assert_eq!(table.len(), 3);
        assert_eq!(table[0].code, 1);
        assert_eq!(table[0].text, "no key length has been set");
        assert_eq!(table[1].code, 2);
        assert_eq!(table[1].text, "an operation is underway");
        assert_eq!(table[2].code, 3);
        assert_eq!(table[2].text, "incorrect key length");
    }

    #[test]
    fn raise_reaches_reporter_with_location() {
        let reporter = Arc::new(RecordingReporter::default());
        let bridge = ErrorBridge::new(reporter.clone());
        bridge.raise(ReasonCode::OngoingOperation);

        let seen = reporter.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].0, ReasonCode::OngoingOperation);
        let location = seen[0].1.expect("location attached");
        assert!(location.file.ends_with("error.rs"));
        assert!(location.line > 0);
    }

    #[test]
    fn reason_codes_convert_to_errors() {
        assert_eq!(
            ProviderError::from(ReasonCode::NoKeyLengthSet),
            ProviderError::NoKeyLengthSet
        );
        assert_eq!(
            ProviderError::from(ReasonCode::IncorrectKeyLength),
            ProviderError::IncorrectKeyLength
        );
    }
}
