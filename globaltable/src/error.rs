//! Error types and result definitions for reconciliation passes.
//!
//! A [`ReconcileError`] carries an [`ErrorKind`] used for classification, a static description,
//! optional dynamic detail and an optional source error, together with the call site that
//! created it. One reconciliation invocation fails with exactly one such error.

use std::backtrace::Backtrace;
use std::borrow::Cow;
use std::error;
use std::fmt;
use std::panic::Location;
use std::sync::Arc;

/// Result type used across the crate.
pub type ReconcileResult<T> = Result<T, ReconcileError>;

/// Categories of failures that can end a reconciliation pass.
#[derive(PartialEq, Eq, Copy, Clone, Debug, Hash)]
#[non_exhaustive]
pub enum ErrorKind {
    // Waiting
    /// A bounded wait ran out of attempts before its condition held.
    PollTimeout,

    // Structural preconditions
    /// The live configuration cannot be reconciled, e.g. a master table without the required
    /// stream or a tag set that does not fit a single listing page.
    UnsupportedConfiguration,
    /// The reconciler was asked to do something that would violate its own invariants.
    InvalidState,

    // Remote store
    RemoteCallFailed,
    RemoteThrottled,
    RemotePermissionDenied,
    RemoteValidationFailed,
    RemoteResourceInUse,
    RemoteLimitExceeded,
    /// A resource that must exist is missing. Existence checks never produce this kind.
    ResourceNotFound,
    RequestBuildFailed,

    // Lifecycle events
    InvalidProperties,
    UnsupportedResourceType,

    // Infrastructure
    ConfigError,
    IoError,
    SerializationError,
    DeserializationError,

    Unknown,
}

impl ErrorKind {
    /// Returns `true` for failures reported by the remote store.
    pub fn is_remote(&self) -> bool {
        matches!(
            self,
            ErrorKind::RemoteCallFailed
                | ErrorKind::RemoteThrottled
                | ErrorKind::RemotePermissionDenied
                | ErrorKind::RemoteValidationFailed
                | ErrorKind::RemoteResourceInUse
                | ErrorKind::RemoteLimitExceeded
                | ErrorKind::ResourceNotFound
        )
    }
}

/// Error raised by a reconciliation pass.
#[derive(Debug, Clone)]
pub struct ReconcileError {
    kind: ErrorKind,
    description: Cow<'static, str>,
    detail: Option<Cow<'static, str>>,
    source: Option<Arc<dyn error::Error + Send + Sync>>,
    location: &'static Location<'static>,
    backtrace: Arc<Backtrace>,
}

impl ReconcileError {
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn detail(&self) -> Option<&str> {
        self.detail.as_deref()
    }

    pub fn backtrace(&self) -> &Backtrace {
        self.backtrace.as_ref()
    }

    /// Attaches the originating error, exposed through [`error::Error::source`].
    pub fn with_source<E>(mut self, source: E) -> Self
    where
        E: error::Error + Send + Sync + 'static,
    {
        self.source = Some(Arc::new(source));
        self
    }

    /// Returns the attached source if it is of type `E`.
    pub fn source_as<E>(&self) -> Option<&E>
    where
        E: error::Error + 'static,
    {
        error::Error::source(self)?.downcast_ref::<E>()
    }

    /// Human readable message without location or backtrace, suitable for reporting the
    /// failure back to the orchestrator.
    pub fn message(&self) -> String {
        match &self.detail {
            Some(detail) => format!("{}: {}", self.description, detail),
            None => self.description.to_string(),
        }
    }

    #[track_caller]
    fn from_components(
        kind: ErrorKind,
        description: Cow<'static, str>,
        detail: Option<Cow<'static, str>>,
    ) -> Self {
        ReconcileError {
            kind,
            description,
            detail,
            source: None,
            location: Location::caller(),
            backtrace: Arc::new(Backtrace::capture()),
        }
    }
}

impl PartialEq for ReconcileError {
    fn eq(&self, other: &ReconcileError) -> bool {
        self.kind == other.kind && self.description == other.description
    }
}

impl fmt::Display for ReconcileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{:?}] {} @ {}:{}:{}",
            self.kind,
            self.description,
            self.location.file(),
            self.location.line(),
            self.location.column()
        )?;

        if let Some(detail) = &self.detail {
            write!(f, "\n  Detail:")?;
            for line in detail.lines() {
                write!(f, "\n    {line}")?;
            }
        }

        Ok(())
    }
}

impl error::Error for ReconcileError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|source| source.as_ref() as &(dyn error::Error + 'static))
    }
}

impl From<(ErrorKind, &'static str)> for ReconcileError {
    #[track_caller]
    fn from((kind, desc): (ErrorKind, &'static str)) -> ReconcileError {
        ReconcileError::from_components(kind, Cow::Borrowed(desc), None)
    }
}

impl<D> From<(ErrorKind, &'static str, D)> for ReconcileError
where
    D: Into<Cow<'static, str>>,
{
    #[track_caller]
    fn from((kind, desc, detail): (ErrorKind, &'static str, D)) -> ReconcileError {
        ReconcileError::from_components(kind, Cow::Borrowed(desc), Some(detail.into()))
    }
}

impl From<std::io::Error> for ReconcileError {
    #[track_caller]
    fn from(err: std::io::Error) -> ReconcileError {
        let detail = err.to_string();
        ReconcileError::from_components(
            ErrorKind::IoError,
            Cow::Borrowed("I/O operation failed"),
            Some(Cow::Owned(detail)),
        )
        .with_source(err)
    }
}

impl From<serde_json::Error> for ReconcileError {
    #[track_caller]
    fn from(err: serde_json::Error) -> ReconcileError {
        let (kind, description) = match err.classify() {
            serde_json::error::Category::Io => (ErrorKind::IoError, "JSON I/O operation failed"),
            serde_json::error::Category::Syntax
            | serde_json::error::Category::Data
            | serde_json::error::Category::Eof => (
                ErrorKind::DeserializationError,
                "JSON deserialization failed",
            ),
        };

        let detail = err.to_string();
        ReconcileError::from_components(kind, Cow::Borrowed(description), Some(Cow::Owned(detail)))
            .with_source(err)
    }
}

impl From<config::shared::ValidationError> for ReconcileError {
    #[track_caller]
    fn from(err: config::shared::ValidationError) -> ReconcileError {
        let detail = err.to_string();
        ReconcileError::from_components(
            ErrorKind::ConfigError,
            Cow::Borrowed("Invalid reconciler configuration"),
            Some(Cow::Owned(detail)),
        )
        .with_source(err)
    }
}
