use std::backtrace::Backtrace;
use std::error::Error;
use std::fmt;

use globaltable::error::ReconcileError;

/// Returns whether terminal output should include backtraces.
fn should_render_backtrace() -> bool {
    matches!(
        std::env::var("RUST_BACKTRACE").as_deref(),
        Ok("1") | Ok("full")
    )
}

pub type ReconcilerResult<T> = Result<T, ReconcilerError>;

/// Backtrace captured when an infrastructure error is created.
pub struct CapturedBacktrace(Backtrace);

impl CapturedBacktrace {
    fn capture() -> Self {
        Self(Backtrace::capture())
    }
}

impl fmt::Debug for CapturedBacktrace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Error type of the reconciler binary.
#[derive(Debug)]
pub enum ReconcilerError {
    /// The engine could not be set up.
    Reconcile(ReconcileError),
    Config(Box<dyn Error + Send + Sync>, CapturedBacktrace),
    /// The event could not be decoded or the response could not be encoded.
    Json(serde_json::Error, CapturedBacktrace),
    Io(std::io::Error, CapturedBacktrace),
    /// The event was handled and reported as failed.
    EventFailed(String),
}

impl ReconcilerError {
    /// Returns a short category label for this error.
    pub fn category(&self) -> &'static str {
        match self {
            ReconcilerError::Reconcile(_) => "reconciler error",
            ReconcilerError::Config(_, _) => "configuration error",
            ReconcilerError::Json(_, _) => "event encoding error",
            ReconcilerError::Io(_, _) => "i/o error",
            ReconcilerError::EventFailed(_) => "event failed",
        }
    }

    pub fn backtrace(&self) -> Option<&Backtrace> {
        match self {
            ReconcilerError::Reconcile(err) => Some(err.backtrace()),
            ReconcilerError::Config(_, cb) => Some(&cb.0),
            ReconcilerError::Json(_, cb) => Some(&cb.0),
            ReconcilerError::Io(_, cb) => Some(&cb.0),
            ReconcilerError::EventFailed(_) => None,
        }
    }

    pub fn config<E: Error + Send + Sync + 'static>(err: E) -> Self {
        ReconcilerError::Config(Box::new(err), CapturedBacktrace::capture())
    }

    /// Returns a user-oriented report for terminal output.
    pub fn render_report(&self) -> String {
        let mut out = String::new();
        out.push_str("reconciler failed\n");
        out.push_str(&format!("category: {}\n", self.category()));
        out.push_str(&format!("error: {self}\n"));

        let mut source = Error::source(self);
        let mut idx = 1usize;
        while let Some(err) = source {
            out.push_str(&format!("cause {idx}: {err}\n"));
            source = err.source();
            idx += 1;
        }

        if should_render_backtrace()
            && let Some(backtrace) = self.backtrace()
        {
            out.push_str("backtrace:\n");
            out.push_str(&backtrace.to_string());
            if !out.ends_with('\n') {
                out.push('\n');
            }
        }

        out
    }
}

impl fmt::Display for ReconcilerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReconcilerError::Reconcile(err) => write!(f, "{}", err.message()),
            ReconcilerError::Config(source, _) => write!(f, "configuration error: {source}"),
            ReconcilerError::Json(source, _) => write!(f, "event encoding error: {source}"),
            ReconcilerError::Io(source, _) => write!(f, "i/o error: {source}"),
            ReconcilerError::EventFailed(reason) => write!(f, "lifecycle event failed: {reason}"),
        }
    }
}

impl Error for ReconcilerError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ReconcilerError::Reconcile(err) => err.source(),
            ReconcilerError::Config(source, _) => Some(source.as_ref()),
            ReconcilerError::Json(source, _) => Some(source),
            ReconcilerError::Io(source, _) => Some(source),
            ReconcilerError::EventFailed(_) => None,
        }
    }
}

impl From<ReconcileError> for ReconcilerError {
    fn from(err: ReconcileError) -> Self {
        ReconcilerError::Reconcile(err)
    }
}

impl From<serde_json::Error> for ReconcilerError {
    fn from(err: serde_json::Error) -> Self {
        ReconcilerError::Json(err, CapturedBacktrace::capture())
    }
}

impl From<std::io::Error> for ReconcilerError {
    fn from(err: std::io::Error) -> Self {
        ReconcilerError::Io(err, CapturedBacktrace::capture())
    }
}
