//! Error types for the GMDH engine.
//!
//! Two tracks, kept deliberately separate (see design notes):
//! - [`GmdhError`] is the hard-failure track: returned by `fit`/`predict`/the
//!   data utilities whenever an argument is structurally invalid. It is
//!   always returned at the API boundary before any numeric work begins.
//! - [`PersistError`] carries the non-raising exit-code contract for
//!   `save`/`load`.

/// Raised for structurally invalid arguments: shape mismatches, `k_best` too
/// small, bad time-series lags, malformed criterion compositions.
#[derive(Clone)]
pub struct GmdhError {
    message: String,
}

impl GmdhError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::new(message)
    }
}

impl std::fmt::Display for GmdhError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for GmdhError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GmdhError").field("message", &self.message).finish()
    }
}

impl std::error::Error for GmdhError {}

/// Exit codes for `save`/`load`, per the persistence contract: 0 success, 1
/// I/O failure, 2 malformed content, 3 wrong model family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersistCode {
    Io = 1,
    Malformed = 2,
    WrongFamily = 3,
}

#[derive(Clone)]
pub struct PersistError {
    code: PersistCode,
    message: String,
}

impl PersistError {
    pub fn new(code: PersistCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn code(&self) -> PersistCode {
        self.code
    }

    /// The exit code as specified by the persistence contract (1/2/3).
    pub fn exit_code(&self) -> u8 {
        self.code as u8
    }
}

impl std::fmt::Display for PersistError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for PersistError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersistError")
            .field("code", &self.code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for PersistError {}
