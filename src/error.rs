//! Error types and the process exit-code taxonomy.
//!
//! All operations return [`Result<T>`](Result). The first error anywhere
//! aborts the whole run; there is no retry and no partial recovery. Output
//! already flushed before a failure stays where it was written; callers must
//! not assume the output stream is atomic.

use std::collections::TryReserveError;

use thiserror::Error;

/// The error type for all streambox operations.
///
/// Each variant maps to one stable process exit code, see [`Error::exit_code`].
#[derive(Debug, Error)]
pub enum Error {
    /// Read or write failed, including short writes to the output stream.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Bad arguments or out-of-range cost parameters at encrypt time.
    #[error("{0}")]
    Usage(String),

    /// The environment is unusable: entropy source failure, unsuitable
    /// input file, or a diagnostics setup problem.
    #[error("{0}")]
    Environment(String),

    /// A chunk buffer could not be allocated.
    #[error("couldn't allocate buffers: {0}")]
    Alloc(#[from] TryReserveError),

    /// The process-wide memory lock could not be acquired.
    #[error("couldn't lock process memory: {0}")]
    MemoryLock(std::io::Error),

    /// The key-derivation function failed.
    #[error("key derivation failed: {0}")]
    Derivation(String),

    /// Malformed or tampered ciphertext structure at decrypt time: bad magic
    /// tag, out-of-range header parameters, a nonzero structural prefix, or
    /// a truncated chunk.
    #[error("invalid input: {0}")]
    Format(String),
}

impl Error {
    /// Stable exit code for this error.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Io(_) => 1,
            Self::Usage(_) => 2,
            Self::Environment(_) => 3,
            Self::Alloc(_) => 4,
            Self::MemoryLock(_) => 5,
            Self::Derivation(_) => 6,
            Self::Format(_) => 11,
        }
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;
