//! Error taxonomy for the archive engine.

use thiserror::Error;

/// Errors produced by history replay, the archive façade, envelope
/// crypto, datasources, and the workspace coordinator.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// A history line was malformed: unknown slug, bad quoting, or the
    /// wrong number of arguments for its slug.
    #[error("invalid command: {0}")]
    InvalidCommand(String),

    /// A command referenced an entity ID that does not exist.
    #[error("entity not found: {0}")]
    EntityNotFound(String),

    /// A creation command collided with an existing ID.
    #[error("duplicate id: {0}")]
    DuplicateID(String),

    /// A move would create a cycle (a group moved into its own descendant).
    #[error("invalid move: {0}")]
    InvalidMove(String),

    /// The envelope signature line was missing or names an incompatible
    /// major version.
    #[error("unrecognized envelope format: {0}")]
    UnrecognizedFormat(String),

    /// Decryption failed: wrong password, tampered ciphertext, bad
    /// HMAC, truncated packet, or remote authentication failure.
    #[error("authentication failure: {0}")]
    AuthenticationFailure(String),

    /// A datasource transport operation failed.
    #[error("network error: {0}")]
    NetworkError(String),

    /// The remote datasource rejected a save (e.g. an ETag mismatch).
    #[error("conflict: {0}")]
    Conflict(String),

    /// Replay produced an inconsistent tree. This indicates a bug in the
    /// executor or a corrupted history and is treated as fatal.
    #[error("internal invariant violated: {0}")]
    InternalInvariant(String),
}

impl Error {
    /// Abort the process. Called at the one site where an
    /// [`Error::InternalInvariant`] is detected post-replay, per the
    /// contract that this class of error must never be silently
    /// tolerated.
    pub fn abort_on_internal_invariant(&self) -> ! {
        panic!("fatal internal invariant violation: {}", self);
    }
}

pub type Result<T> = std::result::Result<T, Error>;
