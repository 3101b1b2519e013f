//! Scene error types

use super::handle::ObjectKind;
use super::resources::ResourceError;
use thiserror::Error;

/// Scene errors
///
/// Growth failure is not represented: running out of memory while doubling a
/// pool aborts the process.
#[derive(Debug, Error)]
pub enum SceneError {
    /// The handle's id is out of range, was never allocated, or was released
    #[error("Invalid {kind} handle: id {id}")]
    HandleInvalid {
        /// Kind of the pool that was queried
        kind: ObjectKind,
        /// Raw id carried by the handle
        id: u32,
    },

    /// The operation is not permitted on this object
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    /// The GPU resource collaborator failed
    #[error("Resource error: {0}")]
    Resource(#[from] ResourceError),
}

/// Result type for scene operations
pub type SceneResult<T> = Result<T, SceneError>;
