// Communication with the microcontroller
//
// The regulator and the distance sensor only see the `Communicator` trait;
// `ZenohLink` is the transport used by the runtime.

use std::future::Future;

mod zenoh_link;

pub use zenoh_link::ZenohLink;

/// Error types for microcontroller communication
#[derive(Debug, thiserror::Error)]
pub enum CommError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Encoding error: {0}")]
    Encoding(#[from] serde_json::Error),

    #[error("Timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("No reply on {key}")]
    NoReply { key: &'static str },

    #[error("Microcontroller rejected request on {key}: {reason}")]
    Rejected { key: &'static str, reason: String },
}

impl CommError {
    pub(crate) fn transport(err: impl std::fmt::Display) -> Self {
        CommError::Transport(err.to_string())
    }
}

/// Channel to the microcontroller
///
/// Implementations must be shareable between the regulator task and other
/// callers; the returned futures are driven from tokio tasks.
pub trait Communicator: Send + Sync {
    /// Send normalized powers (-1.0..=1.0) for the left and right motor
    fn send_powers(
        &self,
        power_left: f32,
        power_right: f32,
    ) -> impl Future<Output = Result<(), CommError>> + Send;

    /// Request a raw distance reading
    fn request_distance(&self) -> impl Future<Output = Result<f32, CommError>> + Send;
}
