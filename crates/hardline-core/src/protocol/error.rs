//! Bridge errors

use thiserror::Error;

/// Errors that terminate a pipeline run
#[derive(Error, Debug)]
pub enum BridgeError {
    /// The flight data port failed after it was established
    #[error("serial port error: {0}")]
    Serial(#[from] serialport::Error),

    /// A socket operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Shutdown was requested while the pipeline was blocked or polling.
    /// Distinct from every failure so the supervisor can tell a signal
    /// cancellation apart from a fault that warrants a restart.
    #[error("shutdown requested")]
    Shutdown,
}
