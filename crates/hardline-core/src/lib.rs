//! # Hardline Core Library
//!
//! Core functionality for the hardline flight-radio bridge.
//!
//! This library provides:
//! - Frame extraction and validation for the radio link wire format
//! - Serial link management with retry-until-connected semantics
//! - The two directional forwarding pipelines (telemetry and commands)
//! - Supervision and restart of both pipelines
//!
//! ## Example
//!
//! ```rust,ignore
//! use hardline_core::bridge::{BridgeConfig, Supervisor};
//!
//! let config = BridgeConfig::default();
//! let supervisor = Supervisor::new(config);
//!
//! // Signal glue calls supervisor.control().shutdown() on interrupt.
//! supervisor.run()?;
//! ```

#![warn(missing_docs)]

pub mod bridge;
pub mod protocol;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::bridge::{BridgeConfig, ConsumePolicy, Control, Supervisor};
    pub use crate::protocol::{split_candidates, BridgeError, Frame, FrameReject};
}

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
