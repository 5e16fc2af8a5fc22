//! Logging and metrics for Portcullis.
//!
//! - **Logging**: a `tracing-subscriber` registry with an `EnvFilter`, writing
//!   JSON lines or pretty output ([`logging`])
//! - **Metrics**: counters for requests, CSRF rejections and recovered panics,
//!   emitted through the `metrics` facade ([`metrics`])
//! - **Panics**: backtraces captured at the panic site for the recovery
//!   stage to log ([`panic`])
//!
//! # Example
//!
//! ```rust,ignore
//! use portcullis_telemetry::{init_logging, LogConfig};
//!
//! init_logging(&LogConfig::development())?;
//! portcullis_telemetry::metrics::describe_metrics();
//! ```

#![doc(html_root_url = "https://docs.rs/portcullis-telemetry/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod error;
pub mod logging;
pub mod metrics;
pub mod panic;

pub use error::TelemetryError;
pub use logging::{init_logging, LogConfig, LogFormat};

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;
