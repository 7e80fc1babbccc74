//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events, spans per controller action)
//!     → metrics.rs (counters)
//! ```

pub mod logging;
pub mod metrics;
