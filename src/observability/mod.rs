//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → tracing events (admission rejections, kill statements, failures)
//!     → Scope Display (correlation string with live counts)
//!
//! Consumers:
//!     → logging.rs (fmt subscriber, stdout)
//!     → admin API snapshots
//! ```
//!
//! # Design Decisions
//! - Structured fields on every event, message text kept short
//! - Admission rejections are debug-level; they are expected under load

pub mod logging;
