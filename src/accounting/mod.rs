//! Concurrency accounting subsystem.
//!
//! # Data Flow
//! ```text
//! request authenticated → (ExternalUser, BackendCredential, Cluster)
//!     → Scope::admit
//!         → cluster picks a node (cluster::select)
//!         → node, user and credential counters incremented
//!         → ceilings checked; on overshoot all three rolled back
//!     → request forwarded to the node
//!     → Scope dropped on every exit path → all three counters decremented
//! ```
//!
//! # Design Decisions
//! - Counters are plain atomics; no lock spans the three updates
//! - Concurrent admissions may overshoot a ceiling transiently; the losers
//!   roll back and the count settles at or below the ceiling
//! - Release is tied to ownership of the `Scope`

pub mod counter;
pub mod identity;
pub mod scope;

pub use counter::Counter;
pub use identity::{BackendCredential, ExternalUser};
pub use scope::{AdmitError, LimitedEntity, Scope};
