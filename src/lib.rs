//! Admission control and backend selection for a query-proxying reverse proxy.

pub mod accounting;
pub mod admin;
pub mod cluster;
pub mod config;
pub mod observability;
pub mod registry;

pub use accounting::{AdmitError, Scope};
pub use cluster::{Cluster, KillError};
pub use config::schema::ProxyConfig;
pub use registry::{Registry, Route};
