//! Verdant Core - Core types for the infrastructure convergence engine
//!
//! This crate provides the foundational types used throughout Verdant:
//! - `Provisioner`: the closed set of ways an environment can be provisioned
//! - `Cloud`: a provisioned resource environment (VM, managed infra, external)
//! - `Cluster`: a deployment target bound to exactly one Cloud
//! - `Chart`: a deployable bundle definition scoped to one namespace
//! - `ChartSet`: chart discovery and namespace selection
//! - namespace ordering for the deploy pipeline

pub mod chart;
pub mod charts;
pub mod cloud;
pub mod cluster;
pub mod error;
pub mod ordering;
pub mod provisioner;

pub use chart::Chart;
pub use charts::ChartSet;
pub use cloud::Cloud;
pub use cluster::Cluster;
pub use error::{CoreError, Result};
pub use ordering::{order_namespaces, PRIORITY_NAMESPACES};
pub use provisioner::Provisioner;

/// Raw attribute map for an entity record, as dumped from the config store.
///
/// Insertion order is preserved so that enumeration order matches the store.
pub type Attributes = indexmap::IndexMap<String, String>;
