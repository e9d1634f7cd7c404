//! Verdant Converge - drives declared infrastructure toward its desired state
//!
//! The pipeline is fixed and fail-fast: converge the cloud (optional),
//! converge the cluster (optional), then for every namespace in priority
//! order aggregate its secrets and apply its charts. Any failure terminates
//! the run; nothing is retried and nothing already applied is rolled back.
//!
//! Everything here is single-threaded and blocking by design: the chart
//! apply tool wipes a namespace's existing releases while applying, so
//! overlapping deployments to one namespace are unsafe, and ordering - not
//! throughput - is the goal.

pub mod cloud;
pub mod cluster;
pub mod deploy;
pub mod error;
pub mod exec;
pub mod localmachine;
pub mod orchestrate;
pub mod secrets;
pub mod statefile;

pub use cloud::{converge_cloud, CloudOptions};
pub use cluster::{converge_cluster, ClusterOptions};
pub use error::{ConvergeError, Result};
pub use exec::{Invocation, RecordingRunner, RunOutput, Runner, ShellRunner};
pub use orchestrate::{ConvergePlan, Orchestrator};
pub use statefile::repair_state_link;
