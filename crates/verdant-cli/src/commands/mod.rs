//! CLI commands

pub mod charts;
pub mod cloud;
pub mod cluster;
