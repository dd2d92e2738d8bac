//! # Host Container
//!
//! Configuration for the composition root.

pub mod config;

pub use config::{parse_scene, HostConfig};
