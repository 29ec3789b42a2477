//! class-relocator
//!
//! Command-line front end for the relocation engine in `class-relocation`.
//! This library holds the configuration layer shared by the binary and its
//! tests: a JSON file merged with command-line overrides and resolved into a
//! [`config::RunConfig`].

pub mod config;

pub use config::{RelocatorConfig, RunConfig, TagSource};
