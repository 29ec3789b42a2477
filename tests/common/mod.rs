#![allow(unused_imports, dead_code)]
//! Shared test utilities for integration tests.
//!
//! - `fixtures`: class trees assembled with `ClassFileBuilder`

pub mod fixtures;

pub use fixtures::{list_class_files, read_class, write_class, write_qwerty_scenario, MARKER};
