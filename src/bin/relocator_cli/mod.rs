//! CLI subcommand implementations for class-relocator

pub mod inspect;
pub mod output;
pub mod relocate;
