//! Generates mock implementations of Go interfaces.
//!
//! The pipeline runs in a single pass: [`package::source`] resolves the
//! source directory, [`env::loader`] loads the types that the requested
//! interfaces reach, [`mock`] extracts and renders the mocks, and [`format`]
//! produces the final document. [`driver`] ties these together.

pub mod config;
pub mod driver;
pub mod env;
pub mod format;
pub mod mock;
pub mod package;
pub mod source_file;
pub mod span;
pub mod symbol;
pub mod syntax;

/// The first line of every generated file.
pub const GENERATED_MARKER: &str = "// Code generated by moq; DO NOT EDIT.";
