//! Shared infrastructure utilities for Tarry.
//!
//! This crate provides cross-cutting utilities that don't belong in the
//! domain-pure `tarry-types` crate:
//!
//! - **`resource`**: Locating a test's sibling `resources` directory
//! - **`diff`**: Line diff rendering for assertion messages

pub mod diff;
pub mod resource;

pub use diff::format_line_diff;
pub use resource::{
    RESOURCE_DIR_NAME, locate_source, resource_directory_for, test_resource_directory,
};
