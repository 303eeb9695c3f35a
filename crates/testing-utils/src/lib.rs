//! # Monitor Testing Utils
//!
//! Shared testing utilities for the fleet monitor workspace: in-memory
//! implementations of the store traits and builders for work-item fixtures.
//!
//! ```toml
//! [dev-dependencies]
//! monitor-testing-utils = { path = "../testing-utils" }
//! ```

pub mod builders;
pub mod mocks;

pub use builders::*;
pub use mocks::*;
