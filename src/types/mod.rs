//! Read-only projections of CI server state.

pub mod build;
pub mod common;
pub mod jobs;

pub use build::*;
pub use common::*;
pub use jobs::*;
