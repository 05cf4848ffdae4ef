//! Helper functions for API operations

pub mod common;
pub mod retention;

pub use common::*;
pub use retention::*;
