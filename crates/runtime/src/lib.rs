//! Runtime utilities for Bundlescope.
#![allow(missing_docs)]

pub mod health;
pub mod rate_limiter;
pub mod shutdown;
