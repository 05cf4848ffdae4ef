//! Read-only `ClickHouse` access for the Bundlescope API.
//!
//! Every query the service runs lives here as a named, parameterized reader
//! method. Request parameters never reach the SQL text: table identifiers and
//! truncation functions are resolved from the [`Chain`] and [`Granularity`]
//! enums, and free-form values such as entity names are bound server-side.

pub mod granularity;
pub mod models;
pub mod reader;

pub use granularity::{Chain, Granularity};
pub use models::*;
pub use reader::ClickhouseReader;
