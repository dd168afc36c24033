//! Package index (PyPI) access.

mod client;
mod query;
mod types;

pub use client::{PyPi, QueryIndex};
pub use query::VersionQuery;
pub use types::ProjectResponse;

#[cfg(test)]
pub use client::MockQueryIndex;
