//! GraphQL transport layer: response cache, envelope handling, retry
//! policy, and the schema-variant query registry.

pub mod cache;
pub mod graphql;
pub mod queries;
pub mod transport;

pub use cache::ResponseCache;
pub use queries::Fetched;
pub use transport::{Endpoint, GridClient};
