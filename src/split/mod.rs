//! Cookie-sticky A/B split between two upstream HTML variants.
//!
//! Each request discovers the two variant URLs, fetches both documents,
//! rewrites the one matching the client's bucket and returns it.

mod bucket;
mod gateway;
mod rewrite;
mod upstream;

pub use bucket::Bucket;
pub use gateway::SplitGateway;
pub use upstream::HttpFetcher;
