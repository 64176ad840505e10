// Public modules
pub mod client;
pub mod config;
pub mod config_item;
pub mod content_pack;
pub mod deploy;
pub mod error;
pub mod flow;
pub mod http;
pub mod paths;
pub mod poll;
pub mod tester;

#[cfg(test)]
pub(crate) mod test_support;

// Re-export common types for convenience
pub use client::OoClient;
pub use config::ConnectionConfig;
pub use error::{Error, ErrorCode, Result};
pub use http::{Payload, RestClient, Transport};
