//! Client for an Operations Orchestration central server's REST API.
//!
//! ```no_run
//! use oo_client::{ConnectionConfig, OoClient};
//! use oo_client::flow::DEFAULT_RUN_TIMEOUT;
//!
//! let config = ConnectionConfig::new("https://oo.example.com:8443", "admin", "secret");
//! let mut client = OoClient::connect(&config)?;
//! let result = client.run_flow("Library/Tests/smoke", None, &Default::default(), DEFAULT_RUN_TIMEOUT)?;
//! println!("{:?}", result);
//! # Ok::<(), oo_client::Error>(())
//! ```

pub mod core;

// Re-export everything from core for ergonomic library use
// Users can write `oo_client::flow` instead of `oo_client::core::flow`
pub use core::*;
