//! kie.ai MCP Common Library
//!
//! Shared configuration, credential handling, error types, transport selection,
//! server wiring and tracing setup for the kie.ai MCP servers.

#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod auth;
pub mod config;
pub mod error;
pub mod server;
pub mod tracing;
pub mod transport;


pub use auth::ApiKey;
pub use config::Config;
pub use error::{ConfigError, Error, Result};
pub use server::{MCP_PATH, McpServerBuilder, ServerError, shutdown_channel};
pub use transport::{DEFAULT_PORT, Transport, TransportArgs, TransportMode};
