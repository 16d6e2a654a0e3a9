//! Workspace-level integration tests for the kie.ai MCP servers.
//!
//! These tests verify:
//! - The server can be constructed and reports correct server info
//! - Tool registration and schema generation
//! - Property-based tests for tool schema validity, input validation, and output format

pub mod input_validation;
pub mod output_format;
