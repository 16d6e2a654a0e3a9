//! kie.ai MCP FLUX Server Library
//!
//! This library exposes kie.ai's FLUX 2 Pro text-to-image job API as an MCP
//! tool.

pub mod handler;
pub mod server;


pub use handler::{
    AspectRatio, FluxGenerateParams, FluxGenerateResult, FluxHandler, GenerationOutcome, PollPolicy,
    Resolution,
};
pub use server::FluxServer;
