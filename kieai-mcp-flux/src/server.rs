//! MCP Server implementation for the FLUX server.
//!
//! Exposes a single tool, `text_to_image_flux_2_pro`, backed by
//! [`FluxHandler`].

use crate::handler::{FluxGenerateParams, FluxHandler};
use kieai_mcp_common::config::Config;
use rmcp::{
    ErrorData as McpError, ServerHandler,
    model::{
        CallToolRequestParam, CallToolResult, Content, Implementation, JsonObject,
        ListToolsResult, PaginatedRequestParam, ServerCapabilities, ServerInfo, Tool,
    },
    service::{RequestContext, RoleServer},
};
use schemars::schema_for;
use std::borrow::Cow;
use std::sync::Arc;
use tracing::{debug, info};

/// Name reported in the MCP `initialize` response.
pub const SERVER_NAME: &str = "kieai-mcp-server";

/// Name of the text-to-image tool.
pub const TOOL_NAME: &str = "text_to_image_flux_2_pro";

/// Human-readable tool title.
pub const TOOL_TITLE: &str = "Text to Image FLUX 2 Pro";

/// Tool description shown to agents.
pub const TOOL_DESCRIPTION: &str = "Generate image from text with FLUX 2 Pro";

/// MCP Server for FLUX 2 Pro image generation.
#[derive(Clone)]
pub struct FluxServer {
    handler: Arc<FluxHandler>,
}

impl FluxServer {
    /// Create a new FluxServer with the given configuration.
    pub fn new(config: Config) -> Self {
        Self::with_handler(FluxHandler::new(config))
    }

    /// Create a FluxServer around an existing handler.
    pub fn with_handler(handler: FluxHandler) -> Self {
        Self {
            handler: Arc::new(handler),
        }
    }

    /// Generate an image and wrap the outcome in a single text content item.
    ///
    /// Never fails: a failed generation yields an empty text payload.
    pub async fn generate_image(&self, params: FluxGenerateParams) -> Result<CallToolResult, McpError> {
        info!(
            prompt_chars = params.prompt.chars().count(),
            aspect_ratio = %params.aspect_ratio,
            resolution = %params.resolution,
            "Generating image"
        );

        let outcome = self.handler.run(params).await;
        Ok(CallToolResult::success(vec![Content::text(outcome.into_text())]))
    }
}

/// Deserialize and validate tool arguments.
///
/// Schema violations are reported as `invalid_params` so they never reach
/// the handler.
pub fn parse_tool_arguments(arguments: Option<JsonObject>) -> Result<FluxGenerateParams, McpError> {
    let params: FluxGenerateParams = arguments
        .map(|args| serde_json::from_value(serde_json::Value::Object(args)))
        .transpose()
        .map_err(|e| McpError::invalid_params(format!("Invalid parameters: {}", e), None))?
        .ok_or_else(|| McpError::invalid_params("Missing parameters", None))?;

    params.validate().map_err(|errors| {
        let messages: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
        McpError::invalid_params(format!("Invalid parameters: {}", messages.join("; ")), None)
    })?;

    Ok(params)
}

/// Definition of the `text_to_image_flux_2_pro` tool.
pub fn tool_definition() -> Tool {
    let schema = schema_for!(FluxGenerateParams);
    let input_schema = match serde_json::to_value(&schema).unwrap_or_default() {
        serde_json::Value::Object(map) => Arc::new(map),
        _ => Arc::new(serde_json::Map::new()),
    };

    Tool {
        name: Cow::Borrowed(TOOL_NAME),
        title: Some(TOOL_TITLE.to_string()),
        description: Some(Cow::Borrowed(TOOL_DESCRIPTION)),
        input_schema,
        annotations: None,
        icons: None,
        meta: None,
        output_schema: None,
    }
}

impl ServerHandler for FluxServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "Image generation server backed by kie.ai FLUX 2 Pro. \
                 Use text_to_image_flux_2_pro to create an image from a text prompt; \
                 the result is the image URL, or an empty string if generation failed."
                    .to_string(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: SERVER_NAME.to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    fn list_tools(
        &self,
        _params: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> impl std::future::Future<Output = Result<ListToolsResult, McpError>> + Send + '_ {
        async move {
            debug!("Listing tools");
            Ok(ListToolsResult {
                tools: vec![tool_definition()],
                next_cursor: None,
                meta: None,
            })
        }
    }

    fn call_tool(
        &self,
        params: CallToolRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> impl std::future::Future<Output = Result<CallToolResult, McpError>> + Send + '_ {
        async move {
            match params.name.as_ref() {
                TOOL_NAME => {
                    let tool_params = parse_tool_arguments(params.arguments)?;
                    self.generate_image(tool_params).await
                }
                _ => Err(McpError::invalid_params(format!("Unknown tool: {}", params.name), None)),
            }
        }
    }
}
