// SPDX-License-Identifier: GPL-3.0-or-later

/// MCP server loop over stdio.
mod server;
/// MCP (Model Context Protocol) type definitions.
mod types;

pub use server::{McpServer, ToolHandler};
pub use types::{
    CallToolParams, CallToolResult, InitializeParams, InitializeResult, ListToolsResult,
    Notification, Request, RequestId, Response, ResponseError, ServerCapabilities, ServerInfo,
    Tool, ToolContent, ToolsCapability, INTERNAL_ERROR, METHOD_NOT_FOUND,
};
