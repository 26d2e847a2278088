// SPDX-License-Identifier: GPL-3.0-or-later

//! Palisade is a sandboxed MCP (Model Context Protocol) filesystem server.
//!
//! It exposes a restricted set of filesystem tools (read, write, edit, list,
//! move, search, stat) to MCP clients while confining every operation to an
//! explicit allow-list of root directories supplied at startup.

/// Configuration handling for sandbox and search settings.
pub mod config;
/// Structural text editing with unified-diff output.
pub mod edit;
/// MCP server implementation and type definitions.
pub mod mcp;
/// Path containment enforcement: allowed roots and path validation.
pub mod sandbox;
/// Filesystem tool handlers dispatched from the MCP server.
pub mod tools;
