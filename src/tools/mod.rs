// SPDX-License-Identifier: GPL-3.0-or-later

/// Tool registry and dispatch.
mod handler;
/// Directory listing and tree serialization handlers.
mod list;
/// File reading handlers.
mod read;
/// Name search and metadata handlers.
mod search;
/// File writing, editing, and moving handlers.
mod write;

pub use handler::{FsToolHandler, ToolKind};
