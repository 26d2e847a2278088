// SPDX-License-Identifier: GPL-3.0-or-later

//! Maps MCP tool calls to sandboxed filesystem operations.
//!
//! Tool names are mapped once into a closed [`ToolKind`] set and dispatched
//! with an exhaustive match; each kind deserializes its own typed argument
//! record. Every handler obtains a [`ValidatedPath`] from the guard before
//! touching the filesystem.

use anyhow::{Result, anyhow};
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tracing::debug;

use crate::config::Config;
use crate::mcp::{CallToolResult, Tool, ToolHandler};
use crate::sandbox::{PathGuard, SandboxError, ValidatedPath};

/// The closed set of tools this server exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolKind {
    /// Read one file, optionally only its head or tail.
    ReadFile,
    /// Read several files in one call.
    ReadMultipleFiles,
    /// Create or overwrite a file.
    WriteFile,
    /// Apply ordered text edits to a file.
    EditFile,
    /// Create a directory tree.
    CreateDirectory,
    /// List a directory's entries.
    ListDirectory,
    /// List a directory's entries with sizes.
    ListDirectoryWithSizes,
    /// Serialize a directory subtree as JSON.
    DirectoryTree,
    /// Move or rename a file or directory.
    MoveFile,
    /// Search for names matching a pattern.
    SearchFiles,
    /// Report metadata for a file or directory.
    GetFileInfo,
    /// Report the configured sandbox roots.
    ListAllowedDirectories,
}

impl ToolKind {
    /// All tools, in the order they are listed to clients.
    pub const ALL: [Self; 12] = [
        Self::ReadFile,
        Self::ReadMultipleFiles,
        Self::WriteFile,
        Self::EditFile,
        Self::CreateDirectory,
        Self::ListDirectory,
        Self::ListDirectoryWithSizes,
        Self::DirectoryTree,
        Self::MoveFile,
        Self::SearchFiles,
        Self::GetFileInfo,
        Self::ListAllowedDirectories,
    ];

    /// The wire name of the tool.
    pub const fn name(self) -> &'static str {
        match self {
            Self::ReadFile => "read_file",
            Self::ReadMultipleFiles => "read_multiple_files",
            Self::WriteFile => "write_file",
            Self::EditFile => "edit_file",
            Self::CreateDirectory => "create_directory",
            Self::ListDirectory => "list_directory",
            Self::ListDirectoryWithSizes => "list_directory_with_sizes",
            Self::DirectoryTree => "directory_tree",
            Self::MoveFile => "move_file",
            Self::SearchFiles => "search_files",
            Self::GetFileInfo => "get_file_info",
            Self::ListAllowedDirectories => "list_allowed_directories",
        }
    }

    /// Maps a wire name onto the closed tool set.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }
}

/// Dispatches MCP tool calls onto sandboxed filesystem operations.
pub struct FsToolHandler {
    guard: PathGuard,
    config: Config,
    runtime: tokio::runtime::Handle,
}

impl FsToolHandler {
    /// Creates a handler over the given guard and settings.
    pub const fn new(guard: PathGuard, config: Config, runtime: tokio::runtime::Handle) -> Self {
        Self {
            guard,
            config,
            runtime,
        }
    }

    pub(super) const fn guard(&self) -> &PathGuard {
        &self.guard
    }

    pub(super) const fn config(&self) -> &Config {
        &self.config
    }

    pub(super) const fn runtime(&self) -> &tokio::runtime::Handle {
        &self.runtime
    }

    /// Validates a caller-supplied path, existing or not.
    pub(super) fn validate(&self, raw: &str) -> Result<ValidatedPath> {
        Ok(self.guard.validate(raw)?)
    }

    /// Validates a caller-supplied path that must exist.
    pub(super) fn validate_existing(&self, raw: &str) -> Result<ValidatedPath> {
        let validated = self.guard.validate(raw)?;
        if !validated.exists() {
            return Err(SandboxError::NotFound(raw.to_string()).into());
        }
        Ok(validated)
    }

    /// Deserializes a tool's typed argument record.
    pub(super) fn parse_input<T: DeserializeOwned>(arguments: Option<Value>) -> Result<T> {
        serde_json::from_value(arguments.ok_or_else(|| anyhow!("Missing arguments"))?)
            .map_err(|e| anyhow!("Invalid arguments: {e}"))
    }
}

impl ToolHandler for FsToolHandler {
    fn list_tools(&self) -> Vec<Tool> {
        ToolKind::ALL
            .into_iter()
            .map(|kind| Tool {
                name: kind.name().to_string(),
                description: Some(description(kind).to_string()),
                input_schema: input_schema(kind),
            })
            .collect()
    }

    fn call_tool(&self, name: &str, arguments: Option<Value>) -> Result<CallToolResult> {
        let Some(kind) = ToolKind::from_name(name) else {
            return Err(anyhow!("Unknown tool: {name}"));
        };
        debug!("tool call: {}", kind.name());

        match kind {
            ToolKind::ReadFile => self.handle_read_file(arguments),
            ToolKind::ReadMultipleFiles => self.handle_read_multiple_files(arguments),
            ToolKind::WriteFile => self.handle_write_file(arguments),
            ToolKind::EditFile => self.handle_edit_file(arguments),
            ToolKind::CreateDirectory => self.handle_create_directory(arguments),
            ToolKind::ListDirectory => self.handle_list_directory(arguments),
            ToolKind::ListDirectoryWithSizes => self.handle_list_directory_with_sizes(arguments),
            ToolKind::DirectoryTree => self.handle_directory_tree(arguments),
            ToolKind::MoveFile => self.handle_move_file(arguments),
            ToolKind::SearchFiles => self.handle_search_files(arguments),
            ToolKind::GetFileInfo => self.handle_get_file_info(arguments),
            ToolKind::ListAllowedDirectories => self.handle_list_allowed_directories(),
        }
    }
}

fn description(kind: ToolKind) -> &'static str {
    match kind {
        ToolKind::ReadFile => {
            "Read the complete contents of a file from the file system. Use the 'head' \
             parameter to read only the first N lines, or the 'tail' parameter to read \
             only the last N lines. Only works within allowed directories."
        }
        ToolKind::ReadMultipleFiles => {
            "Read the contents of multiple files simultaneously. Each file's content is \
             returned with its path as a reference. Failed reads for individual files \
             won't stop the entire operation. Only works within allowed directories."
        }
        ToolKind::WriteFile => {
            "Create a new file or completely overwrite an existing file with new content. \
             Use with caution as it will overwrite existing files without warning. Only \
             works within allowed directories."
        }
        ToolKind::EditFile => {
            "Make line-based edits to a text file. Each edit replaces an exact or \
             whitespace-tolerant line sequence with new content. Returns a git-style diff \
             showing the changes made. Only works within allowed directories."
        }
        ToolKind::CreateDirectory => {
            "Create a new directory or ensure a directory exists. Can create multiple \
             nested directories in one operation. Succeeds silently if the directory \
             already exists. Only works within allowed directories."
        }
        ToolKind::ListDirectory => {
            "Get a detailed listing of all files and directories in a specified path. \
             Results distinguish files and directories with [FILE] and [DIR] prefixes. \
             Only works within allowed directories."
        }
        ToolKind::ListDirectoryWithSizes => {
            "Get a detailed listing of all files and directories in a specified path, \
             including sizes. Sort by name or size with the sortBy parameter. Only works \
             within allowed directories."
        }
        ToolKind::DirectoryTree => {
            "Get a recursive tree view of files and directories as a JSON structure. Each \
             entry includes 'name', 'type', and 'children' for directories. Only works \
             within allowed directories."
        }
        ToolKind::MoveFile => {
            "Move or rename files and directories. Fails if the destination exists. Both \
             source and destination must be within allowed directories."
        }
        ToolKind::SearchFiles => {
            "Recursively search for files and directories matching a pattern. The search \
             is case-insensitive and matches partial names. Returns full paths to all \
             matching items. Only searches within allowed directories."
        }
        ToolKind::GetFileInfo => {
            "Retrieve detailed metadata about a file or directory: size, timestamps, type, \
             and permissions. Only works within allowed directories."
        }
        ToolKind::ListAllowedDirectories => {
            "Returns the list of directories that this server is allowed to access. Use \
             this to understand the sandbox boundaries before trying to access files."
        }
    }
}

fn input_schema(kind: ToolKind) -> Value {
    match kind {
        ToolKind::ReadFile => json!({
            "type": "object",
            "properties": {
                "path": { "type": "string" },
                "head": {
                    "type": "integer",
                    "description": "If provided, returns only the first N lines of the file"
                },
                "tail": {
                    "type": "integer",
                    "description": "If provided, returns only the last N lines of the file"
                }
            },
            "required": ["path"]
        }),
        ToolKind::ReadMultipleFiles => json!({
            "type": "object",
            "properties": {
                "paths": { "type": "array", "items": { "type": "string" } }
            },
            "required": ["paths"]
        }),
        ToolKind::WriteFile => json!({
            "type": "object",
            "properties": {
                "path": { "type": "string" },
                "content": { "type": "string" }
            },
            "required": ["path", "content"]
        }),
        ToolKind::EditFile => json!({
            "type": "object",
            "properties": {
                "path": { "type": "string" },
                "edits": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "properties": {
                            "oldText": {
                                "type": "string",
                                "description": "Text to search for - must match exactly"
                            },
                            "newText": {
                                "type": "string",
                                "description": "Text to replace with"
                            }
                        },
                        "required": ["oldText", "newText"]
                    }
                },
                "dryRun": {
                    "type": "boolean",
                    "description": "Preview changes using git-style diff format",
                    "default": false
                }
            },
            "required": ["path", "edits"]
        }),
        ToolKind::CreateDirectory
        | ToolKind::ListDirectory
        | ToolKind::DirectoryTree
        | ToolKind::GetFileInfo => json!({
            "type": "object",
            "properties": {
                "path": { "type": "string" }
            },
            "required": ["path"]
        }),
        ToolKind::ListDirectoryWithSizes => json!({
            "type": "object",
            "properties": {
                "path": { "type": "string" },
                "sortBy": {
                    "type": "string",
                    "enum": ["name", "size"],
                    "description": "Sort entries by name or size",
                    "default": "name"
                }
            },
            "required": ["path"]
        }),
        ToolKind::MoveFile => json!({
            "type": "object",
            "properties": {
                "source": { "type": "string" },
                "destination": { "type": "string" }
            },
            "required": ["source", "destination"]
        }),
        ToolKind::SearchFiles => json!({
            "type": "object",
            "properties": {
                "path": { "type": "string" },
                "pattern": { "type": "string" },
                "excludePatterns": {
                    "type": "array",
                    "items": { "type": "string" },
                    "default": []
                }
            },
            "required": ["path", "pattern"]
        }),
        ToolKind::ListAllowedDirectories => json!({
            "type": "object",
            "properties": {}
        }),
    }
}
