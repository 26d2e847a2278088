// SPDX-License-Identifier: GPL-3.0-or-later

//! Mutating handlers: `write_file`, `edit_file`, `create_directory`,
//! `move_file`.

use anyhow::{Result, anyhow};
use serde::Deserialize;

use super::handler::FsToolHandler;
use crate::edit::{self, EditOperation};
use crate::mcp::CallToolResult;

/// Input for `write_file`.
#[derive(Debug, Deserialize)]
pub struct WriteFileInput {
    /// Absolute path to the file.
    pub path: String,
    /// The full new content.
    pub content: String,
}

/// Input for `edit_file`.
#[derive(Debug, Deserialize)]
pub struct EditFileInput {
    /// Absolute path to the file.
    pub path: String,
    /// Edits applied in order, each seeing the previous one's output.
    pub edits: Vec<EditOperation>,
    /// Preview the diff without persisting.
    #[serde(rename = "dryRun", default)]
    pub dry_run: bool,
}

/// Input for `create_directory`.
#[derive(Debug, Deserialize)]
pub struct CreateDirectoryInput {
    /// Absolute path of the directory to create.
    pub path: String,
}

/// Input for `move_file`.
#[derive(Debug, Deserialize)]
pub struct MoveFileInput {
    /// Absolute path of the entry to move.
    pub source: String,
    /// Absolute destination path; must not exist.
    pub destination: String,
}

impl FsToolHandler {
    /// Handles the `write_file` tool call.
    pub(super) fn handle_write_file(
        &self,
        arguments: Option<serde_json::Value>,
    ) -> Result<CallToolResult> {
        let input: WriteFileInput = Self::parse_input(arguments)?;
        let validated = self.validate(&input.path)?;

        self.runtime()
            .block_on(tokio::fs::write(validated.as_path(), &input.content))?;

        Ok(CallToolResult::text(format!(
            "Successfully wrote to {}",
            input.path
        )))
    }

    /// Handles the `edit_file` tool call.
    ///
    /// The diff is returned for dry runs and real runs alike; the file is
    /// only rewritten when all edits matched and `dryRun` is false.
    pub(super) fn handle_edit_file(
        &self,
        arguments: Option<serde_json::Value>,
    ) -> Result<CallToolResult> {
        let input: EditFileInput = Self::parse_input(arguments)?;
        let validated = self.validate_existing(&input.path)?;

        let content = self
            .runtime()
            .block_on(tokio::fs::read_to_string(validated.as_path()))?;

        let result = edit::apply_edits(&content, &input.path, &input.edits, input.dry_run)?;

        if !result.dry_run {
            self.runtime()
                .block_on(tokio::fs::write(validated.as_path(), &result.new_content))?;
        }

        Ok(CallToolResult::text(format!("```diff\n{}```\n\n", result.diff)))
    }

    /// Handles the `create_directory` tool call.
    pub(super) fn handle_create_directory(
        &self,
        arguments: Option<serde_json::Value>,
    ) -> Result<CallToolResult> {
        let input: CreateDirectoryInput = Self::parse_input(arguments)?;
        let validated = self.validate(&input.path)?;

        self.runtime()
            .block_on(tokio::fs::create_dir_all(validated.as_path()))?;

        Ok(CallToolResult::text(format!(
            "Successfully created directory {}",
            input.path
        )))
    }

    /// Handles the `move_file` tool call.
    pub(super) fn handle_move_file(
        &self,
        arguments: Option<serde_json::Value>,
    ) -> Result<CallToolResult> {
        let input: MoveFileInput = Self::parse_input(arguments)?;
        let source = self.validate_existing(&input.source)?;
        let destination = self.validate(&input.destination)?;

        if destination.exists() {
            return Err(anyhow!("Destination already exists: {}", input.destination));
        }

        self.runtime()
            .block_on(tokio::fs::rename(source.as_path(), destination.as_path()))?;

        Ok(CallToolResult::text(format!(
            "Successfully moved {} to {}",
            input.source, input.destination
        )))
    }
}
