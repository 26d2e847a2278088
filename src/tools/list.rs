// SPDX-License-Identifier: GPL-3.0-or-later

//! Listing handlers: `list_directory`, `list_directory_with_sizes`,
//! `directory_tree`.

use anyhow::{Result, anyhow};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::path::Path;

use super::handler::FsToolHandler;
use crate::mcp::CallToolResult;

/// Input for `list_directory`.
#[derive(Debug, Deserialize)]
pub struct ListDirectoryInput {
    /// Absolute path to the directory.
    pub path: String,
}

/// Input for `list_directory_with_sizes`.
#[derive(Debug, Deserialize)]
pub struct ListDirectoryWithSizesInput {
    /// Absolute path to the directory.
    pub path: String,
    /// Sort entries by `name` or `size`.
    #[serde(rename = "sortBy", default)]
    pub sort_by: SortBy,
}

/// Sort order for `list_directory_with_sizes`.
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SortBy {
    /// Alphabetical by entry name.
    #[default]
    Name,
    /// Largest first.
    Size,
}

/// Input for `directory_tree`.
#[derive(Debug, Deserialize)]
pub struct DirectoryTreeInput {
    /// Absolute path to the subtree root.
    pub path: String,
}

/// One node in the `directory_tree` output.
#[derive(Debug, Serialize)]
struct TreeEntry {
    name: String,
    #[serde(rename = "type")]
    kind: &'static str,
    /// Present (possibly empty) for directories, absent for files.
    #[serde(skip_serializing_if = "Option::is_none")]
    children: Option<Vec<TreeEntry>>,
}

impl FsToolHandler {
    /// Handles the `list_directory` tool call.
    pub(super) fn handle_list_directory(
        &self,
        arguments: Option<serde_json::Value>,
    ) -> Result<CallToolResult> {
        let input: ListDirectoryInput = Self::parse_input(arguments)?;
        let validated = self.validate_existing(&input.path)?;

        if !validated.as_path().is_dir() {
            return Err(anyhow!("Not a directory: {}", input.path));
        }

        let mut entries = self.runtime().block_on(async {
            let mut dir = tokio::fs::read_dir(validated.as_path()).await?;
            let mut rows: Vec<(String, bool)> = Vec::new();
            while let Some(entry) = dir.next_entry().await? {
                let name = entry.file_name().to_string_lossy().to_string();
                let is_dir = entry.file_type().await?.is_dir();
                rows.push((name, is_dir));
            }
            Ok::<_, std::io::Error>(rows)
        })?;

        entries.sort_by(|a, b| a.0.cmp(&b.0));

        let mut out = String::new();
        for (name, is_dir) in &entries {
            let prefix = if *is_dir { "[DIR]" } else { "[FILE]" };
            let _ = writeln!(out, "{prefix} {name}");
        }
        if out.is_empty() {
            out = "Directory is empty".to_string();
        }

        Ok(CallToolResult::text(out))
    }

    /// Handles the `list_directory_with_sizes` tool call.
    pub(super) fn handle_list_directory_with_sizes(
        &self,
        arguments: Option<serde_json::Value>,
    ) -> Result<CallToolResult> {
        let input: ListDirectoryWithSizesInput = Self::parse_input(arguments)?;
        let validated = self.validate_existing(&input.path)?;

        if !validated.as_path().is_dir() {
            return Err(anyhow!("Not a directory: {}", input.path));
        }

        let mut entries = self.runtime().block_on(async {
            let mut dir = tokio::fs::read_dir(validated.as_path()).await?;
            let mut rows: Vec<(String, bool, u64)> = Vec::new();
            while let Some(entry) = dir.next_entry().await? {
                let name = entry.file_name().to_string_lossy().to_string();
                match entry.metadata().await {
                    Ok(meta) if meta.is_dir() => rows.push((name, true, 0)),
                    Ok(meta) => rows.push((name, false, meta.len())),
                    // Entries whose metadata cannot be read still show up.
                    Err(_) => rows.push((name, false, 0)),
                }
            }
            Ok::<_, std::io::Error>(rows)
        })?;

        match input.sort_by {
            SortBy::Name => entries.sort_by(|a, b| a.0.cmp(&b.0)),
            SortBy::Size => entries.sort_by(|a, b| b.2.cmp(&a.2)),
        }

        let total_files = entries.iter().filter(|e| !e.1).count();
        let total_dirs = entries.iter().filter(|e| e.1).count();
        let total_size: u64 = entries.iter().filter(|e| !e.1).map(|e| e.2).sum();

        let mut out = String::new();
        for (name, is_dir, size) in &entries {
            let prefix = if *is_dir { "[DIR]" } else { "[FILE]" };
            let size_str = if *is_dir {
                String::new()
            } else {
                format!("{:>10}", format_size(*size))
            };
            let _ = writeln!(out, "{prefix} {name:<30} {size_str}");
        }
        let _ = writeln!(out);
        let _ = writeln!(out, "Total: {total_files} files, {total_dirs} directories");
        let _ = write!(out, "Combined size: {}", format_size(total_size));

        Ok(CallToolResult::text(out))
    }

    /// Handles the `directory_tree` tool call.
    ///
    /// Subtrees whose real location fails validation (e.g. symlinks
    /// escaping the sandbox) are skipped rather than failing the call.
    pub(super) fn handle_directory_tree(
        &self,
        arguments: Option<serde_json::Value>,
    ) -> Result<CallToolResult> {
        let input: DirectoryTreeInput = Self::parse_input(arguments)?;
        let validated = self.validate_existing(&input.path)?;

        if !validated.as_path().is_dir() {
            return Err(anyhow!("Not a directory: {}", input.path));
        }

        let tree = self.build_tree(validated.as_path())?;
        Ok(CallToolResult::text(serde_json::to_string_pretty(&tree)?))
    }

    fn build_tree(&self, dir: &Path) -> Result<Vec<TreeEntry>> {
        let mut entries: Vec<TreeEntry> = Vec::new();
        let mut names: Vec<(String, std::path::PathBuf)> = std::fs::read_dir(dir)?
            .filter_map(std::result::Result::ok)
            .map(|e| (e.file_name().to_string_lossy().to_string(), e.path()))
            .collect();
        names.sort_by(|a, b| a.0.cmp(&b.0));

        for (name, path) in names {
            // Re-validate each child so symlinked subtrees cannot smuggle
            // outside content into the listing.
            let Ok(child) = self.validate(&path.to_string_lossy()) else {
                continue;
            };
            // Symlinks are listed but never descended into; a link back to
            // an ancestor would otherwise recurse forever.
            let is_symlink = std::fs::symlink_metadata(&path)
                .is_ok_and(|meta| meta.file_type().is_symlink());
            if !is_symlink && child.exists() && child.as_path().is_dir() {
                entries.push(TreeEntry {
                    name,
                    kind: "directory",
                    children: Some(self.build_tree(child.as_path())?),
                });
            } else {
                entries.push(TreeEntry {
                    name,
                    kind: "file",
                    children: None,
                });
            }
        }
        Ok(entries)
    }
}

/// Formats a byte count with binary units, two decimals above bytes.
fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];

    if bytes == 0 {
        return "0 B".to_string();
    }

    let mut index = 0;
    #[allow(
        clippy::cast_precision_loss,
        reason = "display-only rounding of file sizes"
    )]
    let mut value = bytes as f64;
    while value >= 1024.0 && index < UNITS.len() - 1 {
        value /= 1024.0;
        index += 1;
    }

    if index == 0 {
        format!("{bytes} {}", UNITS[0])
    } else {
        format!("{value:.2} {}", UNITS[index])
    }
}
