// SPDX-License-Identifier: GPL-3.0-or-later

//! Search and metadata handlers: `search_files`, `get_file_info`,
//! `list_allowed_directories`.

use anyhow::{Result, anyhow};
use chrono::{DateTime, Utc};
use globset::{Glob, GlobSet, GlobSetBuilder};
use serde::Deserialize;
use std::fmt::Write as _;
use std::time::SystemTime;
use tracing::debug;

use super::handler::FsToolHandler;
use crate::mcp::CallToolResult;

/// Input for `search_files`.
#[derive(Debug, Deserialize)]
pub struct SearchFilesInput {
    /// Absolute path to the directory to search under.
    pub path: String,
    /// Case-insensitive substring matched against entry names.
    pub pattern: String,
    /// Glob patterns excluded from the results.
    #[serde(rename = "excludePatterns", default)]
    pub exclude_patterns: Vec<String>,
}

/// Input for `get_file_info`.
#[derive(Debug, Deserialize)]
pub struct GetFileInfoInput {
    /// Absolute path to the file or directory.
    pub path: String,
}

impl FsToolHandler {
    /// Handles the `search_files` tool call.
    ///
    /// Entries whose real location fails validation are skipped silently, so
    /// a symlink pointing outside the sandbox never surfaces in results.
    pub(super) fn handle_search_files(
        &self,
        arguments: Option<serde_json::Value>,
    ) -> Result<CallToolResult> {
        let input: SearchFilesInput = Self::parse_input(arguments)?;
        let root = self.validate_existing(&input.path)?;

        if !root.as_path().is_dir() {
            return Err(anyhow!("Not a directory: {}", input.path));
        }

        let excludes = build_exclude_set(&input.exclude_patterns)?;
        let needle = input.pattern.to_lowercase();
        let limit = self.config().max_search_results;

        let mut matches: Vec<String> = Vec::new();
        let walker = ignore::WalkBuilder::new(root.as_path())
            .standard_filters(false)
            .follow_links(false)
            .build();

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    debug!("search skipping unreadable entry: {e}");
                    continue;
                }
            };
            // The walk root itself is not a result.
            if entry.depth() == 0 {
                continue;
            }
            let path = entry.path();
            if self.validate(&path.to_string_lossy()).is_err() {
                continue;
            }
            if let Ok(relative) = path.strip_prefix(root.as_path()) {
                if excludes.is_match(relative) {
                    continue;
                }
            }
            let name = entry.file_name().to_string_lossy();
            if name.to_lowercase().contains(&needle) {
                matches.push(path.display().to_string());
                if matches.len() >= limit {
                    break;
                }
            }
        }

        if matches.is_empty() {
            return Ok(CallToolResult::text("No matches found"));
        }
        Ok(CallToolResult::text(matches.join("\n")))
    }

    /// Handles the `get_file_info` tool call.
    pub(super) fn handle_get_file_info(
        &self,
        arguments: Option<serde_json::Value>,
    ) -> Result<CallToolResult> {
        let input: GetFileInfoInput = Self::parse_input(arguments)?;
        let validated = self.validate_existing(&input.path)?;

        let metadata = std::fs::metadata(validated.as_path())?;

        let mut out = String::new();
        let _ = writeln!(out, "size: {}", metadata.len());
        let _ = writeln!(out, "created: {}", format_time(metadata.created()));
        let _ = writeln!(out, "modified: {}", format_time(metadata.modified()));
        let _ = writeln!(out, "accessed: {}", format_time(metadata.accessed()));
        let _ = writeln!(out, "isDirectory: {}", metadata.is_dir());
        let _ = writeln!(out, "isFile: {}", metadata.is_file());
        let _ = write!(out, "permissions: {}", format_permissions(&metadata));

        Ok(CallToolResult::text(out))
    }

    /// Handles the `list_allowed_directories` tool call.
    pub(super) fn handle_list_allowed_directories(&self) -> Result<CallToolResult> {
        let mut out = String::from("Allowed directories:\n");
        let roots: Vec<String> = self
            .guard()
            .roots()
            .iter()
            .map(|root| root.display().to_string())
            .collect();
        out.push_str(&roots.join("\n"));
        Ok(CallToolResult::text(out))
    }
}

/// Compiles exclusion globs against paths relative to the search root.
///
/// A bare pattern such as `*.log` also matches at any depth, so callers do
/// not have to spell out `**/` prefixes themselves.
fn build_exclude_set(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern).map_err(|e| anyhow!("Invalid exclude pattern: {e}"))?);
        if !pattern.contains('/') {
            let nested = format!("**/{pattern}");
            builder.add(Glob::new(&nested).map_err(|e| anyhow!("Invalid exclude pattern: {e}"))?);
        }
    }
    Ok(builder.build()?)
}

fn format_time(time: std::io::Result<SystemTime>) -> String {
    match time {
        Ok(time) => DateTime::<Utc>::from(time).to_rfc3339(),
        Err(_) => "unavailable".to_string(),
    }
}

#[cfg(unix)]
fn format_permissions(metadata: &std::fs::Metadata) -> String {
    use std::os::unix::fs::PermissionsExt;
    format!("{:03o}", metadata.permissions().mode() & 0o777)
}

#[cfg(not(unix))]
fn format_permissions(metadata: &std::fs::Metadata) -> String {
    if metadata.permissions().readonly() {
        "read-only".to_string()
    } else {
        "read-write".to_string()
    }
}
