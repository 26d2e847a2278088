// SPDX-License-Identifier: GPL-3.0-or-later

//! File reading handlers: `read_file`, `read_multiple_files`.

use anyhow::{Result, anyhow};
use serde::Deserialize;
use std::fmt::Write as _;
use std::io::SeekFrom;
use std::path::Path;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncSeekExt, BufReader};

use super::handler::FsToolHandler;
use crate::mcp::CallToolResult;

/// Input for `read_file`.
#[derive(Debug, Deserialize)]
pub struct ReadFileInput {
    /// Absolute path to the file.
    pub path: String,
    /// If provided, returns only the first N lines.
    pub head: Option<usize>,
    /// If provided, returns only the last N lines.
    pub tail: Option<usize>,
}

/// Input for `read_multiple_files`.
#[derive(Debug, Deserialize)]
pub struct ReadMultipleFilesInput {
    /// Absolute paths to the files.
    pub paths: Vec<String>,
}

impl FsToolHandler {
    /// Handles the `read_file` tool call.
    pub(super) fn handle_read_file(
        &self,
        arguments: Option<serde_json::Value>,
    ) -> Result<CallToolResult> {
        let input: ReadFileInput = Self::parse_input(arguments)?;

        if input.head.is_some() && input.tail.is_some() {
            return Err(anyhow!(
                "Cannot specify both head and tail parameters simultaneously"
            ));
        }

        let validated = self.validate_existing(&input.path)?;

        let content = self.runtime().block_on(async {
            match (input.head, input.tail) {
                (Some(n), None) => head_lines(validated.as_path(), n).await,
                (None, Some(n)) => tail_lines(validated.as_path(), n).await,
                _ => tokio::fs::read_to_string(validated.as_path()).await,
            }
        })?;

        Ok(CallToolResult::text(content))
    }

    /// Handles the `read_multiple_files` tool call.
    ///
    /// A failed read for one file is reported inline and never aborts the
    /// rest of the batch.
    pub(super) fn handle_read_multiple_files(
        &self,
        arguments: Option<serde_json::Value>,
    ) -> Result<CallToolResult> {
        let input: ReadMultipleFilesInput = Self::parse_input(arguments)?;

        let mut results = Vec::with_capacity(input.paths.len());
        for path in &input.paths {
            let read = self.validate_existing(path).and_then(|validated| {
                self.runtime()
                    .block_on(tokio::fs::read_to_string(validated.as_path()))
                    .map_err(Into::into)
            });
            match read {
                Ok(content) => {
                    let mut entry = String::new();
                    let _ = writeln!(entry, "{path}:");
                    entry.push_str(&content);
                    entry.push('\n');
                    results.push(entry);
                }
                Err(e) => results.push(format!("{path}: Error - {e}")),
            }
        }

        Ok(CallToolResult::text(results.join("\n---\n")))
    }
}

/// Reads the first `n` lines without loading the whole file.
async fn head_lines(path: &Path, n: usize) -> std::io::Result<String> {
    let file = tokio::fs::File::open(path).await?;
    let mut lines = BufReader::new(file).lines();

    let mut out: Vec<String> = Vec::with_capacity(n.min(1024));
    while out.len() < n {
        let Some(line) = lines.next_line().await? else {
            break;
        };
        out.push(line.trim_end_matches('\r').to_string());
    }
    Ok(out.join("\n"))
}

/// Reads the last `n` lines by scanning fixed-size chunks backward from
/// the end of the file.
async fn tail_lines(path: &Path, n: usize) -> std::io::Result<String> {
    const CHUNK: u64 = 1024;

    let mut file = tokio::fs::File::open(path).await?;
    let len = file.seek(SeekFrom::End(0)).await?;
    if len == 0 || n == 0 {
        return Ok(String::new());
    }

    let mut buf: Vec<u8> = Vec::new();
    let mut pos = len;
    let mut newlines = 0usize;

    while pos > 0 && newlines <= n {
        let read_len = CHUNK.min(pos);
        pos -= read_len;
        file.seek(SeekFrom::Start(pos)).await?;

        #[allow(
            clippy::cast_possible_truncation,
            reason = "read_len is capped at CHUNK"
        )]
        let mut chunk = vec![0u8; read_len as usize];
        file.read_exact(&mut chunk).await?;

        newlines += chunk.iter().filter(|&&b| b == b'\n').count();
        chunk.extend_from_slice(&buf);
        buf = chunk;
    }

    let text = String::from_utf8_lossy(&buf).replace("\r\n", "\n");
    let mut lines: Vec<&str> = text.split('\n').collect();
    if lines.last() == Some(&"") {
        lines.pop();
    }
    let start = lines.len().saturating_sub(n);
    Ok(lines[start..].join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use tempfile::TempDir;

    fn block_on<F: std::future::Future>(future: F) -> F::Output {
        tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map(|rt| rt.block_on(future))
            .unwrap_or_else(|e| panic!("failed to build runtime: {e}"))
    }

    #[test]
    fn test_head_lines() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("f.txt");
        std::fs::write(&path, "1\n2\n3\n4\n")?;

        assert_eq!(block_on(head_lines(&path, 2))?, "1\n2");
        assert_eq!(block_on(head_lines(&path, 10))?, "1\n2\n3\n4");
        Ok(())
    }

    #[test]
    fn test_tail_lines() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("f.txt");
        std::fs::write(&path, "1\n2\n3\n4\n")?;

        assert_eq!(block_on(tail_lines(&path, 2))?, "3\n4");
        assert_eq!(block_on(tail_lines(&path, 10))?, "1\n2\n3\n4");
        Ok(())
    }

    #[test]
    fn test_tail_lines_spanning_chunks() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("big.txt");
        let content: String = (0..500).map(|i| format!("line-{i}\n")).collect();
        std::fs::write(&path, &content)?;

        assert_eq!(block_on(tail_lines(&path, 3))?, "line-497\nline-498\nline-499");
        Ok(())
    }

    #[test]
    fn test_tail_of_empty_file() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("empty.txt");
        std::fs::write(&path, "")?;

        assert_eq!(block_on(tail_lines(&path, 5))?, "");
        Ok(())
    }
}
