// SPDX-License-Identifier: GPL-3.0-or-later

//! Structural text editing with verifiable diff output.
//!
//! Applies an ordered sequence of find/replace edits to file content and
//! renders a unified diff of the overall change. Matching is two-tier:
//! exact substring first, then a per-line whitespace-normalized pass that
//! tolerates edits authored against differently-indented source. A failed
//! match aborts the whole call; nothing is partially applied.

use serde::Deserialize;
use similar::TextDiff;
use thiserror::Error;
use tracing::debug;

/// One find/replace operation. Wire field names follow the MCP tool schema.
#[derive(Debug, Clone, Deserialize)]
pub struct EditOperation {
    /// Text to search for. Matched exactly, or with per-line whitespace
    /// normalization as a fallback.
    #[serde(rename = "oldText")]
    pub old_text: String,
    /// Text to substitute for the matched region.
    #[serde(rename = "newText")]
    pub new_text: String,
}

/// Outcome of a successful edit application. Nothing has been persisted;
/// the caller decides based on `dry_run`.
#[derive(Debug)]
pub struct EditResult {
    /// The fully edited content, in the original's dominant line-ending style.
    pub new_content: String,
    /// Unified diff between original and edited content.
    pub diff: String,
    /// Echo of the caller's dry-run request.
    pub dry_run: bool,
}

/// Errors from [`apply_edits`].
#[derive(Debug, Error)]
pub enum EditError {
    /// Neither matching tier located the given operation's `old_text`.
    /// Carries the zero-based index of the failing operation.
    #[error("no match found for edit operation {0}")]
    NoMatch(usize),
}

/// Applies `edits` in order to `content`, each operation seeing the result
/// of the previous one.
///
/// `label` names the file in the diff header. The diff is produced whether
/// or not `dry_run` is set; dry-run only signals the caller not to persist.
///
/// # Errors
///
/// Returns [`EditError::NoMatch`] identifying the first operation that
/// could not be located. No partial result is produced.
pub fn apply_edits(
    content: &str,
    label: &str,
    edits: &[EditOperation],
    dry_run: bool,
) -> Result<EditResult, EditError> {
    let uses_crlf = dominant_crlf(content);
    let original = normalize_line_endings(content);
    let mut modified = original.clone();

    for (index, edit) in edits.iter().enumerate() {
        let old = normalize_line_endings(&edit.old_text);
        let new = normalize_line_endings(&edit.new_text);

        if let Some(pos) = modified.find(&old) {
            modified.replace_range(pos..pos + old.len(), &new);
            continue;
        }

        modified = match replace_normalized(&modified, &old, &new) {
            Some(updated) => updated,
            None => {
                debug!("edit {index} failed to match");
                return Err(EditError::NoMatch(index));
            }
        };
    }

    let diff = unified_diff(&original, &modified, label);
    let new_content = if uses_crlf {
        modified.replace('\n', "\r\n")
    } else {
        modified
    };

    Ok(EditResult {
        new_content,
        diff,
        dry_run,
    })
}

/// Renders a conventional `---`/`+++`/`@@` unified diff.
fn unified_diff(original: &str, modified: &str, label: &str) -> String {
    TextDiff::from_lines(original, modified)
        .unified_diff()
        .context_radius(3)
        .header(&format!("{label} (original)"), &format!("{label} (modified)"))
        .to_string()
}

/// Tier-two matching: locates `old` as a run of lines compared with
/// leading/trailing whitespace stripped, then substitutes `new` while
/// re-applying the matched region's base indentation.
fn replace_normalized(content: &str, old: &str, new: &str) -> Option<String> {
    let old_lines: Vec<&str> = old.split('\n').collect();
    let mut content_lines: Vec<String> = content.split('\n').map(str::to_string).collect();
    if old_lines.is_empty() || content_lines.len() < old_lines.len() {
        return None;
    }

    for start in 0..=(content_lines.len() - old_lines.len()) {
        let window = &content_lines[start..start + old_lines.len()];
        let is_match = old_lines
            .iter()
            .zip(window.iter())
            .all(|(old_line, content_line)| old_line.trim() == content_line.trim());
        if !is_match {
            continue;
        }

        let base_indent = leading_whitespace(&content_lines[start]).to_string();
        let mut new_lines: Vec<String> = new.split('\n').map(str::to_string).collect();

        if let Some(first) = new_lines.first_mut() {
            *first = format!("{base_indent}{}", first.trim_start());
        }
        // Subsequent lines keep their indentation relative to the matched
        // region's original lines.
        for j in 1..new_lines.len() {
            if j < old_lines.len() {
                let old_indent = leading_whitespace(old_lines[j]);
                let new_indent = leading_whitespace(&new_lines[j]).to_string();
                if !old_indent.is_empty() && !new_indent.is_empty() {
                    let relative = new_indent.len().saturating_sub(old_indent.len());
                    new_lines[j] = format!(
                        "{base_indent}{}{}",
                        " ".repeat(relative),
                        new_lines[j].trim_start()
                    );
                }
            }
        }

        content_lines.splice(start..start + old_lines.len(), new_lines);
        return Some(content_lines.join("\n"));
    }

    None
}

/// The leading whitespace of a line.
fn leading_whitespace(line: &str) -> &str {
    let trimmed = line.trim_start();
    &line[..line.len() - trimmed.len()]
}

/// Whether CRLF is the dominant line-ending style in `content`.
fn dominant_crlf(content: &str) -> bool {
    let crlf = content.matches("\r\n").count();
    let total = content.matches('\n').count();
    crlf > total - crlf
}

/// Converts CRLF line endings to LF.
fn normalize_line_endings(text: &str) -> String {
    text.replace("\r\n", "\n")
}
