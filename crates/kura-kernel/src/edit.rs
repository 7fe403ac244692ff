//! Line-oriented text edits: unique string replacement and line insertion.
//!
//! Lines are what `split('\n')` yields; empty content has no lines. Line
//! numbers shown to people are 1-indexed, insertion points are 0-indexed
//! boundaries (`0` = before the first line, `line_count` = append).

use kura_types::{ErrorCode, VfsError, VfsResult};

/// Lines shown before and after an edited region.
const SNIPPET_CONTEXT: usize = 4;

/// Split content into lines. Empty content has none.
pub fn split_lines(content: &str) -> Vec<&str> {
    if content.is_empty() {
        Vec::new()
    } else {
        content.split('\n').collect()
    }
}

/// 1-indexed line containing a byte offset.
pub fn line_at(content: &str, offset: usize) -> usize {
    content[..offset].matches('\n').count() + 1
}

/// Replace the single occurrence of `old` with `new`.
///
/// Returns the new content and the 1-indexed line where the match started.
/// Zero matches fail with `STRING_NOT_FOUND`; several fail with
/// `STRING_NOT_UNIQUE`, naming every line a match starts on.
pub fn replace_unique(content: &str, old: &str, new: &str, path: &str) -> VfsResult<(String, usize)> {
    if old.is_empty() {
        return Err(VfsError::new(
            ErrorCode::StringNotFound,
            format!("search string is empty (in {path})"),
        ));
    }

    let offsets: Vec<usize> = content.match_indices(old).map(|(idx, _)| idx).collect();
    match offsets.as_slice() {
        [] => Err(VfsError::new(
            ErrorCode::StringNotFound,
            format!("string not found in {path}"),
        )),
        [offset] => {
            let mut updated = String::with_capacity(content.len() - old.len() + new.len());
            updated.push_str(&content[..*offset]);
            updated.push_str(new);
            updated.push_str(&content[offset + old.len()..]);
            Ok((updated, line_at(content, *offset)))
        }
        many => {
            let lines: Vec<String> = many
                .iter()
                .map(|&offset| line_at(content, offset).to_string())
                .collect();
            Err(VfsError::new(
                ErrorCode::StringNotUnique,
                format!(
                    "string occurs {} times in {path} (lines {}); include more context to make it unique",
                    many.len(),
                    lines.join(", ")
                ),
            ))
        }
    }
}

/// Splice `text` in at a 0-indexed line boundary.
pub fn insert_lines(content: &str, at: usize, text: &str, path: &str) -> VfsResult<String> {
    let lines = split_lines(content);
    if at > lines.len() {
        return Err(VfsError::new(
            ErrorCode::InvalidLine,
            format!(
                "line {at} is out of range for {path} (valid: 0..={})",
                lines.len()
            ),
        ));
    }
    let mut spliced: Vec<&str> = Vec::with_capacity(lines.len() + line_span(text));
    spliced.extend_from_slice(&lines[..at]);
    spliced.extend(text.split('\n'));
    spliced.extend_from_slice(&lines[at..]);
    Ok(spliced.join("\n"))
}

/// Numbered lines around an edit.
///
/// `first` is the 1-indexed first edited line, `span` how many lines the
/// edit covers. Output looks like `cat -n`.
pub fn snippet(content: &str, first: usize, span: usize) -> String {
    let lines = split_lines(content);
    if lines.is_empty() {
        return String::new();
    }
    let start = first.saturating_sub(SNIPPET_CONTEXT).max(1);
    let end = (first + span.max(1) - 1 + SNIPPET_CONTEXT).min(lines.len());
    (start..=end)
        .map(|n| format!("{n:>6}\t{}", lines[n - 1]))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Number of lines `text` occupies once written.
pub fn line_span(text: &str) -> usize {
    text.split('\n').count()
}
