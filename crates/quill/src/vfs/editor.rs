//! Line- and substring-oriented edits over a single file.
//!
//! Lines are the `\n`-separated segments of a file's content and are
//! numbered from 1. Empty content has no lines at all. Line numbers arrive
//! straight from agent tool calls, so they are taken as signed integers and
//! validated here rather than trusted.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::error::{VfsError, VfsResult};
use super::path::CanonicalPath;
use super::store::NodeStore;

/// Lines returned by [`view`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewResult {
    /// The file that was viewed.
    pub path: CanonicalPath,
    /// 1-indexed number of the first returned line.
    pub start_line: usize,
    /// Total number of lines in the file.
    pub total_lines: usize,
    /// The requested lines, without their terminators.
    pub lines: Vec<String>,
}

impl ViewResult {
    /// The viewed lines joined back into text.
    pub fn content(&self) -> String {
        self.lines.join("\n")
    }

    /// The viewed lines prefixed with their line numbers, one per row.
    ///
    /// ```text
    /// 1	import { useState } from 'react';
    /// 2
    /// 3	const Counter = () => {
    /// ```
    pub fn numbered(&self) -> String {
        self.lines
            .iter()
            .enumerate()
            .map(|(offset, line)| format!("{}\t{line}", self.start_line + offset))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// The outcome of a successful edit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditResult {
    /// The edited file.
    pub path: CanonicalPath,
    /// Content after the edit.
    pub content: String,
}

/// Split content into lines. Empty content has zero lines.
fn split_lines(content: &str) -> Vec<&str> {
    if content.is_empty() {
        Vec::new()
    } else {
        content.split('\n').collect()
    }
}

/// Return a file's content, optionally restricted to an inclusive 1-indexed line range.
pub fn view(store: &NodeStore, path: &str, range: Option<(i64, i64)>) -> VfsResult<ViewResult> {
    let (path, content) = store.get_file(path)?;
    let lines = split_lines(content);
    let total_lines = lines.len();

    let (start, end) = match range {
        None => (1, total_lines),
        Some((start, end)) => {
            let in_bounds = start >= 1
                && end >= start
                && usize::try_from(end).is_ok_and(|end| end <= total_lines);
            if !in_bounds {
                return Err(VfsError::RangeOutOfBounds {
                    path: path.to_string(),
                    requested: format!("[{start}, {end}]"),
                    line_count: total_lines,
                });
            }
            // Both bounds were checked against `total_lines` above.
            (start as usize, end as usize)
        }
    };

    let selected = if total_lines == 0 {
        Vec::new()
    } else {
        lines[start - 1..end].iter().map(|l| l.to_string()).collect()
    };

    Ok(ViewResult {
        path: path.clone(),
        start_line: start,
        total_lines,
        lines: selected,
    })
}

/// Replace the single literal occurrence of `old_str` with `new_str`.
///
/// Fails with [`VfsError::NoMatch`] when `old_str` does not occur and with
/// [`VfsError::AmbiguousMatch`] when it occurs more than once; the file is
/// untouched in both cases.
pub fn replace_in_file(
    store: &mut NodeStore,
    path: &str,
    old_str: &str,
    new_str: &str,
) -> VfsResult<EditResult> {
    let (path, content) = store.get_file(path)?;
    let path = path.clone();

    let count = count_occurrences(content, old_str);
    let start = match count {
        0 => {
            return Err(VfsError::NoMatch {
                path: path.to_string(),
            });
        }
        1 => content.find(old_str).unwrap_or_default(),
        count => {
            return Err(VfsError::AmbiguousMatch {
                path: path.to_string(),
                count,
            });
        }
    };

    let mut updated = String::with_capacity(content.len() - old_str.len() + new_str.len());
    updated.push_str(&content[..start]);
    updated.push_str(new_str);
    updated.push_str(&content[start + old_str.len()..]);

    debug!(%path, offset = start, "replaced unique match");
    store.write_file(&path, updated.clone())?;
    Ok(EditResult {
        path,
        content: updated,
    })
}

/// Insert `new_str` as new line(s) after line `after_line` (0 inserts before the first line).
pub fn insert_in_file(
    store: &mut NodeStore,
    path: &str,
    after_line: i64,
    new_str: &str,
) -> VfsResult<EditResult> {
    let (path, content) = store.get_file(path)?;
    let path = path.clone();

    let mut lines = split_lines(content);
    let index = usize::try_from(after_line)
        .ok()
        .filter(|&index| index <= lines.len())
        .ok_or_else(|| VfsError::RangeOutOfBounds {
            path: path.to_string(),
            requested: after_line.to_string(),
            line_count: lines.len(),
        })?;

    lines.insert(index, new_str);
    let updated = lines.join("\n");

    debug!(%path, after_line = index, "inserted text");
    store.write_file(&path, updated.clone())?;
    Ok(EditResult {
        path,
        content: updated,
    })
}

/// Undo is not available: no edit history is kept.
pub fn undo_edit(path: &str) -> VfsResult<EditResult> {
    Err(VfsError::Unsupported(format!(
        "undo_edit is not supported for {path}: no edit history is kept. \
         Use str_replace with the previous content, or create, to revert changes."
    )))
}

/// Count occurrences of `needle` in `haystack`, including overlapping ones.
///
/// An empty needle occurs at every character boundary.
fn count_occurrences(haystack: &str, needle: &str) -> usize {
    if needle.is_empty() {
        return haystack.chars().count() + 1;
    }
    let mut count = 0;
    let mut from = 0;
    while let Some(found) = haystack[from..].find(needle) {
        count += 1;
        let at = from + found;
        // Step past the first character of the match so overlaps are seen.
        from = at + haystack[at..].chars().next().map_or(1, char::len_utf8);
    }
    count
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn store_with(path: &str, content: &str) -> NodeStore {
        let mut store = NodeStore::new();
        store.create_file_with_parents(path, content).unwrap();
        store
    }

    // ==================== view ====================

    #[test]
    fn test_view_whole_file() {
        let mut store = NodeStore::new();
        store.create_file_with_parents("/a/b/c.txt", "x").unwrap();

        let result = view(&store, "/a/b/c.txt", None).unwrap();
        assert_eq!(result.content(), "x");
        assert_eq!(result.numbered(), "1\tx");
        assert_eq!(result.total_lines, 1);
    }

    #[test]
    fn test_view_range() {
        let store = store_with("/f.txt", "one\ntwo\nthree\nfour");
        let result = view(&store, "/f.txt", Some((2, 3))).unwrap();
        assert_eq!(result.lines, vec!["two", "three"]);
        assert_eq!(result.numbered(), "2\ttwo\n3\tthree");
    }

    #[test]
    fn test_view_range_out_of_bounds() {
        let store = store_with("/f.txt", "one\ntwo");
        for range in [(0, 1), (2, 1), (1, 3), (-1, 2)] {
            let err = view(&store, "/f.txt", Some(range)).unwrap_err();
            assert!(
                matches!(err, VfsError::RangeOutOfBounds { line_count: 2, .. }),
                "range {range:?} should be rejected, got {err:?}"
            );
        }
    }

    #[test]
    fn test_view_empty_file() {
        let store = store_with("/empty.txt", "");
        let result = view(&store, "/empty.txt", None).unwrap();
        assert!(result.lines.is_empty());
        assert_eq!(result.numbered(), "");
        assert!(view(&store, "/empty.txt", Some((1, 1))).is_err());
    }

    #[test]
    fn test_view_missing_and_directory() {
        let store = store_with("/dir/f.txt", "x");
        assert!(matches!(
            view(&store, "/nope", None).unwrap_err(),
            VfsError::NotFound(_)
        ));
        assert!(matches!(
            view(&store, "/dir", None).unwrap_err(),
            VfsError::NotFound(_)
        ));
    }

    // ==================== replace ====================

    #[test]
    fn test_replace_unique_match() {
        let mut store = store_with("/f.txt", "foo bar foo");
        let result = replace_in_file(&mut store, "/f.txt", "bar", "baz").unwrap();
        assert_eq!(result.content, "foo baz foo");
        assert_eq!(
            store.get("/f.txt").unwrap().content(),
            Some("foo baz foo")
        );
    }

    #[test]
    fn test_replace_ambiguous_match_leaves_file() {
        let mut store = store_with("/f.txt", "foo bar foo");
        let err = replace_in_file(&mut store, "/f.txt", "foo", "qux").unwrap_err();
        assert_eq!(
            err,
            VfsError::AmbiguousMatch {
                path: "/f.txt".into(),
                count: 2
            }
        );
        assert!(err.to_string().contains("more surrounding context"));
        assert_eq!(
            store.get("/f.txt").unwrap().content(),
            Some("foo bar foo")
        );
    }

    #[test]
    fn test_replace_overlapping_is_ambiguous() {
        let mut store = store_with("/f.txt", "aaa");
        assert!(matches!(
            replace_in_file(&mut store, "/f.txt", "aa", "b").unwrap_err(),
            VfsError::AmbiguousMatch { count: 2, .. }
        ));
    }

    #[test]
    fn test_replace_no_match() {
        let mut store = store_with("/f.txt", "hello");
        assert!(matches!(
            replace_in_file(&mut store, "/f.txt", "world", "x").unwrap_err(),
            VfsError::NoMatch { .. }
        ));
    }

    #[test]
    fn test_replace_is_literal() {
        let mut store = store_with("/f.txt", "a.c abc");
        let result = replace_in_file(&mut store, "/f.txt", "a.c", "X").unwrap();
        assert_eq!(result.content, "X abc");
    }

    #[test]
    fn test_replace_multiline_and_unicode() {
        let mut store = store_with("/f.txt", "héllo\nwörld\n");
        let result = replace_in_file(&mut store, "/f.txt", "lo\nwö", "LO\nWÖ").unwrap();
        assert_eq!(result.content, "hélLO\nWÖrld\n");
    }

    #[test]
    fn test_replace_missing_file() {
        let mut store = NodeStore::new();
        assert!(matches!(
            replace_in_file(&mut store, "/f.txt", "a", "b").unwrap_err(),
            VfsError::NotFound(_)
        ));
    }

    // ==================== insert ====================

    #[test]
    fn test_insert_at_start_and_end() {
        let mut store = store_with("/f.txt", "a\nb");
        let result = insert_in_file(&mut store, "/f.txt", 0, "first").unwrap();
        assert_eq!(result.content, "first\na\nb");

        let mut store = store_with("/f.txt", "a\nb");
        let result = insert_in_file(&mut store, "/f.txt", 2, "x").unwrap();
        assert_eq!(result.content, "a\nb\nx");
    }

    #[test]
    fn test_insert_multiline() {
        let mut store = store_with("/f.txt", "a\nd");
        let result = insert_in_file(&mut store, "/f.txt", 1, "b\nc").unwrap();
        assert_eq!(result.content, "a\nb\nc\nd");
    }

    #[test]
    fn test_insert_into_empty_file() {
        let mut store = store_with("/f.txt", "");
        let result = insert_in_file(&mut store, "/f.txt", 0, "only").unwrap();
        assert_eq!(result.content, "only");
    }

    #[test]
    fn test_insert_out_of_bounds() {
        let mut store = store_with("/f.txt", "a\nb");
        for line in [-1, 3] {
            assert!(matches!(
                insert_in_file(&mut store, "/f.txt", line, "x").unwrap_err(),
                VfsError::RangeOutOfBounds { line_count: 2, .. }
            ));
        }
        assert_eq!(store.get("/f.txt").unwrap().content(), Some("a\nb"));
    }

    // ==================== undo ====================

    #[test]
    fn test_undo_unsupported() {
        let err = undo_edit("/f.txt").unwrap_err();
        assert!(matches!(err, VfsError::Unsupported(_)));
        assert!(err.to_string().contains("str_replace"));
    }

    #[test]
    fn test_count_occurrences() {
        assert_eq!(count_occurrences("foo bar foo", "foo"), 2);
        assert_eq!(count_occurrences("aaaa", "aa"), 3);
        assert_eq!(count_occurrences("abc", "d"), 0);
        assert_eq!(count_occurrences("", ""), 1);
        assert_eq!(count_occurrences("ab", ""), 3);
    }
}
