//! Source position model.
//!
//! A position is a `(FileId, byte offset, length)` triple. Unlike the
//! teacher's `Span`, no source text is embedded here — line/column are
//! derived lazily from a `SourceMap` only when a diagnostic actually needs to
//! render them, so spans stay cheap to copy and to store per-token/per-node.

use std::collections::HashMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
pub struct FileId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Span {
    pub file: FileId,
    pub offset: u32,
    pub length: u32,
}

impl Span {
    pub fn new(file: FileId, offset: u32, length: u32) -> Self {
        Self {
            file,
            offset,
            length,
        }
    }

    pub fn dummy() -> Self {
        Self {
            file: FileId(0),
            offset: 0,
            length: 0,
        }
    }

    pub fn end(&self) -> u32 {
        self.offset + self.length
    }

    /// True when `other` lies fully within `self` (used by the span-containment
    /// property test: every child node's span is a subrange of its parent's).
    pub fn contains(&self, other: &Span) -> bool {
        self.file == other.file && other.offset >= self.offset && other.end() <= self.end()
    }

    /// Smallest span covering both `self` and `other`. Both must be in the same file.
    pub fn merge(&self, other: &Span) -> Span {
        debug_assert_eq!(self.file, other.file);
        let start = self.offset.min(other.offset);
        let end = self.end().max(other.end());
        Span {
            file: self.file,
            offset: start,
            length: end - start,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct LineCol {
    pub line: u32,
    pub column: u32,
}

/// Owns file paths and contents, keyed by `FileId`, and derives line/column
/// information from byte offsets on demand via a cached table of line-start
/// offsets (built once per file on first lookup).
#[derive(Debug, Default)]
pub struct SourceMap {
    files: HashMap<FileId, SourceFile>,
    next_id: u32,
}

#[derive(Debug)]
struct SourceFile {
    path: String,
    contents: String,
    line_starts: Vec<u32>,
}

fn compute_line_starts(contents: &str) -> Vec<u32> {
    let mut starts = vec![0];
    for (i, b) in contents.bytes().enumerate() {
        if b == b'\n' {
            starts.push((i + 1) as u32);
        }
    }
    starts
}

impl SourceMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_file(&mut self, path: impl Into<String>, contents: impl Into<String>) -> FileId {
        let id = FileId(self.next_id);
        self.next_id += 1;
        let contents = contents.into();
        let line_starts = compute_line_starts(&contents);
        self.files.insert(
            id,
            SourceFile {
                path: path.into(),
                contents,
                line_starts,
            },
        );
        id
    }

    pub fn path(&self, file: FileId) -> &str {
        self.files
            .get(&file)
            .map(|f| f.path.as_str())
            .unwrap_or("<unknown>")
    }

    pub fn contents(&self, file: FileId) -> &str {
        self.files
            .get(&file)
            .map(|f| f.contents.as_str())
            .unwrap_or("")
    }

    /// Derive (1-based line, 1-based column) for a byte offset into `file`.
    pub fn line_col(&self, file: FileId, offset: u32) -> LineCol {
        let Some(f) = self.files.get(&file) else {
            return LineCol { line: 1, column: 1 };
        };

        let line_idx = match f.line_starts.binary_search(&offset) {
            Ok(idx) => idx,
            Err(idx) => idx.saturating_sub(1),
        };
        let line_start = f.line_starts.get(line_idx).copied().unwrap_or(0);
        LineCol {
            line: (line_idx + 1) as u32,
            column: offset.saturating_sub(line_start) + 1,
        }
    }

    pub fn snippet(&self, span: Span) -> &str {
        let Some(f) = self.files.get(&span.file) else {
            return "";
        };
        let start = span.offset as usize;
        let end = span.end() as usize;
        f.contents.get(start..end.min(f.contents.len())).unwrap_or("")
    }
}

impl fmt::Display for LineCol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_col_tracks_newlines() {
        let mut map = SourceMap::new();
        let file = map.add_file("a.ast", "ab\ncd\nef");

        assert_eq!(map.line_col(file, 0), LineCol { line: 1, column: 1 });
        assert_eq!(map.line_col(file, 3), LineCol { line: 2, column: 1 });
        assert_eq!(map.line_col(file, 7), LineCol { line: 3, column: 2 });
    }

    #[test]
    fn span_contains_is_reflexive_and_checks_bounds() {
        let outer = Span::new(FileId(0), 0, 10);
        let inner = Span::new(FileId(0), 2, 3);
        let outside = Span::new(FileId(0), 8, 5);

        assert!(outer.contains(&outer));
        assert!(outer.contains(&inner));
        assert!(!outer.contains(&outside));
    }

    #[test]
    fn merge_covers_both_spans() {
        let a = Span::new(FileId(0), 2, 3);
        let b = Span::new(FileId(0), 10, 2);
        let merged = a.merge(&b);

        assert_eq!(merged.offset, 2);
        assert_eq!(merged.end(), 12);
    }
}
