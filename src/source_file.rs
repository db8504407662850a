//! Go source files read from disk, and positions within them.

use std::{
    fs, io,
    path::{Path, PathBuf},
    sync::Arc,
};

use crate::span::Span;

/// A Go source file.
///
/// Cloning is cheap: the contents are shared behind an `Arc<str>`.
#[derive(Clone)]
pub struct SourceFile {
    path: Box<Path>,
    contents: Arc<str>,
}

impl SourceFile {
    pub fn read(path: impl Into<Box<Path>>) -> io::Result<Self> {
        let path = path.into();
        let contents = fs::read_to_string(&path)?.into();
        Ok(Self { path, contents })
    }

    pub fn contents(&self) -> &str {
        &self.contents
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The final component of the path, which build constraints look at.
    pub fn file_name(&self) -> &str {
        self.path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or_default()
    }

    /// Formats the start of `span` as `path:line:column`, the way the Go
    /// toolchain reports positions.
    pub fn position(&self, span: Span) -> String {
        let (line, column) = self.line_col(span);
        format!("{}:{line}:{column}", self.path.display())
    }

    pub fn line_col(&self, span: Span) -> (usize, usize) {
        line_col(&self.contents, span.start as usize)
    }
}

impl std::fmt::Debug for SourceFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let contents = format!("... {{{:.3}KiB}}", (self.contents.len() as f64) / 1024f64);
        f.debug_struct("SourceFile")
            .field("path", &self.path)
            .field("contents", &contents)
            .finish()
    }
}

impl From<(PathBuf, String)> for SourceFile {
    fn from((path, contents): (PathBuf, String)) -> Self {
        Self {
            path: path.into(),
            contents: contents.into(),
        }
    }
}

/// Returns the 1-indexed line and column of the byte `offset` in `text`.
///
/// Columns count bytes rather than characters.
pub fn line_col(text: &str, offset: usize) -> (usize, usize) {
    let offset = offset.min(text.len());
    let before = &text.as_bytes()[..offset];
    let line = before.iter().filter(|&&b| b == b'\n').count() + 1;
    let column = match before.iter().rposition(|&b| b == b'\n') {
        Some(newline) => offset - newline,
        None => offset + 1,
    };

    (line, column)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positions() {
        let file = SourceFile::from((PathBuf::from("/src/p/p.go"), "package p\n\ntype T int\n".to_owned()));

        assert_eq!(file.line_col(Span::new(0, 1)), (1, 1));
        assert_eq!(file.line_col(Span::new(11, 12)), (3, 1));
        assert_eq!(file.position(Span::new(16, 17)), "/src/p/p.go:3:6");
        assert_eq!(file.file_name(), "p.go");
    }

    #[test]
    fn offsets_past_the_end_are_clamped() {
        assert_eq!(line_col("ab\nc", 100), (2, 2));
        assert_eq!(line_col("", 0), (1, 1));
    }
}
