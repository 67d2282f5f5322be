//! The source map and source files.

use super::{ByteIndex, LocalSpan, Span, Spanning};
use std::{io, ops::Range, path::PathBuf};
use unicode_width::UnicodeWidthStr;

#[cfg(test)]
mod test;

/// A mapping from [index](SourceFileIndex) to [source file](SourceFile).
///
/// The source files are laid out next to each other and padded on their left (at their
/// start) by one byte to reserve space for end-of-input pseudo tokens. Additionally,
/// this frees up the byte index `0` and allows `Span::default()` — starting at this
/// unmapped index and empty — to be interpreted as an _unknown location_.
#[derive(Default)]
pub struct SourceMap {
    files: Vec<SourceFile>,
}

impl SourceMap {
    fn next_offset(&self) -> ByteIndex {
        const PADDING: u32 = 1;

        self.files.last().map(|file| file.span().end).unwrap_or_default() + PADDING
    }

    /// Open a file given its path and add it as a [`SourceFile`] to the map.
    pub fn load(&mut self, path: PathBuf) -> io::Result<SourceFileIndex> {
        let source = std::fs::read_to_string(&path)?;
        Ok(self.add(FileName::Path(path), source))
    }

    /// Add text to the map creating a [`SourceFile`] in the process.
    pub fn add(&mut self, name: FileName, source: String) -> SourceFileIndex {
        let index = SourceFileIndex(self.files.len());
        let file = SourceFile::new(name, source, self.next_offset());
        self.files.push(file);
        index
    }

    pub fn add_str(&mut self, name: impl Into<FileName>, source: &str) -> SourceFileIndex {
        self.add(name.into(), source.to_owned())
    }

    pub fn file(&self, span: Span) -> &SourceFile {
        debug_assert!(span != Span::default());

        self.files.iter().find(|file| file.span().contains(span.start)).unwrap()
    }

    /// Resolve a span to the string content it points to.
    pub fn snippet(&self, span: Span) -> &str {
        let file = self.file(span);
        let span = span.local(file);
        &file[span]
    }

    /// Resolve a span to 1-based lines, columns, and widths for rendering.
    pub fn lines_with_highlight(&self, span: Span) -> LinesWithHighlight<'_> {
        let file = self.file(span);
        let local = span.local(file);
        let content = file.content();
        let start = usize::from(local.start).min(content.len());
        let end = usize::from(local.end).min(content.len());

        let first = line_of(content, start);
        let highlighted_line = |line: Line, start: usize, end: usize| {
            let line_content = &content[line.start..line.end];
            let prefix = &content[line.start..start];
            let highlight = &content[start..end.min(line.end).max(start)];
            let column = prefix.chars().count() + 1;

            LineWithHighlight {
                number: line.number,
                content: line_content,
                highlight: Highlight {
                    start: column as u32,
                    end: (column + highlight.chars().count()) as u32,
                    width: highlight.width(),
                    prefix_width: prefix.width(),
                },
            }
        };

        if end <= first.end {
            LinesWithHighlight {
                file: &file.name,
                first: highlighted_line(first, start, end),
                last: None,
            }
        } else {
            let last = line_of(content, end);
            LinesWithHighlight {
                file: &file.name,
                first: highlighted_line(first, start, first.end),
                last: Some(highlighted_line(last, last.start, end)),
            }
        }
    }
}

#[derive(Clone, Copy)]
struct Line {
    /// One-indexed line number.
    number: u32,
    start: usize,
    end: usize,
}

fn line_of(content: &str, index: usize) -> Line {
    let mut number = 1;
    let mut start = 0;

    for (offset, character) in content.char_indices() {
        if character == '\n' {
            if index <= offset {
                return Line { number, start, end: offset };
            }

            start = offset + 1;
            number += 1;
        }
    }

    Line { number, start, end: content.len() }
}

impl std::ops::Index<SourceFileIndex> for SourceMap {
    type Output = SourceFile;

    fn index(&self, index: SourceFileIndex) -> &Self::Output {
        &self.files[index.0]
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct SourceFileIndex(usize);

#[derive(Debug)]
#[cfg_attr(test, derive(PartialEq, Eq))]
pub struct LinesWithHighlight<'a> {
    pub file: &'a FileName,
    pub first: LineWithHighlight<'a>,
    /// This is `None` if the last line is the first line.
    pub last: Option<LineWithHighlight<'a>>,
}

#[derive(Debug)]
#[cfg_attr(test, derive(PartialEq, Eq))]
pub struct LineWithHighlight<'a> {
    /// One-indexed line number.
    pub number: u32,
    /// The content of the entire line that contains the to-be-highlighted snippet.
    pub content: &'a str,
    pub highlight: Highlight,
}

/// A 1-based character-column highlight within a line.
#[derive(Debug)]
#[cfg_attr(test, derive(PartialEq, Eq))]
pub struct Highlight {
    pub start: u32,
    pub end: u32,
    pub width: usize,
    pub prefix_width: usize,
}

/// A source file.
///
/// Obtained by and contained within a [source map](SourceMap).
pub struct SourceFile {
    name: FileName,
    content: String,
    span: Span,
}

impl SourceFile {
    fn new(name: FileName, content: String, start: ByteIndex) -> Self {
        Self {
            span: Span::with_length(start, content.len().try_into().unwrap()),
            name,
            content,
        }
    }

    pub fn name(&self) -> &FileName {
        &self.name
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn local_span(&self) -> LocalSpan {
        self.span.local(self)
    }
}

impl Spanning for SourceFile {
    fn span(&self) -> Span {
        self.span
    }
}

impl std::ops::Index<LocalSpan> for SourceFile {
    type Output = str;

    fn index(&self, index: LocalSpan) -> &Self::Output {
        &self.content[Range::from(index)]
    }
}

#[derive(PartialEq, Eq, Debug)]
pub enum FileName {
    Stdin,
    Path(PathBuf),
    Str(&'static str),
}

impl From<PathBuf> for FileName {
    fn from(path: PathBuf) -> Self {
        Self::Path(path)
    }
}

impl From<&'static str> for FileName {
    fn from(name: &'static str) -> Self {
        Self::Str(name)
    }
}
