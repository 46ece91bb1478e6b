use std::fmt;
use std::ops::Range;
use std::path::PathBuf;
use std::rc::Rc;

use crate::{LineCol, SourcePos, SourceRange};
use line_table::LineTable;

mod line_table;

/// Represents a file name, which can either be a real path or a name synthesized by the compiler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileName {
    Real(PathBuf),
    Synth(String),
}

impl FileName {
    /// Creates a new real file name with the specified path.
    pub fn real(path: impl Into<PathBuf>) -> Self {
        FileName::Real(path.into())
    }

    /// Creates a new synthesized file name.
    pub fn synth(name: impl Into<String>) -> Self {
        FileName::Synth(name.into())
    }

    /// Returns `true` if the file name is real.
    pub fn is_real(&self) -> bool {
        matches!(self, FileName::Real(_))
    }
}

impl fmt::Display for FileName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileName::Real(path) => write!(f, "{}", path.display()),
            FileName::Synth(name) => write!(f, "<{}>", name),
        }
    }
}

/// Represents the contents of a loaded source file.
pub struct FileContents {
    /// The source code in the file.
    pub src: String,
    /// A table used to look up line numbers by file offset.
    line_table: LineTable,
}

impl FileContents {
    /// Creates a new `FileContents` with the specified source.
    pub fn new(src: &str) -> Rc<Self> {
        let line_table = LineTable::new_for_src(src);

        Rc::new(FileContents {
            src: src.to_owned(),
            line_table,
        })
    }

    /// Retrieves the specified portion of the source code.
    ///
    /// # Panics
    ///
    /// Panics if the range does not lie within the source.
    pub fn get_snippet(&self, range: Range<u32>) -> &str {
        &self.src[range.start as usize..range.end as usize]
    }

    /// Returns the number of lines in the source.
    pub fn line_count(&self) -> u32 {
        self.line_table.line_count()
    }

    /// Computes the line and column numbers for the specified position.
    ///
    /// # Panics
    ///
    /// Panics if the offset is longer than the source.
    pub fn get_linecol(&self, off: u32) -> LineCol {
        assert!((off as usize) <= self.src.len());
        self.line_table.get_linecol(off)
    }

    /// Obtains the starting offset within the source of the specified (zero-based) line number.
    ///
    /// # Panics
    ///
    /// Panics if the line number is out of range.
    pub fn get_line_start(&self, line: u32) -> u32 {
        self.line_table.get_line_start(line)
    }

    /// Obtains the ending offset within the source of the specified (zero-based) line number.
    ///
    /// # Panics
    ///
    /// Panics if the line number is out of range.
    pub fn get_line_end(&self, line: u32) -> u32 {
        assert!(line < self.line_count());

        if line == self.line_count() - 1 {
            self.src.len() as u32
        } else {
            self.line_table.get_line_start(line + 1) - 1
        }
    }

    /// Returns a reference to the specified line of source code, without its terminator.
    ///
    /// # Panics
    ///
    /// Panics if the line number is out of range.
    pub fn get_line(&self, line: u32) -> &str {
        let snippet = self.get_snippet(self.get_line_start(line)..self.get_line_end(line));
        snippet.trim_end_matches(|c| c == '\n' || c == '\r')
    }
}

/// Holds information about a file [source](../struct.SourceMap.html#sources).
#[derive(Clone)]
pub struct FileSourceInfo {
    /// The name of the file.
    pub filename: FileName,
    /// The contents of the file. Multiple file sources may share the same contents (e.g. when the
    /// same file is included multiple times).
    pub contents: Rc<FileContents>,
    /// The position at which this file was included, if any.
    pub include_pos: Option<SourcePos>,
}

impl FileSourceInfo {
    pub fn new(
        filename: FileName,
        contents: Rc<FileContents>,
        include_pos: Option<SourcePos>,
    ) -> Self {
        Self {
            filename,
            contents,
            include_pos,
        }
    }
}

/// Holds information about a macro-expansion [source](../struct.SourceMap.html#sources).
///
/// The source itself covers the spelling of the macro body; `spelling_pos` points at where that
/// body was spelled (the `#define` site) and `expansion_range` covers the name that triggered the
/// expansion.
#[derive(Debug, Clone, Copy)]
pub struct ExpansionSourceInfo {
    pub spelling_pos: SourcePos,
    pub expansion_range: SourceRange,
}

impl ExpansionSourceInfo {
    pub fn new(spelling_pos: SourcePos, expansion_range: SourceRange) -> Self {
        ExpansionSourceInfo {
            spelling_pos,
            expansion_range,
        }
    }

    /// Returns the spelling position corresponding to byte `off` of the expansion.
    pub fn spelling_pos(&self, off: u32) -> SourcePos {
        self.spelling_pos.offset(off)
    }
}

#[derive(Clone)]
pub enum SourceInfo {
    File(FileSourceInfo),
    Expansion(ExpansionSourceInfo),
}

/// An area to which source code can be attributed: a file or a macro expansion.
#[derive(Clone)]
pub struct Source {
    pub info: SourceInfo,
    pub range: SourceRange,
}

impl Source {
    pub fn local_off(&self, pos: SourcePos) -> u32 {
        assert!(self.range.contains(pos));
        pos.offset_from(self.range.start())
    }

    pub fn local_range(&self, range: SourceRange) -> Range<u32> {
        assert!(self.range.contains_range(range));
        let off = self.local_off(range.start());
        off..off + range.len()
    }

    pub fn as_file(&self) -> Option<&FileSourceInfo> {
        match self.info {
            SourceInfo::File(ref file) => Some(file),
            _ => None,
        }
    }

    pub fn as_expansion(&self) -> Option<&ExpansionSourceInfo> {
        match self.info {
            SourceInfo::Expansion(ref exp) => Some(exp),
            _ => None,
        }
    }

    pub fn is_file(&self) -> bool {
        self.as_file().is_some()
    }

    pub fn is_expansion(&self) -> bool {
        self.as_expansion().is_some()
    }
}
