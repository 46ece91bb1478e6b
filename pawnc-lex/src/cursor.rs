use std::rc::Rc;

use pawnc_source::smap::FileContents;
use pawnc_source::{SourcePos, SourceRange};

/// A byte-level reader over one source buffer.
///
/// Reading past the end yields a virtual `b'\0'` sentinel; the sentinel read advances a clamped
/// one-past-end cursor so the usual "read, inspect, back up one" pattern stays symmetric at EOF.
/// Backing up is legal after any read that produced a non-sentinel byte.
pub struct SourceCursor {
    contents: Rc<FileContents>,
    range: SourceRange,
    pos: usize,
    len: usize,
}

impl SourceCursor {
    /// Creates a cursor over `contents`, reporting positions inside `range`.
    ///
    /// `range` must be the range the source map assigned to this buffer (which includes one
    /// past-the-end byte used for EOF positions).
    pub fn new(contents: Rc<FileContents>, range: SourceRange) -> Self {
        let len = contents.src.len();
        assert_eq!(range.len() as usize, len + 1);

        SourceCursor {
            contents,
            range,
            pos: 0,
            len,
        }
    }

    /// Consumes and returns the next byte, or `b'\0'` at the end of the buffer.
    #[inline]
    pub fn read_char(&mut self) -> u8 {
        if self.pos < self.len {
            let c = self.contents.src.as_bytes()[self.pos];
            self.pos += 1;
            c
        } else {
            if self.pos == self.len {
                self.pos += 1;
            }
            b'\0'
        }
    }

    /// Returns the next byte without consuming it, or `b'\0'` at the end of the buffer.
    #[inline]
    pub fn peek_char(&self) -> u8 {
        self.contents
            .src
            .as_bytes()
            .get(self.pos)
            .copied()
            .unwrap_or(b'\0')
    }

    /// Checks whether the next byte is `expected` without consuming it.
    #[inline]
    pub fn peek_is(&self, expected: u8) -> bool {
        self.peek_char() == expected
    }

    /// Consumes the next byte if it is `expected`, returning whether it was consumed.
    #[inline]
    pub fn match_char(&mut self, expected: u8) -> bool {
        debug_assert_ne!(expected, b'\0');
        if self.peek_char() == expected {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    /// Moves the cursor one byte backward.
    #[inline]
    pub fn back_up(&mut self) {
        assert!(self.pos > 0);
        self.pos -= 1;
    }

    /// Returns the byte offset of the next unconsumed byte, clamped to the buffer length.
    #[inline]
    pub fn off(&self) -> usize {
        self.pos.min(self.len)
    }

    /// Returns the location of the next unconsumed byte (the EOF position at the end).
    #[inline]
    pub fn pos(&self) -> SourcePos {
        self.range.start().offset(self.off() as u32)
    }

    /// Returns the location of the byte just read.
    #[inline]
    pub fn lastpos(&self) -> SourcePos {
        let off = self.pos.saturating_sub(1).min(self.len);
        self.range.start().offset(off as u32)
    }

    /// Checks whether the cursor has consumed the entire buffer.
    #[inline]
    pub fn at_end(&self) -> bool {
        self.pos >= self.len
    }

    /// Moves the cursor to the end of the buffer, simulating EOF.
    pub fn seek_to_end(&mut self) {
        self.pos = self.len;
    }

    /// Returns the bytes in `[start, end)` of the underlying buffer.
    pub fn slice(&self, start: usize, end: usize) -> &[u8] {
        &self.contents.src.as_bytes()[start..end]
    }
}
