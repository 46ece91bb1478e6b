#![warn(rust_2018_idioms)]

use std::borrow::Cow;

use pawnc_source::{DiagManager, DiagReporter, SourceMap};

pub use cursor::SourceCursor;
pub use kw::KeywordTable;
pub use token::{Token, TokenKind, TokenPos};

pub mod cursor;
pub mod kw;
pub mod token;

/// Atoms are interned byte strings; string-literal bodies may contain arbitrary escape-produced
/// bytes, so the pool is byte-based rather than `str`-based.
pub type Interner = intern::Interner<[u8]>;
pub type Atom = intern::Symbol<[u8]>;

/// The pieces of compile state threaded through every lexing call: the atom pool, the diagnostics
/// engine, and the source map.
pub struct LexCtx<'a, 'h> {
    pub interner: &'a mut Interner,
    pub diags: &'a mut DiagManager<'h>,
    pub smap: &'a mut SourceMap,
}

impl<'a, 'h> LexCtx<'a, 'h> {
    pub fn new(
        interner: &'a mut Interner,
        diags: &'a mut DiagManager<'h>,
        smap: &'a mut SourceMap,
    ) -> Self {
        Self {
            interner,
            diags,
            smap,
        }
    }

    pub fn reporter(&mut self) -> DiagReporter<'_, 'h> {
        self.diags.reporter(self.smap)
    }

    /// Interns `bytes`, returning its atom.
    pub fn intern(&mut self, bytes: &[u8]) -> Atom {
        self.interner.intern(bytes)
    }

    /// Returns the spelling of `atom` for display, replacing any non-UTF-8 bytes.
    pub fn atom_str(&self, atom: Atom) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.interner[atom])
    }
}

/// Decodes a decimal digit string into a 32-bit value.
///
/// Unlike integer literals in source code, this helper accepts `_` as a digit separator; it is
/// used for numeric strings that arrive out-of-band (version pragmas and the like). Decoding stops
/// at the first byte that is neither a digit nor `_`.
pub fn string_to_int32(bytes: &[u8]) -> i32 {
    let mut v: i32 = 0;
    for &b in bytes {
        match b {
            b'0'..=b'9' => v = v.wrapping_mul(10).wrapping_add((b - b'0') as i32),
            b'_' => {}
            _ => break,
        }
    }
    v
}
