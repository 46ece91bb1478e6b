use std::rc::Rc;

use rustc_hash::FxHashMap;

use pawnc_lex::{Atom, Token};
use pawnc_source::{SourcePos, SourceRange};

/// The replacement tokens captured from a `#define` body.
///
/// The tokens span a contiguous portion of the line they were captured from, which lets an
/// expansion source point back at their spelling.
#[derive(Debug, Clone)]
pub struct ReplacementList {
    tokens: Vec<Token>,
}

impl ReplacementList {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self { tokens }
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Returns the range covered by this replacement list's tokens, or `None` if it is empty.
    pub fn spelling_range(&self) -> Option<SourceRange> {
        self.tokens.first().map(|first| {
            let last = self.tokens.last().unwrap();
            SourceRange::between(first.start.loc, last.end.loc)
        })
    }
}

/// A macro definition read from the source code.
#[derive(Debug)]
pub struct MacroDef {
    /// The macro's name.
    pub name: Atom,
    /// Where the name was spelled in its `#define`.
    pub loc: SourcePos,
    /// The captured replacement tokens.
    pub replacement: ReplacementList,
}

/// Holds a table of currently defined macros.
pub struct MacroTable {
    map: FxHashMap<Atom, Rc<MacroDef>>,
}

impl MacroTable {
    pub fn new() -> Self {
        Self {
            map: Default::default(),
        }
    }

    /// Adds `def` to the table.
    ///
    /// If `def` redefines an existing macro, the previous definition is returned so the caller can
    /// report it.
    pub fn define(&mut self, def: MacroDef) -> Option<Rc<MacroDef>> {
        self.map.insert(def.name, Rc::new(def))
    }

    /// Removes any stored definition associated with `name`, returning it.
    pub fn undef(&mut self, name: Atom) -> Option<Rc<MacroDef>> {
        self.map.remove(&name)
    }

    /// Looks up the definition associated with `name`.
    pub fn lookup(&self, name: Atom) -> Option<&Rc<MacroDef>> {
        self.map.get(&name)
    }
}
