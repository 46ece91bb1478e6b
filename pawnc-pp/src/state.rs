use std::path::PathBuf;
use std::rc::Rc;

use pawnc_lex::{Atom, Interner, KeywordTable, LexCtx, Token, TokenKind, TokenPos};
use pawnc_source::diag::Note;
use pawnc_source::{DResult, SourcePos, SourceRange};

use crate::file::IncludeKind;
use crate::macros::{MacroDef, MacroTable, ReplacementList};

/// Where a comment block sits relative to its neighbour token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentPos {
    /// The block precedes a token that starts its own line.
    Front,
    /// The block trails a token on the same line.
    Tail,
}

/// An `#include`/`#tryinclude` the lexer has parsed but cannot act on itself.
///
/// Pushing a new file replaces the active lexer, so the request is queued here and consumed by the
/// [`Preprocessor`](../struct.Preprocessor.html) once the directive finishes.
pub struct IncludeRequest {
    pub kind: IncludeKind,
    /// `false` for `#tryinclude`, where a missing file is not an error.
    pub required: bool,
    /// The location of the directive, for diagnostics.
    pub loc: SourcePos,
    pub filename: PathBuf,
}

/// One macro expansion in flight: a replacement list being replayed into an expansion source.
struct ExpansionFrame {
    name: Atom,
    def: Rc<MacroDef>,
    idx: usize,
    spelling_start: SourcePos,
    exp_start: SourcePos,
}

impl ExpansionFrame {
    /// Returns the next replayed token, with its locations remapped from the `#define` body into
    /// the expansion source.
    fn next_token(&mut self) -> Option<Token> {
        let tok = self.def.replacement.tokens().get(self.idx)?;
        self.idx += 1;

        let remap = |pos: TokenPos| {
            TokenPos::new(
                self.exp_start.offset(pos.loc.offset_from(self.spelling_start)),
                pos.line,
            )
        };

        Some(Token::new(tok.kind, remap(tok.start), remap(tok.end)))
    }
}

/// The preprocessor state the lexer works against: the macro table and expansion stack, the
/// keyword table, and the sinks for everything a directive produces besides tokens.
pub struct PpState {
    /// Gates macro expansion of identifiers. Directive handlers clear this while capturing
    /// `#define` bodies and `#undef`/pragma operand names.
    pub macro_expansion: bool,

    keywords: KeywordTable,
    macros: MacroTable,
    expansions: Vec<ExpansionFrame>,

    comments: Vec<(CommentPos, SourceRange)>,
    next_deprecation: Option<String>,
    pending_include: Option<IncludeRequest>,
    pragma_dynamic: Option<i32>,
}

impl PpState {
    pub fn new(interner: &mut Interner) -> Self {
        PpState {
            macro_expansion: true,
            keywords: KeywordTable::new(interner),
            macros: MacroTable::new(),
            expansions: Vec::new(),
            comments: Vec::new(),
            next_deprecation: None,
            pending_include: None,
            pragma_dynamic: None,
        }
    }

    /// Looks up the keyword kind of `atom`, if any. The table covers `#`-directive spellings too.
    pub fn find_keyword(&self, atom: Atom) -> Option<TokenKind> {
        self.keywords.find(atom)
    }

    /// Registers a macro definition, reporting a redefinition against the previous one.
    pub fn define_macro(
        &mut self,
        ctx: &mut LexCtx<'_, '_>,
        name: Atom,
        name_range: SourceRange,
        replacement: ReplacementList,
    ) -> DResult<()> {
        let def = MacroDef {
            name,
            loc: name_range.start(),
            replacement,
        };

        if let Some(prev) = self.macros.define(def) {
            let msg = format!("macro '{}' redefined", ctx.atom_str(name));
            ctx.reporter()
                .warn(name_range, msg)
                .add_note(Note::new(
                    "previous definition is here",
                    Some(SourceRange::from(prev.loc)),
                ))
                .emit()?;
        }

        Ok(())
    }

    /// Drops the definition of `atom`. Reports an error and returns `false` if it was not defined.
    pub fn remove_macro(
        &mut self,
        ctx: &mut LexCtx<'_, '_>,
        range: SourceRange,
        atom: Atom,
    ) -> DResult<bool> {
        if self.macros.undef(atom).is_none() {
            let msg = format!("macro '{}' is not defined", ctx.atom_str(atom));
            ctx.reporter().error(range, msg).emit()?;
            return Ok(false);
        }
        Ok(true)
    }

    /// Checks whether `atom` names a macro somewhere in the active expansion stack.
    pub fn is_expanding(&self, atom: Atom) -> bool {
        self.expansions.iter().any(|frame| frame.name == atom)
    }

    /// Begins expanding `atom` if it names a defined macro, returning whether expansion started.
    ///
    /// A macro already being expanded is not re-entered; its name lexes as a plain identifier
    /// instead. An empty replacement list expands to nothing but still counts as an expansion.
    pub fn enter_macro(
        &mut self,
        ctx: &mut LexCtx<'_, '_>,
        exp_range: SourceRange,
        atom: Atom,
    ) -> DResult<bool> {
        let def = match self.macros.lookup(atom) {
            Some(def) if !self.is_expanding(atom) => Rc::clone(def),
            Some(_) => return Ok(false),
            None => return Ok(false),
        };

        let spelling = match def.replacement.spelling_range() {
            Some(range) => range,
            None => return Ok(true),
        };

        let id = match ctx.smap.create_expansion(spelling, exp_range) {
            Ok(id) => id,
            Err(_) => {
                return ctx
                    .reporter()
                    .fatal(exp_range, "translation unit too large")
                    .emit()
                    .map(|_| false);
            }
        };

        let exp_start = ctx.smap.get_source(id).range.start();
        self.expansions.push(ExpansionFrame {
            name: atom,
            def,
            idx: 0,
            spelling_start: spelling.start(),
            exp_start,
        });

        Ok(true)
    }

    /// Returns the next token replayed from the active macro expansions, if any.
    ///
    /// Replayed identifiers that themselves name expandable macros are expanded in place, so the
    /// caller only ever sees fully-expanded tokens.
    pub fn next_expansion_token(&mut self, ctx: &mut LexCtx<'_, '_>) -> DResult<Option<Token>> {
        loop {
            let tok = match self.expansions.last_mut() {
                None => return Ok(None),
                Some(frame) => frame.next_token(),
            };

            let tok = match tok {
                None => {
                    self.expansions.pop();
                    continue;
                }
                Some(tok) => tok,
            };

            if self.macro_expansion {
                if let TokenKind::Name(atom) = tok.kind {
                    if self.enter_macro(ctx, tok.range(), atom)? {
                        continue;
                    }
                }
            }

            return Ok(Some(tok));
        }
    }

    pub fn add_comment(&mut self, pos: CommentPos, range: SourceRange) {
        self.comments.push((pos, range));
    }

    pub fn comments(&self) -> &[(CommentPos, SourceRange)] {
        &self.comments
    }

    pub fn set_next_deprecation(&mut self, msg: String) {
        self.next_deprecation = Some(msg);
    }

    /// Takes the deprecation message pending for the next declaration, if one was set.
    pub fn take_next_deprecation(&mut self) -> Option<String> {
        self.next_deprecation.take()
    }

    pub fn request_include(
        &mut self,
        kind: IncludeKind,
        required: bool,
        loc: SourcePos,
        filename: &[u8],
    ) {
        self.pending_include = Some(IncludeRequest {
            kind,
            required,
            loc,
            filename: PathBuf::from(String::from_utf8_lossy(filename).into_owned()),
        });
    }

    pub fn take_include_request(&mut self) -> Option<IncludeRequest> {
        self.pending_include.take()
    }

    pub fn set_pragma_dynamic(&mut self, value: i32) {
        self.pragma_dynamic = Some(value);
    }

    /// Returns the dynamic heap size requested with `#pragma dynamic`, if any.
    pub fn pragma_dynamic(&self) -> Option<i32> {
        self.pragma_dynamic
    }
}
