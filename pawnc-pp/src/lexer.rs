//! The lexer: a single state machine that tokenizes source text, processes `#`-directives,
//! expands macros and skips inactive conditional regions.
//!
//! Tokenization and preprocessing are deliberately one component here. Directive parsing re-enters
//! [`scan()`](struct.Lexer.html) in a directive-local mode where newlines terminate tokens as
//! [`TokenKind::Eol`](../pawnc_lex/enum.TokenKind.html); macro expansion surfaces to the caller as
//! [`TokenKind::None`](../pawnc_lex/enum.TokenKind.html), meaning "ask again". The
//! [`Preprocessor`](../struct.Preprocessor.html) owns the lexer stack and drives `next()` until a
//! concrete token appears.

use std::mem;
use std::rc::Rc;

use pawnc_lex::{LexCtx, SourceCursor, Token, TokenKind, TokenPos};
use pawnc_source::diag::Note;
use pawnc_source::{DResult, SourcePos, SourceRange};

use crate::eval::eval_directive_expr;
use crate::file::{File, IncludeKind};
use crate::macros::ReplacementList;
use crate::state::{CommentPos, PpState};

#[cfg(test)]
mod tests;

fn is_line_terminator(c: u8) -> bool {
    c == b'\n' || c == b'\r' || c == b'\0'
}

fn is_skip_space(c: u8) -> bool {
    c == b' ' || c == b'\t' || c == b'\x0c'
}

fn is_ident_start(c: u8) -> bool {
    c.is_ascii_alphabetic() || c == b'_'
}

fn is_ident_char(c: u8) -> bool {
    is_ident_start(c) || c.is_ascii_digit()
}

fn hex_digit_value(c: u8) -> u64 {
    match c {
        b'0'..=b'9' => u64::from(c - b'0'),
        b'a'..=b'f' => u64::from(c - b'a') + 10,
        _ => {
            debug_assert!((b'A'..=b'F').contains(&c));
            u64::from(c - b'A') + 10
        }
    }
}

/// Decodes a float literal previously validated by the scanner.
///
/// The accumulation mirrors the classic pawn decoder: integer part, fraction scaled by a running
/// multiplier, then a power-of-ten exponent. It is not required to round-trip IEEE-754 exactly.
fn parse_double(bytes: &[u8]) -> f64 {
    let mut i = 0;

    let mut number = 0.0;
    while i < bytes.len() && bytes[i].is_ascii_digit() {
        number = number * 10.0 + f64::from(bytes[i] - b'0');
        i += 1;
    }

    debug_assert!(bytes[i] == b'.');
    i += 1;

    let mut fraction = 0.0;
    let mut multiplier = 1.0;
    while i < bytes.len() && bytes[i].is_ascii_digit() {
        fraction = fraction * 10.0 + f64::from(bytes[i] - b'0');
        multiplier /= 10.0;
        i += 1;
    }

    number += fraction * multiplier;

    if i < bytes.len() && bytes[i] == b'e' {
        i += 1;
        let mut sign = 1;
        if bytes[i] == b'-' {
            sign = -1;
            i += 1;
        }

        let mut exponent: i32 = 0;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            exponent = exponent * 10 + i32::from(bytes[i] - b'0');
            i += 1;
        }

        number *= 10f64.powi(exponent * sign);
    }

    number
}

enum NumberKind {
    Int,
    Hex,
    Float,
    Malformed,
}

/// Per-lexer options. Includes inherit the including file's options, but changes made inside a
/// file (`#pragma newdecls`) do not escape back to the includer.
#[derive(Debug, Clone, Default)]
pub struct LexOptions {
    /// Attribute comments to neighbouring tokens and hand the blocks to the preprocessor state.
    pub trace_comments: bool,
    /// Whether new-style declarations are required; toggled by `#pragma newdecls`.
    pub require_newdecls: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum IfState {
    /// Tokens in this region reach the parser.
    Active,
    /// The condition was false; a later `#else` can activate the region.
    Ignoring,
    /// The region already had its active part; `#else` cannot reactivate it.
    Inactive,
    /// Nested inside a skipped region; `#else` is neutralized entirely.
    Dead,
}

struct IfContext {
    first: SourcePos,
    else_loc: Option<SourcePos>,
    state: IfState,
}

impl IfContext {
    fn new(first: SourcePos, state: IfState) -> Self {
        IfContext {
            first,
            else_loc: None,
            state,
        }
    }
}

/// Lexer over one source file.
pub struct Lexer {
    options: LexOptions,
    file: Rc<File>,
    cursor: SourceCursor,
    line_number: u32,
    /// While set, newlines terminate tokens as `Eol` instead of advancing the line counter.
    lexing_for_directive: bool,
    /// Silences diagnostics during speculative scans (the post-directive line chew).
    suppress_errors: bool,
    /// Whether a non-comment token has been produced on the current line. Gates directive
    /// recognition and tail-comment attribution.
    lexed_tokens_on_line: bool,
    /// Scratch buffer for the literal or identifier being scanned.
    literal: Vec<u8>,
    ifstack: Vec<IfContext>,
}

impl Lexer {
    pub fn new(file: Rc<File>, range: SourceRange, options: LexOptions) -> Self {
        Lexer {
            cursor: SourceCursor::new(Rc::clone(&file.contents), range),
            file,
            options,
            line_number: 1,
            lexing_for_directive: false,
            suppress_errors: false,
            lexed_tokens_on_line: false,
            literal: Vec::new(),
            ifstack: Vec::new(),
        }
    }

    pub fn file(&self) -> &Rc<File> {
        &self.file
    }

    pub fn options(&self) -> &LexOptions {
        &self.options
    }

    /// Reports an error unless this lexer is in a suppressed scan.
    fn report(
        &mut self,
        ctx: &mut LexCtx<'_, '_>,
        range: impl Into<SourceRange>,
        msg: impl Into<String>,
    ) -> DResult<()> {
        if self.suppress_errors {
            return Ok(());
        }
        ctx.reporter().error(range, msg).emit()
    }

    fn skip_spaces(&mut self) {
        while is_skip_space(self.cursor.peek_char()) {
            self.cursor.read_char();
        }
    }

    fn first_non_space_char(&mut self) -> u8 {
        let mut c = self.cursor.read_char();
        while is_skip_space(c) {
            c = self.cursor.read_char();
        }
        c
    }

    /// Consumes the rest of the line, returning the byte offsets of its content with surrounding
    /// whitespace trimmed.
    fn read_until_end(&mut self) -> (usize, usize) {
        self.skip_spaces();
        let begin = self.cursor.off();

        while !is_line_terminator(self.cursor.peek_char()) {
            self.cursor.read_char();
        }

        let mut end = self.cursor.off();
        while end > begin && is_skip_space(self.cursor.slice(end - 1, end)[0]) {
            end -= 1;
        }

        (begin, end)
    }

    /// Advances the line counter for newline character `c`, folding CRLF pairs.
    fn advance_line(&mut self, c: u8) {
        debug_assert!(c == b'\r' || c == b'\n');
        if c == b'\r' && self.cursor.read_char() != b'\n' {
            self.cursor.back_up();
        }

        self.line_number += 1;
        self.lexed_tokens_on_line = false;
    }

    /// Consumes characters until we have something to start parsing from.
    fn consume_whitespace(&mut self) -> u8 {
        loop {
            let c = self.cursor.read_char();
            match c {
                b'\n' | b'\r' => {
                    if self.lexing_for_directive {
                        // Back up - don't consume the newline.
                        self.cursor.back_up();
                        return c;
                    }

                    self.advance_line(c);
                }

                b' ' | b'\t' | b'\x0c' => {}

                _ => return c,
            }
        }
    }

    /// Reads an identifier starting with `first` into the literal buffer.
    fn name(&mut self, first: u8) {
        self.literal.clear();
        self.literal.push(first);

        loop {
            let c = self.cursor.read_char();
            if !is_ident_char(c) {
                self.cursor.back_up();
                break;
            }
            self.literal.push(c);
        }
    }

    /// Reads an identifier starting with `first` and looks it up in the keyword table. The
    /// spelling stays in the literal buffer for diagnostics.
    fn maybe_keyword(
        &mut self,
        ctx: &mut LexCtx<'_, '_>,
        state: &PpState,
        first: u8,
    ) -> Option<TokenKind> {
        self.name(first);
        let atom = ctx.intern(&self.literal);
        state.find_keyword(atom)
    }

    fn hex_literal(&mut self) -> NumberKind {
        self.literal.clear();
        loop {
            let c = self.cursor.read_char();
            if !c.is_ascii_hexdigit() {
                self.cursor.back_up();
                break;
            }
            self.literal.push(c);
        }
        NumberKind::Hex
    }

    fn number_literal(&mut self, ctx: &mut LexCtx<'_, '_>, first: u8) -> DResult<NumberKind> {
        self.literal.clear();
        self.literal.push(first);

        let mut c;
        loop {
            c = self.cursor.read_char();
            if !c.is_ascii_digit() {
                break;
            }
            self.literal.push(c);
        }

        // Detect a hexadecimal string.
        if self.literal.len() == 1 && self.literal[0] == b'0' && (c == b'x' || c == b'X') {
            return Ok(self.hex_literal());
        }

        if c != b'.' {
            self.cursor.back_up();
            return Ok(NumberKind::Int);
        }
        self.literal.push(c);

        c = self.cursor.read_char();
        if !c.is_ascii_digit() {
            let msg = format!(
                "expected digit in float literal, got '{}'",
                (c as char).escape_default()
            );
            ctx.reporter().error(self.cursor.pos(), msg).emit()?;
            return Ok(NumberKind::Malformed);
        }
        self.literal.push(c);

        loop {
            c = self.cursor.read_char();
            if !c.is_ascii_digit() {
                self.cursor.back_up();
                break;
            }
            self.literal.push(c);
        }

        if !self.cursor.match_char(b'e') {
            return Ok(NumberKind::Float);
        }
        self.literal.push(b'e');

        c = self.cursor.read_char();
        if c == b'-' {
            self.literal.push(c);
            c = self.cursor.read_char();
        }
        if !c.is_ascii_digit() {
            self.cursor.back_up();

            let msg = format!(
                "expected digit in float exponent, got '{}'",
                (self.cursor.peek_char() as char).escape_default()
            );
            ctx.reporter().error(self.cursor.pos(), msg).emit()?;
            return Ok(NumberKind::Malformed);
        }
        self.literal.push(c);

        loop {
            c = self.cursor.read_char();
            if !c.is_ascii_digit() {
                self.cursor.back_up();
                break;
            }
            self.literal.push(c);
        }

        Ok(NumberKind::Float)
    }

    fn handle_number(
        &mut self,
        ctx: &mut LexCtx<'_, '_>,
        start: TokenPos,
        first: u8,
    ) -> DResult<TokenKind> {
        let kind = match self.number_literal(ctx, first)? {
            NumberKind::Int => {
                let mut val: u64 = 0;
                let mut overflowed = false;
                for &b in &self.literal {
                    debug_assert!(b.is_ascii_digit());
                    match val
                        .checked_mul(10)
                        .and_then(|v| v.checked_add(u64::from(b - b'0')))
                    {
                        Some(v) => val = v,
                        None => {
                            overflowed = true;
                            break;
                        }
                    }
                }
                if overflowed {
                    self.report(ctx, start.loc, "integer literal is too large")?;
                }
                TokenKind::IntLit(val)
            }

            NumberKind::Hex => {
                let mut val: u64 = 0;
                let mut overflowed = false;
                for &b in &self.literal {
                    match val
                        .checked_mul(16)
                        .and_then(|v| v.checked_add(hex_digit_value(b)))
                    {
                        Some(v) => val = v,
                        None => {
                            overflowed = true;
                            break;
                        }
                    }
                }
                if overflowed {
                    self.report(ctx, start.loc, "integer literal is too large")?;
                }
                TokenKind::HexLit(val)
            }

            NumberKind::Float => TokenKind::FloatLit(parse_double(&self.literal)),

            NumberKind::Malformed => TokenKind::Unknown,
        };

        Ok(kind)
    }

    /// Decodes one escape sequence after a `\`.
    ///
    /// Returns `i32::MAX` as a sentinel for an unknown escape, after reporting it.
    fn read_escape_code(&mut self, ctx: &mut LexCtx<'_, '_>) -> DResult<i32> {
        let c = self.cursor.read_char();
        if c == b'\\' {
            return Ok(i32::from(c));
        }

        match c {
            b'a' => Ok(7),
            b'b' => Ok(8),
            // \e is non-standard but handy.
            b'e' => Ok(27),
            b'f' => Ok(12),
            b'n' => Ok(10),
            b'r' => Ok(13),
            b't' => Ok(9),
            b'v' => Ok(11),

            b'x' => {
                let mut val: i32 = 0;
                let mut digits = 0;

                let mut c = self.cursor.read_char();
                while c.is_ascii_hexdigit() && digits < 2 {
                    val = val * 16 + hex_digit_value(c) as i32;
                    digits += 1;
                    c = self.cursor.read_char();
                }

                // Swallow a trailing ';'.
                if c != b';' {
                    self.cursor.back_up();
                }

                Ok(val)
            }

            b'\'' | b'"' | b'%' => Ok(i32::from(c)),

            c if c.is_ascii_digit() => {
                // \ddd
                let mut val: i32 = 0;
                let mut c = c;
                while c.is_ascii_digit() {
                    val = val.wrapping_mul(10).wrapping_add(i32::from(c - b'0'));
                    c = self.cursor.read_char();
                }

                // Swallow a trailing ';'.
                if c != b';' {
                    self.cursor.back_up();
                }

                Ok(val)
            }

            c => {
                let msg = format!("unknown escape code '\\{}'", (c as char).escape_default());
                ctx.reporter().error(self.cursor.lastpos(), msg).emit()?;
                Ok(i32::MAX)
            }
        }
    }

    fn char_literal(&mut self, ctx: &mut LexCtx<'_, '_>, start: TokenPos) -> DResult<TokenKind> {
        let c = self.cursor.read_char();
        if c == b'\'' {
            self.report(ctx, start.loc, "empty character literal")?;
            return Ok(TokenKind::Unknown);
        }

        let value = if c == b'\\' {
            self.read_escape_code(ctx)?
        } else {
            i32::from(c)
        };

        let c = self.cursor.read_char();
        if c != b'\'' {
            self.report(ctx, start.loc, "character literal is not terminated by '\''")?;

            // If the user wrote something like '5", assume it was a typo and keep the token.
            // Otherwise, backtrack.
            if c != b'"' {
                self.cursor.back_up();
            }
        }

        Ok(TokenKind::CharLit(value))
    }

    fn string_literal(&mut self, ctx: &mut LexCtx<'_, '_>, start: TokenPos) -> DResult<TokenKind> {
        self.literal.clear();

        loop {
            let c = self.cursor.read_char();
            if c == b'"' {
                break;
            }
            if c == b'\r' || c == b'\n' || c == b'\0' {
                // Leave the terminator for ordinary newline handling so line counts stay exact.
                if c != b'\0' {
                    self.cursor.back_up();
                }
                ctx.reporter()
                    .error(SourceRange::from(start.loc), "unterminated string literal")
                    .emit()?;
                let atom = ctx.intern(&self.literal);
                return Ok(TokenKind::StrLit(atom));
            }
            let c = if c == b'\\' {
                let code = self.read_escape_code(ctx)?;
                if code == i32::MAX {
                    b'?'
                } else {
                    code as u8
                }
            } else {
                c
            };
            self.literal.push(c);
        }

        let atom = ctx.intern(&self.literal);
        Ok(TokenKind::StrLit(atom))
    }

    fn handle_identifier(
        &mut self,
        ctx: &mut LexCtx<'_, '_>,
        state: &mut PpState,
        start: TokenPos,
        first: u8,
    ) -> DResult<TokenKind> {
        self.name(first);
        let atom = ctx.intern(&self.literal);

        // Macro expansion happens before keyword lookup so an unexpanded identifier is never
        // mis-classified. Directive handlers gate this with `state.macro_expansion`.
        if state.macro_expansion {
            let exp_range = SourceRange::between(start.loc, self.cursor.pos());
            if state.enter_macro(ctx, exp_range, atom)? {
                // No matter what the macro expands to (even if nothing), it counts as having
                // introduced a token onto the current line.
                self.lexed_tokens_on_line = true;
                return Ok(TokenKind::None);
            }
        }

        if let Some(kind) = state.find_keyword(atom) {
            return Ok(kind);
        }

        if self.cursor.match_char(b':') {
            return Ok(TokenKind::Label(atom));
        }
        Ok(TokenKind::Name(atom))
    }

    fn single_line_comment(&mut self, start: TokenPos) -> Token {
        while !is_line_terminator(self.cursor.peek_char()) {
            self.cursor.read_char();
        }

        // Unlike other tokens, comments carry their end position immediately, since comment
        // attribution re-scans before the caller gets a chance to fill it in.
        let end = TokenPos::new(self.cursor.pos(), self.line_number);
        Token::new(TokenKind::Comment, start, end)
    }

    fn multi_line_comment(
        &mut self,
        ctx: &mut LexCtx<'_, '_>,
        start: TokenPos,
    ) -> DResult<Token> {
        loop {
            let c = self.cursor.read_char();
            match c {
                b'\r' | b'\n' => self.advance_line(c),
                b'\0' => {
                    ctx.reporter()
                        .error(SourceRange::from(start.loc), "unterminated block comment")
                        .emit()?;
                    break;
                }
                b'*' => {
                    if self.cursor.match_char(b'/') {
                        break;
                    }
                }
                _ => {}
            }
        }

        let end = TokenPos::new(self.cursor.pos(), self.line_number);
        Ok(Token::new(TokenKind::Comment, start, end))
    }

    /// Lexes a token while inside a preprocessor directive. This is `next()` minus comment
    /// attribution; comments inside directives are skipped outright.
    pub(crate) fn directive_next(
        &mut self,
        ctx: &mut LexCtx<'_, '_>,
        state: &mut PpState,
    ) -> DResult<Token> {
        debug_assert!(self.lexing_for_directive);

        let mut tok = loop {
            let tok = self.scan(ctx, state)?;
            if tok.kind != TokenKind::Comment {
                break tok;
            }
        };

        tok.end = TokenPos::new(self.cursor.pos(), self.line_number);
        Ok(tok)
    }

    /// Eats any trailing characters after a directive, up to the newline. The newline itself is
    /// left unconsumed. Warns at most once about non-comment content if `warn_on_non_space` is
    /// set; everything else on the line is scanned with errors suppressed.
    fn chew_line_after_directive(
        &mut self,
        ctx: &mut LexCtx<'_, '_>,
        state: &mut PpState,
        warn_on_non_space: bool,
    ) -> DResult<()> {
        debug_assert!(self.lexing_for_directive);

        let prev = mem::replace(&mut self.suppress_errors, true);

        let mut warned = false;
        let result = loop {
            let tok = match self.directive_next(ctx, state) {
                Ok(tok) => tok,
                Err(err) => break Err(err),
            };

            if tok.kind == TokenKind::Eol {
                break Ok(());
            }

            if warn_on_non_space && !warned {
                // Reported through the context: internal errors are suppressed here, but the
                // user still gets told about the trailing garbage once.
                if let Err(err) = ctx
                    .reporter()
                    .warn(tok.range(), "extra characters after directive")
                    .emit()
                {
                    break Err(err);
                }
                warned = true;
            }
        };

        self.suppress_errors = prev;
        result
    }

    fn capture_macro_tokens(
        &mut self,
        ctx: &mut LexCtx<'_, '_>,
        state: &mut PpState,
    ) -> DResult<ReplacementList> {
        let mut tokens = Vec::new();

        loop {
            let tok = self.directive_next(ctx, state)?;
            if tok.kind == TokenKind::Eol {
                break;
            }
            tokens.push(tok);
        }

        Ok(ReplacementList::new(tokens))
    }

    fn bad_directive_token(
        &mut self,
        ctx: &mut LexCtx<'_, '_>,
        tok: &Token,
        expected: &str,
    ) -> DResult<()> {
        let msg = format!("expected {} in directive, got {}", expected, tok.kind.name());
        ctx.reporter().error(tok.range(), msg).emit()
    }

    fn handle_define(&mut self, ctx: &mut LexCtx<'_, '_>, state: &mut PpState) -> DResult<bool> {
        let tok = self.directive_next(ctx, state)?;
        let atom = match tok.kind {
            TokenKind::Name(atom) => atom,
            _ => {
                self.bad_directive_token(ctx, &tok, "identifier")?;
                return Ok(false);
            }
        };

        if self.cursor.peek_is(b'(') {
            self.report(ctx, self.cursor.pos(), "macros with parameters are not supported")?;
            return Ok(false);
        }

        let replacement = self.capture_macro_tokens(ctx, state)?;
        state.define_macro(ctx, atom, tok.range(), replacement)?;
        Ok(false)
    }

    fn handle_undef(&mut self, ctx: &mut LexCtx<'_, '_>, state: &mut PpState) -> DResult<bool> {
        let tok = self.directive_next(ctx, state)?;
        match tok.kind {
            TokenKind::Name(atom) => state.remove_macro(ctx, tok.range(), atom),
            _ => {
                self.bad_directive_token(ctx, &tok, "identifier")?;
                Ok(false)
            }
        }
    }

    fn report_else_twice(
        &mut self,
        ctx: &mut LexCtx<'_, '_>,
        begin: SourcePos,
        prev: SourcePos,
    ) -> DResult<()> {
        if self.suppress_errors {
            return Ok(());
        }
        ctx.reporter()
            .error(SourceRange::from(begin), "#else already seen in this #if")
            .add_note(Note::new(
                "previous #else is here",
                Some(SourceRange::from(prev)),
            ))
            .emit()
    }

    fn handle_else(&mut self, ctx: &mut LexCtx<'_, '_>, begin: SourcePos) -> DResult<bool> {
        if self.ifstack.is_empty() {
            self.report(ctx, begin, "#else without matching #if")?;
            return Ok(false);
        }

        if let Some(prev) = self.ifstack.last().unwrap().else_loc {
            self.report_else_twice(ctx, begin, prev)?;
            return Ok(false);
        }

        let ix = self.ifstack.last_mut().unwrap();
        ix.else_loc = Some(begin);
        ix.state = if ix.state == IfState::Ignoring {
            IfState::Active
        } else {
            IfState::Inactive
        };
        Ok(true)
    }

    fn handle_include(
        &mut self,
        ctx: &mut LexCtx<'_, '_>,
        state: &mut PpState,
        begin: SourcePos,
        required: bool,
    ) -> DResult<bool> {
        // Search for a delimiter.
        let c = self.first_non_space_char();
        let (kind, term) = match c {
            b'"' => (IncludeKind::Quoted, b'"'),
            b'<' => (IncludeKind::Angled, b'>'),
            _ => {
                self.report(
                    ctx,
                    self.cursor.lastpos(),
                    r#"expected "filename" or <filename>"#,
                )?;
                return Ok(false);
            }
        };

        self.literal.clear();
        loop {
            if is_line_terminator(self.cursor.peek_char()) {
                self.report(ctx, self.cursor.lastpos(), "include filename is not terminated")?;
                return Ok(false);
            }

            let c = self.cursor.read_char();
            if c == term {
                break;
            }

            self.literal.push(c);
        }

        // The preprocessor resolves the path and pushes the new file once this directive's line
        // has been fully consumed.
        state.request_include(kind, required, begin, &self.literal);
        Ok(true)
    }

    fn handle_pragma_newdecls(
        &mut self,
        ctx: &mut LexCtx<'_, '_>,
        state: &mut PpState,
    ) -> DResult<bool> {
        let tok = self.directive_next(ctx, state)?;

        if let TokenKind::Name(atom) = tok.kind {
            if ctx.interner[atom] == *b"required" {
                self.options.require_newdecls = true;
                return Ok(true);
            }
            if ctx.interner[atom] == *b"optional" {
                self.options.require_newdecls = false;
                return Ok(true);
            }
        }

        ctx.reporter()
            .error(
                tok.range(),
                "expected 'required' or 'optional' after #pragma newdecls",
            )
            .emit()?;
        Ok(false)
    }

    fn handle_pragma(&mut self, ctx: &mut LexCtx<'_, '_>, state: &mut PpState) -> DResult<bool> {
        let tok = self.directive_next(ctx, state)?;
        let atom = match tok.kind {
            TokenKind::Name(atom) => atom,
            _ => {
                ctx.reporter()
                    .error(tok.range(), "expected a name after #pragma")
                    .emit()?;
                return Ok(false);
            }
        };

        if ctx.interner[atom] == *b"deprecated" {
            let (begin, end) = self.read_until_end();
            let msg = String::from_utf8_lossy(self.cursor.slice(begin, end)).into_owned();
            state.set_next_deprecation(msg);
            return Ok(true);
        }

        if ctx.interner[atom] == *b"newdecls" {
            // Whether newdecls are required is local to this lexer's options, though includes
            // inherit the value.
            let prev = mem::replace(&mut state.macro_expansion, false);
            let result = self.handle_pragma_newdecls(ctx, state);
            state.macro_expansion = prev;
            return result;
        }

        if ctx.interner[atom] == *b"semicolon" {
            // #pragma semicolon is accepted for compatibility and its value discarded; requiring
            // semicolons is a top-level compiler mode now. The expression still has to parse.
            return Ok(eval_directive_expr(self, ctx, state)?.is_some());
        }

        if ctx.interner[atom] == *b"dynamic" {
            let val = match eval_directive_expr(self, ctx, state)? {
                Some(val) => val,
                None => return Ok(false),
            };
            state.set_pragma_dynamic(val);
            return Ok(true);
        }

        let msg = format!("unknown pragma '{}'", ctx.atom_str(atom));
        ctx.reporter().error(tok.range(), msg).emit()?;
        Ok(false)
    }

    /// Dispatches one `#`-directive. Returns whether the caller should warn about trailing
    /// characters on the line.
    fn handle_preprocessor_directive(
        &mut self,
        ctx: &mut LexCtx<'_, '_>,
        state: &mut PpState,
    ) -> DResult<bool> {
        let begin = self.cursor.lastpos();

        match self.maybe_keyword(ctx, state, b'#') {
            Some(TokenKind::MDefine) => {
                let prev = mem::replace(&mut state.macro_expansion, false);
                let result = self.handle_define(ctx, state);
                state.macro_expansion = prev;
                result
            }

            Some(TokenKind::MIf) => {
                let val = eval_directive_expr(self, ctx, state)?;
                let if_state = if val.unwrap_or(0) != 0 {
                    IfState::Active
                } else {
                    IfState::Ignoring
                };
                self.ifstack.push(IfContext::new(begin, if_state));
                Ok(val.is_some())
            }

            Some(TokenKind::MElse) => self.handle_else(ctx, begin),

            Some(TokenKind::MEndif) => {
                if self.ifstack.pop().is_none() {
                    self.report(ctx, begin, "#endif without matching #if")?;
                    return Ok(false);
                }
                Ok(true)
            }

            Some(TokenKind::MUndef) => {
                let prev = mem::replace(&mut state.macro_expansion, false);
                let result = self.handle_undef(ctx, state);
                state.macro_expansion = prev;
                result
            }

            Some(TokenKind::MEndinput) => {
                // Simulate reaching the end of the file, and purge the ifstack so the
                // end-of-file check does not complain about open #if blocks.
                self.cursor.seek_to_end();
                self.ifstack.clear();
                Ok(false)
            }

            Some(TokenKind::MInclude) => self.handle_include(ctx, state, begin, true),
            Some(TokenKind::MTryinclude) => self.handle_include(ctx, state, begin, false),

            Some(TokenKind::MPragma) => self.handle_pragma(ctx, state),

            _ => {
                let msg = format!(
                    "unknown directive '{}'",
                    String::from_utf8_lossy(&self.literal)
                );
                self.report(ctx, begin, msg)?;
                Ok(false)
            }
        }
    }

    /// Handles a `#`-directive found inside a skipped region. Only the conditional directives are
    /// recognized; anything else is skipped with the rest of the region.
    fn handle_directive_while_inactive(
        &mut self,
        ctx: &mut LexCtx<'_, '_>,
        state: &mut PpState,
    ) -> DResult<()> {
        self.lexing_for_directive = true;
        let result = self.handle_inactive_directive(ctx, state);
        self.lexing_for_directive = false;
        result
    }

    fn handle_inactive_directive(
        &mut self,
        ctx: &mut LexCtx<'_, '_>,
        state: &mut PpState,
    ) -> DResult<()> {
        let begin = self.cursor.lastpos();

        match self.maybe_keyword(ctx, state, b'#') {
            Some(TokenKind::MIf) => {
                // We need to push *something* here, otherwise we can't tell which #endifs match
                // up to what. The context is dead: nothing nested inside a skipped region can
                // become active.
                self.ifstack.push(IfContext::new(begin, IfState::Dead));
                Ok(())
            }

            Some(TokenKind::MElse) => {
                let (cur_state, cur_else) = match self.ifstack.last() {
                    Some(ix) => (ix.state, ix.else_loc),
                    None => return Ok(()),
                };

                if cur_state == IfState::Dead {
                    return Ok(());
                }

                if let Some(prev) = cur_else {
                    self.report_else_twice(ctx, begin, prev)?;
                } else {
                    let ix = self.ifstack.last_mut().unwrap();
                    ix.else_loc = Some(begin);
                    ix.state = if cur_state == IfState::Ignoring {
                        IfState::Active
                    } else {
                        IfState::Inactive
                    };
                }

                self.chew_line_after_directive(ctx, state, true)
            }

            Some(TokenKind::MEndif) => {
                self.ifstack.pop();
                self.chew_line_after_directive(ctx, state, true)
            }

            _ => Ok(()),
        }
    }

    /// Fast-forwards over an inactive region line by line until the top of the if-stack becomes
    /// active again (or the stack empties, or the file ends).
    fn handle_if_context(&mut self, ctx: &mut LexCtx<'_, '_>, state: &mut PpState) -> DResult<()> {
        // The directive line was chewed, so we are at a newline or EOF right now.
        debug_assert!(is_line_terminator(self.cursor.peek_char()));
        if self.cursor.at_end() {
            return Ok(());
        }

        let c = self.cursor.read_char();
        self.advance_line(c);

        loop {
            let mut c = self.first_non_space_char();
            if c == b'#' {
                // This might put us back into normal lexing territory, so check afterward.
                self.handle_directive_while_inactive(ctx, state)?;
                if self
                    .ifstack
                    .last()
                    .map_or(true, |ix| ix.state == IfState::Active)
                {
                    return Ok(());
                }
            }

            while !is_line_terminator(c) {
                c = self.cursor.read_char();
            }

            if c == b'\0' {
                return Ok(());
            }
            self.advance_line(c);
        }
    }

    /// Reports any conditional region left open at the end of the file.
    pub(crate) fn check_if_stack_at_end_of_file(
        &mut self,
        ctx: &mut LexCtx<'_, '_>,
    ) -> DResult<()> {
        let pending = self.ifstack.last().map(|ix| (ix.first, ix.else_loc));
        self.ifstack.clear();

        if let Some((first, else_loc)) = pending {
            match else_loc {
                Some(loc) => ctx
                    .reporter()
                    .error(
                        SourceRange::from(loc),
                        "#else does not have a matching #endif",
                    )
                    .emit()?,
                None => ctx
                    .reporter()
                    .error(
                        SourceRange::from(first),
                        "#if does not have a matching #endif",
                    )
                    .emit()?,
            }
        }

        Ok(())
    }

    fn enter_preprocessor_directive(
        &mut self,
        ctx: &mut LexCtx<'_, '_>,
        state: &mut PpState,
    ) -> DResult<()> {
        // Set before handling anything: directive parsing recursively re-enters scan(), and a
        // '#' later on this line must not start a nested directive.
        self.lexed_tokens_on_line = true;

        self.lexing_for_directive = true;
        let result = match self.handle_preprocessor_directive(ctx, state) {
            Ok(warn) => self.chew_line_after_directive(ctx, state, warn),
            Err(err) => Err(err),
        };
        self.lexing_for_directive = false;
        result?;

        // If we are now in an inactive or ignored #if context, sweep through the file until we
        // find a new position we can parse from. Reaching EOF while sweeping simply surfaces as
        // the next Eof token.
        if self
            .ifstack
            .last()
            .map_or(false, |ix| ix.state != IfState::Active)
        {
            self.handle_if_context(ctx, state)?;
        }

        Ok(())
    }

    fn scan(&mut self, ctx: &mut LexCtx<'_, '_>, state: &mut PpState) -> DResult<Token> {
        let c = self.consume_whitespace();

        // Directives can only be parsed if they are the first token on the line and we're not
        // already inside one. Preceding comments and whitespace are fine.
        if c == b'#' && !self.lexed_tokens_on_line {
            self.enter_preprocessor_directive(ctx, state)?;

            // No token to hand back; the caller loops, and the preprocessor may want to pull
            // tokens from a new lexer first.
            let pos = TokenPos::new(self.cursor.pos(), self.line_number);
            return Ok(Token::new(TokenKind::None, pos, pos));
        }

        let start = TokenPos::new(self.cursor.lastpos(), self.line_number);

        let kind = match c {
            b'\0' => {
                if self.lexing_for_directive {
                    TokenKind::Eol
                } else {
                    TokenKind::Eof
                }
            }

            b';' => TokenKind::Semicolon,
            b'{' => TokenKind::LBrace,
            b'}' => TokenKind::RBrace,
            b'(' => TokenKind::LParen,
            b')' => TokenKind::RParen,
            b'[' => TokenKind::LBracket,
            b']' => TokenKind::RBracket,
            b'~' => TokenKind::Tilde,
            b'?' => TokenKind::QMark,
            b':' => TokenKind::Colon,
            b',' => TokenKind::Comma,

            b'\r' | b'\n' => {
                debug_assert!(self.lexing_for_directive);
                TokenKind::Eol
            }

            b'.' => {
                if self.cursor.match_char(b'.') {
                    if self.cursor.match_char(b'.') {
                        TokenKind::Ellipses
                    } else {
                        self.cursor.back_up();
                        TokenKind::Dot
                    }
                } else {
                    TokenKind::Dot
                }
            }

            b'/' => {
                if self.cursor.match_char(b'=') {
                    TokenKind::AssignDiv
                } else if self.cursor.match_char(b'/') {
                    return Ok(self.single_line_comment(start));
                } else if self.cursor.match_char(b'*') {
                    return self.multi_line_comment(ctx, start);
                } else {
                    TokenKind::Slash
                }
            }

            b'*' => {
                if self.cursor.match_char(b'=') {
                    TokenKind::AssignMul
                } else {
                    TokenKind::Star
                }
            }

            b'+' => {
                if self.cursor.match_char(b'=') {
                    TokenKind::AssignAdd
                } else if self.cursor.match_char(b'+') {
                    TokenKind::Increment
                } else {
                    TokenKind::Plus
                }
            }

            b'&' => {
                if self.cursor.match_char(b'=') {
                    TokenKind::AssignBitAnd
                } else if self.cursor.match_char(b'&') {
                    TokenKind::And
                } else {
                    TokenKind::BitAnd
                }
            }

            b'|' => {
                if self.cursor.match_char(b'=') {
                    TokenKind::AssignBitOr
                } else if self.cursor.match_char(b'|') {
                    TokenKind::Or
                } else {
                    TokenKind::BitOr
                }
            }

            b'^' => {
                if self.cursor.match_char(b'=') {
                    TokenKind::AssignBitXor
                } else {
                    TokenKind::BitXor
                }
            }

            b'%' => {
                if self.cursor.match_char(b'=') {
                    TokenKind::AssignMod
                } else {
                    TokenKind::Percent
                }
            }

            b'-' => {
                if self.cursor.match_char(b'=') {
                    TokenKind::AssignSub
                } else if self.cursor.match_char(b'-') {
                    TokenKind::Decrement
                } else {
                    TokenKind::Minus
                }
            }

            b'!' => {
                if self.cursor.match_char(b'=') {
                    TokenKind::NotEquals
                } else {
                    TokenKind::Not
                }
            }

            b'=' => {
                if self.cursor.match_char(b'=') {
                    TokenKind::Equals
                } else {
                    TokenKind::Assign
                }
            }

            b'<' => {
                if self.cursor.match_char(b'=') {
                    TokenKind::Le
                } else if self.cursor.match_char(b'<') {
                    if self.cursor.match_char(b'=') {
                        TokenKind::AssignShl
                    } else {
                        TokenKind::Shl
                    }
                } else {
                    TokenKind::Lt
                }
            }

            b'>' => {
                if self.cursor.match_char(b'=') {
                    TokenKind::Ge
                } else if self.cursor.match_char(b'>') {
                    if self.cursor.match_char(b'>') {
                        if self.cursor.match_char(b'=') {
                            TokenKind::AssignUshr
                        } else {
                            TokenKind::Ushr
                        }
                    } else {
                        TokenKind::Shr
                    }
                } else {
                    TokenKind::Gt
                }
            }

            b'\'' => self.char_literal(ctx, start)?,
            b'"' => self.string_literal(ctx, start)?,

            b'0'..=b'9' => self.handle_number(ctx, start, c)?,

            c if is_ident_start(c) => self.handle_identifier(ctx, state, start, c)?,

            c => {
                // Don't report while lexing a directive; the caller reports malformed directive
                // content with more context.
                if !self.lexing_for_directive {
                    let msg = format!(
                        "unexpected character '{}' (0x{:02x})",
                        (c as char).escape_default(),
                        c
                    );
                    ctx.reporter()
                        .error(SourceRange::from(start.loc), msg)
                        .emit()?;
                }
                TokenKind::Unknown
            }
        };

        Ok(Token::new(kind, start, start))
    }

    /// A front comment is a sequence of comments at most one line away from a non-comment token
    /// that is the first token on its line. Returns the token that terminated the block.
    fn process_front_comment_block(
        &mut self,
        ctx: &mut LexCtx<'_, '_>,
        state: &mut PpState,
        first: Token,
    ) -> DResult<Token> {
        let start = first.start;
        let mut last_end = first.end;
        let mut committed = None;

        let tok = loop {
            let tok = self.scan(ctx, state)?;

            if tok.kind != TokenKind::Comment {
                if tok.start.line == start.line {
                    // Something like `/* ... */ status` - the token was not the first on its
                    // line, so the whole block is discarded.
                    return Ok(tok);
                }
                if tok.start.line != last_end.line {
                    // The last comment ended on a different line from where this token starts,
                    // so that final comment can be committed.
                    committed = Some(last_end);
                }
                break tok;
            }

            // Commit the previous comment.
            committed = Some(last_end);

            // A comment starting more than one line past the previous ending finishes the
            // block; it will start a block of its own.
            if tok.start.line > last_end.line + 1 {
                break tok;
            }

            last_end = tok.end;
        };

        if let Some(end) = committed {
            state.add_comment(CommentPos::Front, SourceRange::between(start.loc, end.loc));
        }

        Ok(tok)
    }

    /// A tail comment is a sequence of comments appearing after a token on the same line, ending
    /// at a blank line or a non-comment token. Returns the token that terminated the block.
    fn process_tail_comment_block(
        &mut self,
        ctx: &mut LexCtx<'_, '_>,
        state: &mut PpState,
        first: Token,
    ) -> DResult<Token> {
        let start = first.start;
        let mut end = first.end;

        let tok = loop {
            let tok = self.scan(ctx, state)?;
            if tok.kind != TokenKind::Comment {
                break tok;
            }
            if tok.start.line > end.line + 1 {
                break tok;
            }
            end = tok.end;
        };

        state.add_comment(CommentPos::Tail, SourceRange::between(start.loc, end.loc));
        Ok(tok)
    }

    /// Resolves a comment token: either discards comments outright, or groups them into front and
    /// tail blocks. Returns the first non-comment token scanned past them.
    fn handle_comments(
        &mut self,
        ctx: &mut LexCtx<'_, '_>,
        state: &mut PpState,
        first: Token,
    ) -> DResult<Token> {
        if !self.options.trace_comments || self.lexing_for_directive {
            let mut tok = first;
            while tok.kind == TokenKind::Comment {
                tok = self.scan(ctx, state)?;
            }
            return Ok(tok);
        }

        let mut tok = first;
        if self.lexed_tokens_on_line {
            tok = self.process_tail_comment_block(ctx, state, tok)?;
        }

        // Any remaining comments start their own lines; there can be multiple front blocks.
        while tok.kind == TokenKind::Comment {
            tok = self.process_front_comment_block(ctx, state, tok)?;
        }

        Ok(tok)
    }

    /// Produces the next token, or yields control with `TokenKind::None` after a directive or a
    /// macro entry. The caller loops until a concrete kind appears.
    pub fn next(&mut self, ctx: &mut LexCtx<'_, '_>, state: &mut PpState) -> DResult<Token> {
        let mut tok = self.scan(ctx, state)?;
        if tok.kind == TokenKind::Comment {
            tok = self.handle_comments(ctx, state, tok)?;
            debug_assert!(tok.kind != TokenKind::Comment);
        }

        if tok.kind != TokenKind::None {
            self.lexed_tokens_on_line = true;
        }

        tok.end = TokenPos::new(self.cursor.pos(), self.line_number);
        Ok(tok)
    }
}
