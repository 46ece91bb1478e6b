use std::fmt;

use pawnc_source::{SourcePos, SourceRange};

use super::{Atom, LexCtx};

/// Enum representing token kinds.
///
/// Literal payloads live directly in the variants. `FloatLit` carries an `f64`, which is why this
/// type is `PartialEq` but not `Eq`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TokenKind {
    /// No token was produced; the caller should ask again. Returned after a directive has been
    /// processed or a macro expansion has been entered.
    None,
    /// End of line, only produced while lexing a directive.
    Eol,
    Eof,
    Unknown,
    Comment,

    Name(Atom),
    Label(Atom),

    IntLit(u64),
    HexLit(u64),
    FloatLit(f64),
    CharLit(i32),
    StrLit(Atom),

    // Punctuators.
    Semicolon,
    LBrace,
    RBrace,
    LParen,
    RParen,
    LBracket,
    RBracket,
    Tilde,
    QMark,
    Colon,
    Comma,
    Dot,
    Ellipses,
    Slash,
    AssignDiv,
    Star,
    AssignMul,
    Plus,
    AssignAdd,
    Increment,
    Minus,
    AssignSub,
    Decrement,
    Percent,
    AssignMod,
    BitAnd,
    AssignBitAnd,
    And,
    BitOr,
    AssignBitOr,
    Or,
    BitXor,
    AssignBitXor,
    Not,
    NotEquals,
    Assign,
    Equals,
    Lt,
    Le,
    Shl,
    AssignShl,
    Gt,
    Ge,
    Shr,
    Ushr,
    AssignUshr,

    // Keywords.
    Bool,
    Break,
    Case,
    Char,
    Const,
    Continue,
    Default,
    Delete,
    Do,
    Else,
    Enum,
    False,
    Float,
    For,
    Forward,
    Function,
    If,
    Int,
    Methodmap,
    Native,
    New,
    Null,
    Public,
    Return,
    Sizeof,
    Static,
    Stock,
    Switch,
    This,
    True,
    Typedef,
    Typeset,
    Union,
    ViewAs,
    Void,
    While,

    // Preprocessor directive keywords, looked up with their leading '#'.
    MDefine,
    MElse,
    MEndif,
    MEndinput,
    MIf,
    MInclude,
    MPragma,
    MTryinclude,
    MUndef,
}

impl TokenKind {
    /// Returns the atom payload of a name, label or string token.
    pub fn atom(&self) -> Option<Atom> {
        match *self {
            TokenKind::Name(atom) | TokenKind::Label(atom) | TokenKind::StrLit(atom) => Some(atom),
            _ => None,
        }
    }

    /// Returns a human-readable name for diagnostics.
    pub fn name(&self) -> &'static str {
        use TokenKind::*;

        match *self {
            None => "<none>",
            Eol => "end of line",
            Eof => "end of file",
            Unknown => "<unknown>",
            Comment => "comment",

            Name(_) => "identifier",
            Label(_) => "label",
            IntLit(_) => "integer literal",
            HexLit(_) => "hex literal",
            FloatLit(_) => "float literal",
            CharLit(_) => "character literal",
            StrLit(_) => "string literal",

            Semicolon => "';'",
            LBrace => "'{'",
            RBrace => "'}'",
            LParen => "'('",
            RParen => "')'",
            LBracket => "'['",
            RBracket => "']'",
            Tilde => "'~'",
            QMark => "'?'",
            Colon => "':'",
            Comma => "','",
            Dot => "'.'",
            Ellipses => "'...'",
            Slash => "'/'",
            AssignDiv => "'/='",
            Star => "'*'",
            AssignMul => "'*='",
            Plus => "'+'",
            AssignAdd => "'+='",
            Increment => "'++'",
            Minus => "'-'",
            AssignSub => "'-='",
            Decrement => "'--'",
            Percent => "'%'",
            AssignMod => "'%='",
            BitAnd => "'&'",
            AssignBitAnd => "'&='",
            And => "'&&'",
            BitOr => "'|'",
            AssignBitOr => "'|='",
            Or => "'||'",
            BitXor => "'^'",
            AssignBitXor => "'^='",
            Not => "'!'",
            NotEquals => "'!='",
            Assign => "'='",
            Equals => "'=='",
            Lt => "'<'",
            Le => "'<='",
            Shl => "'<<'",
            AssignShl => "'<<='",
            Gt => "'>'",
            Ge => "'>='",
            Shr => "'>>'",
            Ushr => "'>>>'",
            AssignUshr => "'>>>='",

            Bool => "bool",
            Break => "break",
            Case => "case",
            Char => "char",
            Const => "const",
            Continue => "continue",
            Default => "default",
            Delete => "delete",
            Do => "do",
            Else => "else",
            Enum => "enum",
            False => "false",
            Float => "float",
            For => "for",
            Forward => "forward",
            Function => "function",
            If => "if",
            Int => "int",
            Methodmap => "methodmap",
            Native => "native",
            New => "new",
            Null => "null",
            Public => "public",
            Return => "return",
            Sizeof => "sizeof",
            Static => "static",
            Stock => "stock",
            Switch => "switch",
            This => "this",
            True => "true",
            Typedef => "typedef",
            Typeset => "typeset",
            Union => "union",
            ViewAs => "view_as",
            Void => "void",
            While => "while",

            MDefine => "#define",
            MElse => "#else",
            MEndif => "#endif",
            MEndinput => "#endinput",
            MIf => "#if",
            MInclude => "#include",
            MPragma => "#pragma",
            MTryinclude => "#tryinclude",
            MUndef => "#undef",
        }
    }
}

/// A position a token endpoint was lexed at.
///
/// The location identifies the byte; the line number is carried separately so comment attribution
/// can group tokens by line without consulting the source map.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenPos {
    pub loc: SourcePos,
    pub line: u32,
}

impl TokenPos {
    pub fn new(loc: SourcePos, line: u32) -> Self {
        TokenPos { loc, line }
    }
}

/// A lexed token: a kind (with payload) plus its start and end positions.
///
/// The byte range is half-open (`[start.loc, end.loc)`), but both endpoints carry line numbers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub start: TokenPos,
    pub end: TokenPos,
}

impl Token {
    pub fn new(kind: TokenKind, start: TokenPos, end: TokenPos) -> Self {
        Token { kind, start, end }
    }

    /// Returns the byte range covered by this token.
    pub fn range(&self) -> SourceRange {
        SourceRange::between(self.start.loc, self.end.loc)
    }

    /// Returns an object that implements `fmt::Display` for printing the token.
    pub fn display<'t, 'a, 'h>(&'t self, ctx: &'t LexCtx<'a, 'h>) -> Display<'t, 'a, 'h> {
        Display { tok: self, ctx }
    }
}

pub struct Display<'t, 'a, 'h> {
    tok: &'t Token,
    ctx: &'t LexCtx<'a, 'h>,
}

impl fmt::Display for Display<'_, '_, '_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.tok.kind {
            TokenKind::Name(atom) => write!(f, "{}", self.ctx.atom_str(atom)),
            TokenKind::Label(atom) => write!(f, "{}:", self.ctx.atom_str(atom)),
            TokenKind::IntLit(val) => write!(f, "{}", val),
            TokenKind::HexLit(val) => write!(f, "0x{:x}", val),
            TokenKind::FloatLit(val) => write!(f, "{}", val),
            TokenKind::CharLit(val) => write!(f, "char({})", val),
            TokenKind::StrLit(atom) => write!(f, "\"{}\"", self.ctx.atom_str(atom)),
            kind => write!(f, "{}", kind.name()),
        }
    }
}
