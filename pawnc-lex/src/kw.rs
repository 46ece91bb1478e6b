use rustc_hash::FxHashMap;

use crate::{Atom, Interner, TokenKind};

const KEYWORDS: &[(&[u8], TokenKind)] = &[
    (b"bool", TokenKind::Bool),
    (b"break", TokenKind::Break),
    (b"case", TokenKind::Case),
    (b"char", TokenKind::Char),
    (b"const", TokenKind::Const),
    (b"continue", TokenKind::Continue),
    (b"default", TokenKind::Default),
    (b"delete", TokenKind::Delete),
    (b"do", TokenKind::Do),
    (b"else", TokenKind::Else),
    (b"enum", TokenKind::Enum),
    (b"false", TokenKind::False),
    (b"float", TokenKind::Float),
    (b"for", TokenKind::For),
    (b"forward", TokenKind::Forward),
    (b"function", TokenKind::Function),
    (b"if", TokenKind::If),
    (b"int", TokenKind::Int),
    (b"methodmap", TokenKind::Methodmap),
    (b"native", TokenKind::Native),
    (b"new", TokenKind::New),
    (b"null", TokenKind::Null),
    (b"public", TokenKind::Public),
    (b"return", TokenKind::Return),
    (b"sizeof", TokenKind::Sizeof),
    (b"static", TokenKind::Static),
    (b"stock", TokenKind::Stock),
    (b"switch", TokenKind::Switch),
    (b"this", TokenKind::This),
    (b"true", TokenKind::True),
    (b"typedef", TokenKind::Typedef),
    (b"typeset", TokenKind::Typeset),
    (b"union", TokenKind::Union),
    (b"view_as", TokenKind::ViewAs),
    (b"void", TokenKind::Void),
    (b"while", TokenKind::While),
    // Directives are recognized through the same table, spelled with their '#'.
    (b"#define", TokenKind::MDefine),
    (b"#else", TokenKind::MElse),
    (b"#endif", TokenKind::MEndif),
    (b"#endinput", TokenKind::MEndinput),
    (b"#if", TokenKind::MIf),
    (b"#include", TokenKind::MInclude),
    (b"#pragma", TokenKind::MPragma),
    (b"#tryinclude", TokenKind::MTryinclude),
    (b"#undef", TokenKind::MUndef),
];

/// Maps interned identifier atoms to keyword token kinds.
pub struct KeywordTable {
    map: FxHashMap<Atom, TokenKind>,
}

impl KeywordTable {
    pub fn new(interner: &mut Interner) -> Self {
        let map = KEYWORDS
            .iter()
            .map(|&(spelling, kind)| (interner.intern(spelling), kind))
            .collect();

        KeywordTable { map }
    }

    /// Looks up the keyword kind of `atom`, if it is a keyword.
    pub fn find(&self, atom: Atom) -> Option<TokenKind> {
        self.map.get(&atom).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keywords_and_names() {
        let mut interner = Interner::new();
        let table = KeywordTable::new(&mut interner);

        let kw = interner.intern(b"while");
        let directive = interner.intern(b"#define");
        let name = interner.intern(b"whileish");

        assert_eq!(table.find(kw), Some(TokenKind::While));
        assert_eq!(table.find(directive), Some(TokenKind::MDefine));
        assert_eq!(table.find(name), None);
    }
}
