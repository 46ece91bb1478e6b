use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use pawnc_lex::{Atom, Interner, LexCtx, Token, TokenKind};
use pawnc_source::diag::{Diagnostic, Handler, Level};
use pawnc_source::smap::{FileContents, FileName};
use pawnc_source::{DiagManager, SourceMap, SourceRange};

use crate::state::CommentPos;
use crate::{LexOptions, PreprocessorBuilder};

struct CollectingHandler(Rc<RefCell<Vec<(Level, String)>>>);

impl Handler for CollectingHandler {
    fn handle(&mut self, diag: &Diagnostic, _smap: Option<&SourceMap>) {
        self.0.borrow_mut().push((diag.level, diag.msg.clone()));
    }
}

struct Lexed {
    atoms: Vec<Atom>,
    tokens: Vec<Token>,
    diags: Vec<(Level, String)>,
    comments: Vec<(CommentPos, SourceRange)>,
    deprecation: Option<String>,
    pragma_dynamic: Option<i32>,
    fatal: bool,
}

impl Lexed {
    fn kinds(&self) -> Vec<TokenKind> {
        self.tokens.iter().map(|tok| tok.kind).collect()
    }

    fn errors(&self) -> Vec<&str> {
        self.diags
            .iter()
            .filter(|(level, _)| *level == Level::Error)
            .map(|(_, msg)| msg.as_str())
            .collect()
    }

    fn warnings(&self) -> Vec<&str> {
        self.diags
            .iter()
            .filter(|(level, _)| *level == Level::Warning)
            .map(|(_, msg)| msg.as_str())
            .collect()
    }

    fn assert_clean(&self) {
        assert!(self.diags.is_empty(), "unexpected diagnostics: {:?}", self.diags);
    }
}

fn lex_impl(
    src: &str,
    options: LexOptions,
    pre: &[&[u8]],
    parent_dir: Option<PathBuf>,
    include_dirs: Vec<PathBuf>,
) -> Lexed {
    let sink = Rc::new(RefCell::new(Vec::new()));
    let mut diags = DiagManager::new(CollectingHandler(Rc::clone(&sink)), None);

    let mut interner = Interner::new();
    let atoms: Vec<Atom> = pre.iter().map(|spelling| interner.intern(spelling)).collect();

    let mut smap = SourceMap::new();
    let main_id = smap
        .create_file(FileName::synth("test"), FileContents::new(src), None)
        .unwrap();

    let mut ctx = LexCtx::new(&mut interner, &mut diags, &mut smap);

    let mut pp = {
        let mut builder = PreprocessorBuilder::new(&mut ctx, main_id);
        builder.options(options).include_dirs(include_dirs);
        if let Some(dir) = parent_dir {
            builder.parent_dir(dir);
        }
        builder.build()
    };

    let mut tokens = Vec::new();
    let mut fatal = false;
    loop {
        match pp.next(&mut ctx) {
            Ok(tok) => {
                let done = tok.kind == TokenKind::Eof;
                tokens.push(tok);
                if done {
                    break;
                }
            }
            Err(_) => {
                fatal = true;
                break;
            }
        }
    }

    let comments = pp.state().comments().to_vec();
    let deprecation = pp.state_mut().take_next_deprecation();
    let pragma_dynamic = pp.state().pragma_dynamic();

    let diags = sink.borrow().clone();
    Lexed {
        atoms,
        tokens,
        diags,
        comments,
        deprecation,
        pragma_dynamic,
        fatal,
    }
}

fn lex(src: &str, pre: &[&[u8]]) -> Lexed {
    lex_impl(src, LexOptions::default(), pre, None, vec![])
}

fn lex_tracing(src: &str, pre: &[&[u8]]) -> Lexed {
    let options = LexOptions {
        trace_comments: true,
        ..Default::default()
    };
    lex_impl(src, options, pre, None, vec![])
}

fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("pawnc-lexer-tests-{}", name));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).unwrap();
    dir
}

#[test]
fn empty_input() {
    let lexed = lex("", &[]);
    lexed.assert_clean();
    assert_eq!(lexed.kinds(), vec![TokenKind::Eof]);
}

#[test]
fn punctuators_maximal_munch() {
    use TokenKind::*;

    let lexed = lex(">>>= >>> >> >= > <<= << <= < += ++ + -= -- - /= ...", &[]);
    lexed.assert_clean();
    assert_eq!(
        lexed.kinds(),
        vec![
            AssignUshr, Ushr, Shr, Ge, Gt, AssignShl, Shl, Le, Lt, AssignAdd, Increment, Plus,
            AssignSub, Decrement, Minus, AssignDiv, Ellipses, Eof,
        ]
    );
}

#[test]
fn two_dots_are_two_tokens() {
    let lexed = lex("..", &[]);
    lexed.assert_clean();
    assert_eq!(lexed.kinds(), vec![TokenKind::Dot, TokenKind::Dot, TokenKind::Eof]);
}

#[test]
fn keywords_and_names() {
    let lexed = lex("while spin view_as", &[b"spin"]);
    lexed.assert_clean();
    assert_eq!(
        lexed.kinds(),
        vec![
            TokenKind::While,
            TokenKind::Name(lexed.atoms[0]),
            TokenKind::ViewAs,
            TokenKind::Eof,
        ]
    );
}

#[test]
fn labels() {
    let lexed = lex("done: retry :", &[b"done", b"retry"]);
    lexed.assert_clean();
    assert_eq!(
        lexed.kinds(),
        vec![
            TokenKind::Label(lexed.atoms[0]),
            TokenKind::Name(lexed.atoms[1]),
            TokenKind::Colon,
            TokenKind::Eof,
        ]
    );
}

#[test]
fn int_literals() {
    let lexed = lex("0 42 007", &[]);
    lexed.assert_clean();
    assert_eq!(
        lexed.kinds(),
        vec![
            TokenKind::IntLit(0),
            TokenKind::IntLit(42),
            TokenKind::IntLit(7),
            TokenKind::Eof,
        ]
    );
}

#[test]
fn int_literal_overflow() {
    let lexed = lex("99999999999999999999999999", &[]);
    assert_eq!(lexed.errors(), vec!["integer literal is too large"]);
    assert!(matches!(lexed.tokens[0].kind, TokenKind::IntLit(_)));
}

#[test]
fn hex_literals() {
    let lexed = lex("0x1A + 2", &[]);
    lexed.assert_clean();
    assert_eq!(
        lexed.kinds(),
        vec![
            TokenKind::HexLit(26),
            TokenKind::Plus,
            TokenKind::IntLit(2),
            TokenKind::Eof,
        ]
    );
}

#[test]
fn hex_decodes_base_16() {
    let lexed = lex("0xff 0X10", &[]);
    lexed.assert_clean();
    assert_eq!(
        lexed.kinds(),
        vec![TokenKind::HexLit(255), TokenKind::HexLit(16), TokenKind::Eof]
    );
}

#[test]
fn no_digit_separators_in_literals() {
    // string_to_int32 accepts '_', but literals do not; the underscore starts an identifier.
    let lexed = lex("1_000", &[b"_000"]);
    lexed.assert_clean();
    assert_eq!(
        lexed.kinds(),
        vec![
            TokenKind::IntLit(1),
            TokenKind::Name(lexed.atoms[0]),
            TokenKind::Eof,
        ]
    );
}

#[test]
fn float_literals() {
    let lexed = lex("3.14 1.5e3 3.14e-2", &[]);
    lexed.assert_clean();

    let vals: Vec<f64> = lexed.tokens[..3]
        .iter()
        .map(|tok| match tok.kind {
            TokenKind::FloatLit(val) => val,
            kind => panic!("expected float, got {:?}", kind),
        })
        .collect();

    assert!((vals[0] - 3.14).abs() < 1e-9);
    assert!((vals[1] - 1500.0).abs() < 1e-9);
    assert!((vals[2] - 0.0314).abs() < 1e-9);
}

#[test]
fn float_missing_fraction_digit() {
    let lexed = lex("3.x", &[]);
    assert_eq!(lexed.errors().len(), 1);
    assert!(lexed.errors()[0].starts_with("expected digit in float literal"));
    assert_eq!(lexed.tokens[0].kind, TokenKind::Unknown);
}

#[test]
fn float_missing_exponent_digit() {
    let lexed = lex("1.5e;", &[]);
    assert_eq!(lexed.errors().len(), 1);
    assert!(lexed.errors()[0].starts_with("expected digit in float exponent"));
    assert_eq!(lexed.tokens[0].kind, TokenKind::Unknown);
}

#[test]
fn char_literals() {
    let lexed = lex(r"'A' '\n' '\x41;' '\65;' '\\'", &[]);
    lexed.assert_clean();
    assert_eq!(
        lexed.kinds(),
        vec![
            TokenKind::CharLit(65),
            TokenKind::CharLit(10),
            TokenKind::CharLit(65),
            TokenKind::CharLit(65),
            TokenKind::CharLit(92),
            TokenKind::Eof,
        ]
    );
}

#[test]
fn empty_char_literal() {
    let lexed = lex("''", &[]);
    assert_eq!(lexed.errors(), vec!["empty character literal"]);
    assert_eq!(lexed.tokens[0].kind, TokenKind::Unknown);
}

#[test]
fn char_literal_quote_typo() {
    // '5" is treated as a typo for '5'; the stray quote is consumed.
    let lexed = lex("'5\"", &[]);
    assert_eq!(
        lexed.errors(),
        vec!["character literal is not terminated by '''"]
    );
    assert_eq!(
        lexed.kinds(),
        vec![TokenKind::CharLit(53), TokenKind::Eof]
    );
}

#[test]
fn string_literals() {
    let lexed = lex("\"abc\" \"a\\tb\" \"\\x41;\\66;\"", &[b"abc", b"a\tb", b"AB"]);
    lexed.assert_clean();
    assert_eq!(
        lexed.kinds(),
        vec![
            TokenKind::StrLit(lexed.atoms[0]),
            TokenKind::StrLit(lexed.atoms[1]),
            TokenKind::StrLit(lexed.atoms[2]),
            TokenKind::Eof,
        ]
    );
}

#[test]
fn unknown_escape_in_string() {
    let lexed = lex("\"a\\qb\"", &[b"a?b"]);
    assert_eq!(lexed.errors(), vec!["unknown escape code '\\q'"]);
    assert_eq!(
        lexed.kinds(),
        vec![TokenKind::StrLit(lexed.atoms[0]), TokenKind::Eof]
    );
}

#[test]
fn unterminated_string() {
    let lexed = lex("\"a\nb", &[b"a", b"b"]);
    assert_eq!(lexed.errors(), vec!["unterminated string literal"]);
    assert_eq!(
        lexed.kinds(),
        vec![
            TokenKind::StrLit(lexed.atoms[0]),
            TokenKind::Name(lexed.atoms[1]),
            TokenKind::Eof,
        ]
    );

    // The newline was left for ordinary handling, so the next token is on line 2.
    assert_eq!(lexed.tokens[1].start.line, 2);
}

#[test]
fn line_counting() {
    let lexed = lex("a\nb\r\nc\rd", &[b"a", b"b", b"c", b"d"]);
    lexed.assert_clean();

    let lines: Vec<u32> = lexed.tokens.iter().map(|tok| tok.start.line).collect();
    assert_eq!(lines, vec![1, 2, 3, 4, 4]);
}

#[test]
fn comments_are_skipped() {
    let lexed = lex("a // one\nb /* two */ c", &[b"a", b"b", b"c"]);
    lexed.assert_clean();
    assert_eq!(
        lexed.kinds(),
        vec![
            TokenKind::Name(lexed.atoms[0]),
            TokenKind::Name(lexed.atoms[1]),
            TokenKind::Name(lexed.atoms[2]),
            TokenKind::Eof,
        ]
    );
}

#[test]
fn unterminated_block_comment() {
    let lexed = lex("/* never closed", &[]);
    assert_eq!(lexed.errors(), vec!["unterminated block comment"]);
    assert_eq!(lexed.kinds(), vec![TokenKind::Eof]);
}

#[test]
fn comment_attribution() {
    let src = "// a\n// b\nint x; // tail\n";
    let lexed = lex_tracing(src, &[b"x"]);
    lexed.assert_clean();

    assert_eq!(
        lexed.kinds(),
        vec![
            TokenKind::Int,
            TokenKind::Name(lexed.atoms[0]),
            TokenKind::Semicolon,
            TokenKind::Eof,
        ]
    );

    let positions: Vec<CommentPos> = lexed.comments.iter().map(|&(pos, _)| pos).collect();
    assert_eq!(positions, vec![CommentPos::Front, CommentPos::Tail]);
}

#[test]
fn adjacent_comment_is_discarded() {
    // `/* ... */ token` is ill style; the comment binds to nothing.
    let lexed = lex_tracing("/* x */ int y;", &[b"y"]);
    lexed.assert_clean();
    assert!(lexed.comments.is_empty());
}

#[test]
fn front_blocks_split_on_gaps() {
    let src = "// one\n\n\n// two\nint x;\n";
    let lexed = lex_tracing(src, &[b"x"]);
    lexed.assert_clean();

    let positions: Vec<CommentPos> = lexed.comments.iter().map(|&(pos, _)| pos).collect();
    assert_eq!(positions, vec![CommentPos::Front, CommentPos::Front]);
}

#[test]
fn define_expands() {
    let lexed = lex("#define X 1\nX", &[]);
    lexed.assert_clean();
    assert_eq!(lexed.kinds(), vec![TokenKind::IntLit(1), TokenKind::Eof]);
}

#[test]
fn define_empty_body_expands_to_nothing() {
    let lexed = lex("#define NOTHING\nNOTHING after", &[b"after"]);
    lexed.assert_clean();
    assert_eq!(
        lexed.kinds(),
        vec![TokenKind::Name(lexed.atoms[0]), TokenKind::Eof]
    );
}

#[test]
fn macros_expand_inside_macros() {
    let lexed = lex("#define A 1\n#define B A + 2\nB", &[]);
    lexed.assert_clean();
    assert_eq!(
        lexed.kinds(),
        vec![
            TokenKind::IntLit(1),
            TokenKind::Plus,
            TokenKind::IntLit(2),
            TokenKind::Eof,
        ]
    );
}

#[test]
fn self_referential_macro_does_not_loop() {
    let lexed = lex("#define X X\nX", &[b"X"]);
    lexed.assert_clean();
    assert_eq!(
        lexed.kinds(),
        vec![TokenKind::Name(lexed.atoms[0]), TokenKind::Eof]
    );
}

#[test]
fn undef_removes_macro() {
    let lexed = lex("#define X 1\n#undef X\nX", &[b"X"]);
    lexed.assert_clean();
    assert_eq!(
        lexed.kinds(),
        vec![TokenKind::Name(lexed.atoms[0]), TokenKind::Eof]
    );
}

#[test]
fn undef_unknown_macro() {
    let lexed = lex("#undef X\n", &[]);
    assert_eq!(lexed.errors(), vec!["macro 'X' is not defined"]);
}

#[test]
fn redefinition_warns() {
    let lexed = lex("#define X 1\n#define X 2\nX", &[]);
    assert_eq!(lexed.warnings(), vec!["macro 'X' redefined"]);
    assert_eq!(lexed.kinds(), vec![TokenKind::IntLit(2), TokenKind::Eof]);
}

#[test]
fn define_requires_name() {
    let lexed = lex("#define 3 4\n", &[]);
    assert_eq!(lexed.errors().len(), 1);
    assert!(lexed.errors()[0].starts_with("expected identifier in directive"));
    assert_eq!(lexed.kinds(), vec![TokenKind::Eof]);
}

#[test]
fn macro_functions_unsupported() {
    let lexed = lex("#define F(x) 1\n", &[]);
    assert_eq!(
        lexed.errors(),
        vec!["macros with parameters are not supported"]
    );
}

#[test]
fn if_else_endif() {
    let lexed = lex("#if 0\nJUNK JUNK\n#else\nok\n#endif\n", &[b"ok"]);
    lexed.assert_clean();
    assert_eq!(
        lexed.kinds(),
        vec![TokenKind::Name(lexed.atoms[0]), TokenKind::Eof]
    );
}

#[test]
fn if_with_macro_condition() {
    let lexed = lex("#define X 1\n#if X\nyes\n#endif\n", &[b"yes"]);
    lexed.assert_clean();
    assert_eq!(
        lexed.kinds(),
        vec![TokenKind::Name(lexed.atoms[0]), TokenKind::Eof]
    );
}

#[test]
fn nested_conditionals_in_dead_region() {
    let src = "#if 0\n#if 1\na\n#endif\nb\n#else\nc\n#endif\n";
    let lexed = lex(src, &[b"c"]);
    lexed.assert_clean();
    assert_eq!(
        lexed.kinds(),
        vec![TokenKind::Name(lexed.atoms[0]), TokenKind::Eof]
    );
}

#[test]
fn else_twice_is_an_error() {
    let lexed = lex("#if 1\n#else\n#else\n#endif\n", &[]);
    assert_eq!(lexed.errors(), vec!["#else already seen in this #if"]);
}

#[test]
fn else_without_if() {
    let lexed = lex("#else\n", &[]);
    assert_eq!(lexed.errors(), vec!["#else without matching #if"]);
}

#[test]
fn endif_without_if() {
    let lexed = lex("#endif\n", &[]);
    assert_eq!(lexed.errors(), vec!["#endif without matching #if"]);
}

#[test]
fn unterminated_if() {
    let lexed = lex("#if 1\nx\n", &[b"x"]);
    assert_eq!(lexed.errors(), vec!["#if does not have a matching #endif"]);
    assert_eq!(
        lexed.kinds(),
        vec![TokenKind::Name(lexed.atoms[0]), TokenKind::Eof]
    );
}

#[test]
fn unterminated_else() {
    let lexed = lex("#if 0\n#else\nx\n", &[b"x"]);
    assert_eq!(lexed.errors(), vec!["#else does not have a matching #endif"]);
}

#[test]
fn endinput_stops_the_file() {
    let lexed = lex("a\n#endinput\nb\n", &[b"a"]);
    lexed.assert_clean();
    assert_eq!(
        lexed.kinds(),
        vec![TokenKind::Name(lexed.atoms[0]), TokenKind::Eof]
    );
}

#[test]
fn endinput_suppresses_unterminated_if() {
    let lexed = lex("#if 1\n#endinput\n", &[]);
    lexed.assert_clean();
    assert_eq!(lexed.kinds(), vec![TokenKind::Eof]);
}

#[test]
fn eval_precedence() {
    let lexed = lex("#if 1 + 2 * 3 == 7\ny\n#endif\n", &[b"y"]);
    lexed.assert_clean();
    assert_eq!(
        lexed.kinds(),
        vec![TokenKind::Name(lexed.atoms[0]), TokenKind::Eof]
    );
}

#[test]
fn eval_ternary_and_parens() {
    let lexed = lex("#if (1 ? 0 : 1) || 0\nx\n#endif\ny\n", &[b"y"]);
    lexed.assert_clean();
    assert_eq!(
        lexed.kinds(),
        vec![TokenKind::Name(lexed.atoms[0]), TokenKind::Eof]
    );
}

#[test]
fn eval_unsigned_shift() {
    let lexed = lex("#if (-1 >>> 28) == 15\ny\n#endif\n", &[b"y"]);
    lexed.assert_clean();
    assert_eq!(
        lexed.kinds(),
        vec![TokenKind::Name(lexed.atoms[0]), TokenKind::Eof]
    );
}

#[test]
fn eval_undefined_name_is_zero() {
    let lexed = lex("#if NOT_DEFINED\nx\n#endif\n", &[]);
    lexed.assert_clean();
    assert_eq!(lexed.kinds(), vec![TokenKind::Eof]);
}

#[test]
fn eval_division_by_zero() {
    let lexed = lex("#if 1 / 0\nx\n#endif\n", &[]);
    assert_eq!(
        lexed.errors(),
        vec!["division by zero in preprocessor expression"]
    );
    assert_eq!(lexed.kinds(), vec![TokenKind::Eof]);
}

#[test]
fn eval_unbalanced_paren() {
    let lexed = lex("#if (1\nx\n#endif\n", &[]);
    assert_eq!(lexed.errors(), vec!["expected ')' in preprocessor expression"]);
    assert_eq!(lexed.kinds(), vec![TokenKind::Eof]);
}

#[test]
fn extra_characters_after_directive() {
    let lexed = lex("#if 1\n#endif junk\n", &[]);
    assert_eq!(lexed.warnings(), vec!["extra characters after directive"]);
    assert_eq!(lexed.kinds(), vec![TokenKind::Eof]);
}

#[test]
fn unknown_directive() {
    let lexed = lex("#wat\n", &[]);
    assert_eq!(lexed.errors(), vec!["unknown directive '#wat'"]);
}

#[test]
fn directive_requires_line_start() {
    let lexed = lex("x #define Y 1\n", &[b"x", b"define", b"Y"]);
    assert_eq!(lexed.errors().len(), 1);
    assert!(lexed.errors()[0].starts_with("unexpected character '#'"));
    assert_eq!(
        lexed.kinds(),
        vec![
            TokenKind::Name(lexed.atoms[0]),
            TokenKind::Unknown,
            TokenKind::Name(lexed.atoms[1]),
            TokenKind::Name(lexed.atoms[2]),
            TokenKind::IntLit(1),
            TokenKind::Eof,
        ]
    );
}

#[test]
fn pragma_deprecated() {
    let lexed = lex("#pragma deprecated   use Other instead  \nx", &[b"x"]);
    lexed.assert_clean();
    assert_eq!(lexed.deprecation.as_deref(), Some("use Other instead"));
}

#[test]
fn pragma_newdecls() {
    let lexed = lex("#pragma newdecls required\n#pragma newdecls optional\n", &[]);
    lexed.assert_clean();

    let lexed = lex("#pragma newdecls sometimes\n", &[]);
    assert_eq!(
        lexed.errors(),
        vec!["expected 'required' or 'optional' after #pragma newdecls"]
    );
}

#[test]
fn pragma_semicolon_value_is_discarded() {
    let lexed = lex("#pragma semicolon 1\n", &[]);
    lexed.assert_clean();
}

#[test]
fn pragma_dynamic() {
    let lexed = lex("#pragma dynamic 4096\n", &[]);
    lexed.assert_clean();
    assert_eq!(lexed.pragma_dynamic, Some(4096));
}

#[test]
fn unknown_pragma() {
    let lexed = lex("#pragma frobnicate\n", &[]);
    assert_eq!(lexed.errors(), vec!["unknown pragma 'frobnicate'"]);
}

#[test]
fn tryinclude_missing_is_silent() {
    let lexed = lex("#tryinclude <does_not_exist>\nx\n", &[b"x"]);
    lexed.assert_clean();
    assert_eq!(
        lexed.kinds(),
        vec![TokenKind::Name(lexed.atoms[0]), TokenKind::Eof]
    );
}

#[test]
fn include_missing_is_fatal() {
    let lexed = lex("#include <does_not_exist>\n", &[]);
    assert!(lexed.fatal);
    assert!(lexed
        .diags
        .iter()
        .any(|(level, msg)| *level == Level::Fatal && msg.contains("not found")));
}

#[test]
fn include_pushes_and_resumes() {
    let dir = scratch_dir("include");
    fs::write(dir.join("helper.inc"), "inside\n").unwrap();

    let lexed = lex_impl(
        "#include \"helper.inc\"\nafter\n",
        LexOptions::default(),
        &[b"inside", b"after"],
        Some(dir.clone()),
        vec![],
    );
    lexed.assert_clean();
    assert_eq!(
        lexed.kinds(),
        vec![
            TokenKind::Name(lexed.atoms[0]),
            TokenKind::Name(lexed.atoms[1]),
            TokenKind::Eof,
        ]
    );
}

#[test]
fn include_searches_system_dirs() {
    let dir = scratch_dir("sysinclude");
    fs::write(dir.join("lib.inc"), "#define FROM_LIB 7\n").unwrap();

    let lexed = lex_impl(
        "#include <lib.inc>\nFROM_LIB\n",
        LexOptions::default(),
        &[],
        None,
        vec![dir],
    );
    lexed.assert_clean();
    assert_eq!(lexed.kinds(), vec![TokenKind::IntLit(7), TokenKind::Eof]);
}

#[test]
fn macro_conditional_roundtrip() {
    // A denser end-to-end slice: conditions over macros, re-definition inside branches.
    let src = "#define MODE 2\n\
               #if MODE == 1\n\
               one\n\
               #else\n\
               #if MODE == 2\n\
               two\n\
               #endif\n\
               #endif\n";
    let lexed = lex(src, &[b"two"]);
    lexed.assert_clean();
    assert_eq!(
        lexed.kinds(),
        vec![TokenKind::Name(lexed.atoms[0]), TokenKind::Eof]
    );
}
