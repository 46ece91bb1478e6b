#![warn(rust_2018_idioms)]

use std::mem;
use std::path::PathBuf;
use std::rc::Rc;

use pawnc_lex::{LexCtx, Token, TokenKind};
use pawnc_source::smap::FileName;
use pawnc_source::{DResult, SourceId, SourceRange};

pub use file::{File, IncludeError, IncludeKind, IncludeLoader};
pub use lexer::{LexOptions, Lexer};
pub use macros::{MacroDef, ReplacementList};
pub use state::{CommentPos, IncludeRequest, PpState};

mod eval;
mod file;
mod lexer;
mod macros;
mod state;

/// Hard bound on `#include` nesting, to catch include cycles.
const MAX_INCLUDE_DEPTH: usize = 64;

pub struct PreprocessorBuilder<'a, 'b, 'h> {
    ctx: &'a mut LexCtx<'b, 'h>,
    main_id: SourceId,
    parent_dir: Option<PathBuf>,
    include_dirs: Vec<PathBuf>,
    options: LexOptions,
}

impl<'a, 'b, 'h> PreprocessorBuilder<'a, 'b, 'h> {
    pub fn new(ctx: &'a mut LexCtx<'b, 'h>, main_id: SourceId) -> Self {
        Self {
            ctx,
            main_id,
            parent_dir: None,
            include_dirs: Vec::new(),
            options: LexOptions::default(),
        }
    }

    pub fn parent_dir(&mut self, dir: PathBuf) -> &mut Self {
        self.parent_dir = Some(dir);
        self
    }

    pub fn include_dirs(&mut self, dirs: Vec<PathBuf>) -> &mut Self {
        self.include_dirs = dirs;
        self
    }

    pub fn options(&mut self, options: LexOptions) -> &mut Self {
        self.options = options;
        self
    }

    pub fn build(&mut self) -> Preprocessor {
        let source = self.ctx.smap.get_source(self.main_id);
        let file_info = source
            .as_file()
            .expect("preprocessor requires a file source");
        let file = File::new(Rc::clone(&file_info.contents), self.parent_dir.take());
        let main = Lexer::new(file, source.range, self.options.clone());

        Preprocessor {
            files: ActiveFiles {
                main,
                includes: vec![],
            },
            include_loader: IncludeLoader::new(mem::take(&mut self.include_dirs)),
            state: PpState::new(self.ctx.interner),
        }
    }
}

/// The stack of lexers currently being read.
///
/// The bottom of the stack is always the main source file; includes are pushed on top of it.
struct ActiveFiles {
    main: Lexer,
    includes: Vec<Lexer>,
}

impl ActiveFiles {
    fn top(&mut self) -> &mut Lexer {
        self.includes.last_mut().unwrap_or(&mut self.main)
    }

    fn have_includes(&self) -> bool {
        !self.includes.is_empty()
    }

    fn depth(&self) -> usize {
        self.includes.len()
    }

    fn push_include(&mut self, lexer: Lexer) {
        self.includes.push(lexer);
    }

    fn pop_include(&mut self) {
        self.includes.pop();
    }
}

/// The preprocessor facade: owns the file stack, the macro and keyword tables, and the include
/// loader, and produces one fully-preprocessed token per `next()` call.
pub struct Preprocessor {
    files: ActiveFiles,
    include_loader: IncludeLoader,
    state: PpState,
}

impl Preprocessor {
    /// Produces the next token for the parser.
    ///
    /// Macro replays are drained first; the active lexer's `None` yields (directive handled,
    /// macro entered) loop internally; includes are resolved and pushed; a file's EOF pops back
    /// to its includer after verifying if-stack balance.
    pub fn next(&mut self, ctx: &mut LexCtx<'_, '_>) -> DResult<Token> {
        loop {
            if let Some(tok) = self.state.next_expansion_token(ctx)? {
                return Ok(tok);
            }

            let tok = self.files.top().next(ctx, &mut self.state)?;

            if let Some(req) = self.state.take_include_request() {
                self.handle_include(ctx, req)?;
                continue;
            }

            match tok.kind {
                TokenKind::None => continue,

                TokenKind::Eof => {
                    self.files.top().check_if_stack_at_end_of_file(ctx)?;
                    if self.files.have_includes() {
                        self.files.pop_include();
                        continue;
                    }
                    return Ok(tok);
                }

                _ => return Ok(tok),
            }
        }
    }

    pub fn state(&self) -> &PpState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut PpState {
        &mut self.state
    }

    fn handle_include(&mut self, ctx: &mut LexCtx<'_, '_>, req: IncludeRequest) -> DResult<()> {
        let range = SourceRange::from(req.loc);

        if self.files.depth() >= MAX_INCLUDE_DEPTH {
            return ctx
                .reporter()
                .fatal(range, "includes nested too deeply")
                .emit();
        }

        let file = match self
            .include_loader
            .load(&req.filename, req.kind, self.files.top().file())
        {
            Ok(file) => file,
            Err(err) => {
                // #tryinclude is allowed to fail silently.
                if !req.required {
                    return Ok(());
                }

                let msg = match err {
                    IncludeError::NotFound => {
                        format!("include '{}' not found", req.filename.display())
                    }
                    IncludeError::Io { full_path, error } => {
                        format!("failed to read '{}': {}", full_path.display(), error)
                    }
                };
                return ctx.reporter().fatal(range, msg).emit();
            }
        };

        let id = match ctx.smap.create_file(
            FileName::real(req.filename),
            Rc::clone(&file.contents),
            Some(req.loc),
        ) {
            Ok(id) => id,
            Err(_) => {
                return ctx
                    .reporter()
                    .fatal(range, "translation unit too large")
                    .emit();
            }
        };

        // Includes inherit the including file's options; their local changes don't escape.
        let options = self.files.top().options().clone();
        let lexer = Lexer::new(file, ctx.smap.get_source(id).range, options);
        self.files.push_include(lexer);

        Ok(())
    }
}
