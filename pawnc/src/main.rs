use std::fs;
use std::path::PathBuf;
use std::process;

use structopt::StructOpt;

use pawnc_lex::{Interner, LexCtx, TokenKind};
use pawnc_pp::{LexOptions, PreprocessorBuilder};
use pawnc_source::diag::Level;
use pawnc_source::smap::{FileContents, FileName};
use pawnc_source::{DResult, DiagManager, SourceMap};

/// Lexes a SourcePawn script through the preprocessor and dumps the token stream.
#[derive(StructOpt)]
#[structopt(name = "pawnc")]
struct Opts {
    /// The script to process.
    pub filename: PathBuf,

    /// Additional include search directories.
    #[structopt(short = "I", number_of_values = 1)]
    pub include_dirs: Vec<PathBuf>,

    /// Attribute comments to neighbouring tokens and dump the blocks.
    #[structopt(long)]
    pub trace_comments: bool,

    /// Abort after this many errors.
    #[structopt(long)]
    pub error_limit: Option<u32>,
}

fn run(opts: &Opts, diags: &mut DiagManager<'_>) -> DResult<()> {
    let main_src = fs::read_to_string(&opts.filename).map_err(|err| {
        diags
            .report_anon(
                Level::Fatal,
                format!("failed to read '{}': {}", opts.filename.display(), err),
            )
            .emit()
            .unwrap_err()
    })?;

    let mut interner = Interner::new();
    let mut smap = SourceMap::new();

    let main_id = smap
        .create_file(
            FileName::real(opts.filename.clone()),
            FileContents::new(&main_src),
            None,
        )
        .map_err(|_| {
            diags
                .report_anon(Level::Fatal, "file too large".into())
                .emit()
                .unwrap_err()
        })?;

    let mut ctx = LexCtx::new(&mut interner, diags, &mut smap);

    let mut builder = PreprocessorBuilder::new(&mut ctx, main_id);
    builder
        .include_dirs(opts.include_dirs.clone())
        .options(LexOptions {
            trace_comments: opts.trace_comments,
            ..Default::default()
        });
    if let Some(parent) = opts.filename.parent() {
        builder.parent_dir(parent.into());
    }
    let mut pp = builder.build();

    loop {
        let tok = pp.next(&mut ctx)?;
        if tok.kind == TokenKind::Eof {
            break;
        }

        let file_range = ctx.smap.get_expansion_range(tok.range());
        let linecol = ctx.smap.get_interpreted_range(file_range).start_linecol();
        println!(
            "{:>4}:{:<4} {}",
            linecol.line + 1,
            linecol.col + 1,
            tok.display(&ctx)
        );
    }

    if opts.trace_comments {
        for &(pos, range) in pp.state().comments() {
            let interpreted = ctx.smap.get_interpreted_range(range);
            println!(
                "comment ({:?}) lines {}-{}",
                pos,
                interpreted.start_linecol().line + 1,
                interpreted.end_linecol().line + 1
            );
        }
    }

    if let Some(msg) = pp.state_mut().take_next_deprecation() {
        println!("pending deprecation: {}", msg);
    }
    if let Some(size) = pp.state().pragma_dynamic() {
        println!("pragma dynamic: {}", size);
    }

    Ok(())
}

fn main() {
    let opts = Opts::from_args();
    let mut diags = DiagManager::annotating(opts.error_limit);

    if run(&opts, &mut diags).is_err() || diags.error_count() > 0 {
        process::exit(1);
    }
}
