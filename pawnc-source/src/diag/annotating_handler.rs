use crate::smap::InterpretedFileRange;
use crate::{SourceMap, SourceRange};

use super::{Diagnostic, Handler, Level};

/// A diagnostic handler that emits messages and annotated code snippets to `stderr`.
pub struct AnnotatingHandler;

impl Handler for AnnotatingHandler {
    fn handle(&mut self, diag: &Diagnostic, smap: Option<&SourceMap>) {
        match (diag.range, smap) {
            (Some(range), Some(smap)) => print_located(diag.level, &diag.msg, range, smap),
            _ => print_anon(diag.level, &diag.msg),
        }

        for note in &diag.notes {
            match (note.range, smap) {
                (Some(range), Some(smap)) => print_located(Level::Note, &note.msg, range, smap),
                _ => print_anon(Level::Note, &note.msg),
            }
        }

        eprintln!();
    }
}

fn print_anon(level: Level, msg: &str) {
    eprintln!("{}: {}", level, msg);
}

fn print_located(level: Level, msg: &str, range: SourceRange, smap: &SourceMap) {
    let file_range = smap.get_expansion_range(range);
    let interpreted = smap.get_interpreted_range(file_range);

    print_include_trace(&interpreted, smap);

    let linecol = interpreted.start_linecol();
    eprintln!(
        "{}:{}:{}: {}: {}",
        interpreted.filename(),
        linecol.line + 1,
        linecol.col + 1,
        level,
        msg
    );

    print_snippet(&interpreted);

    // Point back at the macro definition when the range came out of an expansion.
    if file_range != range {
        let spelling = smap.get_spelling_pos(range.start());
        let spelled = smap.get_interpreted_range(spelling.into());
        let linecol = spelled.start_linecol();
        eprintln!(
            "{}:{}:{}: note: expanded from here",
            spelled.filename(),
            linecol.line + 1,
            linecol.col + 1
        );
    }
}

fn print_include_trace(interpreted: &InterpretedFileRange<'_>, smap: &SourceMap) {
    if let Some(include_pos) = interpreted.include_pos() {
        for (_, pos) in smap.get_includer_chain(include_pos) {
            let interpreted = smap.get_interpreted_range(pos.into());
            let linecol = interpreted.start_linecol();
            eprintln!(
                "In file included from {}:{}:",
                interpreted.filename(),
                linecol.line + 1
            );
        }
    }
}

fn print_snippet(interpreted: &InterpretedFileRange<'_>) {
    let linecol = interpreted.start_linecol();
    let line = interpreted.contents().get_line(linecol.line);

    eprintln!("{}", line);

    let marker_len = (interpreted.len as usize).max(1);
    let padding: String = line
        .chars()
        .take(linecol.col as usize)
        .map(|c| if c == '\t' { '\t' } else { ' ' })
        .collect();
    eprintln!("{}{}", padding, "^".repeat(marker_len.min(line.len() + 1 - padding.len())));
}
