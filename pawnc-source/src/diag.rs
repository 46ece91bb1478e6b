//! Diagnostic reporting and emission.
//!
//! Diagnostics are constructed through a [`Reporter`](struct.Reporter.html) borrowed from the
//! [`Manager`](struct.Manager.html) and finished with
//! [`DiagnosticBuilder::emit()`](struct.DiagnosticBuilder.html#method.emit):
//!
//! ```ignore
//! ctx.reporter().error(range, "unterminated string literal").emit()?;
//! ```
//!
//! Every diagnostic below `Level::Fatal` is recoverable: `emit()` returns `Ok(())` and the caller
//! continues. A fatal diagnostic (reported directly, or synthesized when the error limit is hit)
//! makes `emit()` return `Err(FatalErrorEmitted)`, which is threaded up through the
//! [`Result`](type.Result.html) alias to abort the pipeline.

use std::fmt;

use crate::{SourceMap, SourceRange};

pub use annotating_handler::AnnotatingHandler;

mod annotating_handler;

/// Diagnostic severity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Note,
    Warning,
    Error,
    Fatal,
}

impl Level {
    /// Returns a human-readable string describing this level.
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Note => "note",
            Level::Warning => "warning",
            Level::Error => "error",
            Level::Fatal => "fatal",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error type indicating that a fatal diagnostic has been emitted and compilation should be
/// aborted.
#[derive(Debug, Copy, Clone)]
pub struct FatalErrorEmitted;

pub type Result<T> = std::result::Result<T, FatalErrorEmitted>;

/// An attached note pointing at related code (e.g. a previous definition).
#[derive(Debug, Clone)]
pub struct Note {
    pub msg: String,
    pub range: Option<SourceRange>,
}

impl Note {
    pub fn new(msg: impl Into<String>, range: impl Into<Option<SourceRange>>) -> Self {
        Note {
            msg: msg.into(),
            range: range.into(),
        }
    }
}

/// A diagnostic: a leveled message with an optional primary range and attached notes.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub level: Level,
    pub msg: String,
    pub range: Option<SourceRange>,
    pub notes: Vec<Note>,
}

/// Handler trait for receiving emitted diagnostics.
pub trait Handler {
    /// Handles a diagnostic.
    ///
    /// If the diagnostic was reported with location information, `smap` will be provided as well.
    fn handle(&mut self, diag: &Diagnostic, smap: Option<&SourceMap>);
}

/// A helper structure for constructing and emitting diagnostics.
///
/// Once the diagnostic is built, be sure to call [`emit()`](#method.emit) to actually emit it.
#[must_use = "diagnostics should be emitted with `.emit()`"]
pub struct DiagnosticBuilder<'a, 'h> {
    diag: Box<Diagnostic>,
    smap: Option<&'a SourceMap>,
    manager: &'a mut Manager<'h>,
}

impl<'a, 'h> DiagnosticBuilder<'a, 'h> {
    fn new(
        manager: &'a mut Manager<'h>,
        level: Level,
        msg: String,
        range: Option<(SourceRange, &'a SourceMap)>,
    ) -> Self {
        let diag = Box::new(Diagnostic {
            level,
            msg,
            range: range.map(|(range, _)| range),
            notes: Vec::new(),
        });

        DiagnosticBuilder {
            diag,
            smap: range.map(|(_, smap)| smap),
            manager,
        }
    }

    /// Adds a note to the diagnostic being built.
    pub fn add_note(mut self, note: Note) -> Self {
        self.diag.notes.push(note);
        self
    }

    /// Emits the built diagnostic back to the manager.
    ///
    /// If this diagnostic caused a fatal error to be emitted, either directly or indirectly
    /// (through the error limit), returns `Err(FatalErrorEmitted)`. Otherwise, returns `Ok(())`.
    pub fn emit(self) -> Result<()> {
        self.manager.emit(&self.diag, self.smap)
    }
}

/// A top-level diagnostics engine.
///
/// This structure is responsible for forwarding diagnostics to a handler, enforcing error limits
/// and tracking statistics about emitted diagnostics.
pub struct Manager<'h> {
    handler: Box<dyn Handler + 'h>,
    error_limit: Option<u32>,
    warning_count: u32,
    error_count: u32,
}

impl<'h> Manager<'h> {
    /// Creates a new `Manager` with the specified handler and error limit.
    ///
    /// If `error_limit` is provided, the manager will emit a fatal diagnostic once the specified
    /// number of errors has been emitted.
    pub fn new(handler: impl Handler + 'h, error_limit: Option<u32>) -> Self {
        Manager {
            handler: Box::new(handler),
            error_limit,
            warning_count: 0,
            error_count: 0,
        }
    }

    /// Creates a new `Manager` with an [annotating handler](struct.AnnotatingHandler.html) and
    /// the specified error limit.
    pub fn annotating(error_limit: Option<u32>) -> Manager<'static> {
        Manager::new(AnnotatingHandler, error_limit)
    }

    /// Creates a new reporter for reporting diagnostics with location information.
    pub fn reporter<'a>(&'a mut self, smap: &'a SourceMap) -> Reporter<'a, 'h> {
        Reporter {
            manager: self,
            smap,
        }
    }

    /// Reports a diagnostic with no location information, returning a diagnostic builder.
    pub fn report_anon(&mut self, level: Level, msg: String) -> DiagnosticBuilder<'_, 'h> {
        DiagnosticBuilder::new(self, level, msg, None)
    }

    /// Returns the number of warnings emitted by this manager.
    pub fn warning_count(&self) -> u32 {
        self.warning_count
    }

    /// Returns the number of errors emitted by this manager.
    pub fn error_count(&self) -> u32 {
        self.error_count
    }

    /// Emits the specified diagnostic.
    ///
    /// Statistics are updated, and a fatal diagnostic is emitted if the error limit is reached.
    fn emit(&mut self, diag: &Diagnostic, smap: Option<&SourceMap>) -> Result<()> {
        self.handler.handle(diag, smap);

        match diag.level {
            Level::Warning => self.warning_count += 1,
            Level::Error => self.error_count += 1,
            Level::Fatal => return Err(FatalErrorEmitted),
            _ => {}
        }

        if let Some(limit) = self.error_limit {
            if self.error_count >= limit {
                return self
                    .report_anon(Level::Fatal, "too many errors emitted".to_owned())
                    .emit();
            }
        }

        Ok(())
    }
}

/// Helper for reporting diagnostics with location information.
///
/// Use [`Manager::reporter()`](struct.Manager.html#method.reporter) to create a new reporter.
pub struct Reporter<'a, 'h> {
    manager: &'a mut Manager<'h>,
    smap: &'a SourceMap,
}

impl<'a, 'h> Reporter<'a, 'h> {
    /// Reports a diagnostic at the specified location, returning a diagnostic builder to allow the
    /// diagnostic to be finished and emitted.
    pub fn report(
        &mut self,
        level: Level,
        range: impl Into<SourceRange>,
        msg: impl Into<String>,
    ) -> DiagnosticBuilder<'_, 'h> {
        DiagnosticBuilder::new(
            self.manager,
            level,
            msg.into(),
            Some((range.into(), self.smap)),
        )
    }

    /// Reports a warning at the specified location, returning a diagnostic builder.
    pub fn warn(
        &mut self,
        range: impl Into<SourceRange>,
        msg: impl Into<String>,
    ) -> DiagnosticBuilder<'_, 'h> {
        self.report(Level::Warning, range, msg)
    }

    /// Reports an error at the specified location, returning a diagnostic builder.
    pub fn error(
        &mut self,
        range: impl Into<SourceRange>,
        msg: impl Into<String>,
    ) -> DiagnosticBuilder<'_, 'h> {
        self.report(Level::Error, range, msg)
    }

    /// Reports a fatal error at the specified location, returning a diagnostic builder.
    pub fn fatal(
        &mut self,
        range: impl Into<SourceRange>,
        msg: impl Into<String>,
    ) -> DiagnosticBuilder<'_, 'h> {
        self.report(Level::Fatal, range, msg)
    }
}
