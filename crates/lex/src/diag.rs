//! Diagnostic records shared by the lexer and the parser.
//!
//! Errors are recorded into a [`Diagnostics`] sink owned by the session that
//! produced them; nothing here unwinds. A non-zero [`Diagnostics::error_count`]
//! means the token stream or AST must not be handed to later stages.

use std::fmt;
use std::io::{self, Write};

use anyhow::{bail, Result};
use thiserror::Error;

use crate::source::SourceLocation;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticKind {
    Lex,
    Parse,
    Internal,
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DiagnosticKind::Lex => "lex",
            DiagnosticKind::Parse => "parse",
            DiagnosticKind::Internal => "internal",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{location}: {kind} error: {message}")]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub location: SourceLocation,
    pub message: String,
}

#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    items: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn report(&mut self, kind: DiagnosticKind, location: SourceLocation, message: impl Into<String>) {
        let message = message.into();
        log::debug!("{} error at {}: {}", kind, location, message);
        self.items.push(Diagnostic {
            kind,
            location,
            message,
        });
    }

    pub fn error_count(&self) -> usize {
        self.items.len()
    }

    pub fn count(&self, kind: DiagnosticKind) -> usize {
        self.items.iter().filter(|d| d.kind == kind).count()
    }

    pub fn has_errors(&self) -> bool {
        !self.items.is_empty()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter()
    }

    pub fn first(&self) -> Option<&Diagnostic> {
        self.items.first()
    }

    pub fn extend(&mut self, other: Diagnostics) {
        self.items.extend(other.items);
    }

    /// Render one line per diagnostic.
    pub fn emit(&self, out: &mut impl Write) -> io::Result<()> {
        for d in &self.items {
            writeln!(out, "{}", d)?;
        }
        Ok(())
    }

    pub fn emit_to_stderr(&self) {
        let stderr = io::stderr();
        let mut lock = stderr.lock();
        let _ = self.emit(&mut lock);
    }

    /// Fold the recorded errors into a single `anyhow` error, or `Ok` when clean.
    pub fn check(&self) -> Result<()> {
        if self.items.is_empty() {
            return Ok(());
        }
        let mut rendered = Vec::new();
        self.emit(&mut rendered)?;
        bail!(
            "{} error(s)\n{}",
            self.items.len(),
            String::from_utf8_lossy(&rendered).trim_end()
        )
    }
}
