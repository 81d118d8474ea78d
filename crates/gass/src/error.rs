/*
 * error.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Error types for manifest loading, import resolution and transpilation.
 */

//! Error types for gass.
//!
//! Every failure in the library aborts the current run. Nothing is retried
//! or swallowed; variants carry enough context to tell which phase failed.

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Errors that can occur while loading a manifest or transpiling its sources.
#[derive(Debug, Error)]
pub enum GassError {
    /// An input or output path in a source declaration is empty.
    #[error("source {which} path is blank")]
    BlankPath { which: &'static str },

    /// The input path does not end in `.scss`, `.sass` or `.css`.
    #[error("{} ends with an unrecognized extension", .path.display())]
    UnrecognizedExtension { path: PathBuf },

    /// A manifest line does not consist of exactly two paths.
    #[error("invalid source on line {line}: must be 2 paths, found {tokens}")]
    InvalidLine { line: usize, tokens: usize },

    /// A source declared on a manifest line could not be constructed.
    #[error("line {line}: {source}")]
    AtLine {
        line: usize,
        #[source]
        source: Box<GassError>,
    },

    /// Filesystem failure; `context` names the phase that failed.
    #[error("{context} {}: {source}", .path.display())]
    Io {
        context: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The input stylesheet has no content.
    #[error("source text of {} is empty", .path.display())]
    EmptySource { path: PathBuf },

    /// The compiler rejected the stylesheet.
    #[error("compilation failed: {message}")]
    Compile { message: String },

    /// The compiler did not answer within the session timeout.
    #[error("compilation timed out after {}s", .after.as_secs_f64())]
    Timeout { after: Duration },

    /// The compiler session could not be started.
    #[error("starting compiler session: {0}")]
    SessionStart(#[source] io::Error),

    /// The compiler session was closed or has stopped accepting work.
    #[error("compiler session is closed")]
    SessionClosed,

    /// A source failed to transpile.
    #[error("transpiling {}: {source}", .input.display())]
    Transpile {
        input: PathBuf,
        #[source]
        source: Box<GassError>,
    },
}

impl GassError {
    pub(crate) fn io(context: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        GassError::Io {
            context,
            path: path.into(),
            source,
        }
    }
}

/// Result type for gass operations.
pub type Result<T> = std::result::Result<T, GassError>;
