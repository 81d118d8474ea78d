/*
 * session.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * The compiler session abstraction driven by the transpiler.
 */

//! Compiler sessions.
//!
//! A [`CompilerSession`] is a long-lived handle to a Sass compiler. It is
//! opened once per run, receives one [`CompileRequest`] per source and is
//! closed when the run ends, whether it succeeded or not.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::error::Result;
use crate::resolver::ImportResolver;
use crate::syntax::Syntax;

/// Default upper bound for a single compile round-trip.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// CSS output style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputStyle {
    /// Human-readable CSS.
    #[default]
    Expanded,
    /// Minified CSS.
    Compressed,
}

impl OutputStyle {
    pub(crate) fn to_grass(self) -> grass::OutputStyle {
        match self {
            OutputStyle::Expanded => grass::OutputStyle::Expanded,
            OutputStyle::Compressed => grass::OutputStyle::Compressed,
        }
    }
}

/// Options used when starting a session.
#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// Maximum time to wait for one compilation.
    pub timeout: Duration,
    /// Suppress `@warn` and `@debug` output from stylesheets.
    pub quiet: bool,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            quiet: false,
        }
    }
}

/// A single compilation.
#[derive(Debug, Clone)]
pub struct CompileRequest {
    /// Stylesheet text to compile.
    pub source: String,
    /// Canonical reference of the stylesheet, used to name it in source maps.
    pub url: String,
    pub syntax: Syntax,
    pub style: OutputStyle,
    /// Produce a source map alongside the CSS.
    pub source_map: bool,
    /// Embed the content of every source into the source map.
    pub embed_sources: bool,
    /// Resolver consulted for every import.
    pub resolver: Arc<dyn ImportResolver>,
    /// Extra search roots tried after the resolver's base directory.
    pub load_paths: Vec<PathBuf>,
}

/// Result of a successful compilation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompileOutput {
    pub css: String,
    /// Source map JSON; empty unless requested.
    pub source_map: String,
}

/// A compiler that accepts compile requests until closed.
pub trait CompilerSession {
    /// Compile one stylesheet.
    fn execute(&mut self, request: CompileRequest) -> Result<CompileOutput>;

    /// Release the session. Further requests fail; closing twice is a no-op.
    fn close(&mut self) -> Result<()>;
}
