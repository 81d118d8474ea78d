/*
 * gass
 * Copyright (c) 2025 Posit, PBC
 *
 * Batch Sass to CSS transpilation.
 *
 * A manifest lists (input, output) pairs. Each input is compiled on a single
 * long-lived compiler session, with imports resolved relative to the input's
 * directory and its sibling directories, and the CSS (plus an optional
 * source map) is written to the output.
 */

mod error;
mod grass_session;
mod manifest;
mod resolver;
mod session;
mod source;
mod syntax;
mod transpile;

pub use error::{GassError, Result};
pub use grass_session::GrassSession;
pub use manifest::{DEFAULT_MANIFEST, Manifest};
pub use resolver::{
    DirectoryPolicy, FILE_SCHEME, FileImportResolver, Import, ImportResolver, to_canonical,
    to_path,
};
pub use session::{
    CompileOutput, CompileRequest, CompilerSession, DEFAULT_TIMEOUT, OutputStyle, SessionOptions,
};
pub use source::{MAP_SUFFIX, Source};
pub use syntax::{RECOGNIZED_EXTENSIONS, Syntax, is_recognized};
pub use transpile::{TranspileOptions, Transpiler};
