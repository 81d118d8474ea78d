/*
 * source.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * A single input/output pair declared in a manifest.
 */

//! Source records.
//!
//! A [`Source`] pairs one stylesheet input with the place its compiled CSS
//! should go. Everything beyond the two stored paths (output file name,
//! source map name, dialect, sibling search directories) is derived on
//! demand.

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{GassError, Result};
use crate::syntax::{self, Syntax};

/// Suffix appended to the CSS output path to name its source map.
pub const MAP_SUFFIX: &str = ".map";

/// One input stylesheet and its output destination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Source {
    input: PathBuf,
    output: PathBuf,
}

impl Source {
    /// Create a source from an input stylesheet and an output destination.
    ///
    /// The output may name a `.css` file directly or a directory in which
    /// the compiled file is placed.
    ///
    /// # Errors
    ///
    /// Returns [`GassError::BlankPath`] if either path is empty and
    /// [`GassError::UnrecognizedExtension`] if the input is not a `.scss`,
    /// `.sass` or `.css` file.
    pub fn new(input: impl Into<PathBuf>, output: impl Into<PathBuf>) -> Result<Self> {
        let input = input.into();
        let output = output.into();

        if input.as_os_str().is_empty() {
            return Err(GassError::BlankPath { which: "input" });
        }
        if output.as_os_str().is_empty() {
            return Err(GassError::BlankPath { which: "output" });
        }
        if !syntax::is_recognized(&input) {
            return Err(GassError::UnrecognizedExtension { path: input });
        }

        Ok(Self { input, output })
    }

    /// Anchor relative input and output paths at `base`.
    ///
    /// Absolute paths are left untouched.
    pub fn resolved_against(self, base: &Path) -> Self {
        Self {
            input: base.join(self.input),
            output: base.join(self.output),
        }
    }

    /// Path of the input stylesheet.
    pub fn input(&self) -> &Path {
        &self.input
    }

    /// Output path exactly as declared (file or directory).
    pub fn declared_output(&self) -> &Path {
        &self.output
    }

    /// Directory containing the input stylesheet.
    ///
    /// A bare file name lives in the working directory, `.`.
    pub fn input_dir(&self) -> &Path {
        match self.input.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        }
    }

    /// Path the compiled CSS is written to.
    ///
    /// A declared output ending in `.css` is used verbatim; anything else is
    /// treated as a directory and receives `<input stem>.css`.
    pub fn output(&self) -> PathBuf {
        let names_file = self
            .output
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("css"));
        if names_file {
            return self.output.clone();
        }

        let mut name = self.input.file_stem().map(OsString::from).unwrap_or_default();
        name.push(".css");
        self.output.join(name)
    }

    /// Path the source map is written to: [`Source::output`] plus `.map`.
    pub fn output_map(&self) -> PathBuf {
        let mut path = self.output().into_os_string();
        path.push(MAP_SUFFIX);
        PathBuf::from(path)
    }

    /// Dialect of the input, inferred from its extension.
    pub fn syntax(&self) -> Syntax {
        Syntax::from_path(&self.input)
    }

    /// Directories sitting next to the input file, sorted by name.
    ///
    /// These become extra import search roots so that peer directories can
    /// be imported from without `../` navigation. Only one level is listed.
    pub fn relative(&self) -> Result<Vec<PathBuf>> {
        let dir = self.input_dir();
        let entries =
            fs::read_dir(dir).map_err(|e| GassError::io("listing input directory", dir, e))?;

        let mut dirs = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| GassError::io("listing input directory", dir, e))?;
            let file_type = entry
                .file_type()
                .map_err(|e| GassError::io("inspecting", entry.path(), e))?;
            if file_type.is_dir() {
                dirs.push(entry.path());
            }
        }
        dirs.sort();
        Ok(dirs)
    }
}
