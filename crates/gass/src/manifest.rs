/*
 * manifest.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Loading of `.gassfile` manifests.
 */

//! Manifest loading.
//!
//! A manifest is a plain text file listing one source per line:
//!
//! ```text
//! # comment lines start with '#'
//! /proj/src/app.scss /proj/dist
//! /proj/src/print.sass /proj/dist/print.css
//! ```
//!
//! Each source line holds exactly two paths separated by a single space.
//! Any malformed line fails the whole manifest; no partial list is
//! returned. Relative paths are anchored at the manifest's directory.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use crate::error::{GassError, Result};
use crate::source::Source;

/// Default manifest file name looked up by the command-line tool.
pub const DEFAULT_MANIFEST: &str = ".gassfile";

/// Ordered list of sources, in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    sources: Vec<Source>,
}

impl Manifest {
    /// Load a manifest from a file.
    ///
    /// Relative paths inside the manifest are resolved against the
    /// directory containing it.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| GassError::io("opening manifest", path, e))?;
        let base_dir = manifest_dir(path)?;

        tracing::debug!(manifest = %path.display(), "loading manifest");
        Self::parse(BufReader::new(file), &base_dir, path)
    }

    /// Load a manifest from any buffered reader, resolving relative paths
    /// against `base_dir`.
    pub fn from_reader<R: BufRead>(reader: R, base_dir: &Path) -> Result<Self> {
        Self::parse(reader, base_dir, Path::new("<reader>"))
    }

    fn parse<R: BufRead>(reader: R, base_dir: &Path, origin: &Path) -> Result<Self> {
        let mut sources = Vec::new();

        for (index, line) in reader.lines().enumerate() {
            let line = line.map_err(|e| GassError::io("reading manifest", origin, e))?;
            let line = line.strip_suffix('\r').unwrap_or(&line);
            let number = index + 1;

            if line.starts_with('#') {
                continue;
            }

            let paths: Vec<&str> = line.split(' ').collect();
            let [input, output] = paths.as_slice() else {
                return Err(GassError::InvalidLine {
                    line: number,
                    tokens: paths.len(),
                });
            };

            let source = Source::new(*input, *output).map_err(|e| GassError::AtLine {
                line: number,
                source: Box::new(e),
            })?;
            sources.push(source.resolved_against(base_dir));
        }

        Ok(Self { sources })
    }

    /// Sources in declaration order.
    pub fn sources(&self) -> &[Source] {
        &self.sources
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

impl<'a> IntoIterator for &'a Manifest {
    type Item = &'a Source;
    type IntoIter = std::slice::Iter<'a, Source>;

    fn into_iter(self) -> Self::IntoIter {
        self.sources.iter()
    }
}

/// Absolute directory of the manifest at `path`.
fn manifest_dir(path: &Path) -> Result<PathBuf> {
    let absolute = std::path::absolute(path)
        .map_err(|e| GassError::io("resolving manifest path", path, e))?;
    Ok(absolute
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("/")))
}
