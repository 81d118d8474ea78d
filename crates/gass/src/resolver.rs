/*
 * resolver.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Import resolution: canonicalization of import references and loading of
 * canonical references.
 */

//! Import resolution.
//!
//! Resolution happens in two phases, mirroring how Sass compilers import:
//!
//! 1. [`ImportResolver::canonicalize`] turns a reference written inside a
//!    stylesheet (`"base"`, `"components/button"`) into a canonical
//!    `file://` URL, or reports that nothing matched.
//! 2. [`ImportResolver::load`] reads the content behind a canonical URL.
//!
//! Keeping the phases apart lets a compiler cache canonical URLs and skip
//! re-reading a file imported more than once in the same compilation.
//!
//! # Matching
//!
//! The search directory is listed in file-name order. An entry matches when
//! its name starts with the referenced file name, or with the same name
//! prefixed by `_` (a partial). The first matching entry wins; several
//! simultaneous matches are not disambiguated.

use std::fmt::Debug;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{GassError, Result};
use crate::syntax::Syntax;

/// Scheme prefix of canonical references.
pub const FILE_SCHEME: &str = "file://";

/// Content of a loaded import.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Import {
    pub contents: String,
    pub syntax: Syntax,
}

/// Resolves import references for a compiler session.
pub trait ImportResolver: Send + Sync + Debug {
    /// Directory that references are resolved against.
    fn base_dir(&self) -> &Path;

    /// Turn an import reference into a canonical reference.
    ///
    /// `Ok(None)` means nothing matched and the compiler should try its next
    /// search root; errors are reserved for I/O failures.
    fn canonicalize(&self, url: &str) -> Result<Option<String>>;

    /// Read the stylesheet behind a canonical reference.
    fn load(&self, canonical: &str) -> Result<Import>;
}

/// How a directory entry met while scanning is handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DirectoryPolicy {
    /// Ignore directories and keep scanning.
    #[default]
    Skip,
    /// Stop at the first directory and report no match.
    StopScan,
}

/// Resolver backed by the local filesystem, bound to one base directory.
#[derive(Debug, Clone)]
pub struct FileImportResolver {
    base_dir: PathBuf,
    directories: DirectoryPolicy,
}

impl FileImportResolver {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            directories: DirectoryPolicy::default(),
        }
    }

    /// Use `policy` for directory entries met while scanning.
    pub fn with_directory_policy(mut self, policy: DirectoryPolicy) -> Self {
        self.directories = policy;
        self
    }
}

impl ImportResolver for FileImportResolver {
    fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    fn canonicalize(&self, url: &str) -> Result<Option<String>> {
        let (dir, file) = split_reference(url);
        let search_dir = if dir.is_empty() {
            self.base_dir.clone()
        } else {
            self.base_dir.join(dir)
        };

        if file.is_empty() {
            return Ok(None);
        }

        let Some(partial) = find_entry(&search_dir, file, self.directories)? else {
            tracing::debug!(url, dir = %search_dir.display(), "no import match");
            return Ok(None);
        };

        let mut name = if partial {
            format!("_{file}")
        } else {
            file.to_string()
        };
        if Path::new(file).extension().is_none() {
            name.push('.');
            name.push_str(Syntax::default().extension());
        }

        let canonical = to_canonical(&search_dir.join(name));
        tracing::debug!(url, canonical = %canonical, partial, "canonicalized import");
        Ok(Some(canonical))
    }

    fn load(&self, canonical: &str) -> Result<Import> {
        let path = to_path(canonical);
        let contents =
            fs::read_to_string(&path).map_err(|e| GassError::io("loading import", &path, e))?;

        Ok(Import {
            contents,
            syntax: Syntax::from_path(&path),
        })
    }
}

/// Path named by a canonical reference.
pub fn to_path(canonical: &str) -> PathBuf {
    PathBuf::from(canonical.strip_prefix(FILE_SCHEME).unwrap_or(canonical))
}

/// Canonical reference for an absolute path.
pub fn to_canonical(path: &Path) -> String {
    format!("{FILE_SCHEME}{}", path.display())
}

/// Split a reference into its directory part (with trailing `/`) and file
/// name.
fn split_reference(url: &str) -> (&str, &str) {
    match url.rfind('/') {
        Some(index) => url.split_at(index + 1),
        None => ("", url),
    }
}

/// Scan `dir` for an entry matching `file`.
///
/// Returns `Some(is_partial)` for the first match in name order.
fn find_entry(dir: &Path, file: &str, directories: DirectoryPolicy) -> Result<Option<bool>> {
    let entries =
        fs::read_dir(dir).map_err(|e| GassError::io("listing import directory", dir, e))?;

    let mut listing = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| GassError::io("listing import directory", dir, e))?;
        let file_type = entry
            .file_type()
            .map_err(|e| GassError::io("inspecting", entry.path(), e))?;
        listing.push((entry.file_name(), file_type.is_dir()));
    }
    listing.sort();

    let partial = format!("_{file}");
    for (name, is_dir) in listing {
        if is_dir {
            match directories {
                DirectoryPolicy::Skip => continue,
                DirectoryPolicy::StopScan => return Ok(None),
            }
        }

        let name = name.to_string_lossy();
        if name.starts_with(file) {
            return Ok(Some(false));
        }
        if name.starts_with(&partial) {
            return Ok(Some(true));
        }
    }

    Ok(None)
}
