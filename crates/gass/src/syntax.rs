/*
 * syntax.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Stylesheet dialects and extension mapping.
 */

use std::path::Path;

/// Extensions accepted for source inputs, compared case-insensitively.
pub const RECOGNIZED_EXTENSIONS: [&str; 3] = ["scss", "sass", "css"];

/// Syntax dialect of a stylesheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Syntax {
    /// Brace-based SCSS. Assumed whenever the extension says nothing else.
    #[default]
    Scss,
    /// Indentation-based Sass.
    Sass,
    /// Plain CSS.
    Css,
}

impl Syntax {
    /// Map a file extension (without the dot) to a dialect.
    ///
    /// Unknown or absent extensions fall back to [`Syntax::Scss`], so piped
    /// or generated input without an extension is treated as SCSS.
    pub fn from_extension(ext: Option<&str>) -> Self {
        match ext {
            Some(ext) if ext.eq_ignore_ascii_case("sass") => Syntax::Sass,
            Some(ext) if ext.eq_ignore_ascii_case("css") => Syntax::Css,
            _ => Syntax::Scss,
        }
    }

    /// Infer the dialect of a file from its extension.
    pub fn from_path(path: &Path) -> Self {
        Self::from_extension(path.extension().and_then(|ext| ext.to_str()))
    }

    /// File extension conventionally used for this dialect.
    pub fn extension(&self) -> &'static str {
        match self {
            Syntax::Scss => "scss",
            Syntax::Sass => "sass",
            Syntax::Css => "css",
        }
    }

    pub(crate) fn to_grass(self) -> grass::InputSyntax {
        match self {
            Syntax::Scss => grass::InputSyntax::Scss,
            Syntax::Sass => grass::InputSyntax::Sass,
            Syntax::Css => grass::InputSyntax::Css,
        }
    }
}

/// Whether `path` ends in one of [`RECOGNIZED_EXTENSIONS`].
pub fn is_recognized(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            RECOGNIZED_EXTENSIONS
                .iter()
                .any(|known| known.eq_ignore_ascii_case(ext))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_syntax_from_extension_is_case_insensitive() {
        assert_eq!(Syntax::from_extension(Some("SASS")), Syntax::Sass);
        assert_eq!(Syntax::from_extension(Some("Css")), Syntax::Css);
        assert_eq!(Syntax::from_extension(Some("scss")), Syntax::Scss);
    }

    #[test]
    fn test_syntax_defaults_to_scss() {
        assert_eq!(Syntax::from_extension(None), Syntax::Scss);
        assert_eq!(Syntax::from_extension(Some("less")), Syntax::Scss);
        assert_eq!(Syntax::from_path(Path::new("/src/generated")), Syntax::Scss);
    }

    #[test]
    fn test_is_recognized() {
        assert!(is_recognized(Path::new("/a/style.scss")));
        assert!(is_recognized(Path::new("/a/style.SASS")));
        assert!(is_recognized(Path::new("/a/style.Css")));
        assert!(!is_recognized(Path::new("/a/style.less")));
        assert!(!is_recognized(Path::new("/a/style")));
        assert!(!is_recognized(Path::new("/a/style.scss.bak")));
    }
}
