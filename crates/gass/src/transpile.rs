/*
 * transpile.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Drives a compiler session over every source of a manifest.
 */

//! Batch transpilation.
//!
//! [`Transpiler`] walks a [`Manifest`] in declaration order and, for each
//! source:
//!
//! 1. collects the sibling directories of the input as extra search roots,
//! 2. binds a [`FileImportResolver`] to the input's directory,
//! 3. reads the input and assembles a [`CompileRequest`],
//! 4. compiles it on the session,
//! 5. writes the CSS, and the source map when requested.
//!
//! The first failure stops the run. Outputs written before it stay on disk.

use std::fs;
use std::io::BufRead;
use std::path::Path;
use std::sync::Arc;

use crate::error::{GassError, Result};
use crate::grass_session::GrassSession;
use crate::manifest::Manifest;
use crate::resolver::{FileImportResolver, to_canonical};
use crate::session::{CompileRequest, CompilerSession, OutputStyle, SessionOptions};
use crate::source::Source;
use crate::syntax::Syntax;

/// Caller-chosen options applied to every source of a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TranspileOptions {
    pub style: OutputStyle,
    /// Write `<output>.map` next to every CSS file.
    pub source_maps: bool,
    /// Embed source contents into source maps.
    pub embed_sources: bool,
    /// Dialect used for every input instead of the one its extension implies.
    pub syntax: Option<Syntax>,
}

/// Transpiles manifests on one compiler session.
pub struct Transpiler<S: CompilerSession = GrassSession> {
    session: S,
}

impl Transpiler<GrassSession> {
    /// Start a transpiler on a fresh [`GrassSession`].
    pub fn start(options: SessionOptions) -> Result<Self> {
        Ok(Self::with_session(GrassSession::start(options)?))
    }
}

impl<S: CompilerSession> Transpiler<S> {
    pub fn with_session(session: S) -> Self {
        Self { session }
    }

    /// Transpile every source listed in the manifest at `path`.
    pub fn transpile(&mut self, path: impl AsRef<Path>, options: &TranspileOptions) -> Result<()> {
        let manifest = Manifest::load(path)?;
        self.transpile_manifest(&manifest, options)
    }

    /// Transpile a manifest read from `reader`, such as standard input.
    ///
    /// Relative paths are resolved against the working directory.
    pub fn transpile_from_reader<R: BufRead>(
        &mut self,
        reader: R,
        options: &TranspileOptions,
    ) -> Result<()> {
        let cwd = std::env::current_dir()
            .map_err(|e| GassError::io("resolving working directory", ".", e))?;
        let manifest = Manifest::from_reader(reader, &cwd)?;
        self.transpile_manifest(&manifest, options)
    }

    /// Transpile every source of `manifest`, in order, stopping at the first
    /// failure.
    pub fn transpile_manifest(
        &mut self,
        manifest: &Manifest,
        options: &TranspileOptions,
    ) -> Result<()> {
        tracing::debug!(sources = manifest.len(), "iterating sources");
        for source in manifest {
            self.transpile_source(source, options)
                .map_err(|e| GassError::Transpile {
                    input: source.input().to_path_buf(),
                    source: Box::new(e),
                })?;
        }
        tracing::debug!("finished transpiling sources");
        Ok(())
    }

    fn transpile_source(&mut self, source: &Source, options: &TranspileOptions) -> Result<()> {
        let output = source.output();
        let request = build_request(source, options)?;

        tracing::debug!(input = %source.input().display(), output = %output.display(), "transpiling input");
        let result = self.session.execute(request)?;

        fs::write(&output, &result.css)
            .map_err(|e| GassError::io("writing CSS to", &output, e))?;
        tracing::info!(output = %output.display(), "wrote CSS");

        if options.source_maps {
            let map = source.output_map();
            fs::write(&map, &result.source_map)
                .map_err(|e| GassError::io("writing source map to", &map, e))?;
            tracing::debug!(map = %map.display(), "wrote source map");
        }

        Ok(())
    }

    /// Close the underlying session.
    pub fn close(mut self) -> Result<()> {
        self.session.close()
    }
}

/// Assemble the compile request for one source.
fn build_request(source: &Source, options: &TranspileOptions) -> Result<CompileRequest> {
    let load_paths = source.relative()?;
    let resolver = FileImportResolver::new(source.input_dir());

    let text = fs::read_to_string(source.input())
        .map_err(|e| GassError::io("reading input", source.input(), e))?;
    if text.is_empty() {
        return Err(GassError::EmptySource {
            path: source.input().to_path_buf(),
        });
    }

    Ok(CompileRequest {
        source: text,
        url: to_canonical(source.input()),
        syntax: options.syntax.unwrap_or_else(|| source.syntax()),
        style: options.style,
        source_map: options.source_maps,
        embed_sources: options.embed_sources,
        resolver: Arc::new(resolver),
        load_paths,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::CompileOutput;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicBool, Ordering};
    use tempfile::TempDir;

    /// Session that records requests and answers with canned output.
    #[derive(Default)]
    struct RecordingSession {
        requests: Vec<CompileRequest>,
        fail_on: Option<usize>,
        closed: Arc<AtomicBool>,
    }

    impl CompilerSession for RecordingSession {
        fn execute(&mut self, request: CompileRequest) -> Result<CompileOutput> {
            let index = self.requests.len();
            self.requests.push(request);
            if self.fail_on == Some(index) {
                return Err(GassError::Compile {
                    message: "Error: expected \"}\".".to_string(),
                });
            }
            Ok(CompileOutput {
                css: format!("/* css {index} */\n"),
                source_map: format!("{{\"version\":3,\"index\":{index}}}"),
            })
        }

        fn close(&mut self) -> Result<()> {
            self.closed.store(true, Ordering::SeqCst);
            Ok(())
        }
    }

    struct Project {
        temp: TempDir,
    }

    impl Project {
        fn new() -> Self {
            let temp = TempDir::new().unwrap();
            fs::create_dir_all(temp.path().join("src/components")).unwrap();
            fs::create_dir_all(temp.path().join("dist")).unwrap();
            Self { temp }
        }

        fn path(&self, rel: &str) -> PathBuf {
            self.temp.path().join(rel)
        }

        fn write(&self, rel: &str, contents: &str) {
            fs::write(self.path(rel), contents).unwrap();
        }

        fn manifest(&self, lines: &str) -> Manifest {
            Manifest::from_reader(lines.as_bytes(), self.temp.path()).unwrap()
        }
    }

    #[test]
    fn test_request_carries_derived_settings() {
        let project = Project::new();
        project.write("src/app.sass", ".a\n  b: c\n");
        let manifest = project.manifest("src/app.sass dist\n");

        let mut transpiler = Transpiler::with_session(RecordingSession::default());
        let options = TranspileOptions {
            style: OutputStyle::Compressed,
            ..Default::default()
        };
        transpiler.transpile_manifest(&manifest, &options).unwrap();

        let request = &transpiler.session.requests[0];
        assert_eq!(request.source, ".a\n  b: c\n");
        assert_eq!(request.syntax, Syntax::Sass);
        assert_eq!(request.style, OutputStyle::Compressed);
        assert_eq!(request.url, to_canonical(&project.path("src/app.sass")));
        assert_eq!(request.resolver.base_dir(), project.path("src"));
        assert_eq!(request.load_paths, vec![project.path("src/components")]);
        assert!(!request.source_map);
    }

    #[test]
    fn test_syntax_override_wins() {
        let project = Project::new();
        project.write("src/app.scss", "a { b: c; }");
        let manifest = project.manifest("src/app.scss dist\n");

        let mut transpiler = Transpiler::with_session(RecordingSession::default());
        let options = TranspileOptions {
            syntax: Some(Syntax::Css),
            ..Default::default()
        };
        transpiler.transpile_manifest(&manifest, &options).unwrap();

        assert_eq!(transpiler.session.requests[0].syntax, Syntax::Css);
    }

    #[test]
    fn test_writes_css_without_map_by_default() {
        let project = Project::new();
        project.write("src/app.scss", "a { b: c; }");
        let manifest = project.manifest("src/app.scss dist\n");

        let mut transpiler = Transpiler::with_session(RecordingSession::default());
        transpiler
            .transpile_manifest(&manifest, &TranspileOptions::default())
            .unwrap();

        assert_eq!(
            fs::read_to_string(project.path("dist/app.css")).unwrap(),
            "/* css 0 */\n"
        );
        assert!(!project.path("dist/app.css.map").exists());
    }

    #[test]
    fn test_writes_map_when_enabled() {
        let project = Project::new();
        project.write("src/app.scss", "a { b: c; }");
        let manifest = project.manifest("src/app.scss dist/bundle.css\n");

        let mut transpiler = Transpiler::with_session(RecordingSession::default());
        let options = TranspileOptions {
            source_maps: true,
            embed_sources: true,
            ..Default::default()
        };
        transpiler.transpile_manifest(&manifest, &options).unwrap();

        let request = &transpiler.session.requests[0];
        assert!(request.source_map);
        assert!(request.embed_sources);
        assert_eq!(
            fs::read_to_string(project.path("dist/bundle.css.map")).unwrap(),
            "{\"version\":3,\"index\":0}"
        );
    }

    #[test]
    fn test_overwrites_existing_output() {
        let project = Project::new();
        project.write("src/app.scss", "a { b: c; }");
        project.write("dist/app.css", "stale content that is much longer than the new css");
        let manifest = project.manifest("src/app.scss dist\n");

        let mut transpiler = Transpiler::with_session(RecordingSession::default());
        transpiler
            .transpile_manifest(&manifest, &TranspileOptions::default())
            .unwrap();

        assert_eq!(
            fs::read_to_string(project.path("dist/app.css")).unwrap(),
            "/* css 0 */\n"
        );
    }

    #[test]
    fn test_compile_failure_stops_the_run() {
        let project = Project::new();
        project.write("src/a.scss", "a { b: c; }");
        project.write("src/b.scss", "a { b: c; }");
        project.write("src/c.scss", "a { b: c; }");
        let manifest = project.manifest("src/a.scss dist\nsrc/b.scss dist\nsrc/c.scss dist\n");

        let mut transpiler = Transpiler::with_session(RecordingSession {
            fail_on: Some(1),
            ..Default::default()
        });
        let err = transpiler
            .transpile_manifest(&manifest, &TranspileOptions::default())
            .unwrap_err();

        match err {
            GassError::Transpile { input, source } => {
                assert_eq!(input, project.path("src/b.scss"));
                assert!(matches!(*source, GassError::Compile { .. }));
            }
            other => panic!("expected Transpile error, got {other:?}"),
        }
        assert_eq!(transpiler.session.requests.len(), 2);
        assert!(project.path("dist/a.css").exists());
        assert!(!project.path("dist/b.css").exists());
        assert!(!project.path("dist/c.css").exists());
    }

    #[test]
    fn test_empty_input_is_rejected_before_compiling() {
        let project = Project::new();
        project.write("src/app.scss", "");
        let manifest = project.manifest("src/app.scss dist\n");

        let mut transpiler = Transpiler::with_session(RecordingSession::default());
        let err = transpiler
            .transpile_manifest(&manifest, &TranspileOptions::default())
            .unwrap_err();

        let GassError::Transpile { source, .. } = err else {
            panic!("expected Transpile error");
        };
        assert!(matches!(*source, GassError::EmptySource { .. }));
        assert!(transpiler.session.requests.is_empty());
    }

    #[test]
    fn test_missing_input_is_an_io_error() {
        let project = Project::new();
        let manifest = project.manifest("src/missing.scss dist\n");

        let mut transpiler = Transpiler::with_session(RecordingSession::default());
        let err = transpiler
            .transpile_manifest(&manifest, &TranspileOptions::default())
            .unwrap_err();

        let GassError::Transpile { source, .. } = err else {
            panic!("expected Transpile error");
        };
        assert!(matches!(
            *source,
            GassError::Io {
                context: "reading input",
                ..
            }
        ));
    }

    #[test]
    fn test_missing_output_directory_is_an_io_error() {
        let project = Project::new();
        project.write("src/app.scss", "a { b: c; }");
        let manifest = project.manifest("src/app.scss out/nowhere\n");

        let mut transpiler = Transpiler::with_session(RecordingSession::default());
        let err = transpiler
            .transpile_manifest(&manifest, &TranspileOptions::default())
            .unwrap_err();

        let GassError::Transpile { source, .. } = err else {
            panic!("expected Transpile error");
        };
        assert!(matches!(
            *source,
            GassError::Io {
                context: "writing CSS to",
                ..
            }
        ));
    }

    #[test]
    fn test_bad_manifest_aborts_before_compiling() {
        let project = Project::new();
        project.write("src/app.scss", "a { b: c; }");
        project.write(".gassfile", "src/app.scss dist\nsrc/app.scss dist extra\n");

        let mut transpiler = Transpiler::with_session(RecordingSession::default());
        let err = transpiler
            .transpile(project.path(".gassfile"), &TranspileOptions::default())
            .unwrap_err();

        assert!(matches!(err, GassError::InvalidLine { line: 2, .. }));
        assert!(transpiler.session.requests.is_empty());
    }

    #[test]
    fn test_close_closes_session() {
        let session = RecordingSession::default();
        let closed = Arc::clone(&session.closed);

        Transpiler::with_session(session).close().unwrap();
        assert!(closed.load(Ordering::SeqCst));
    }
}
