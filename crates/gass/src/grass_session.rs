/*
 * grass_session.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Compiler session backed by the grass crate.
 */

//! Compiler session backed by [grass](https://github.com/connorskees/grass).
//!
//! The session owns a dedicated worker thread that performs every
//! compilation. Requests travel to the worker over a channel and the caller
//! waits for the reply at most [`SessionOptions::timeout`]. A session whose
//! request timed out is considered stalled and refuses further work.
//!
//! Imports are routed through the request's [`ImportResolver`] by
//! [`ResolverFs`], an adapter implementing `grass::Fs`: each candidate path
//! grass probes below the resolver's base directory is checked with
//! `canonicalize`, and each file grass reads is fetched with `load`.
//!
//! `@debug` and `@warn` output is forwarded to `tracing` by
//! [`TracingLogger`] unless the session is quiet.

use std::io;
use std::path::Path;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{RecvTimeoutError, Sender};
use grass_compiler::codemap::SpanLoc;
use parking_lot::Mutex;
use serde::Serialize;

use crate::error::{GassError, Result};
use crate::resolver::{ImportResolver, to_canonical, to_path};
use crate::session::{
    CompileOutput, CompileRequest, CompilerSession, DEFAULT_TIMEOUT, SessionOptions,
};

/// File name grass gives to a stylesheet compiled from a string.
const STRING_INPUT_NAME: &str = "stdin";

struct Job {
    request: CompileRequest,
    reply: Sender<Result<CompileOutput>>,
}

/// Long-lived in-process compiler session.
pub struct GrassSession {
    jobs: Option<Sender<Job>>,
    worker: Option<JoinHandle<()>>,
    timeout: Duration,
    stalled: bool,
}

impl GrassSession {
    /// Start the compiler worker.
    ///
    /// A zero timeout falls back to [`DEFAULT_TIMEOUT`].
    pub fn start(options: SessionOptions) -> Result<Self> {
        let (jobs, queue) = crossbeam_channel::unbounded::<Job>();
        let quiet = options.quiet;
        let timeout = if options.timeout.is_zero() {
            DEFAULT_TIMEOUT
        } else {
            options.timeout
        };

        let worker = thread::Builder::new()
            .name("gass-compiler".to_string())
            .spawn(move || {
                for job in queue {
                    let output = compile(&job.request, quiet);
                    // Nobody is listening if the request already timed out.
                    let _ = job.reply.send(output);
                }
            })
            .map_err(GassError::SessionStart)?;

        tracing::debug!(?timeout, "started compiler session");
        Ok(Self {
            jobs: Some(jobs),
            worker: Some(worker),
            timeout,
            stalled: false,
        })
    }
}

impl CompilerSession for GrassSession {
    fn execute(&mut self, request: CompileRequest) -> Result<CompileOutput> {
        if self.stalled {
            return Err(GassError::SessionClosed);
        }
        let jobs = self.jobs.as_ref().ok_or(GassError::SessionClosed)?;

        let (reply, response) = crossbeam_channel::bounded(1);
        jobs.send(Job { request, reply })
            .map_err(|_| GassError::SessionClosed)?;

        match response.recv_timeout(self.timeout) {
            Ok(output) => output,
            Err(RecvTimeoutError::Timeout) => {
                self.stalled = true;
                Err(GassError::Timeout {
                    after: self.timeout,
                })
            }
            Err(RecvTimeoutError::Disconnected) => Err(GassError::SessionClosed),
        }
    }

    fn close(&mut self) -> Result<()> {
        self.jobs.take();
        let Some(worker) = self.worker.take() else {
            return Ok(());
        };

        if self.stalled {
            // The worker is stuck in a compilation; it exits once that ends.
            tracing::warn!("detaching stalled compiler worker");
        } else if worker.join().is_err() {
            tracing::warn!("compiler worker panicked");
        }
        tracing::debug!("closed compiler session");
        Ok(())
    }
}

impl Drop for GrassSession {
    fn drop(&mut self) {
        let _ = self.close();
    }
}

/// Run one compilation on the worker thread.
fn compile(request: &CompileRequest, quiet: bool) -> Result<CompileOutput> {
    let fs = ResolverFs::new(request.resolver.as_ref(), request.source_map);
    let logger = TracingLogger {
        entry: &request.url,
    };

    let mut load_paths = Vec::with_capacity(request.load_paths.len() + 1);
    load_paths.push(request.resolver.base_dir().to_path_buf());
    load_paths.extend(request.load_paths.iter().cloned());

    let compiled = {
        let options = grass::Options::default()
            .fs(&fs)
            .logger(&logger)
            .load_paths(&load_paths)
            .style(request.style.to_grass())
            .input_syntax(request.syntax.to_grass())
            .quiet(quiet);
        grass::from_string(request.source.clone(), &options)
    };

    let state = fs.into_state();
    // A resolver failure explains the compile error better than grass can.
    if let Some(err) = state.error {
        return Err(err);
    }
    let css = compiled.map_err(|e| GassError::Compile {
        message: e.to_string(),
    })?;

    let source_map = if request.source_map {
        render_source_map(request, &state.loaded)?
    } else {
        String::new()
    };

    Ok(CompileOutput { css, source_map })
}

#[derive(Debug, Default)]
struct FsState {
    /// First resolver error met during the compilation.
    error: Option<GassError>,
    /// Canonical reference and content of every loaded import, kept only
    /// when a source map is requested.
    loaded: Vec<(String, String)>,
}

/// Adapter that lets grass find and read imports through an
/// [`ImportResolver`].
#[derive(Debug)]
struct ResolverFs<'a> {
    resolver: &'a dyn ImportResolver,
    keep_loaded: bool,
    state: Mutex<FsState>,
}

impl<'a> ResolverFs<'a> {
    fn new(resolver: &'a dyn ImportResolver, keep_loaded: bool) -> Self {
        Self {
            resolver,
            keep_loaded,
            state: Mutex::new(FsState::default()),
        }
    }

    fn into_state(self) -> FsState {
        self.state.into_inner()
    }

    fn record(&self, err: GassError) {
        let mut state = self.state.lock();
        if state.error.is_none() {
            state.error = Some(err);
        }
    }

    /// Import reference naming `path` relative to the resolver's base
    /// directory, with any partial underscore removed.
    ///
    /// `None` when `path` lies outside the base directory.
    fn reference_for(&self, path: &Path) -> Option<String> {
        let relative = path.strip_prefix(self.resolver.base_dir()).ok()?;
        let name = relative.file_name()?.to_str()?;
        let name = name.strip_prefix('_').unwrap_or(name);

        let mut parts: Vec<String> = relative
            .parent()
            .map(|dir| {
                dir.components()
                    .map(|c| c.as_os_str().to_string_lossy().into_owned())
                    .collect()
            })
            .unwrap_or_default();
        parts.push(name.to_string());
        Some(parts.join("/"))
    }
}

impl grass::Fs for ResolverFs<'_> {
    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn is_file(&self, path: &Path) -> bool {
        if !path.is_absolute() {
            return false;
        }
        let Some(url) = self.reference_for(path) else {
            return path.is_file();
        };

        match self.resolver.canonicalize(&url) {
            Ok(Some(canonical)) => to_path(&canonical) == path,
            Ok(None) => false,
            Err(err) => {
                self.record(err);
                false
            }
        }
    }

    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        let canonical = to_canonical(path);
        match self.resolver.load(&canonical) {
            Ok(import) => {
                tracing::debug!(import = %canonical, syntax = ?import.syntax, "loaded import");
                if !self.keep_loaded {
                    return Ok(import.contents.into_bytes());
                }
                let bytes = import.contents.clone().into_bytes();
                self.state.lock().loaded.push((canonical, import.contents));
                Ok(bytes)
            }
            Err(err) => {
                let message = err.to_string();
                self.record(err);
                Err(io::Error::other(message))
            }
        }
    }
}

/// Forwards `@debug` and `@warn` output to `tracing`.
#[derive(Debug)]
struct TracingLogger<'a> {
    /// Canonical URL reported for the entry stylesheet.
    entry: &'a str,
}

impl TracingLogger<'_> {
    fn describe(&self, location: &SpanLoc) -> String {
        let name = location.file.name();
        let file = if name == STRING_INPUT_NAME {
            self.entry
        } else {
            name
        };
        format!(
            "{file}:{}:{}",
            location.begin.line + 1,
            location.begin.column + 1
        )
    }
}

impl grass::Logger for TracingLogger<'_> {
    fn debug(&self, location: SpanLoc, message: &str) {
        tracing::debug!(location = %self.describe(&location), "{message}");
    }

    fn warn(&self, location: SpanLoc, message: &str) {
        tracing::warn!(location = %self.describe(&location), "{message}");
    }
}

/// Version 3 source map.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SourceMap<'a> {
    version: u8,
    sources: Vec<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    sources_content: Option<Vec<&'a str>>,
    names: Vec<&'a str>,
    /// grass does not track output positions, so no segments are emitted.
    mappings: &'a str,
}

fn render_source_map(request: &CompileRequest, loaded: &[(String, String)]) -> Result<String> {
    let mut sources = vec![(request.url.as_str(), request.source.as_str())];
    for (url, contents) in loaded {
        if !sources.iter().any(|(seen, _)| *seen == url.as_str()) {
            sources.push((url.as_str(), contents.as_str()));
        }
    }

    let map = SourceMap {
        version: 3,
        sources: sources.iter().map(|(url, _)| *url).collect(),
        sources_content: request
            .embed_sources
            .then(|| sources.iter().map(|(_, contents)| *contents).collect()),
        names: Vec::new(),
        mappings: "",
    };

    serde_json::to_string(&map).map_err(|e| GassError::Compile {
        message: format!("serializing source map: {e}"),
    })
}
