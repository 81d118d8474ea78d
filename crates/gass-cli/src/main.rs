//! gass CLI - Main entry point

use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use gass::{DEFAULT_MANIFEST, OutputStyle, SessionOptions, TranspileOptions, Transpiler};

#[derive(Parser, Debug)]
#[command(name = "gass")]
#[command(version)]
#[command(about = "Transpile the Sass sources listed in a Gassfile to CSS", long_about = None)]
struct Cli {
    /// Path to the Gassfile to use for transpilation ('-' reads standard input)
    #[arg(short = 'f', long = "file", default_value = DEFAULT_MANIFEST)]
    gassfile: PathBuf,

    /// Run in debug mode
    #[arg(short = 'd', long)]
    debug: bool,

    /// Compress CSS output
    #[arg(short = 'c', long)]
    compressed: bool,

    /// Generate source maps
    #[arg(short = 'm', long, default_value_t = true, action = ArgAction::Set)]
    source_maps: bool,

    /// Embed sources into source maps
    #[arg(short = 'e', long)]
    embed_sources: bool,

    /// Maximum number of seconds allotted to each transpilation (0 uses the default)
    #[arg(short = 't', long, default_value_t = 30)]
    timeout: u64,

    /// Silence @warn and @debug output from stylesheets
    #[arg(short = 'q', long)]
    quiet: bool,
}

impl Cli {
    fn session_options(&self) -> SessionOptions {
        SessionOptions {
            timeout: Duration::from_secs(self.timeout),
            quiet: self.quiet,
        }
    }

    fn transpile_options(&self) -> TranspileOptions {
        TranspileOptions {
            style: if self.compressed {
                OutputStyle::Compressed
            } else {
                OutputStyle::Expanded
            },
            source_maps: self.source_maps,
            embed_sources: self.embed_sources,
            syntax: None,
        }
    }

    fn reads_stdin(&self) -> bool {
        self.gassfile.as_os_str() == "-"
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging
    let default_filter = if cli.debug { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %format!("{err:#}"), "error transpiling sources");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    let mut transpiler =
        Transpiler::start(cli.session_options()).context("error creating new transpiler")?;
    tracing::debug!("created new transpiler");

    let options = cli.transpile_options();
    tracing::debug!(?options, "preparing to transpile");

    let result = if cli.reads_stdin() {
        transpiler.transpile_from_reader(io::stdin().lock(), &options)
    } else {
        transpiler.transpile(&cli.gassfile, &options)
    };

    // Close the session on every path; the transpile error takes precedence.
    let closed = transpiler.close();
    result.context("transpiling sources")?;
    closed.context("closing transpiler")?;
    Ok(())
}
