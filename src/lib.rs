pub mod cli;
pub mod config;
pub mod error;
pub mod model;
pub mod processor;
pub mod runtime;
pub mod source;
pub mod writer;

use std::fs::File;
use std::io::{self, BufWriter, Write};

use anyhow::Context;

use cli::Cli;
use config::Config;
use processor::{ParseContext, ParseOutcome};
use source::SearchPath;

pub fn run(args: &Cli) -> anyhow::Result<ParseOutcome> {
    // 1. ── Configure ──────────────────────────────────────────────────
    let config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    }
    .merge_cli(args);
    log::debug!("configuration: {config:?}");

    let mut search = SearchPath::new(config.include_dirs.clone());
    if config.env_include {
        for dir in source::env_include_dirs() {
            search.push(dir);
        }
    }

    // 2. ── Open output ────────────────────────────────────────────────
    let out: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("Creating {}", path.display()))?,
        )),
        None => Box::new(BufWriter::new(io::stdout())),
    };
    let backend = writer::make_backend(config.strategy, out);

    // 3. ── Parse and emit ─────────────────────────────────────────────
    let mut ctx = ParseContext::new(backend, search, config.endianness);
    ctx.parse_file(&args.input)
        .with_context(|| format!("Parsing {}", args.input.display()))?;
    let outcome = ctx.finish().with_context(|| "Writing output")?;

    log::info!(
        "{} structs, {} symbols, {} warnings",
        outcome.types.structs().count(),
        outcome.env.len(),
        outcome.diagnostics.len()
    );
    Ok(outcome)
}
