//! Doppel CLI - token-based code clone detection.

use std::io::stdout;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use doppel::cli::{Cli, Command, OutputFormat};
use doppel::config::Config;
use doppel::core::FileSet;
use doppel::engine::{Engine, Options, TokenCache};
use doppel::output::Format;
use doppel::server::Server;

fn main() -> ExitCode {
    // Logs go to stderr; stdout carries report output only.
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let config = match &cli.config {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => Config::load_default(&cli.path)?,
    };

    let format = match cli.format {
        OutputFormat::Json => Format::Json,
        OutputFormat::Text => Format::Text,
    };

    let engine = Engine::with_cache(TokenCache::new(config.cache.capacity));
    let out = stdout();

    match cli.command {
        Command::Analyze(ref args) => {
            let mut options = config.engine.to_options();
            apply_overrides(
                &mut options,
                args.min_tokens,
                args.min_similarity,
                args.no_type3,
                args.threads,
            );
            let set = file_set(&cli, &config, &args.extensions)?;
            let report = engine.analyze(&set, &options)?;
            format.write_report(&report, &mut out.lock())?;
        }
        Command::Compare(args) => {
            let mut options = config.engine.to_options();
            apply_overrides(&mut options, None, args.min_similarity, false, None);
            let report = engine.compare_files(&args.file1, &args.file2, &options)?;
            format.write_report(&report, &mut out.lock())?;
        }
        Command::Hotspots(ref args) => {
            let options = config.engine.to_options();
            let set = file_set(&cli, &config, &args.extensions)?;
            let report = engine.hotspots(&set, &options, args.limit)?;
            match format {
                Format::Json => format.write_value(&report.hotspots, &mut out.lock())?,
                Format::Text => {
                    for h in &report.hotspots {
                        println!(
                            "{:.1}%  {} ({} clones)",
                            h.duplication_score * 100.0,
                            h.file,
                            h.clone_count
                        );
                    }
                }
            }
        }
        Command::Clones(ref args) => {
            let options = config.engine.to_options();
            let set = file_set(&cli, &config, &args.extensions)?;
            let report = engine.file_clones(&set, &args.file, &options)?;
            format.write_report(&report, &mut out.lock())?;
        }
        Command::Tree(ref args) => {
            let set = file_set(&cli, &config, &args.extensions)?;
            match format {
                Format::Json => {
                    let paths: Vec<String> = set
                        .iter()
                        .map(|p| p.to_string_lossy().into_owned())
                        .collect();
                    format.write_value(&paths, &mut out.lock())?;
                }
                Format::Text => {
                    for path in &set {
                        println!("{}", path.display());
                    }
                }
            }
        }
        Command::Serve(args) => {
            Server::new(config, args.socket).run()?;
        }
    }

    Ok(())
}

fn file_set(cli: &Cli, config: &Config, extensions: &[String]) -> anyhow::Result<FileSet> {
    FileSet::from_path_filtered(&cli.path, extensions, &config.exclude_patterns)
        .with_context(|| format!("collecting files under {}", cli.path.display()))
}

fn apply_overrides(
    options: &mut Options,
    min_tokens: Option<usize>,
    min_similarity: Option<f64>,
    no_type3: bool,
    threads: Option<usize>,
) {
    if let Some(min_tokens) = min_tokens {
        options.min_tokens = min_tokens;
    }
    if let Some(min_similarity) = min_similarity {
        options.min_similarity = min_similarity;
    }
    if no_type3 {
        options.type3 = false;
    }
    if let Some(threads) = threads {
        options.threads = threads;
    }
}
