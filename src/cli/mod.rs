//! Command-line interface definitions.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// Token-based code clone detection.
#[derive(Debug, Parser)]
#[command(name = "doppel", version, about = "Find duplicated code (Type 1, 2, 3 clones)")]
pub struct Cli {
    /// Root path to analyze.
    #[arg(short = 'p', long, global = true, default_value = ".")]
    pub path: PathBuf,

    /// Output format.
    #[arg(short = 'f', long, global = true, value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Explicit config file (defaults to doppel.toml in the root path).
    #[arg(short = 'c', long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Text,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Analyze a corpus and report all clone pairs.
    Analyze(AnalyzeArgs),
    /// Compare exactly two files.
    Compare(CompareArgs),
    /// Rank files by how much of their content is duplicated.
    Hotspots(HotspotsArgs),
    /// Report clones touching one file.
    Clones(ClonesArgs),
    /// List the files that would be analyzed.
    Tree(TreeArgs),
    /// Run the persistent IPC server.
    Serve(ServeArgs),
}

#[derive(Debug, Args, Default)]
pub struct AnalyzeArgs {
    /// Only analyze files with these extensions (repeatable).
    #[arg(short = 'e', long = "ext")]
    pub extensions: Vec<String>,

    /// Minimum tokens for a reported clone region.
    #[arg(long)]
    pub min_tokens: Option<usize>,

    /// Minimum accepted Type-3 similarity (0.0 - 1.0).
    #[arg(long)]
    pub min_similarity: Option<f64>,

    /// Disable Type-3 (gapped) detection.
    #[arg(long)]
    pub no_type3: bool,

    /// Worker threads (0 = all cores).
    #[arg(short = 'j', long)]
    pub threads: Option<usize>,
}

#[derive(Debug, Args)]
pub struct CompareArgs {
    /// First file.
    pub file1: PathBuf,
    /// Second file.
    pub file2: PathBuf,

    /// Minimum accepted Type-3 similarity (0.0 - 1.0).
    #[arg(long)]
    pub min_similarity: Option<f64>,
}

#[derive(Debug, Args)]
pub struct HotspotsArgs {
    /// Only analyze files with these extensions (repeatable).
    #[arg(short = 'e', long = "ext")]
    pub extensions: Vec<String>,

    /// Number of hotspots to report.
    #[arg(short = 'n', long, default_value_t = 10)]
    pub limit: usize,
}

#[derive(Debug, Args)]
pub struct ClonesArgs {
    /// Target file.
    pub file: PathBuf,

    /// Only analyze files with these extensions (repeatable).
    #[arg(short = 'e', long = "ext")]
    pub extensions: Vec<String>,
}

#[derive(Debug, Args)]
pub struct TreeArgs {
    /// Only list files with these extensions (repeatable).
    #[arg(short = 'e', long = "ext")]
    pub extensions: Vec<String>,
}

#[derive(Debug, Args)]
pub struct ServeArgs {
    /// Socket path to bind (overrides config).
    #[arg(long)]
    pub socket: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_analyze() {
        let cli = Cli::try_parse_from(["doppel", "analyze", "--min-tokens", "40", "-e", "rs"])
            .unwrap();
        match cli.command {
            Command::Analyze(args) => {
                assert_eq!(args.min_tokens, Some(40));
                assert_eq!(args.extensions, vec!["rs"]);
                assert!(!args.no_type3);
            }
            _ => panic!("expected analyze"),
        }
    }

    #[test]
    fn test_parse_compare() {
        let cli = Cli::try_parse_from(["doppel", "compare", "a.rs", "b.rs"]).unwrap();
        match cli.command {
            Command::Compare(args) => {
                assert_eq!(args.file1, PathBuf::from("a.rs"));
                assert_eq!(args.file2, PathBuf::from("b.rs"));
            }
            _ => panic!("expected compare"),
        }
    }

    #[test]
    fn test_parse_serve_with_socket() {
        let cli =
            Cli::try_parse_from(["doppel", "serve", "--socket", "/tmp/test.sock"]).unwrap();
        match cli.command {
            Command::Serve(args) => {
                assert_eq!(args.socket, Some(PathBuf::from("/tmp/test.sock")));
            }
            _ => panic!("expected serve"),
        }
    }

    #[test]
    fn test_global_flags() {
        let cli = Cli::try_parse_from(["doppel", "-p", "/src", "-f", "json", "tree"]).unwrap();
        assert_eq!(cli.path, PathBuf::from("/src"));
        assert_eq!(cli.format, OutputFormat::Json);
    }
}
