/*!
Main binary for jpq.
*/

use anyhow::{Context, Result, anyhow};
use clap::{ArgAction, CommandFactory, Parser, Subcommand};
use clap_complete::generate;
use clap_verbosity_flag::Verbosity;
use memmap2::Mmap;
use serde_json::Value;
use std::fs::File;
use std::io::{self, IsTerminal, Read, stdout};
use std::path::{Path, PathBuf};

use jpq::{commands, query::compile, write_colored_result, write_result};

/// Run an RFC 9535 JSONPath query against a JSON document.
#[derive(Parser)]
#[command(
    name = "jpq",
    version,
    about,
    arg_required_else_help = true,
    long_about = None,
    disable_help_subcommand = true
)]
struct Args {
    /// Optional subcommands
    #[command(subcommand)]
    command: Option<Commands>,
    /// JSONPath query (e.g., "$.store.book[?@.price < 10].title")
    query: Option<String>,
    #[arg(value_name = "FILE")]
    /// Optional path to JSON file. If omitted, reads from STDIN
    input: Option<PathBuf>,
    /// Do not pretty-print the JSON output, instead use compact
    #[arg(long, action = ArgAction::SetTrue)]
    compact: bool,
    /// Colorize the JSON output
    #[arg(long, action = ArgAction::SetTrue)]
    color: bool,
    /// Display count of number of matches
    #[arg(long, action = ArgAction::SetTrue)]
    count: bool,
    /// Display the normalized query before the matches
    #[arg(long, action = ArgAction::SetTrue)]
    explain: bool,
    /// Do not display matched JSON values
    #[arg(short, long, action = ArgAction::SetTrue)]
    no_display: bool,
    #[command(flatten)]
    verbosity: Verbosity,
}

/// Available subcommands for `jpq`
#[derive(Subcommand)]
enum Commands {
    #[command(subcommand)]
    /// Generate additional documentation and/or completions
    Generate(GenerateCommand),
}

/// Generate shell completions and man page
#[derive(Subcommand)]
enum GenerateCommand {
    /// Generate shell completions for the given shell to stdout.
    Shell { shell: clap_complete::Shell },
    /// Generate a man page for jpq to output directory if specified, else
    /// the current directory.
    Man {
        /// The output directory to write the man pages.
        #[clap(short, long)]
        output_dir: Option<PathBuf>,
    },
}

/// Reads the whole document, memory-mapping regular files.
fn read_file(path: &Path) -> Result<Value> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open file {}", path.display()))?;
    let len = file
        .metadata()
        .with_context(|| format!("Failed to stat file {}", path.display()))?
        .len();
    if len == 0 {
        // Empty files cannot be mapped
        return serde_json::from_slice(b"").context("Failed to parse JSON");
    }
    // SAFETY: the mapping is read-only and dropped before returning; the
    // file is not expected to be truncated while jpq runs.
    let map = unsafe { Mmap::map(&file) }
        .with_context(|| format!("Failed to map file {}", path.display()))?;
    serde_json::from_slice(&map).context("Failed to parse JSON")
}

/// Entry point for main binary.
///
/// This parses the command line arguments, compiles the query and runs it
/// against the input document. If no file is given, the document is read from
/// STDIN. Matches are printed to STDOUT as one JSON array.
fn main() -> Result<()> {
    let args = Args::parse();

    env_logger::Builder::new()
        .filter_level(args.verbosity.log_level_filter())
        .init();

    match args.command {
        Some(Commands::Generate(cmd)) => match cmd {
            GenerateCommand::Shell { shell } => {
                let mut cmd = Args::command();
                generate(shell, &mut cmd, "jpq", &mut stdout().lock());
            }
            GenerateCommand::Man { output_dir } => {
                let pages = commands::generate::generate_man_pages(
                    &Args::command(),
                    output_dir.as_deref(),
                )?;
                for page in pages {
                    println!("Generated: {}", page.display());
                }
            }
        },
        None => {
            let text = args.query.as_deref().ok_or_else(|| {
                anyhow!("Query string required unless using subcommand")
            })?;
            let query = compile(text).map_err(|errors| {
                let messages: Vec<String> =
                    errors.iter().map(ToString::to_string).collect();
                anyhow!("Failed to parse query: {}", messages.join("; "))
            })?;

            let json: Value = if let Some(path) = &args.input {
                read_file(path)?
            } else {
                if io::stdin().is_terminal() {
                    // No piped input and no file specified
                    let mut cmd = Args::command();
                    return Ok(cmd.print_help()?);
                }
                let mut buffer = Vec::new();
                io::stdin()
                    .read_to_end(&mut buffer)
                    .context("Failed to read STDIN")?;
                serde_json::from_slice(&buffer)
                    .context("Failed to parse JSON")?
            };

            let results = query.execute(&json);
            log::info!("{} matched {} node(s)", query, results.len());

            if args.explain {
                println!("Query: {query}");
                println!("Depth: {}", query.query().depth());
            }

            if args.count {
                println!("Found matches: {}", results.len());
            }

            if !args.no_display {
                let mut out = stdout().lock();
                if args.color {
                    colored::control::set_override(true);
                    write_colored_result(&mut out, &results, !args.compact)?;
                } else {
                    write_result(&mut out, &results, !args.compact)?;
                }
            }
        }
    }

    Ok(())
}
