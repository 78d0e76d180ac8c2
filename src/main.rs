/*!
Main binary for jsonmatch.
*/

use anyhow::{Context, Result};
use clap::{ArgAction, CommandFactory, Parser, Subcommand};
use clap_complete::generate;
use std::io::stdout;
use std::io::{self};
use std::{
    fs::{self},
    io::{IsTerminal, Read},
    path::PathBuf,
};

use jsonmatch::{value::Value, Predicate};

/// Filter JSON documents with a MongoDB-style query.
#[derive(Parser)]
#[command(name = "jm", version, about, arg_required_else_help = true, long_about = None, disable_help_subcommand = true)]
struct Args {
    /// Optional subcommands
    #[command(subcommand)]
    command: Option<Commands>,
    /// Query document as JSON (e.g., '{"age": {"$gte": 21}}')
    query: Option<String>,
    #[arg(value_name = "FILE")]
    /// Optional path to JSON file. If omitted, reads from STDIN. A
    /// top-level array is filtered element by element; any other
    /// document is printed only when it matches.
    input: Option<PathBuf>,
    /// Do not pretty-print the JSON output, instead use compact
    #[arg(long, action = ArgAction::SetTrue)]
    compact: bool,
    /// Display count of number of matches
    #[arg(long, action = ArgAction::SetTrue)]
    count: bool,
    /// Validate the query before matching and fail on structural errors
    #[arg(long, action = ArgAction::SetTrue)]
    check: bool,
    /// Display depth of the input document
    #[arg(long, action = ArgAction::SetTrue)]
    depth: bool,
    /// Do not display matched JSON documents
    #[arg(short, long, action = ArgAction::SetTrue)]
    no_display: bool,
}

/// Available subcommands for `jm`
#[derive(Subcommand)]
enum Commands {
    #[command(subcommand)]
    /// Generate shell completions
    Generate(GenerateCommand),
}

/// Generate shell completions
#[derive(Subcommand)]
enum GenerateCommand {
    /// Generate shell completions for the given shell to stdout.
    Shell { shell: clap_complete::Shell },
}

/// Entry point for main binary.
///
/// This parses the command line arguments, compiles the query, and
/// filters the input documents. If the input is piped in, it reads
/// from STDIN. The output is printed to STDOUT, with formatting
/// determined by the command line arguments.
fn main() -> Result<()> {
    let args = Args::parse();

    match args.command {
        Some(Commands::Generate(cmd)) => match cmd {
            GenerateCommand::Shell { shell } => {
                let mut cmd = Args::command();
                generate(shell, &mut cmd, "jm", &mut stdout().lock());
            }
        },
        None => {
            // Parse query
            let query_text = args.query.ok_or_else(|| {
                anyhow::anyhow!("Query required unless using subcommand")
            })?;
            let query: Value = query_text
                .as_str()
                .try_into()
                .with_context(|| "Failed to parse query as JSON")?;

            let pred = Predicate::new(query);
            if args.check {
                pred.validate()
                    .map_err(|err| anyhow::anyhow!(err))
                    .with_context(|| "Invalid query")?;
            }

            // Parse input content
            let input_content = if let Some(path) = args.input {
                fs::read_to_string(&path)
                    .with_context(|| format!("Failed to read file {path:?}"))?
            } else {
                if io::stdin().is_terminal() {
                    // No piped input and no file specified
                    let mut cmd = Args::command();
                    return Ok(cmd.print_help()?);
                }
                let mut buffer = String::new();
                io::stdin().read_to_string(&mut buffer)?;
                buffer
            };
            let input: Value = input_content
                .as_str()
                .try_into()
                .with_context(|| "Failed to parse input as JSON")?;

            // Display depth before filtering
            if args.depth {
                println!("Depth: {}", input.depth());
            }

            // Filter
            let matched: Vec<&Value> = match &input {
                Value::Array(docs) => docs.iter().filter(|doc| pred.test(doc)).collect(),
                single => pred.test(single).then_some(single).into_iter().collect(),
            };

            if args.count {
                println!("Matched: {}", matched.len());
            }

            if !args.no_display {
                let mut out = stdout().lock();
                for doc in matched {
                    jsonmatch::utils::write_colored_doc(&mut out, doc, !args.compact)?;
                }
            }
        }
    }

    Ok(())
}
