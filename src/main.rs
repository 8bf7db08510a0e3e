// src/main.rs
use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use huffpack::{CodeTable, logger, serialize};
use serde::Serialize;

#[derive(Parser)]
#[command(name = "huffpack", version = "0.1.0")]
#[command(about = "Static Huffman compression with a separate tree file.", long_about = None)]
struct Cli {
    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Print the run report as JSON on stdout
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compress INPUT into a packed stream and a tree file
    Encode {
        input: PathBuf,
        output: PathBuf,
        tree: PathBuf,
    },
    /// Rebuild the original bytes from a packed stream and its tree file
    Decode {
        input: PathBuf,
        output: PathBuf,
        tree: PathBuf,
    },
    /// Print the code of every symbol in a tree file
    Codes { tree: PathBuf },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    if let Err(e) = logger::init(cli.verbose) {
        eprintln!("huffpack: {e}");
        return ExitCode::FAILURE;
    }

    let span = tracing::info_span!("command_execution", command = ?std::env::args().collect::<Vec<_>>());
    let _enter = span.enter();

    let result = match &cli.command {
        Commands::Encode { input, output, tree } => {
            huffpack::encode_file(input, output, tree).and_then(|r| print_report(&r, cli.json))
        }
        Commands::Decode { input, output, tree } => {
            huffpack::decode_file(input, output, tree).and_then(|r| print_report(&r, cli.json))
        }
        Commands::Codes { tree } => print_codes(tree),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "command failed");
            eprintln!("huffpack: {e}");
            ExitCode::FAILURE
        }
    }
}

fn print_report<R: Serialize + std::fmt::Display>(report: &R, json: bool) -> huffpack::Result<()> {
    if json {
        let line = serde_json::to_string(report).map_err(std::io::Error::other)?;
        println!("{line}");
    } else {
        println!("{report}");
    }
    Ok(())
}

fn print_codes(path: &Path) -> huffpack::Result<()> {
    let root = serialize::read_tree(File::open(path)?)?;
    let codes = CodeTable::from_tree(&root);
    for (symbol, code) in codes.iter() {
        println!("{symbol}\t{code}");
    }
    Ok(())
}
