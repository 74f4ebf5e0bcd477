//! laf CLI: labeled argumentation framework engine.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use miette::{IntoDiagnostic, Result};

use laf::program::Program;

#[derive(Parser)]
#[command(name = "laf", version, about = "Labeled argumentation framework engine")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run inference over a program and emit the argumentation graph as JSON.
    Build {
        /// Path to the program file (.json or .toml).
        program: PathBuf,

        /// Write the graph to a file instead of stdout.
        #[arg(long)]
        output: Option<PathBuf>,

        /// Pretty-print the JSON output.
        #[arg(long)]
        pretty: bool,

        /// Abort if inference has not converged within this many passes.
        #[arg(long)]
        max_passes: Option<usize>,
    },

    /// Validate a program file without running inference.
    Check {
        /// Path to the program file (.json or .toml).
        program: PathBuf,
    },
}

fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(3)
                .build(),
        )
    }))
    .ok(); // Ignore error if hook already set (e.g., in tests)

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Build {
            program,
            output,
            pretty,
            max_passes,
        } => {
            let program = Program::from_path(&program)?;
            let graph = program.build_with(&laf::algebra::eval::ExprEval, max_passes)?;
            let json = if pretty {
                serde_json::to_string_pretty(&graph).into_diagnostic()?
            } else {
                serde_json::to_string(&graph).into_diagnostic()?
            };
            match output {
                Some(path) => {
                    std::fs::write(&path, json).into_diagnostic()?;
                    println!(
                        "Wrote {} node(s), {} edge(s) to {}",
                        graph.nodes.len(),
                        graph.edges.len(),
                        path.display()
                    );
                }
                None => println!("{json}"),
            }
        }

        Commands::Check { program } => {
            let path = program.clone();
            Program::from_path(&program)?.validate()?;
            println!("{} is valid", path.display());
        }
    }

    Ok(())
}
