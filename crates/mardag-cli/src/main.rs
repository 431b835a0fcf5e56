//! mardag CLI - convert between marimo notebooks and dagster asset modules.

mod convert;
mod marimo_version;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "mardag")]
#[command(about = "Convert between marimo notebooks and dagster asset modules")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a marimo notebook to a dagster asset module
    ToDagster {
        /// Path to the marimo notebook
        input: String,

        /// Path of the dagster module to write
        output: String,
    },

    /// Convert a dagster asset module to a marimo notebook
    ToMarimo {
        /// Path to the dagster module
        input: String,

        /// Path of the marimo notebook to write
        output: String,

        /// marimo version to stamp (default: installed marimo, else 0.0.0)
        #[arg(long)]
        generated_with: Option<String>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        tracing_subscriber::EnvFilter::from_default_env()
            .add_directive(tracing::Level::DEBUG.into())
    } else {
        tracing_subscriber::EnvFilter::from_default_env().add_directive(tracing::Level::WARN.into())
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    // Helper to format mardag-core errors with recovery hints
    let format_error = |err: anyhow::Error| -> anyhow::Error {
        if let Some(core_err) = err.downcast_ref::<mardag_core::Error>() {
            anyhow::anyhow!("{}", core_err.with_hint())
        } else {
            err
        }
    };

    match cli.command {
        Commands::ToDagster { input, output } => {
            convert::to_dagster(&input, &output).map_err(format_error)?;
        }

        Commands::ToMarimo {
            input,
            output,
            generated_with,
        } => {
            convert::to_marimo(&input, &output, generated_with).map_err(format_error)?;
        }
    }

    Ok(())
}
