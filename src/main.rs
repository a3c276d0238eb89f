mod cli;
mod config;
mod engine;
mod error;
mod report;

use std::io::{IsTerminal, Write};

use anyhow::Result;
use clap::Parser;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use cli::Cli;
use config::OutputFormat;
use engine::Multiplexer;
use report::diagnostic::MergeTotals;
use report::terminal::RenderOptions;

fn main() -> Result<()> {
    // Parse CLI arguments; usage errors exit 1 like every other failure
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            e.print()?;
            std::process::exit(if e.use_stderr() { 1 } else { 0 });
        }
    };

    // Initialize logging; stdout carries results, so logs go to stderr
    let filter = if cli.verbose {
        EnvFilter::new("lintmux=debug")
    } else if cli.quiet {
        EnvFilter::new("lintmux=error")
    } else {
        EnvFilter::new("lintmux=warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    debug!("lintmux v{}", env!("CARGO_PKG_VERSION"));

    let mux = Multiplexer::new(&cli)?;
    let raw = mux.gather()?;

    let (output, totals) = if mux.is_passthrough(&cli) {
        info!("Passing {} raw results through", raw.len());
        (report::json::render_raw(&raw)?, MergeTotals::from_raw(&raw))
    } else {
        let merged = mux.merge(&raw)?;
        let output = match mux.options().format {
            OutputFormat::Merged => {
                let mut json = report::json::render_merged(&merged)?;
                json.push('\n');
                json
            }
            _ => {
                let options = RenderOptions {
                    show_source: mux.options().show_source,
                    color: use_colors(&cli),
                    cwd: std::env::current_dir().ok(),
                };
                report::terminal::render(&merged.files, &options)
            }
        };
        (output, merged.totals)
    };

    let mut stdout = std::io::stdout().lock();
    stdout.write_all(output.as_bytes())?;
    stdout.flush()?;

    // Exit code based on remaining problems
    if totals.problems() > 0 {
        std::process::exit(1);
    }

    Ok(())
}

fn use_colors(cli: &Cli) -> bool {
    !cli.no_color && std::env::var_os("NO_COLOR").is_none() && std::io::stdout().is_terminal()
}
