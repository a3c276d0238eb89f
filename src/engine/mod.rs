pub mod command;
pub mod input;

use std::io::{IsTerminal, Read};

use anyhow::Result;
use tracing::{debug, info};

use crate::cli::Cli;
use crate::config::{LintmuxConfig, MuxOptions, OutputFormat};
use crate::error::MuxError;
use crate::report::diagnostic::{MergeReport, MergeTotals, RawFileResult};
use crate::report::merger;

use command::LintCommand;
use input::{parse_results, InputSource};

/// Orchestrates input gathering and the merge pass.
pub struct Multiplexer {
    /// Resolved options
    options: MuxOptions,
    /// Inline lint command to run, if any
    command: Option<LintCommand>,
    /// Stdin is a pipe or file rather than a terminal
    read_stdin: bool,
}

impl Multiplexer {
    pub fn new(cli: &Cli) -> Result<Self> {
        let cwd = std::env::current_dir()?;

        // Load optional config
        let config = if cli.no_config {
            None
        } else {
            LintmuxConfig::load(&cwd)
        };

        let options = MuxOptions::resolve(cli, config.as_ref(), |k| std::env::var(k).ok())?;
        let command = LintCommand::resolve(&cli.command, &cwd);
        if let Some(ref cmd) = command {
            info!("Lint command: {}", cmd.display());
        }

        Ok(Multiplexer {
            options,
            command,
            read_stdin: !std::io::stdin().is_terminal(),
        })
    }

    pub fn options(&self) -> &MuxOptions {
        &self.options
    }

    /// Raw JSON passthrough instead of merging: requested explicitly, or
    /// stylish output would go to another process and --nopipe was not given.
    pub fn is_passthrough(&self, cli: &Cli) -> bool {
        match self.options.format {
            OutputFormat::Json => true,
            OutputFormat::Stylish => !cli.nopipe && !std::io::stdout().is_terminal(),
            OutputFormat::Merged => false,
        }
    }

    /// Collect raw results from every source: --input, then stdin, then the command.
    ///
    /// Stdin and the command are read concurrently; nothing is merged until
    /// all of them are complete.
    pub fn gather(&self) -> Result<Vec<RawFileResult>> {
        let mut results = Vec::new();

        if let Some(ref text) = self.options.input {
            let batch = parse_results(text, &InputSource::Inline)?;
            debug!("{} results from --input", batch.len());
            results.extend(batch);
        }

        let (stdin, command) = rayon::join(|| self.read_stdin(), || self.run_command());

        for (source, text) in [stdin?, command?].into_iter().flatten() {
            let batch = parse_results(&text, &source)?;
            debug!("{} results from {}", batch.len(), source);
            results.extend(batch);
        }

        info!("Collected {} raw results", results.len());
        Ok(results)
    }

    fn read_stdin(&self) -> Result<Option<(InputSource, String)>, MuxError> {
        if !self.read_stdin {
            return Ok(None);
        }
        let mut text = String::new();
        std::io::stdin().read_to_string(&mut text)?;
        Ok(Some((InputSource::Stdin, text)))
    }

    fn run_command(&self) -> Result<Option<(InputSource, String)>, MuxError> {
        match self.command {
            Some(ref cmd) => {
                let text = cmd.run()?;
                Ok(Some((InputSource::Command(cmd.display().to_string()), text)))
            }
            None => Ok(None),
        }
    }

    /// Merge raw results into a report
    pub fn merge(&self, raw: &[RawFileResult]) -> Result<MergeReport> {
        let files = merger::merge_results(raw, &self.options.merge)?;
        let totals = MergeTotals::from_records(&files);

        for file in &files {
            debug!(
                "{} ({}x): {} diagnostics, {} problems",
                file.file_path,
                file.occurrence,
                file.messages.len(),
                file.problem_count()
            );
        }

        info!(
            "Merged {} results into {} files: {} errors, {} warnings",
            raw.len(),
            totals.files,
            totals.errors,
            totals.warnings
        );

        Ok(MergeReport {
            version: env!("CARGO_PKG_VERSION").to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            inputs: raw.len(),
            totals,
            files,
        })
    }
}
