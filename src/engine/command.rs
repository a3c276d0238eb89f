use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use tracing::{debug, warn};

use crate::error::MuxError;

/// Extra arguments that make the lint tool emit machine-readable results
const JSON_FORMAT_ARGS: [&str; 2] = ["-f", "json"];

/// A lint command given after the options, e.g. `lintmux eslint src`
#[derive(Debug, Clone)]
pub struct LintCommand {
    program: PathBuf,
    args: Vec<String>,
    display: String,
}

impl LintCommand {
    /// Build the command from trailing CLI arguments. Returns `None` when there are none.
    ///
    /// The program name is looked up in the local `node_modules` first, then in
    /// `cwd`, and finally left to `PATH`. JavaScript entry points run through `node`.
    pub fn resolve(argv: &[String], cwd: &Path) -> Option<Self> {
        let (name, rest) = argv.split_first()?;
        let resolved = resolve_program(name, cwd);

        let mut args = Vec::with_capacity(rest.len() + 3);
        let program = if resolved.extension().is_some_and(|e| e == "js") {
            args.push(resolved.to_string_lossy().into_owned());
            PathBuf::from("node")
        } else {
            resolved
        };
        args.extend(rest.iter().cloned());
        args.extend(JSON_FORMAT_ARGS.iter().map(|a| a.to_string()));

        Some(LintCommand {
            program,
            args,
            display: argv.join(" "),
        })
    }

    pub fn display(&self) -> &str {
        &self.display
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Run the command and capture its stdout. Stderr goes to ours.
    ///
    /// A non-zero exit is expected (linters exit 1 when they report problems)
    /// and is not an error by itself.
    pub fn run(&self) -> Result<String, MuxError> {
        debug!("Running {} {}", self.program().display(), self.args().join(" "));

        let output = Command::new(self.program())
            .args(self.args())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .output()
            .map_err(|source| MuxError::CommandSpawn {
                command: self.display.clone(),
                source,
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        if !output.status.success() && stdout.trim().is_empty() {
            warn!("'{}' exited with {} and produced no output", self.display, output.status);
        } else {
            debug!("'{}' exited with {}", self.display, output.status);
        }

        Ok(stdout)
    }
}

/// Locate a lint executable the way npm-installed tools are laid out
fn resolve_program(name: &str, cwd: &Path) -> PathBuf {
    let modules = cwd.join("node_modules");
    let candidates = [
        modules.join(name).join("bin").join(format!("{name}.js")),
        modules.join(name).join("bin").join(name),
        modules.join(".bin").join(name),
        cwd.join(name),
    ];

    candidates
        .into_iter()
        .find(|p| p.is_file())
        .unwrap_or_else(|| PathBuf::from(name))
}
