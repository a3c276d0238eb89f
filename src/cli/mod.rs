use clap::Parser;

/// lintmux: merge repeated lint results
///
/// Combines the JSON output of several lint runs and merges the results
/// for files that are considered the same.
#[derive(Parser, Debug, Default)]
#[command(
    name = "lintmux",
    version,
    about = "Combine multiple eslint results and merge results for common files",
    long_about = "lintmux reads ESLint JSON results from --input, from stdin and from an inline lint command,\nmerges diagnostics for files considered the same and prints them with occurrence counts.\n\nWhen stdout is not a terminal the raw results are passed through as JSON, so several\nlintmux invocations can be piped into each other. Use --nopipe to always merge.",
    after_help = "Examples:\n  lintmux -i '[...]'\n  eslint -f json src | lintmux -b\n  lintmux eslint src/a.js | lintmux eslint other/a.js | lintmux -b\n\nEnvironment (takes precedence over flags):\n  LINTMUX_INPUT, LINTMUX_FORMAT, LINTMUX_BASENAME, LINTMUX_MATCHER,\n  LINTMUX_THRESHOLD, LINTMUX_HIDE_BELOW_THRESHOLD, LINTMUX_SHOW_SOURCE"
)]
pub struct Cli {
    /// Use this stringified JSON as input
    #[arg(short, long, value_name = "JSON")]
    pub input: Option<String>,

    /// Output format: "stylish", "json" (raw passthrough) or "merged"
    #[arg(short, long)]
    pub format: Option<String>,

    /// Match similar file names by their basename
    #[arg(short, long)]
    pub basename: bool,

    /// A regex whose capture groups identify similar file names.
    /// An empty value (-m= or --matcher=) uses the basename regex
    #[arg(short, long, value_name = "REGEX")]
    pub matcher: Option<String>,

    /// Messages whose occurrence ratio is lower than this are dimmed (0 to 1)
    #[arg(short, long, value_name = "FLOAT")]
    pub threshold: Option<String>,

    /// Hide messages below the threshold
    #[arg(long = "hide", visible_alias = "hide-below-threshold")]
    pub hide_below_threshold: bool,

    /// Show the source lines around each message
    #[arg(short, long)]
    pub show_source: bool,

    /// Always merge and render, even when stdout is not a terminal
    #[arg(long)]
    pub nopipe: bool,

    /// Ignore .lintmux.toml config files
    #[arg(long)]
    pub no_config: bool,

    /// Disable colored output (NO_COLOR is honored too)
    #[arg(long)]
    pub no_color: bool,

    /// Enable verbose output (debug level)
    #[arg(short, long, visible_alias = "debug")]
    pub verbose: bool,

    /// Suppress all logging except errors
    #[arg(short, long)]
    pub quiet: bool,

    /// Lint command to run; "-f json" is appended to its arguments
    #[arg(
        value_name = "COMMAND",
        trailing_var_arg = true,
        allow_hyphen_values = true
    )]
    pub command: Vec<String>,
}
