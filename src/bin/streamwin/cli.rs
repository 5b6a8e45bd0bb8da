use clap::{Args, Parser, Subcommand, ValueEnum};
use stream_window::{FeatureSelector, TargetSource};

#[derive(Parser)]
#[command(
    name = "streamwin",
    version,
    about = "Sliding-window streaming for sequence forecasting",
    long_about = "Stream observations (JSON lines, JSON array, CSV or stdin) into sliding\n\
                  (input, target) windows with configurable history, horizon and shift."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
}

#[derive(Subcommand)]
pub enum Command {
    /// Window one data file (or stdin with `-`)
    Window(WindowArgs),
    /// Window many files in parallel
    Batch(BatchArgs),
    /// Show the effective configuration
    Config(ConfigArgs),
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum TargetSourceArg {
    Features,
    Label,
}

impl From<TargetSourceArg> for TargetSource {
    fn from(arg: TargetSourceArg) -> Self {
        match arg {
            TargetSourceArg::Features => TargetSource::Features,
            TargetSourceArg::Label => TargetSource::Label,
        }
    }
}

/// Window and pacing overrides layered over the config file
#[derive(Args, Clone, Default)]
pub struct StreamOptions {
    /// JSON config file (default: the user config dir, if present)
    #[arg(long, env = "STREAMWIN_CONFIG")]
    pub config: Option<String>,

    /// Steps per input window
    #[arg(long)]
    pub past_history: Option<usize>,

    /// Steps per target window
    #[arg(long)]
    pub horizon: Option<usize>,

    /// Observations between input-window completion and target start
    #[arg(long)]
    pub shift: Option<usize>,

    /// Input columns: `all`, an index, or a comma list (e.g. `0,2`)
    #[arg(long)]
    pub input_idx: Option<FeatureSelector>,

    /// Target columns: `all`, an index, or a comma list
    #[arg(long)]
    pub target_idx: Option<FeatureSelector>,

    /// Take targets from the observation features or its label
    #[arg(long, value_enum)]
    pub target_source: Option<TargetSourceArg>,

    /// Minimum milliseconds between observations
    #[arg(long)]
    pub stream_period: Option<u64>,

    /// Milliseconds without data before a live stream is considered stalled
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Cap on items read from a live stream
    #[arg(long)]
    pub n_instances: Option<usize>,
}

#[derive(Args)]
pub struct WindowArgs {
    /// Input file (jsonl, ndjson, json, csv, txt) or `-` for JSON lines on stdin
    #[arg(long)]
    pub file: String,

    #[command(flatten)]
    pub options: StreamOptions,

    /// Write a JSON run document here instead of JSON lines on stdout
    #[arg(short, long)]
    pub output: Option<String>,

    /// Compact JSON for the run document
    #[arg(long, default_value_t = false)]
    pub compact: bool,

    /// Suppress progress messages on stderr
    #[arg(long, default_value_t = false)]
    pub quiet: bool,
}

#[derive(Args)]
pub struct BatchArgs {
    /// Glob pattern selecting input files
    #[arg(long, conflicts_with = "files")]
    pub glob: Option<String>,

    /// Explicit input files
    #[arg(long, num_args = 1..)]
    pub files: Option<Vec<String>>,

    #[command(flatten)]
    pub options: StreamOptions,

    /// Directory for `<stem>_windows.json` outputs (default: summary only)
    #[arg(long)]
    pub output_dir: Option<String>,

    /// Keep processing remaining files after a failure
    #[arg(long, default_value_t = false)]
    pub continue_on_error: bool,

    /// List the matched files and exit
    #[arg(long, default_value_t = false)]
    pub dry_run: bool,

    /// Compact JSON output
    #[arg(long, default_value_t = false)]
    pub compact: bool,

    /// Suppress progress messages on stderr
    #[arg(long, default_value_t = false)]
    pub quiet: bool,
}

#[derive(Args)]
pub struct ConfigArgs {
    /// JSON config file to inspect
    #[arg(long, env = "STREAMWIN_CONFIG")]
    pub config: Option<String>,

    /// Output as JSON only
    #[arg(long, default_value_t = false)]
    pub json: bool,
}
