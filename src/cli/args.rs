use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::common::config;

/// SpaceSweep: find what is eating your disk and reclaim build artifacts
#[derive(Parser, Debug)]
#[command(
    name = "spacesweep",
    version,
    about = "Find the biggest space hogs and reclaimable build artifacts",
    long_about = "SpaceSweep walks a directory tree, finds dependency folders, build caches,\n\
                   trash and logs, groups them by what they are and ranks them by size.\n\
                   Cleaning asks before every category and reports what was actually freed.",
    after_help = "EXAMPLES:\n  \
        spacesweep analyze                        Rank artifacts under your home directory\n  \
        spacesweep analyze ~/code --limit 20      Top 20 artifact groups under ~/code\n  \
        spacesweep analyze / --largest            Largest top-level entries\n  \
        spacesweep clean --dry-run                Show what would be freed\n  \
        spacesweep clean ~/code --per-group       Confirm each group separately\n  \
        sudo spacesweep clean --elevated          Include system caches\n  \
        spacesweep analyze --format json          Machine-readable output\n  \
        spacesweep patterns                       List the artifact catalog"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output format (defaults to the configured one)
    #[arg(long, global = true)]
    pub format: Option<OutputFormat>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Verbose output
    #[arg(long, short, global = true)]
    pub verbose: bool,

    /// Quiet mode, minimal output
    #[arg(long, short, global = true)]
    pub quiet: bool,

    /// Append an action log to FILE (default: ~/.spacesweep/logs/spacesweep.log)
    #[arg(long, global = true, value_name = "FILE", num_args = 0..=1)]
    pub log: Option<Option<PathBuf>>,

    /// Use this config file instead of ~/.spacesweep/config.toml
    #[arg(long, global = true, value_name = "FILE", env = "SPACESWEEP_CONFIG")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Scan and rank reclaimable artifacts
    Analyze {
        /// Directory to analyze (default: home, or / with --elevated)
        root: Option<PathBuf>,

        /// How many ranked entries to show (clamped to 10..=500)
        #[arg(long, short = 'n')]
        limit: Option<usize>,

        /// Rank the largest entries below the root instead of artifacts
        #[arg(long)]
        largest: bool,

        /// Depth for --largest
        #[arg(long, default_value = "1", requires = "largest")]
        depth: usize,

        /// Include system-wide locations (needs root privileges)
        #[arg(long)]
        elevated: bool,
    },

    /// Delete artifacts after confirmation
    Clean {
        /// Directory to clean (default: home, or / with --elevated)
        root: Option<PathBuf>,

        /// Report what would be freed without deleting anything
        #[arg(long)]
        dry_run: bool,

        /// Skip confirmation prompts
        #[arg(long, short = 'y')]
        yes: bool,

        /// Confirm each artifact group instead of each category
        #[arg(long)]
        per_group: bool,

        /// Include system-wide locations (needs root privileges)
        #[arg(long)]
        elevated: bool,
    },

    /// List the artifact catalog
    Patterns {
        /// Include patterns that need --elevated
        #[arg(long)]
        all: bool,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: CompletionShell,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Print the config file path
    Path,

    /// Reset to default configuration
    Reset,

    /// Set a configuration value
    Set {
        /// Configuration key
        key: String,
        /// Configuration value
        value: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, ValueEnum)]
pub enum OutputFormat {
    Human,
    Json,
    Quiet,
}

impl From<&config::OutputFormat> for OutputFormat {
    fn from(format: &config::OutputFormat) -> Self {
        match format {
            config::OutputFormat::Human => OutputFormat::Human,
            config::OutputFormat::Json => OutputFormat::Json,
            config::OutputFormat::Quiet => OutputFormat::Quiet,
        }
    }
}

#[derive(Debug, Clone, ValueEnum)]
pub enum CompletionShell {
    Bash,
    Zsh,
    Fish,
}

impl Cli {
    /// Resolve `--log` into a file path: bare `--log` means the default location
    pub fn log_path(&self) -> Option<PathBuf> {
        self.log
            .as_ref()
            .map(|p| p.clone().unwrap_or_else(config::Config::default_log_path))
    }

    pub fn config_path(&self) -> PathBuf {
        self.config
            .clone()
            .unwrap_or_else(config::Config::config_path)
    }
}
