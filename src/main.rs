use anyhow::Result;
use clap::Parser;
use colored::Colorize;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use spacesweep::cleaner::{self, CleanupOptions, ConfirmationGate, DeletionExecutor};
use spacesweep::cli::args::{Cli, Commands, CompletionShell, ConfigAction, OutputFormat};
use spacesweep::cli::output;
use spacesweep::common::config::Config;
use spacesweep::logging;
use spacesweep::progress;
use spacesweep::scanner::{self, largest, patterns};

fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.no_color {
        colored::control::set_override(false);
    }

    // held until exit so the action log is flushed
    let _log_guard = logging::init(cli.verbose, cli.log_path().as_deref())?;

    let cancel = install_interrupt_handler();

    match cli.command {
        Commands::Analyze {
            ref root,
            limit,
            largest,
            depth,
            elevated,
        } => cmd_analyze(&cli, root.clone(), limit, largest, depth, elevated, cancel),

        Commands::Clean {
            ref root,
            dry_run,
            yes,
            per_group,
            elevated,
        } => cmd_clean(&cli, root.clone(), dry_run, yes, per_group, elevated, cancel),

        Commands::Patterns { all } => cmd_patterns(&cli, all),

        Commands::Config { ref action } => cmd_config(&cli, action),

        Commands::Completions { ref shell } => {
            use clap::CommandFactory;
            let mut cmd = Cli::command();
            let shell = match shell {
                CompletionShell::Bash => clap_complete::Shell::Bash,
                CompletionShell::Zsh => clap_complete::Shell::Zsh,
                CompletionShell::Fish => clap_complete::Shell::Fish,
            };
            clap_complete::generate(shell, &mut cmd, "spacesweep", &mut std::io::stdout());
            Ok(())
        }
    }
}

/// First Ctrl-C asks the scan or cleanup to stop at the next safe point; a
/// second one exits immediately.
fn install_interrupt_handler() -> Arc<AtomicBool> {
    let cancel = Arc::new(AtomicBool::new(false));
    let flag = cancel.clone();
    let installed = ctrlc::set_handler(move || {
        if flag.swap(true, Ordering::SeqCst) {
            std::process::exit(130);
        }
        eprintln!();
        eprintln!("{}", "Cancellation requested...".yellow().bold());
        eprintln!("{}", "Stopping at the next safe point (Ctrl-C again to abort)".dimmed());
    });
    if let Err(e) = installed {
        tracing::debug!(error = %e, "could not install Ctrl-C handler");
    }
    cancel
}

fn load_config(cli: &Cli) -> Result<Config> {
    Config::load_from(&cli.config_path())
}

/// `--quiet` wins, then `--format`, then the configured default
fn output_format(cli: &Cli, config: &Config) -> OutputFormat {
    if cli.quiet {
        return OutputFormat::Quiet;
    }
    cli.format
        .unwrap_or_else(|| OutputFormat::from(&config.output_format))
}

// ─── Analyze ──────────────────────────────────────────────────────────────────

fn cmd_analyze(
    cli: &Cli,
    root: Option<PathBuf>,
    limit: Option<usize>,
    largest: bool,
    depth: usize,
    elevated: bool,
    cancel: Arc<AtomicBool>,
) -> Result<()> {
    let config = load_config(cli)?;
    let format = output_format(cli, &config);
    let root = scanner::resolve_root(root.as_deref(), elevated)?;
    let limit = limit.unwrap_or(config.display_limit);
    let show_progress = format == OutputFormat::Human;

    if largest {
        let walk_root = root.clone();
        let report = progress::run_with_progress(
            "Measuring entries...",
            show_progress,
            cancel,
            move |_| largest::find_largest(&walk_root, depth, limit),
        )?;
        match format {
            OutputFormat::Human => output::print_largest(&root, &report),
            OutputFormat::Json => output::print_json(&report),
            OutputFormat::Quiet => output::print_ranked_quiet(&report.entries),
        }
        return Ok(());
    }

    let catalog = patterns::catalog_with(&config.extra_patterns);
    let options = scanner::options_from_config(&config, elevated, Some(cancel));
    let results = scanner::run_scan(&root, &catalog, options, show_progress)?;
    let entries = results.ranked(limit);

    match format {
        OutputFormat::Human => output::print_ranked(&results, &entries),
        OutputFormat::Json => output::print_json(&output::AnalyzeReport::new(&results, &entries)),
        OutputFormat::Quiet => output::print_ranked_quiet(&entries),
    }

    Ok(())
}

// ─── Clean ────────────────────────────────────────────────────────────────────

fn cmd_clean(
    cli: &Cli,
    root: Option<PathBuf>,
    dry_run: bool,
    yes: bool,
    per_group: bool,
    elevated: bool,
    cancel: Arc<AtomicBool>,
) -> Result<()> {
    let config = load_config(cli)?;
    let format = output_format(cli, &config);
    let root = scanner::resolve_root(root.as_deref(), elevated)?;
    let show_progress = format == OutputFormat::Human;

    // prompts would corrupt machine-readable output
    if format != OutputFormat::Human && !yes && !dry_run {
        anyhow::bail!("Cleaning with --format json or --quiet needs --yes (or --dry-run)");
    }
    let assume_yes = yes || format != OutputFormat::Human;

    let catalog = patterns::catalog_with(&config.extra_patterns);
    let options = scanner::options_from_config(&config, elevated, Some(cancel.clone()));
    let results = scanner::run_scan(&root, &catalog, options, show_progress)?;

    tracing::info!(
        target: "spacesweep::audit",
        root = %root.display(),
        dry_run,
        elevated,
        matches = results.records.len(),
        total_kb = results.total_kb,
        "cleanup started"
    );

    if format == OutputFormat::Human && !results.is_clean() {
        output::print_ranked(&results, &results.ranked(config.display_limit));
    }

    let executor = DeletionExecutor::new(&root, dry_run).with_cancel(cancel);
    let mut gate = ConfirmationGate::stdio(dry_run, assume_yes);
    let options = CleanupOptions {
        per_group,
        preview_items: config.preview_items,
    };
    let summary = cleaner::run_cleanup(&results, &mut gate, &executor, &options);

    match format {
        OutputFormat::Human => output::print_cleanup_summary(&summary),
        OutputFormat::Json => output::print_json(&output::CleanReport::new(&root, &summary)),
        OutputFormat::Quiet => output::print_cleanup_quiet(&summary),
    }

    Ok(())
}

// ─── Patterns ─────────────────────────────────────────────────────────────────

fn cmd_patterns(cli: &Cli, all: bool) -> Result<()> {
    let config = load_config(cli)?;
    let catalog: Vec<_> = patterns::catalog_with(&config.extra_patterns)
        .into_iter()
        .filter(|p| all || !p.requires_elevation)
        .collect();

    // validate user globs up front
    patterns::compile_catalog(&catalog, true)?;

    match output_format(cli, &config) {
        OutputFormat::Human => output::print_patterns(&catalog, config.default_min_size_kb),
        OutputFormat::Json => output::print_json(&catalog),
        OutputFormat::Quiet => {
            for p in &catalog {
                println!("{}\t{}", p.name, p.kind.text());
            }
        }
    }
    Ok(())
}

// ─── Config ───────────────────────────────────────────────────────────────────

fn cmd_config(cli: &Cli, action: &ConfigAction) -> Result<()> {
    let path = cli.config_path();
    match action {
        ConfigAction::Show => {
            let config = Config::load_from(&path)?;
            println!("{}", toml::to_string_pretty(&config)?);
            Ok(())
        }
        ConfigAction::Path => {
            println!("{}", path.display());
            Ok(())
        }
        ConfigAction::Reset => {
            Config::default().save_to(&path)?;
            println!("  {} Configuration reset to defaults", "✓".green());
            Ok(())
        }
        ConfigAction::Set { key, value } => {
            let mut config = Config::load_from(&path)?;
            config.set(key, value)?;
            config.save_to(&path)?;
            tracing::info!(target: "spacesweep::audit", key = %key, value = %value, "config updated");
            println!("  {} Set {} = {}", "✓".green(), key, value);
            Ok(())
        }
    }
}
