//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, WrapErr};
use docvendor_core::pipeline::{self, PipelineConfig, ProgressReporter};
use docvendor_core::{rehydrate, sanitize, vendor};
use docvendor_shared::{init_config, load_config, resolve_config_path};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// docvendor: vendor third-party docs and rewrite their links for the public site.
#[derive(Parser)]
#[command(
    name = "docvendor",
    version,
    about = "Vendor a third-party documentation tree, normalize it, and rehydrate its links.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Config file (defaults to ./docvendor.toml, then ~/.docvendor/docvendor.toml).
    #[arg(long, global = true, env = "DOCVENDOR_CONFIG")]
    pub config: Option<PathBuf>,

    /// Project root that relative config paths resolve against.
    #[arg(long, global = true)]
    pub root: Option<PathBuf>,

    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Copy the upstream document tree into the vendor directory.
    Vendor {
        /// Skip the `git pull` of the upstream checkout.
        #[arg(long)]
        offline: bool,
    },

    /// Normalize document headings and registry titles.
    Sanitize,

    /// Rewrite internal links into absolute site URLs.
    Rehydrate,

    /// Run vendor, sanitize, and rehydrate in order.
    All {
        /// Skip the `git pull` of the upstream checkout.
        #[arg(long)]
        offline: bool,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Write a default docvendor.toml into the project root.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = ["docvendor", "docvendor_core", "docvendor_markdown", "docvendor_shared"]
        .map(|target| format!("{target}={level}"))
        .join(",");

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .with_target(false)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    let root = match cli.root {
        Some(root) => root,
        None => std::env::current_dir().wrap_err("cannot determine working directory")?,
    };
    let config_path = cli.config.as_deref();

    match cli.command {
        Command::Vendor { offline } => cmd_vendor(&root, config_path, offline).await,
        Command::Sanitize => cmd_sanitize(&root, config_path),
        Command::Rehydrate => cmd_rehydrate(&root, config_path),
        Command::All { offline } => cmd_all(&root, config_path, offline).await,
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(&root),
            ConfigAction::Show => cmd_config_show(&root, config_path),
        },
    }
}

// ---------------------------------------------------------------------------
// Stage commands
// ---------------------------------------------------------------------------

async fn cmd_vendor(root: &Path, config_path: Option<&Path>, offline: bool) -> Result<()> {
    let mut vendor_config = load_config(config_path, root)?.vendor(root);
    if offline {
        vendor_config.refresh = false;
    }

    info!(
        source = %vendor_config.source_root.display(),
        dest = %vendor_config.dest.display(),
        "syncing vendored documents"
    );

    let reporter = CliProgress::new();
    let result = vendor::vendor_sync(&vendor_config, &reporter).await;
    reporter.done();
    let result = result?;

    print_vendor_summary(&result);
    Ok(())
}

fn cmd_sanitize(root: &Path, config_path: Option<&Path>) -> Result<()> {
    let sanitize_config = load_config(config_path, root)?.sanitize(root);

    let reporter = CliProgress::new();
    let result = sanitize::sanitize_docs(&sanitize_config, &reporter);
    reporter.done();
    let result = result?;

    print_sanitize_summary(&result);
    Ok(())
}

fn cmd_rehydrate(root: &Path, config_path: Option<&Path>) -> Result<()> {
    let rehydrate_config = load_config(config_path, root)?.rehydrate(root)?;

    let reporter = CliProgress::new();
    let result = rehydrate::rehydrate_docs(&rehydrate_config, &reporter);
    reporter.done();
    let result = result?;

    print_rehydrate_summary(&result);
    Ok(())
}

async fn cmd_all(root: &Path, config_path: Option<&Path>, offline: bool) -> Result<()> {
    let app = load_config(config_path, root)?;
    let mut config = PipelineConfig {
        vendor: app.vendor(root),
        sanitize: app.sanitize(root),
        rehydrate: app.rehydrate(root)?,
    };
    if offline {
        config.vendor.refresh = false;
    }

    let reporter = CliProgress::new();
    let result = pipeline::run_all(&config, &reporter).await;
    reporter.done();
    let result = result?;

    print_vendor_summary(&result.vendor);
    print_sanitize_summary(&result.sanitize);
    print_rehydrate_summary(&result.rehydrate);
    println!("  Pipeline finished in {:.1}s", result.elapsed.as_secs_f64());
    println!();
    Ok(())
}

// ---------------------------------------------------------------------------
// Summaries
// ---------------------------------------------------------------------------

fn print_vendor_summary(result: &vendor::VendorResult) {
    println!();
    println!("  Vendor sync complete.");
    println!("  Dest:       {}", result.dest.display());
    println!("  Files:      {}", result.files_copied);
    println!(
        "  Refreshed:  {}",
        if result.refreshed { "yes" } else { "no (using local copy)" }
    );
    println!(
        "  Revision:   {}",
        result.revision.as_deref().unwrap_or("unknown")
    );
    if !result.provenance.is_empty() {
        println!("  Provenance: {}", result.provenance.join(", "));
    }
    println!("  Time:       {:.1}s", result.elapsed.as_secs_f64());
    println!();
}

fn print_sanitize_summary(result: &sanitize::SanitizeResult) {
    println!();
    println!("  Sanitize complete.");
    println!("  Registry:  {}", result.registry.display());
    println!("  Entries:   {}", result.entries);
    println!("  Sanitized: {}", result.sanitized);
    if !result.missing.is_empty() {
        println!("  Missing:   {}", result.missing.join(", "));
    }
    println!("  Time:      {:.1}s", result.elapsed.as_secs_f64());
    println!();
}

fn print_rehydrate_summary(result: &rehydrate::RehydrateResult) {
    println!();
    println!("  Rehydrate complete.");
    println!("  Scanned:   {}", result.scanned);
    println!("  Links:     {}", result.links_rewritten);
    println!("  Modified:  {}", result.record.modified.len());
    for path in &result.record.modified {
        println!("    - {path}");
    }
    println!("  Record:    {}", result.record_path.display());
    println!("  Time:      {:.1}s", result.elapsed.as_secs_f64());
    println!();
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]);
        spinner.set_style(style);
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn file_processed(&self, path: &str, current: usize, total: usize) {
        self.spinner
            .set_message(format!("[{current}/{total}] {path}"));
    }

    fn done(&self) {
        self.spinner.finish_and_clear();
    }
}

// ---------------------------------------------------------------------------
// Config commands
// ---------------------------------------------------------------------------

fn cmd_config_init(root: &Path) -> Result<()> {
    let path = init_config(root)?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show(root: &Path, config_path: Option<&Path>) -> Result<()> {
    match resolve_config_path(config_path, root) {
        Some(path) => println!("# loaded from {}", path.display()),
        None => println!("# no config file found, showing defaults"),
    }
    let config = load_config(config_path, root)?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}
