use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use extsweep::{
    config::Config,
    model::{BrowserFamily, ExtensionIdentity, Platform},
    output::{
        format_inventory_to_string, print_inventory, print_pending_table, print_report,
        OutputFormat,
    },
    platform::{RootResolution, UserContext},
    scanner::{all_scanners, Enumerator},
    session::{Confirmation, InventorySession},
};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::process::ExitCode;
use std::str::FromStr;
use std::time::Duration;
use tracing::warn;

mod interactive;

/// Exit codes for scripted use
mod exit_codes {
    pub const SUCCESS: u8 = 0;
    pub const ERROR: u8 = 1;
    pub const DELETION_FAILED: u8 = 2;
}

#[derive(Parser)]
#[command(name = "extsweep")]
#[command(
    author,
    version,
    about = "Inventory and remove installed browser extensions"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Inventory another account instead of the current one
    #[arg(long, global = true, value_name = "NAME")]
    user: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// List installed extensions
    Scan {
        /// Only scan one browser (chrome, edge, firefox)
        #[arg(short = 'b', long)]
        family: Option<String>,

        /// Output format (table, json)
        #[arg(short, long)]
        format: Option<String>,

        /// Write the inventory as JSON to a file
        #[arg(short, long)]
        output: Option<String>,

        /// Scan browsers one after another instead of concurrently
        #[arg(long)]
        no_parallel: bool,
    },

    /// Delete extensions by id or path
    Remove {
        /// Only consider one browser (chrome, edge, firefox)
        #[arg(short = 'b', long)]
        family: Option<String>,

        /// Extension id (directory name, or .xpi file stem); repeatable
        #[arg(long = "id", value_name = "ID")]
        ids: Vec<String>,

        /// Backing path as shown by `scan --format json`; repeatable
        #[arg(long = "path", value_name = "PATH")]
        paths: Vec<PathBuf>,

        /// Do not ask for confirmation
        #[arg(short, long)]
        yes: bool,

        /// Show what would be deleted, then stop
        #[arg(long)]
        dry_run: bool,

        /// Output format for the deletion report (table, json)
        #[arg(short, long)]
        format: Option<String>,
    },

    /// Pick extensions to delete from a numbered checklist
    Interactive {
        /// Only consider one browser (chrome, edge, firefox)
        #[arg(short = 'b', long)]
        family: Option<String>,
    },

    /// List supported browsers and where their extensions are expected
    ListFamilies,

    /// Show or create config file
    Config {
        /// Generate default config file
        #[arg(long)]
        init: bool,

        /// Show config file path
        #[arg(long)]
        path: bool,
    },
}

fn main() -> ExitCode {
    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("Error: failed to start async runtime: {}", e);
            return ExitCode::from(exit_codes::ERROR);
        }
    };

    let result = runtime.block_on(run());
    // A family scan that timed out may still be blocked in the filesystem;
    // don't wait for it.
    runtime.shutdown_background();

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(exit_codes::ERROR)
        }
    }
}

async fn run() -> Result<u8> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = Config::load().unwrap_or_else(|e| {
        warn!(error = %e, path = %Config::config_path().display(), "ignoring unreadable config file");
        Config::default()
    });

    match cli.command {
        Commands::Scan {
            family,
            format,
            output,
            no_parallel,
        } => {
            let format = parse_format(format.unwrap_or_else(|| config.default_format.clone()))?;
            let mut session = build_session(&config, family.as_deref(), cli.user.as_deref())?;
            let parallel = config.parallel && !no_parallel;

            run_scan(&mut session, &config, format, output, parallel).await
        }
        Commands::Remove {
            family,
            ids,
            paths,
            yes,
            dry_run,
            format,
        } => {
            if ids.is_empty() && paths.is_empty() {
                anyhow::bail!("Specify at least one --id or --path (or use `extsweep interactive`)");
            }
            let format = parse_format(format.unwrap_or_else(|| config.default_format.clone()))?;
            let mut session = build_session(&config, family.as_deref(), cli.user.as_deref())?;

            run_remove(&mut session, &config, &ids, &paths, yes, dry_run, format).await
        }
        Commands::Interactive { family } => {
            let mut session = build_session(&config, family.as_deref(), cli.user.as_deref())?;
            scan_with_progress(&mut session, &config, config.parallel, true).await;
            interactive::run(&mut session, &config).await
        }
        Commands::ListFamilies => {
            let user = resolve_user(cli.user.as_deref())?;
            list_families(&config, &user);
            Ok(exit_codes::SUCCESS)
        }
        Commands::Config { init, path } => {
            handle_config(&config, init, path)?;
            Ok(exit_codes::SUCCESS)
        }
    }
}

fn init_logging(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("extsweep=debug")
        } else {
            EnvFilter::new("extsweep=warn")
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();
}

fn resolve_user(name: Option<&str>) -> Result<UserContext> {
    match name {
        None => UserContext::current().context("Could not determine the current user's home directory"),
        Some(name) => Ok(match Platform::current() {
            Some(platform) => UserContext::for_user(name, platform),
            // Every family resolves to Unsupported, so the home is never read.
            None => UserContext::new(name, PathBuf::new()),
        }),
    }
}

fn build_session(
    config: &Config,
    family: Option<&str>,
    user: Option<&str>,
) -> Result<InventorySession> {
    let mut enumerator = Enumerator::from_config(config);
    if let Some(family) = family {
        enumerator = enumerator.with_families(vec![parse_family(family)?]);
    }

    Ok(InventorySession::new(enumerator, resolve_user(user)?))
}

async fn scan_with_progress(
    session: &mut InventorySession,
    config: &Config,
    parallel: bool,
    is_interactive: bool,
) {
    let progress = if is_interactive {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.enable_steady_tick(Duration::from_millis(100));
        pb.set_message("Scanning browser extensions...");
        Some(pb)
    } else {
        None
    };

    let found = if parallel {
        session.scan_concurrent(config.family_timeout()).await.len()
    } else {
        session.scan().len()
    };

    if let Some(pb) = progress {
        pb.finish_with_message(format!("Found {} extensions", found));
    }
}

async fn run_scan(
    session: &mut InventorySession,
    config: &Config,
    format: OutputFormat,
    output_file: Option<String>,
    parallel: bool,
) -> Result<u8> {
    let is_interactive = format == OutputFormat::Table;
    scan_with_progress(session, config, parallel, is_interactive).await;

    if let Some(path) = output_file {
        let json = format_inventory_to_string(session.snapshot())?;
        std::fs::write(&path, json).with_context(|| format!("Failed to write {}", path))?;
        if is_interactive {
            println!("Results written to: {}", path);
        }
    } else {
        print_inventory(session.snapshot(), format)?;
    }

    Ok(exit_codes::SUCCESS)
}

async fn run_remove(
    session: &mut InventorySession,
    config: &Config,
    ids: &[String],
    paths: &[PathBuf],
    assume_yes: bool,
    dry_run: bool,
    format: OutputFormat,
) -> Result<u8> {
    let is_interactive = format == OutputFormat::Table;
    scan_with_progress(session, config, config.parallel, is_interactive).await;

    let matches: Vec<ExtensionIdentity> = session
        .snapshot()
        .records()
        .filter(|r| ids.contains(&r.extension_id) || paths.iter().any(|p| p == r.path()))
        .map(|r| r.identity.clone())
        .collect();

    for id in ids {
        if !session.snapshot().records().any(|r| &r.extension_id == id) {
            eprintln!("No installed extension with id '{}'", id);
        }
    }
    for path in paths {
        if !session.snapshot().records().any(|r| r.path() == path) {
            eprintln!("No installed extension at {}", path.display());
        }
    }

    for identity in &matches {
        session.select(identity);
    }

    if session.selection().is_empty() {
        println!("No extensions selected for deletion.");
        return Ok(exit_codes::SUCCESS);
    }

    let pending = session.request_deletion()?;
    if is_interactive || dry_run {
        print_pending_table(&pending)?;
    }

    if dry_run {
        session.confirm(Confirmation::Decline)?;
        println!("Dry run: nothing deleted.");
        return Ok(exit_codes::SUCCESS);
    }

    let approved = assume_yes
        || interactive::confirm_prompt(&format!(
            "Are you sure you want to delete {} extension(s)?",
            pending.len()
        ))?;
    let confirmation = if approved {
        Confirmation::Approve
    } else {
        Confirmation::Decline
    };

    match session.confirm_async(confirmation).await? {
        None => {
            println!("Cancelled.");
            Ok(exit_codes::SUCCESS)
        }
        Some(report) => {
            print_report(&report, format)?;
            if report.is_complete_success() {
                Ok(exit_codes::SUCCESS)
            } else {
                Ok(exit_codes::DELETION_FAILED)
            }
        }
    }
}

fn list_families(config: &Config, user: &UserContext) {
    let enumerator = Enumerator::from_config(config);
    let resolver = enumerator.resolver();

    let platform = resolver
        .platform()
        .map(|p| format!("{:?}", p))
        .unwrap_or_else(|| "unsupported".to_string());
    println!(
        "Supported browsers (user: {}, platform: {}):",
        user.username, platform
    );
    println!();

    for scanner in all_scanners() {
        let family = scanner.family();
        let (location, present) = match resolver.resolve_roots(family, user) {
            RootResolution::Found(roots) => (display_paths(&roots), "yes"),
            RootResolution::NotFound(path) => (path.display().to_string(), "no"),
            RootResolution::Unsupported => ("unsupported on this platform".to_string(), "no"),
        };

        let enabled = if enumerator.families().contains(&family) {
            "yes"
        } else {
            "no"
        };

        println!(
            "  {:<10} {:<20} [present: {}, scanned: {}]",
            family.as_str(),
            scanner.name(),
            present,
            enabled
        );
        println!("  {:<10} Location: {}", "", location);
        println!();
    }
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// `config --path` prints the location, `config --init` writes defaults
/// once, and a bare `config` prints the settings currently in effect.
fn handle_config(config: &Config, init: bool, show_path: bool) -> Result<()> {
    let location = Config::config_path();

    if show_path {
        println!("{}", location.display());
    } else if init {
        if location.exists() {
            anyhow::bail!("{} already exists; edit it or remove it first", location.display());
        }
        Config::default().save()?;
        println!("Wrote default settings to {}", location.display());
    } else {
        let source = if location.exists() {
            location.display().to_string()
        } else {
            "built-in defaults".to_string()
        };
        println!("# Effective settings ({})", source);
        println!("{}", toml::to_string_pretty(config)?);
    }

    Ok(())
}

fn parse_family(s: &str) -> Result<BrowserFamily> {
    BrowserFamily::from_str(s).map_err(|e| anyhow::anyhow!(e))
}

fn parse_format(s: String) -> Result<OutputFormat> {
    OutputFormat::from_str(&s).map_err(|e| anyhow::anyhow!(e))
}
