//! flem - declarative workspace layouts for sway
//!
//! `flem sway --config layout.yaml` switches to each configured workspace,
//! launches or adopts its apps, and arranges them into the configured
//! container tree.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use flem::config::Config;
use flem::ipc::SwayMsg;
use flem::launch::ProcessLauncher;
use flem::session::Session;
use flem::startup::{self, WorkspacePlan};

/// flem - set up sway workspaces from a layout file
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Set up sway workspaces
    Sway {
        /// Layout configuration file (YAML or TOML)
        #[arg(short, long)]
        config: PathBuf,

        /// Validate the configuration and print the plan without touching sway
        #[arg(long)]
        dry_run: bool,

        /// Log each phase
        #[arg(short, long)]
        verbose: bool,

        /// Log every command sent to sway
        #[arg(long)]
        debug: bool,

        /// Print the setup trace as JSON when done
        #[arg(long)]
        trace: bool,

        /// sway IPC socket (default: $SWAYSOCK)
        #[arg(long)]
        socket: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let Commands::Sway {
        config,
        dry_run,
        verbose,
        debug,
        trace,
        socket,
    } = cli.command;

    let level = if debug {
        "debug"
    } else if verbose {
        "info"
    } else {
        "warn"
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let config = Config::load(&config)
        .with_context(|| format!("Failed to load configuration from {:?}", config))?;

    if dry_run {
        print_plan(&startup::plan(&config));
        return Ok(());
    }

    let mut channel = SwayMsg::new();
    if let Some(socket) = socket {
        channel = channel.with_socket(socket);
    }
    startup::check_dependencies(&channel)?;

    let launcher = ProcessLauncher;
    let mut session = Session::new(&channel, &launcher, config.timing());
    startup::run(&mut session, &config);

    if trace {
        let entries = session.trace.get_all();
        let json = serde_json::to_string_pretty(&entries).context("Failed to serialize trace")?;
        println!("{}", json);
    }

    if session.report.error_count() > 0 {
        eprintln!(
            "flem: {} errors, {} warnings, {} operations succeeded",
            session.report.error_count(),
            session.report.warning_count(),
            session.report.success_count()
        );
    }

    let code = session.report.exit_code();
    if code != 0 {
        std::process::exit(code);
    }
    Ok(())
}

fn print_plan(plans: &[WorkspacePlan]) {
    for plan in plans {
        println!("workspace {}", plan.workspace);
        for node in &plan.nodes {
            let mut line = format!("{:indent$}{}", "", node.mark, indent = 2 * (node.depth + 1));
            if let Some(layout) = node.layout {
                line.push_str(&format!(" [{}]", layout));
            }
            if let Some(app) = &node.app {
                line.push_str(&format!(" {}", app));
            }
            if let Some(size) = node.size {
                line.push_str(&format!(" ({})", size));
            }
            println!("{}", line);
        }
        for error in &plan.errors {
            println!("  error: {}", error);
        }
        for warning in &plan.warnings {
            println!("  warning: {}", warning);
        }
    }
}
