//! flemctl - inspect what flem did to sway
//!
//! # Examples
//!
//! ```bash
//! # Every mark flem has placed, decoded
//! flemctl marks
//!
//! # Live windows on workspace 2
//! flemctl windows 2
//!
//! # Nodes and marks a config would produce, without contacting sway
//! flemctl plan ~/.config/flem/layout.yaml
//!
//! # Send one command
//! flemctl run 'focus parent'
//! ```

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;

use flem::config::Config;
use flem::ipc::{ControlChannel, SwayMsg};
use flem::mark::{Mark, MarkPath};
use flem::startup;
use flem::window_query::workspace_windows;

/// flemctl - inspect flem marks and sway state
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// sway IPC socket (default: $SWAYSOCK)
    #[arg(long, global = true)]
    socket: Option<PathBuf>,

    /// Output compact JSON without pretty-printing
    #[arg(long, global = true)]
    raw: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List flem marks present in the live tree
    Marks {
        /// Only marks for this workspace
        #[arg(short, long)]
        workspace: Option<String>,
    },

    /// List live windows, optionally for one workspace
    Windows {
        workspace: Option<String>,
    },

    /// Print the nodes and marks a configuration would create
    Plan {
        config: PathBuf,
    },

    /// Send one raw command to sway
    Run {
        command: String,
    },
}

#[derive(Serialize)]
struct MarkInfo {
    mark: String,
    workspace: String,
    #[serde(flatten)]
    path: MarkPath,
}

fn main() {
    let cli = Cli::parse();
    if let Err(e) = execute(cli) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn execute(cli: Cli) -> Result<()> {
    let mut channel = SwayMsg::new();
    if let Some(socket) = cli.socket {
        channel = channel.with_socket(socket);
    }

    match cli.command {
        Commands::Marks { workspace } => {
            let tree = channel.get_tree().context("Failed to query sway")?;
            let marks: Vec<MarkInfo> = tree
                .all_marks()
                .into_iter()
                .filter_map(|mark| {
                    let parsed = Mark::parse(&mark)?;
                    Some(MarkInfo {
                        mark,
                        workspace: parsed.workspace,
                        path: parsed.path,
                    })
                })
                .filter(|m| workspace.as_ref().map_or(true, |ws| &m.workspace == ws))
                .collect();
            print_json(&marks, cli.raw)
        }
        Commands::Windows { workspace } => {
            let tree = channel.get_tree().context("Failed to query sway")?;
            let windows = match workspace {
                Some(ws) => {
                    if tree.find_workspace(&ws).is_none() {
                        bail!("no workspace named '{}'", ws);
                    }
                    workspace_windows(&tree, &ws)
                }
                None => tree.windows(),
            };
            print_json(&windows, cli.raw)
        }
        Commands::Plan { config } => {
            let config = Config::load(&config)
                .with_context(|| format!("Failed to load configuration from {:?}", config))?;
            print_json(&startup::plan(&config), cli.raw)
        }
        Commands::Run { command } => {
            let acks = channel.run(&command).context("Failed to send command")?;
            print_json(&acks, cli.raw)?;
            if acks.iter().any(|a| !a.success) {
                std::process::exit(1);
            }
            Ok(())
        }
    }
}

fn print_json<T: Serialize>(value: &T, raw: bool) -> Result<()> {
    let json = if raw {
        serde_json::to_string(value)?
    } else {
        serde_json::to_string_pretty(value)?
    };
    println!("{}", json);
    Ok(())
}
