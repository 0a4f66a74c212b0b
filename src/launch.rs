//! Application launching.
//!
//! Starting a process and seeing its window are two separate events. The
//! launcher only starts the process; [`wait_for_window`] then polls the live
//! tree until a new window with the expected name shows up.

use std::collections::HashSet;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

use crate::ipc::ControlChannel;
use crate::window_query::LiveWindow;

/// Errors starting an application
#[derive(Debug, thiserror::Error)]
pub enum LaunchError {
    #[error("empty launch command")]
    Empty,
    #[error("'{program}' not found in PATH")]
    NotFound { program: String },
    #[error("failed to spawn '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },
}

/// Something that starts external processes
pub trait Launcher {
    /// Start `command` detached, without waiting for it
    fn spawn(&self, command: &str) -> Result<(), LaunchError>;
}

/// Launcher that spawns real processes in their own session
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessLauncher;

impl Launcher for ProcessLauncher {
    fn spawn(&self, command: &str) -> Result<(), LaunchError> {
        let mut cmd = build_command(command)?;
        log::info!("Spawning '{}'", command);

        // Detach so apps survive when flem exits
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            unsafe {
                cmd.pre_exec(|| {
                    // Create new session to detach from terminal
                    libc::setsid();
                    Ok(())
                });
            }
        }

        cmd.stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map(|_| ())
            .map_err(|source| LaunchError::Spawn {
                command: command.to_string(),
                source,
            })
    }
}

/// Characters that need a shell to interpret
const SHELL_CHARS: &[char] = &['|', '&', ';', '<', '>', '(', ')', '`', '"', '\'', '*', '?', '\n'];

/// Whether a command line has to be run through `sh -c`
pub fn needs_shell(command: &str) -> bool {
    command.contains(SHELL_CHARS)
}

/// Expand `~` and environment variables in a command line.
///
/// Unknown variables leave the command with only `~` expanded.
pub fn expand(command: &str) -> String {
    match shellexpand::full(command) {
        Ok(expanded) => expanded.into_owned(),
        Err(e) => {
            log::warn!("Could not expand '{}': {}", command, e);
            shellexpand::tilde(command).into_owned()
        }
    }
}

/// Build the process for a command line without starting it
pub fn build_command(command: &str) -> Result<Command, LaunchError> {
    let expanded = expand(command);
    let parts: Vec<&str> = expanded.split_whitespace().collect();
    let Some((program, args)) = parts.split_first() else {
        return Err(LaunchError::Empty);
    };

    if needs_shell(&expanded) {
        let mut cmd = Command::new("sh");
        cmd.arg("-c").arg(&expanded);
        return Ok(cmd);
    }

    let resolved = find_in_path(program).ok_or_else(|| LaunchError::NotFound {
        program: program.to_string(),
    })?;
    let mut cmd = Command::new(resolved);
    cmd.args(args);
    Ok(cmd)
}

/// Resolve a program name the way the shell would.
///
/// Names containing a slash are checked as paths.
pub fn find_in_path(program: &str) -> Option<PathBuf> {
    which::which(program).ok()
}

/// Poll the live tree for a window named `name` that is not in `known`.
///
/// The tree is always checked at least once, even with a zero timeout.
pub fn wait_for_window(
    channel: &dyn ControlChannel,
    name: &str,
    known: &HashSet<i64>,
    timeout: Duration,
    interval: Duration,
) -> Option<LiveWindow> {
    let deadline = Instant::now() + timeout;

    loop {
        match channel.get_tree() {
            Ok(tree) => {
                let found = tree
                    .windows()
                    .into_iter()
                    .find(|w| !known.contains(&w.id) && w.matches_name(name));
                if found.is_some() {
                    return found;
                }
            }
            Err(e) => log::debug!("Tree query failed while waiting for '{}': {}", name, e),
        }

        let now = Instant::now();
        if now >= deadline {
            return None;
        }
        std::thread::sleep(interval.min(deadline - now));
    }
}
