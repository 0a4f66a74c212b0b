//! Control channel to the window manager.
//!
//! Every call runs `swaymsg` once and parses its JSON reply; there is no
//! persistent connection. The engine only sees the [`ControlChannel`] trait,
//! so tests can substitute an in-memory window manager.

use std::path::PathBuf;
use std::process::Command;

use serde::{Deserialize, Serialize};

use crate::launch::find_in_path;
use crate::window_query::TreeNode;

/// Default control utility
pub const SWAYMSG: &str = "swaymsg";

/// Acknowledgement for one command in a `run` reply
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandAck {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default)]
    pub parse_error: bool,
}

impl CommandAck {
    pub fn ok() -> Self {
        Self {
            success: true,
            error: None,
            parse_error: false,
        }
    }

    pub fn failed(message: &str) -> Self {
        Self {
            success: false,
            error: Some(message.to_string()),
            parse_error: false,
        }
    }
}

/// Control channel errors
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{program} exited with {status}: {stderr}")]
    Exit {
        program: String,
        status: String,
        stderr: String,
    },
    #[error("invalid reply from {program}: {source}")]
    Json {
        program: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("command '{command}' failed: {message}")]
    Rejected { command: String, message: String },
}

/// Something that accepts window manager commands and reports the tree
pub trait ControlChannel {
    /// Send one command string and return the raw acknowledgements
    fn run(&self, command: &str) -> Result<Vec<CommandAck>, ChannelError>;

    /// Fetch the whole live tree
    fn get_tree(&self) -> Result<TreeNode, ChannelError>;

    /// Send one command, treating any failed acknowledgement as an error
    fn execute(&self, command: &str) -> Result<(), ChannelError> {
        let acks = self.run(command)?;
        match acks.iter().find(|a| !a.success) {
            Some(failed) => Err(ChannelError::Rejected {
                command: command.to_string(),
                message: failed
                    .error
                    .clone()
                    .unwrap_or_else(|| "unknown error".to_string()),
            }),
            None => Ok(()),
        }
    }
}

/// Control channel backed by the `swaymsg` utility
#[derive(Debug, Clone)]
pub struct SwayMsg {
    program: String,
    socket: Option<PathBuf>,
}

impl SwayMsg {
    pub fn new() -> Self {
        Self {
            program: SWAYMSG.to_string(),
            socket: None,
        }
    }

    /// Talk to a specific IPC socket instead of `$SWAYSOCK`
    pub fn with_socket(mut self, socket: PathBuf) -> Self {
        self.socket = Some(socket);
        self
    }

    /// Location of the utility on `PATH`, if present
    pub fn locate(&self) -> Option<PathBuf> {
        find_in_path(&self.program)
    }

    fn invoke(&self, message_type: &str, payload: Option<&str>) -> Result<Vec<u8>, ChannelError> {
        let mut cmd = Command::new(&self.program);
        if let Some(socket) = &self.socket {
            cmd.arg("--socket").arg(socket);
        }
        cmd.arg("--raw").arg("--type").arg(message_type);
        if let Some(payload) = payload {
            cmd.arg("--").arg(payload);
        }

        let output = cmd.output().map_err(|source| ChannelError::Spawn {
            program: self.program.clone(),
            source,
        })?;

        // A rejected command still prints a JSON reply and exits non-zero
        if !output.status.success() && output.stdout.iter().all(u8::is_ascii_whitespace) {
            return Err(ChannelError::Exit {
                program: self.program.clone(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(output.stdout)
    }
}

impl Default for SwayMsg {
    fn default() -> Self {
        Self::new()
    }
}

impl ControlChannel for SwayMsg {
    fn run(&self, command: &str) -> Result<Vec<CommandAck>, ChannelError> {
        log::debug!("swaymsg: {}", command);
        let stdout = self.invoke("command", Some(command))?;
        parse_acks(&stdout).map_err(|source| ChannelError::Json {
            program: self.program.clone(),
            source,
        })
    }

    fn get_tree(&self) -> Result<TreeNode, ChannelError> {
        let stdout = self.invoke("get_tree", None)?;
        serde_json::from_slice(&stdout).map_err(|source| ChannelError::Json {
            program: self.program.clone(),
            source,
        })
    }
}

/// Parse a `run` reply.
///
/// Replies are an array of acknowledgements; a bare object is accepted for
/// errors reported before any command ran.
pub fn parse_acks(reply: &[u8]) -> Result<Vec<CommandAck>, serde_json::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Reply {
        Many(Vec<CommandAck>),
        One(CommandAck),
    }

    match serde_json::from_slice(reply)? {
        Reply::Many(acks) => Ok(acks),
        Reply::One(ack) => Ok(vec![ack]),
    }
}
