//! Configuration file support for flem.
//!
//! Loads a workspace layout description from YAML (or TOML, chosen by file
//! extension) and validates its structure before anything talks to the
//! window manager.
//!
//! Also provides `Timing` - the runtime struct with resolved delays used by
//! the setup engine.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::types::{Layout, Position, Size};

// =============================================================================
// Runtime Configuration (resolved values)
// =============================================================================

/// Runtime timing configuration with resolved durations.
///
/// Commands are applied asynchronously by the window manager, so the engine
/// paces itself with these. They are upper bounds, not guarantees.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Timing {
    /// Wait after launching an app that has no explicit delay
    pub settle: Duration,
    /// Pause around resize commands
    pub command_delay: Duration,
    /// Pause between post-launch commands
    pub post_delay: Duration,
    /// Pause between workspaces in the focus list
    pub focus_delay: Duration,
    /// Pause after closing an unmatched window
    pub close_delay: Duration,
    /// How long to poll for a launched window before giving up
    pub launch_timeout: Duration,
    /// Interval between live tree polls
    pub poll_interval: Duration,
}

impl Timing {
    /// No waiting at all. Launch polling checks the tree exactly once.
    pub fn immediate() -> Self {
        Self {
            settle: Duration::ZERO,
            command_delay: Duration::ZERO,
            post_delay: Duration::ZERO,
            focus_delay: Duration::ZERO,
            close_delay: Duration::ZERO,
            launch_timeout: Duration::ZERO,
            poll_interval: Duration::ZERO,
        }
    }
}

impl Default for Timing {
    fn default() -> Self {
        Self::from(&GeneralConfig::default())
    }
}

impl From<&GeneralConfig> for Timing {
    fn from(general: &GeneralConfig) -> Self {
        Self {
            settle: Duration::from_millis(general.settle_ms),
            command_delay: Duration::from_millis(general.command_delay_ms),
            post_delay: Duration::from_millis(general.post_delay_ms),
            focus_delay: Duration::from_millis(general.focus_delay_ms),
            close_delay: Duration::from_millis(general.close_delay_ms),
            launch_timeout: Duration::from_millis(general.launch_timeout_ms),
            poll_interval: Duration::from_millis(general.poll_interval_ms),
        }
    }
}

// =============================================================================
// File-based Configuration
// =============================================================================

/// Top-level configuration
#[derive(Debug, Default, Deserialize, Clone)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub general: GeneralConfig,
    /// Workspaces keyed by name, processed in name order
    pub workspaces: BTreeMap<String, WorkspaceSpec>,
    /// Workspaces to focus, in order, once setup is complete
    pub focus: Vec<String>,
}

/// Timing settings, all in milliseconds
#[derive(Debug, Deserialize, Clone)]
#[serde(default, deny_unknown_fields)]
pub struct GeneralConfig {
    pub settle_ms: u64,
    pub command_delay_ms: u64,
    pub post_delay_ms: u64,
    pub focus_delay_ms: u64,
    pub close_delay_ms: u64,
    pub launch_timeout_ms: u64,
    pub poll_interval_ms: u64,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            settle_ms: 300,
            command_delay_ms: 100,
            post_delay_ms: 200,
            focus_delay_ms: 100,
            close_delay_ms: 200,
            launch_timeout_ms: 5000,
            poll_interval_ms: 100,
        }
    }
}

/// Configuration for a single workspace
#[derive(Debug, Default, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct WorkspaceSpec {
    /// Top-level layout of the workspace
    #[serde(default)]
    pub layout: Option<Layout>,
    /// Top-level containers, in order
    #[serde(default)]
    pub containers: Vec<ContainerSpec>,
    /// Close live windows that no configured app claims
    #[serde(default)]
    pub close_unmatched: bool,
    /// Output to move the workspace to
    #[serde(default)]
    pub output: Option<String>,
}

/// Either an application leaf or a split node; see [`ContainerSpec::kind`]
#[derive(Debug, Default, Deserialize, Clone)]
#[serde(default, deny_unknown_fields)]
pub struct ContainerSpec {
    /// Application identifier (app_id on Wayland, class on X11)
    pub app: Option<String>,
    /// Launch command, defaults to `app`
    #[serde(alias = "command")]
    pub cmd: Option<String>,
    /// Size relative to the parent container
    pub size: Option<Size>,
    /// Seconds to wait after launching before looking for the window
    pub delay: Option<f64>,
    /// Commands to run after the app is launched
    #[serde(alias = "posts")]
    pub post: Vec<String>,
    /// Run `post` again when the app was already running
    pub rerun_post: bool,
    /// Make the window floating
    pub floating: bool,
    /// Floating window placement
    pub position: Option<Position>,
    /// Layout of a split node
    pub split: Option<Layout>,
    /// Children of a split node
    pub containers: Vec<ContainerSpec>,
}

/// The two legal shapes of a [`ContainerSpec`]
#[derive(Debug, Clone, Copy)]
pub enum SpecKind<'a> {
    App(&'a str),
    Split {
        split: Option<Layout>,
        children: &'a [ContainerSpec],
    },
}

/// Why a container spec is neither an app nor a split
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum StructureError {
    #[error("container has both 'app' and 'split'/'containers'")]
    Both,
    #[error("container has neither 'app' nor 'containers'")]
    Neither,
}

impl ContainerSpec {
    /// Create an application leaf
    pub fn app(name: &str) -> Self {
        Self {
            app: Some(name.to_string()),
            ..Default::default()
        }
    }

    /// Create a split node
    pub fn split(split: Option<Layout>, children: Vec<ContainerSpec>) -> Self {
        Self {
            split,
            containers: children,
            ..Default::default()
        }
    }

    pub fn with_size(mut self, size: Size) -> Self {
        self.size = Some(size);
        self
    }

    /// Classify the spec. A node is exactly one of app leaf or split node.
    pub fn kind(&self) -> Result<SpecKind<'_>, StructureError> {
        let has_app = self.app.as_deref().is_some_and(|a| !a.trim().is_empty());
        let has_split = self.split.is_some() || !self.containers.is_empty();
        match (has_app, has_split) {
            (true, false) => Ok(SpecKind::App(self.app.as_deref().unwrap_or_default())),
            (false, true) => Ok(SpecKind::Split {
                split: self.split,
                children: &self.containers,
            }),
            (true, true) => Err(StructureError::Both),
            (false, false) => Err(StructureError::Neither),
        }
    }

    /// Command used to launch this app
    pub fn launch_command(&self) -> Option<&str> {
        self.cmd
            .as_deref()
            .filter(|c| !c.trim().is_empty())
            .or(self.app.as_deref())
    }
}

/// Configuration loading and validation errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse YAML config {path:?}: {source}")]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("failed to parse TOML config {path:?}: {source}")]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("no workspaces defined in configuration")]
    NoWorkspaces,
    #[error("configuration error in workspace '{workspace}'{}: {problem}", fmt_context(.context))]
    Invalid {
        workspace: String,
        context: String,
        problem: Problem,
    },
}

/// Structural problems that make a configuration unusable
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Problem {
    #[error("no layout defined")]
    MissingLayout,
    #[error("workspace has no containers defined")]
    NoContainers,
    #[error("{0}; a container must either have an 'app' or a 'containers' list, but not both")]
    Structure(StructureError),
    #[error("split container has no children")]
    EmptyContainer,
    #[error("delay must be a non-negative number of seconds, got {0}")]
    InvalidDelay(f64),
}

fn fmt_context(context: &str) -> String {
    if context.is_empty() {
        String::new()
    } else {
        format!(", {}", context)
    }
}

/// A non-fatal configuration issue
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigWarning {
    pub workspace: Option<String>,
    pub message: String,
}

impl fmt::Display for ConfigWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.workspace {
            Some(ws) => write!(f, "workspace '{}': {}", ws, self.message),
            None => f.write_str(&self.message),
        }
    }
}

impl Config {
    /// Read and parse a config file without validating it.
    ///
    /// `.toml` files are parsed as TOML, everything else as YAML.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let is_toml = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("toml"));

        if is_toml {
            toml::from_str(&contents).map_err(|source| ConfigError::Toml {
                path: path.to_path_buf(),
                source,
            })
        } else {
            serde_yaml::from_str(&contents).map_err(|source| ConfigError::Yaml {
                path: path.to_path_buf(),
                source,
            })
        }
    }

    /// Read, parse and validate a config file, logging any warnings
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let config = Self::from_path(path)?;
        log::debug!("Parsed configuration from {:?}, validating", path);

        for warning in config.validate()? {
            log::warn!("{}", warning);
        }

        log::info!(
            "Loaded configuration with {} workspace(s) from {:?}",
            config.workspaces.len(),
            path
        );
        Ok(config)
    }

    /// Runtime timing derived from the `general` section
    pub fn timing(&self) -> Timing {
        Timing::from(&self.general)
    }

    /// Check the structure of every workspace.
    ///
    /// Structural errors are fatal. Issues the engine can work around are
    /// returned as warnings.
    pub fn validate(&self) -> Result<Vec<ConfigWarning>, ConfigError> {
        if self.workspaces.is_empty() {
            return Err(ConfigError::NoWorkspaces);
        }

        let mut warnings = Vec::new();

        for (name, workspace) in &self.workspaces {
            let invalid = |context: String, problem: Problem| ConfigError::Invalid {
                workspace: name.clone(),
                context,
                problem,
            };

            if workspace.layout.is_none() {
                return Err(invalid(String::new(), Problem::MissingLayout));
            }
            if workspace.containers.is_empty() {
                return Err(invalid(String::new(), Problem::NoContainers));
            }

            for (i, container) in workspace.containers.iter().enumerate() {
                validate_container(container, &format!("containers[{}]", i), &mut |ctx, problem| {
                    invalid(ctx, problem)
                }, &mut |message| {
                    warnings.push(ConfigWarning {
                        workspace: Some(name.clone()),
                        message,
                    })
                })?;
            }
        }

        for name in &self.focus {
            if !self.workspaces.contains_key(name) {
                warnings.push(ConfigWarning {
                    workspace: None,
                    message: format!("focus list names unknown workspace '{}'", name),
                });
            }
        }

        Ok(warnings)
    }
}

fn validate_container(
    container: &ContainerSpec,
    context: &str,
    invalid: &mut dyn FnMut(String, Problem) -> ConfigError,
    warn: &mut dyn FnMut(String),
) -> Result<(), ConfigError> {
    match container.kind() {
        Err(e) => Err(invalid(context.to_string(), Problem::Structure(e))),
        Ok(SpecKind::App(name)) => {
            if let Some(delay) = container.delay {
                if delay < 0.0 || Duration::try_from_secs_f64(delay).is_err() {
                    return Err(invalid(context.to_string(), Problem::InvalidDelay(delay)));
                }
            }
            if container.position.is_some() && !container.floating {
                warn(format!(
                    "{}: position for '{}' is ignored because it is not floating",
                    context, name
                ));
            }
            Ok(())
        }
        Ok(SpecKind::Split { children, .. }) => {
            if children.is_empty() {
                return Err(invalid(context.to_string(), Problem::EmptyContainer));
            }
            for (i, child) in children.iter().enumerate() {
                validate_container(child, &format!("{}.containers[{}]", context, i), invalid, warn)?;
            }
            Ok(())
        }
    }
}
