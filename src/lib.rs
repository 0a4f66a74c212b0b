//! flem - declarative workspace layouts for sway
//!
//! Builds the container tree described by a configuration file, launching
//! or adopting the apps that fill it, and tags every container and app
//! with a mark so later runs can find them again.

pub mod command;
pub mod config;
pub mod ipc;
pub mod launch;
pub mod layout;
pub mod mark;
pub mod reconcile;
pub mod report;
pub mod resize;
pub mod session;
pub mod setup;
pub mod startup;
pub mod state;
pub mod tracing;
pub mod types;
pub mod window_query;
pub mod workspaces;

#[cfg(test)]
pub mod testing;
