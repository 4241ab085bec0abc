use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::constants::probe;
use crate::profiles::ServiceId;

#[derive(Debug, Parser)]
#[command(name = "stream-profiles")]
#[command(version)]
#[command(about = "Manage saved streaming service profiles", long_about = None)]
pub struct Cli {
    /// Path to the service store (defaults to the user config directory)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List saved services in order.
    List,
    /// Show the settings of a service (current one by default).
    Show {
        id: Option<ServiceId>,
    },
    /// Add an empty service and select it.
    Add,
    /// Remove a service (current one by default).
    Remove {
        id: Option<ServiceId>,
    },
    /// Select the service shown by default.
    Select {
        id: ServiceId,
    },
    /// Edit the current service.
    Edit(EditArgs),
    /// Check that the current service's server accepts connections.
    Probe {
        /// Connect timeout in milliseconds.
        #[arg(long, default_value_t = probe::TIMEOUT_MS)]
        timeout_ms: u64,
    },
}

#[derive(Debug, Args)]
pub struct EditArgs {
    #[arg(long)]
    pub name: Option<String>,

    /// Catalog service name (common services).
    #[arg(long)]
    pub service: Option<String>,

    #[arg(long)]
    pub server: Option<String>,

    /// Stream key.
    #[arg(long)]
    pub key: Option<String>,

    /// Switch to a custom server.
    #[arg(long, conflicts_with = "common")]
    pub custom: bool,

    /// Switch to a catalog service.
    #[arg(long)]
    pub common: bool,

    #[arg(long)]
    pub use_auth: Option<bool>,

    #[arg(long)]
    pub username: Option<String>,

    #[arg(long)]
    pub password: Option<String>,

    /// Run a bandwidth test instead of going live.
    #[arg(long)]
    pub bwtest: Option<bool>,
}

impl EditArgs {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.service.is_none()
            && self.server.is_none()
            && self.key.is_none()
            && !self.custom
            && !self.common
            && self.use_auth.is_none()
            && self.username.is_none()
            && self.password.is_none()
            && self.bwtest.is_none()
    }
}
