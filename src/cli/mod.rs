//! Command-line front end over the pipelines and installation state.

pub mod install;
pub mod launch;
pub mod releases;
pub mod status;
pub mod uninstall;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use openrgb_installer::{
    config::{config_path, Config},
    paths::{self, Layout},
    pipeline::{PipelineHandle, ProgressEvent},
};

#[derive(Parser, Debug)]
#[command(name = "openrgb-installer", version, about = "Install, update and remove OpenRGB")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Download a release and install it, replacing any existing install
    Install(install::InstallArgs),
    /// Remove the installed program, its shortcuts and version record
    Uninstall(uninstall::UninstallArgs),
    /// Show the installed version and which actions are available
    Status(status::StatusArgs),
    /// Start the installed program
    Launch(launch::LaunchArgs),
    /// List the releases that can be installed
    Releases,
}

/// Resolved installer home, its config and the derived layout.
pub struct AppContext {
    pub home: PathBuf,
    pub config: Config,
    pub layout: Layout,
}

impl AppContext {
    pub fn load(home: &Path) -> Result<Self> {
        let config = Config::load(&config_path(home))?;
        let layout = Layout::resolve(home, &config)?;
        Ok(Self {
            home: home.to_path_buf(),
            config,
            layout,
        })
    }

    /// `--install-root` wins over the config file, which wins over the default.
    pub fn install_root(&self, flag: Option<PathBuf>) -> Result<PathBuf> {
        match flag {
            Some(root) => Ok(root),
            None => paths::default_install_root(&self.config),
        }
    }
}

pub fn run(cli: Cli, ctx: &AppContext) -> Result<()> {
    match cli.command {
        Command::Install(args) => install::run(ctx, args),
        Command::Uninstall(args) => uninstall::run(ctx, args),
        Command::Status(args) => status::run(ctx, args),
        Command::Launch(args) => launch::run(ctx, args),
        Command::Releases => releases::run(ctx),
    }
}

fn print_progress(event: &ProgressEvent) {
    println!("[{:>3}%] {}", event.percent, event.label);
}

/// Waits for a background run and turns a failed outcome into an error.
fn finish(handle: PipelineHandle) -> Result<()> {
    let outcome = handle.wait(print_progress);
    if !outcome.success {
        bail!("{}", outcome.message);
    }
    println!("{}", outcome.message);
    Ok(())
}
