//! `openrgb-installer launch` command implementation

use anyhow::Result;
use clap::Args;
use std::path::PathBuf;

use openrgb_installer::{launch::launch_installed, paths::OPENRGB};

use super::AppContext;

#[derive(Args, Debug)]
pub struct LaunchArgs {
    /// Directory the install folder lives in
    #[arg(long)]
    install_root: Option<PathBuf>,
}

pub fn run(ctx: &AppContext, args: LaunchArgs) -> Result<()> {
    let install_root = ctx.install_root(args.install_root)?;
    let pid = launch_installed(&install_root, &OPENRGB)?;
    println!("Started OpenRGB (pid {pid})");
    Ok(())
}
