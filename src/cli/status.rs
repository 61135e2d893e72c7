//! `openrgb-installer status` command implementation

use anyhow::Result;
use clap::Args;
use std::path::PathBuf;

use openrgb_installer::{paths::OPENRGB, state};

use super::AppContext;

#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Directory the install folder lives in
    #[arg(long)]
    install_root: Option<PathBuf>,
}

pub fn run(ctx: &AppContext, args: StatusArgs) -> Result<()> {
    let install_root = ctx.install_root(args.install_root)?;
    let available = state::availability(&install_root, &OPENRGB);

    println!("Installed version: {}", state::read_version(&ctx.layout.version_file));
    println!("Install folder: {}", OPENRGB.install_dir(&install_root).display());
    println!("Primary action: {}", available.primary_action.label());
    println!("Uninstall: {}", yes_no(available.can_uninstall));
    println!("Launch: {}", yes_no(available.can_launch));
    println!("Installer home: {}", ctx.home.display());
    Ok(())
}

fn yes_no(enabled: bool) -> &'static str {
    if enabled {
        "available"
    } else {
        "unavailable"
    }
}
