//! `openrgb-installer uninstall` command implementation

use anyhow::Result;
use clap::Args;
use std::path::PathBuf;

use openrgb_installer::{paths::OPENRGB, pipeline, shortcuts};

use super::AppContext;

#[derive(Args, Debug)]
pub struct UninstallArgs {
    /// Directory the install folder was created in
    #[arg(long)]
    install_root: Option<PathBuf>,
}

pub fn run(ctx: &AppContext, args: UninstallArgs) -> Result<()> {
    let install_root = ctx.install_root(args.install_root)?;
    let handle = pipeline::spawn_uninstall(
        install_root,
        ctx.layout.clone(),
        OPENRGB,
        shortcuts::platform(),
    )?;
    super::finish(handle)
}
