//! `openrgb-installer install` command implementation

use anyhow::Result;
use clap::Args;
use std::path::PathBuf;

use openrgb_installer::{
    paths::OPENRGB,
    pipeline::{self, InstallRequest, Services},
    releases::{Release, ReleaseTable},
};

use super::AppContext;

#[derive(Args, Debug)]
pub struct InstallArgs {
    /// Release to install: Master, 0.9, 0.8, 0.7 or 0.6
    #[arg(long, short)]
    release: Option<Release>,

    /// Directory the install folder is created in
    #[arg(long)]
    install_root: Option<PathBuf>,
}

pub fn run(ctx: &AppContext, args: InstallArgs) -> Result<()> {
    let table = ReleaseTable::from_config(&ctx.config)?;
    let release = args.release.unwrap_or_else(|| table.default_release());
    let entry = table.get(release);
    let request = InstallRequest {
        label: release.label().to_string(),
        source_url: entry.url.clone(),
        install_root: ctx.install_root(args.install_root)?,
        sha256: entry.sha256.clone(),
    };
    println!(
        "Installing OpenRGB {} into {}",
        request.label,
        request.install_root.display()
    );

    let services = Services::new(&ctx.config.network)?;
    let handle = pipeline::spawn_install(request, ctx.layout.clone(), OPENRGB, services)?;
    super::finish(handle)
}
