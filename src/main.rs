mod cli;

use anyhow::Result;
use clap::Parser;

use openrgb_installer::{logging, paths};

fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    let home = paths::installer_home()?;
    logging::init(&paths::logs_dir(&home))?;
    let ctx = cli::AppContext::load(&home)?;
    let result = cli::run(cli, &ctx);
    if let Err(err) = &result {
        tracing::error!("{err:#}");
    }
    result
}
