//! `openrgb-installer releases` command implementation

use anyhow::Result;

use openrgb_installer::releases::ReleaseTable;

use super::AppContext;

pub fn run(ctx: &AppContext) -> Result<()> {
    let table = ReleaseTable::from_config(&ctx.config)?;
    let default = table.default_release();
    for entry in table.iter() {
        let marker = if entry.release == default { "*" } else { " " };
        println!("{marker} {:<7} {}", entry.release.label(), entry.url);
    }
    Ok(())
}
