//! Settle command implementation

use console::Style;

use crate::commands::context::Context;
use crate::domain::display_modules;
use crate::error::Result;

/// Let the device apply its queued background requests
pub fn run(ctx: &Context) -> Result<()> {
    let report = ctx.backend.settle()?;

    if report.installed.is_empty() && report.uninstalled.is_empty() {
        println!("No background changes to apply.");
        return Ok(());
    }

    if !report.installed.is_empty() {
        println!(
            "{} {}",
            Style::new().bold().green().apply_to("Installed"),
            display_modules(&report.installed)
        );
    }
    if !report.uninstalled.is_empty() {
        println!(
            "{} {}",
            Style::new().bold().yellow().apply_to("Uninstalled"),
            display_modules(&report.uninstalled)
        );
    }
    Ok(())
}
