//! List command implementation
//!
//! Lists configured modules with their size, entry point and install state,
//! including background requests the device has not applied yet.

use console::Style;
use indicatif::HumanBytes;

use crate::backend::state::{DeferredRequest, DeviceState};
use crate::commands::context::Context;
use crate::config::ModuleConfig;
use crate::error::Result;

/// Run list command
pub fn run(ctx: &Context) -> Result<()> {
    let device = ctx.backend.device_state();
    let modules = &ctx.config.modules;

    if modules.is_empty() {
        println!("No modules configured.");
        return Ok(());
    }

    println!("Modules ({}):", modules.len());
    println!();

    for module in modules {
        display_module(ctx, module, &device);
        println!();
    }

    Ok(())
}

fn display_module(ctx: &Context, module: &ModuleConfig, device: &DeviceState) {
    let installed = ctx.coordinator.is_installed(&module.name);
    let state = if installed {
        Style::new().green().apply_to("installed")
    } else {
        Style::new().dim().apply_to("not installed")
    };
    let pending = match device.pending_for(&module.name) {
        Some(DeferredRequest::Install { .. }) => ", install pending",
        Some(DeferredRequest::Uninstall { .. }) => ", uninstall pending",
        None => "",
    };

    println!(
        "  {}: {state}{pending}",
        Style::new().bold().yellow().apply_to(&module.name)
    );
    println!(
        "    {} {}",
        Style::new().bold().apply_to("Size:"),
        HumanBytes(module.size)
    );
    if let Some(entry) = &module.entry {
        println!("    {} {}", Style::new().bold().apply_to("Entry:"), entry);
    }
}
