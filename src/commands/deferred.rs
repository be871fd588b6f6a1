//! Deferred install and uninstall commands
//!
//! Both only queue work on the device. Nothing changes until the device
//! applies the queue (`ondemand settle`).

use console::Style;

use crate::cli::DeferredArgs;
use crate::commands::context::Context;
use crate::domain::{display_modules, parse_module_set};
use crate::error::Result;

/// Run defer-install command; defaults to every configured module
pub fn run_install(ctx: &Context, args: DeferredArgs) -> Result<()> {
    let requested = ctx.modules_or(&args.modules, || ctx.config.module_names())?;
    ctx.require_known(&requested)?;

    let queued = ctx.coordinator.request_deferred_install(&requested);
    if queued.is_empty() {
        println!("Nothing to install: {} already installed", display_modules(&requested));
    } else {
        print_queued("install", &display_modules(&queued));
    }
    Ok(())
}

/// Run defer-uninstall command; defaults to every installed module
pub fn run_uninstall(ctx: &Context, args: DeferredArgs) -> Result<()> {
    if args.modules.is_empty() {
        let queued = ctx.coordinator.request_uninstall_all();
        if queued.is_empty() {
            println!("Nothing to uninstall: no modules installed");
        } else {
            print_queued("uninstall", &display_modules(&queued));
        }
        return Ok(());
    }

    let requested = parse_module_set(&args.modules)?;
    let queued = ctx.coordinator.request_deferred_uninstall(&requested);
    if queued.is_empty() {
        println!("Nothing to uninstall: {} not installed", display_modules(&requested));
    } else {
        print_queued("uninstall", &display_modules(&queued));
    }
    Ok(())
}

fn print_queued(kind: &str, modules: &str) {
    println!(
        "{} background {kind} of {modules}",
        Style::new().bold().cyan().apply_to("Queued")
    );
    println!("Run 'ondemand settle' to let the device apply it");
}
