//! Launch command implementation

use console::Style;

use crate::cli::LaunchArgs;
use crate::commands::context::Context;
use crate::domain::ModuleName;
use crate::error::Result;
use crate::launcher::{EntryPoint, Presenter};
use crate::progress::ProgressDisplay;

/// Presenter that reports launches on stdout
#[derive(Default)]
pub struct TerminalPresenter<'a> {
    progress: Option<&'a ProgressDisplay>,
}

impl<'a> TerminalPresenter<'a> {
    /// Presenter that hides `progress` before opening anything
    pub fn with_progress(progress: &'a ProgressDisplay) -> Self {
        Self {
            progress: Some(progress),
        }
    }
}

impl Presenter for TerminalPresenter<'_> {
    fn clear_progress(&mut self) {
        if let Some(progress) = self.progress.take() {
            progress.clear();
        }
    }

    fn open(&mut self, module: &ModuleName, entry: &EntryPoint) {
        println!(
            "{} {} ({})",
            Style::new().bold().green().apply_to("Launching"),
            Style::new().bold().apply_to(module),
            entry
        );
    }
}

/// Run launch command
pub fn run(ctx: &Context, args: LaunchArgs) -> Result<()> {
    let module = ModuleName::new(args.module)?;
    ctx.coordinator
        .launch(&module, &mut TerminalPresenter::default())?;
    Ok(())
}
