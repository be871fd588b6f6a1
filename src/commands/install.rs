//! Install command implementation
//!
//! Requests an install session, follows it to a terminal state while showing
//! progress, asks the user to confirm large downloads and launches the
//! modules once the coordinator signals they are ready.

use std::collections::BTreeSet;
use std::io::IsTerminal;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::time::Duration;

use console::{Style, Term};
use indicatif::HumanBytes;
use inquire::Confirm;
use tracing::debug;

use crate::cli::InstallArgs;
use crate::commands::context::Context;
use crate::commands::launch::TerminalPresenter;
use crate::domain::{
    Confirmation, InstallSession, ModuleName, SessionId, SessionStatus, display_modules,
    parse_module_set,
};
use crate::error::{DeliveryError, Result, session_canceled, session_failed, session_stalled};
use crate::events::{ReadyToLaunch, SessionListener};
use crate::progress::ProgressDisplay;

/// Give up when a session reports nothing for this long
const STALL_TIMEOUT: Duration = Duration::from_secs(60);

enum Event {
    Changed(InstallSession),
    Ready(ReadyToLaunch),
}

/// Forwards coordinator events to the command's thread
struct ChannelListener {
    tx: Sender<Event>,
}

impl SessionListener for ChannelListener {
    fn on_session_changed(&self, session: &InstallSession) {
        let _ = self.tx.send(Event::Changed(session.clone()));
    }

    fn on_ready_to_launch(&self, ready: &ReadyToLaunch) {
        let _ = self.tx.send(Event::Ready(ready.clone()));
    }
}

/// Run install command
pub fn run(ctx: &Context, args: InstallArgs) -> Result<()> {
    let modules = parse_module_set(&args.modules)?;

    let (tx, rx) = mpsc::channel();
    let listener = Arc::new(ChannelListener { tx });
    let subscription = ctx.coordinator.subscribe(&listener);

    let result = ctx
        .coordinator
        .request_install_many(modules.clone())
        .and_then(|session_id| follow(ctx, &args, &modules, session_id, &rx));

    ctx.coordinator.unsubscribe(subscription);
    ctx.backend.wait_idle();
    result
}

/// Process events of `session_id` until it is installed, launched or over
fn follow(
    ctx: &Context,
    args: &InstallArgs,
    modules: &BTreeSet<ModuleName>,
    session_id: SessionId,
    events: &Receiver<Event>,
) -> Result<()> {
    let label = display_modules(modules);
    let mut progress = if Term::stderr().is_term() {
        ProgressDisplay::new(&label)
    } else {
        ProgressDisplay::hidden(&label)
    };
    let launch_wanted = !args.no_launch && ctx.coordinator.launcher_table().covers(modules);

    loop {
        let event = match events.recv_timeout(STALL_TIMEOUT) {
            Ok(event) => event,
            Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => {
                progress.abandon();
                return Err(session_stalled(session_id.to_string()));
            }
        };

        match event {
            Event::Changed(session) if session.session_id == session_id => {
                progress.update(&session);
                match session.status {
                    SessionStatus::RequiresUserConfirmation => {
                        let Some(handle) = session.resolution_handle.as_ref() else {
                            continue;
                        };
                        let decision = match confirm(ctx, args, modules, &progress) {
                            Ok(decision) => decision,
                            Err(e) => {
                                // release the waiting session before bailing out
                                let _ = ctx
                                    .coordinator
                                    .resolve_confirmation(handle, Confirmation::Declined);
                                return Err(e);
                            }
                        };
                        ctx.coordinator.resolve_confirmation(handle, decision)?;
                    }
                    SessionStatus::Installed => {
                        if !launch_wanted {
                            progress.clear();
                            report_installed(&label, session_id);
                            return Ok(());
                        }
                    }
                    SessionStatus::Failed => {
                        progress.abandon();
                        return Err(session_failed(&label, session.error_code.unwrap_or_default()));
                    }
                    SessionStatus::Canceled => {
                        progress.clear();
                        return Err(session_canceled(&label));
                    }
                    _ => {}
                }
            }
            Event::Ready(ready) if ready.session_id == session_id => {
                report_installed(&label, session_id);
                let mut presenter = TerminalPresenter::with_progress(&progress);
                for module in &ready.module_names {
                    ctx.coordinator.launch(module, &mut presenter)?;
                }
                return Ok(());
            }
            _ => debug!("ignoring event for another session"),
        }
    }
}

fn confirm(
    ctx: &Context,
    args: &InstallArgs,
    modules: &BTreeSet<ModuleName>,
    progress: &ProgressDisplay,
) -> Result<Confirmation> {
    if args.yes {
        return Ok(Confirmation::Accepted);
    }
    if !std::io::stdin().is_terminal() {
        return Err(DeliveryError::PromptFailed {
            message: "large downloads need an interactive terminal, pass --yes to accept"
                .to_string(),
        });
    }

    let question = format!(
        "Download {} ({})?",
        display_modules(modules),
        HumanBytes(ctx.download_size(modules))
    );
    let accepted = progress.suspend(|| {
        Confirm::new(&question)
            .with_default(true)
            .with_help_message("Large download. Press Enter to confirm, or 'n' to cancel")
            .prompt()
    })?;

    Ok(if accepted {
        Confirmation::Accepted
    } else {
        Confirmation::Declined
    })
}

fn report_installed(label: &str, session_id: SessionId) {
    let status = if session_id.is_synthetic() {
        "Already installed"
    } else {
        "Installed"
    };
    println!("{} {}", Style::new().bold().green().apply_to(status), label);
}
