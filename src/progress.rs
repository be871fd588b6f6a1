//! Progress bar display for install sessions

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

use crate::domain::{InstallSession, SessionStatus};

/// Progress display for one install session
pub struct ProgressDisplay {
    bar: ProgressBar,
    /// Whether the byte total is known and the bar shows a download
    sized: bool,
}

impl ProgressDisplay {
    /// Create a spinner until the download size is known
    pub fn new(modules: &str) -> Self {
        Self::with_bar(ProgressBar::new_spinner(), modules)
    }

    /// Display that draws nothing, for non-interactive output
    pub fn hidden(modules: &str) -> Self {
        Self::with_bar(
            ProgressBar::with_draw_target(None, ProgressDrawTarget::hidden()),
            modules,
        )
    }

    fn with_bar(bar: ProgressBar, modules: &str) -> Self {
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        bar.set_message(format!("{modules}: pending"));
        Self { bar, sized: false }
    }

    /// Reflect the latest session state
    pub fn update(&mut self, session: &InstallSession) {
        let modules = session.modules_label();
        match session.status {
            SessionStatus::Downloading if session.total_bytes > 0 => {
                if !self.sized {
                    self.bar.set_style(
                        ProgressStyle::with_template(
                            "[{bar:40.cyan/blue}] {bytes}/{total_bytes} {msg}",
                        )
                        .unwrap_or_else(|_| ProgressStyle::default_bar())
                        .progress_chars("#>-"),
                    );
                    self.sized = true;
                }
                self.bar.set_length(session.total_bytes);
                self.bar.set_position(session.bytes_downloaded);
                self.bar.set_message(format!("{modules}: downloading"));
            }
            status => {
                self.bar.set_message(format!("{modules}: {status}"));
                self.bar.tick();
            }
        }
    }

    /// Hide the bar, e.g. before launching or prompting
    pub fn clear(&self) {
        self.bar.finish_and_clear();
    }

    /// Suspend drawing while `f` writes to the terminal
    pub fn suspend<R>(&self, f: impl FnOnce() -> R) -> R {
        self.bar.suspend(f)
    }

    /// Abandon on error
    pub fn abandon(&self) {
        self.bar.abandon();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ModuleName, SessionId};

    fn session() -> InstallSession {
        InstallSession::pending(
            SessionId::Assigned(1),
            [ModuleName::unchecked("image_feature")].into(),
        )
    }

    #[test]
    fn test_download_switches_to_sized_bar() {
        let mut display = ProgressDisplay::hidden("image_feature");
        let base = session();

        display.update(&base);
        assert!(!display.sized);

        display.update(&base.downloading(10, 100));
        assert!(display.sized);
        assert_eq!(display.bar.length(), Some(100));
        assert_eq!(display.bar.position(), 10);

        display.update(&base.with_status(SessionStatus::Installing));
        assert_eq!(display.bar.position(), 10);
        display.clear();
    }
}
