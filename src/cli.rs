//! CLI definitions using clap derive API

use clap::builder::{Styles, styling::AnsiColor};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// ondemand - on-demand module delivery
///
/// Install, launch and remove feature modules through a simulated device.
#[derive(Parser, Debug)]
#[command(
    name = "ondemand",
    author,
    version,
    styles = Styles::styled()
        .header(AnsiColor::Green.on_default().bold())
        .usage(AnsiColor::Green.on_default().bold())
        .literal(AnsiColor::Cyan.on_default().bold())
        .placeholder(AnsiColor::Cyan.on_default()),
    about = "On-demand module delivery",
    long_about = "ondemand installs feature modules on demand, tracks each install session \
                  from request to completion, asks for confirmation on large downloads and \
                  launches modules once they are installed. Background installs and \
                  uninstalls are queued and applied later by the device.",
    after_help = "\x1b[1m\x1b[32mExamples:\x1b[0m\n    \
                  ondemand install image_feature\n    \
                  ondemand install image_large_feature --yes\n    \
                  ondemand launch image_feature\n    \
                  ondemand defer-uninstall\n    \
                  ondemand settle\n    \
                  ondemand list"
)]
pub struct Cli {
    /// Configuration file (defaults to ./ondemand.yaml, then built-in modules)
    #[arg(long, global = true, env = "ONDEMAND_CONFIG", value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Directory holding the simulated device state
    #[arg(long, global = true, env = "ONDEMAND_STATE_DIR", value_name = "PATH")]
    pub state_dir: Option<PathBuf>,

    /// Enable verbose output
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Install modules now and launch them when ready
    Install(InstallArgs),

    /// Launch an installed module
    Launch(LaunchArgs),

    /// Queue a background install
    DeferInstall(DeferredArgs),

    /// Queue a background uninstall
    DeferUninstall(DeferredArgs),

    /// Apply queued background requests
    Settle,

    /// List modules and their install state
    List,

    /// Show version information
    Version,

    /// Generate shell completions
    Completions(CompletionsArgs),
}

/// Arguments for the install command
#[derive(Parser, Debug)]
#[command(after_help = "EXAMPLES:\n  \
                   Install and launch a module:\n    ondemand install image_feature\n\n\
                   Install several modules in one session:\n    ondemand install image_feature image_large_feature\n\n\
                   Accept a large download without prompting:\n    ondemand install image_large_feature --yes\n\n\
                   Install without launching:\n    ondemand install image_feature --no-launch")]
pub struct InstallArgs {
    /// Modules to install
    #[arg(required = true, value_name = "MODULE")]
    pub modules: Vec<String>,

    /// Accept large downloads without prompting
    #[arg(long, short = 'y')]
    pub yes: bool,

    /// Do not launch once installed
    #[arg(long)]
    pub no_launch: bool,
}

/// Arguments for the launch command
#[derive(Parser, Debug)]
pub struct LaunchArgs {
    /// Module to launch
    #[arg(value_name = "MODULE")]
    pub module: String,
}

/// Arguments for defer-install and defer-uninstall
#[derive(Parser, Debug)]
#[command(after_help = "EXAMPLES:\n  \
                  Queue every known module:\n    ondemand defer-install\n\n\
                  Queue removal of one module:\n    ondemand defer-uninstall image_feature")]
pub struct DeferredArgs {
    /// Modules (defaults to every module the command applies to)
    #[arg(value_name = "MODULE")]
    pub modules: Vec<String>,
}

/// Arguments for completions command
#[derive(Parser, Debug)]
#[command(after_help = "EXAMPLES:\n  \
                  Generate bash completions:\n    ondemand completions --shell bash > ~/.bash_completion.d/ondemand\n\n\
                  Generate zsh completions:\n    ondemand completions --shell zsh > ~/.zfunc/_ondemand\n\n\
                  Generate fish completions:\n    ondemand completions --shell fish > ~/.config/fish/completions/ondemand.fish")]
pub struct CompletionsArgs {
    /// Shell type (bash, elvish, fish, powershell, zsh)
    #[arg(long)]
    pub shell: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parsing_install() {
        let cli = Cli::try_parse_from(["ondemand", "install", "image_feature"]).unwrap();
        match cli.command {
            Commands::Install(args) => {
                assert_eq!(args.modules, vec!["image_feature"]);
                assert!(!args.yes);
                assert!(!args.no_launch);
            }
            _ => panic!("Expected Install command"),
        }
    }

    #[test]
    fn test_cli_parsing_install_requires_module() {
        assert!(Cli::try_parse_from(["ondemand", "install"]).is_err());
    }

    #[test]
    fn test_cli_parsing_install_with_options() {
        let cli = Cli::try_parse_from([
            "ondemand",
            "install",
            "image_feature",
            "image_large_feature",
            "-y",
            "--no-launch",
        ])
        .unwrap();
        match cli.command {
            Commands::Install(args) => {
                assert_eq!(args.modules.len(), 2);
                assert!(args.yes);
                assert!(args.no_launch);
            }
            _ => panic!("Expected Install command"),
        }
    }

    #[test]
    fn test_cli_parsing_deferred_defaults_to_empty() {
        let cli = Cli::try_parse_from(["ondemand", "defer-uninstall"]).unwrap();
        match cli.command {
            Commands::DeferUninstall(args) => assert!(args.modules.is_empty()),
            _ => panic!("Expected DeferUninstall command"),
        }
    }

    #[test]
    fn test_cli_parsing_global_options() {
        let cli = Cli::try_parse_from([
            "ondemand",
            "list",
            "--state-dir",
            "/tmp/device",
            "--config",
            "custom.yaml",
            "-v",
        ])
        .unwrap();
        assert!(matches!(cli.command, Commands::List));
        assert_eq!(cli.state_dir, Some(PathBuf::from("/tmp/device")));
        assert_eq!(cli.config, Some(PathBuf::from("custom.yaml")));
        assert!(cli.verbose);
    }

    #[test]
    fn test_cli_parsing_launch() {
        let cli = Cli::try_parse_from(["ondemand", "launch", "image_feature"]).unwrap();
        match cli.command {
            Commands::Launch(args) => assert_eq!(args.module, "image_feature"),
            _ => panic!("Expected Launch command"),
        }
    }

    #[test]
    fn test_cli_parsing_completions() {
        let cli = Cli::try_parse_from(["ondemand", "completions", "--shell", "zsh"]).unwrap();
        match cli.command {
            Commands::Completions(args) => assert_eq!(args.shell, "zsh"),
            _ => panic!("Expected Completions command"),
        }
    }
}
