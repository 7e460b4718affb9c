//! CLI argument parsing and command dispatch.
//!
//! The `pesticide` binary administers a workspace. Issues themselves are
//! filed and resolved over HTTP by `pesticide-server`.
//!
//! # Commands
//!
//! - `init`: Initialize a new workspace
//! - `info`: Show workspace information
//! - `user add` / `user list`: Manage user principals
//! - `token`: Mint a bearer token for a user
//!
//! # Global Flags
//!
//! - `--json`: Output in JSON format (applies to all commands)
//!
//! # Example
//!
//! ```bash
//! pesticide init --prefix BUG-
//! pesticide user add alice --admin --developer
//! pesticide token alice
//! ```

mod args;
mod execute;

use anyhow::Result;
use clap::{Parser, Subcommand};

pub use args::{InfoArgs, InitArgs, TokenArgs, UserAction, UserAddArgs, UserArgs};

/// Pesticide - a bug tracker with a public issue board
///
/// Administers the `.pesticide/` workspace that `pesticide-server` serves.
#[derive(Parser, Debug)]
#[command(name = "pesticide")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output in JSON format for programmatic use
    #[arg(long, global = true)]
    pub json: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Initialize a new workspace
    ///
    /// Creates `.pesticide/` with a configuration file, a generated token
    /// secret and an empty data directory.
    Init(InitArgs),

    /// Show workspace information
    ///
    /// Displays the data directory, tag prefix and record counts.
    Info(InfoArgs),

    /// Manage users
    User(UserArgs),

    /// Mint a bearer token for a user
    ///
    /// Prints a token to pass as `Authorization: Bearer <token>`.
    Token(TokenArgs),
}

impl Cli {
    /// Parse CLI arguments from command line
    #[must_use]
    pub fn parse_args() -> Self {
        <Self as Parser>::parse()
    }

    /// Parse CLI arguments from an iterator (for testing)
    ///
    /// # Errors
    ///
    /// Returns the clap error for invalid arguments.
    pub fn try_parse_from<I, T>(iter: I) -> std::result::Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        <Self as Parser>::try_parse_from(iter)
    }

    /// Execute the CLI command
    ///
    /// # Errors
    ///
    /// Returns any error raised by the command.
    pub async fn execute(&self) -> Result<()> {
        use crate::app::App;
        use crate::output::OutputMode;

        let output_mode = if self.json {
            OutputMode::Json
        } else {
            OutputMode::Text
        };

        match &self.command {
            Some(Commands::Init(args)) => execute::execute_init(args, output_mode).await,
            Some(Commands::Info(args)) => {
                let app = App::from_directory(&std::env::current_dir()?).await?;
                execute::execute_info(&app, args, output_mode).await
            }
            Some(Commands::User(args)) => {
                let app = App::from_directory(&std::env::current_dir()?).await?;
                execute::execute_user(&app, args, output_mode).await
            }
            Some(Commands::Token(args)) => {
                let app = App::from_directory(&std::env::current_dir()?).await?;
                execute::execute_token(&app, args, output_mode).await
            }
            None => {
                println!("Pesticide bug tracker");
                println!("Use --help for more information");
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_no_command() {
        let cli = Cli::try_parse_from(["pesticide"]).unwrap();
        assert!(cli.command.is_none());
        assert!(!cli.json);
    }

    #[test]
    fn test_parse_init_with_prefix() {
        let cli = Cli::try_parse_from(["pesticide", "init", "--prefix", "BUG-", "-q"]).unwrap();
        match cli.command {
            Some(Commands::Init(args)) => {
                assert_eq!(args.prefix.as_deref(), Some("BUG-"));
                assert!(args.quiet);
            }
            other => panic!("Expected init, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_init_rejects_bad_prefix() {
        assert!(Cli::try_parse_from(["pesticide", "init", "--prefix", "1x"]).is_err());
    }

    #[test]
    fn test_parse_user_add_flags() {
        let cli =
            Cli::try_parse_from(["pesticide", "user", "add", "alice", "--admin", "--json"]).unwrap();
        assert!(cli.json);
        match cli.command {
            Some(Commands::User(UserArgs {
                action: UserAction::Add(args),
            })) => {
                assert_eq!(args.username, "alice");
                assert!(args.admin);
                assert!(!args.developer);
            }
            other => panic!("Expected user add, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_user_list() {
        let cli = Cli::try_parse_from(["pesticide", "user", "list"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Commands::User(UserArgs {
                action: UserAction::List
            }))
        ));
    }

    #[test]
    fn test_parse_token_requires_username() {
        assert!(Cli::try_parse_from(["pesticide", "token"]).is_err());
        let cli = Cli::try_parse_from(["pesticide", "token", "bob"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Token(ref a)) if a.username == "bob"));
    }
}
