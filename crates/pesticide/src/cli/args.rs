//! CLI argument structs for all commands.

use clap::{Parser, Subcommand};

/// Arguments for the `init` command
#[derive(Parser, Debug, Clone)]
pub struct InitArgs {
    /// Issue tag prefix (e.g., "PST-" for "PST-12")
    ///
    /// Up to 20 characters: a letter followed by letters, digits, '-' or '_'.
    #[arg(short, long, value_parser = parse_prefix)]
    pub prefix: Option<String>,

    /// Suppress output messages
    #[arg(short, long)]
    pub quiet: bool,
}

/// Arguments for the `info` command
#[derive(Parser, Debug, Clone)]
pub struct InfoArgs {}

/// Arguments for the `user` command
#[derive(Parser, Debug, Clone)]
pub struct UserArgs {
    /// User action
    #[command(subcommand)]
    pub action: UserAction,
}

/// User subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum UserAction {
    /// Register a user
    Add(UserAddArgs),

    /// List registered users
    List,
}

/// Arguments for `user add`
#[derive(Parser, Debug, Clone)]
pub struct UserAddArgs {
    /// Login name (unique, case-insensitive)
    pub username: String,

    /// Allow managing categories and projects
    #[arg(long)]
    pub admin: bool,

    /// Allow resolving issues
    #[arg(long)]
    pub developer: bool,
}

/// Arguments for the `token` command
#[derive(Parser, Debug, Clone)]
pub struct TokenArgs {
    /// User to mint the token for
    pub username: String,
}

fn parse_prefix(s: &str) -> Result<String, String> {
    let prefix = s.trim();
    crate::config::validate_prefix(prefix).map_err(|e| e.to_string())?;
    Ok(prefix.to_string())
}
