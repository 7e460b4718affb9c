//! Output formatting for CLI commands.
//!
//! Every printer writes either human-readable text or pretty JSON.

use crate::domain::User;
use colored::Colorize;
use serde::Serialize;
use std::io::{self, Write};

/// Output format mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Human-readable text format
    Text,
    /// JSON format for programmatic use
    Json,
}

/// Role badges shown next to a username.
fn role_badges(user: &User) -> String {
    let mut badges = Vec::new();
    if user.is_admin {
        badges.push("admin".red().bold().to_string());
    }
    if user.is_developer {
        badges.push("developer".yellow().to_string());
    }
    if badges.is_empty() {
        "reporter".dimmed().to_string()
    } else {
        badges.join(", ")
    }
}

/// Print one user in the specified format
pub fn print_user(user: &User, mode: OutputMode) -> io::Result<()> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();

    match mode {
        OutputMode::Text => print_user_text(&mut handle, user),
        OutputMode::Json => write_json(&mut handle, user),
    }
}

/// Print a list of users in the specified format
pub fn print_users(users: &[User], mode: OutputMode) -> io::Result<()> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();

    match mode {
        OutputMode::Text => print_users_text(&mut handle, users),
        OutputMode::Json => write_json(&mut handle, &users),
    }
}

/// Print a simple message
pub fn print_message(msg: &str) -> io::Result<()> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    writeln!(handle, "{msg}")
}

/// Print a JSON-formatted result for any serializable value
pub fn print_json<T: Serialize>(value: &T) -> io::Result<()> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    write_json(&mut handle, value)
}

fn write_json<W: Write, T: Serialize + ?Sized>(w: &mut W, value: &T) -> io::Result<()> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    writeln!(w, "{json}")
}

fn print_user_text<W: Write>(w: &mut W, user: &User) -> io::Result<()> {
    writeln!(
        w,
        "{} {} [{}]",
        user.id.as_str().cyan(),
        user.username.bold(),
        role_badges(user)
    )
}

fn print_users_text<W: Write>(w: &mut W, users: &[User]) -> io::Result<()> {
    if users.is_empty() {
        return writeln!(w, "No users registered. Add one with 'pesticide user add <name>'");
    }

    let noun = if users.len() == 1 { "user" } else { "users" };
    writeln!(w, "Found {} {noun}:", users.len())?;
    writeln!(w)?;
    for user in users {
        write!(w, "  ")?;
        print_user_text(w, user)?;
    }
    Ok(())
}
