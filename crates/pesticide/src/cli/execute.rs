//! Command execution logic.

use anyhow::Result;

use super::args::{InfoArgs, InitArgs, TokenArgs, UserAction, UserArgs};
use crate::app::App;
use crate::output::{self, OutputMode};

/// Execute the init command
pub async fn execute_init(args: &InitArgs, output_mode: OutputMode) -> Result<()> {
    use crate::commands::init;

    let current_dir = std::env::current_dir()?;
    let result = init::init(&current_dir, args.prefix.as_deref()).await?;

    match output_mode {
        OutputMode::Json => {
            output::print_json(&serde_json::json!({
                "pesticide_dir": result.pesticide_dir.display().to_string(),
                "config_file": result.config_file.display().to_string(),
                "data_dir": result.data_dir.display().to_string(),
                "issue_prefix": result.prefix,
            }))?;
        }
        OutputMode::Text if !args.quiet => {
            println!("Initialized pesticide in {}", result.pesticide_dir.display());
            println!("  Config:     {}", result.config_file.display());
            println!("  Data:       {}", result.data_dir.display());
            println!("  Tag prefix: {}", result.prefix);
            println!();
            println!("Next: pesticide user add <name> --admin --developer");
        }
        OutputMode::Text => {}
    }

    Ok(())
}

/// Execute the info command
pub async fn execute_info(app: &App, _args: &InfoArgs, output_mode: OutputMode) -> Result<()> {
    let service = app.service();
    let issues = service.list_public_issues().await?;
    let users = service.list_users().await?;
    let storage = service.storage();
    let (categories, projects) = {
        let storage = storage.read().await;
        (
            storage.list_categories().await?.len(),
            storage.list_projects().await?.len(),
        )
    };

    let total = issues.len();
    let resolved = issues.iter().filter(|i| i.is_resolved).count();
    let private = issues.iter().filter(|i| i.is_private).count();
    let config = app.config();
    let data_dir = app.root_dir().join(&config.storage.data_dir);

    match output_mode {
        OutputMode::Json => {
            output::print_json(&serde_json::json!({
                "root": app.root_dir().display().to_string(),
                "backend": config.storage.backend,
                "data_dir": data_dir.display().to_string(),
                "issue_prefix": config.issue_prefix,
                "bind": config.server.bind,
                "issues": {
                    "total": total,
                    "open": total - resolved,
                    "resolved": resolved,
                    "private": private,
                },
                "categories": categories,
                "projects": projects,
                "users": users.len(),
            }))?;
        }
        OutputMode::Text => {
            println!("Pesticide Workspace Information");
            println!("===============================");
            println!();
            println!("Root:        {}", app.root_dir().display());
            println!("Storage:     {} ({})", config.storage.backend, data_dir.display());
            println!("Tag prefix:  {}", config.issue_prefix);
            println!("Server bind: {}", config.server.bind);
            println!();
            println!(
                "Issues: {total} total ({} open, {resolved} resolved, {private} private)",
                total - resolved
            );
            println!("Categories: {categories}  Projects: {projects}  Users: {}", users.len());
        }
    }

    Ok(())
}

/// Execute the user command
pub async fn execute_user(app: &App, args: &UserArgs, output_mode: OutputMode) -> Result<()> {
    use crate::commands::user;

    match &args.action {
        UserAction::Add(add) => {
            let created = user::add_user(app, &add.username, add.admin, add.developer).await?;
            if output_mode == OutputMode::Text {
                output::print_message("Registered user:")?;
            }
            output::print_user(&created, output_mode)?;
        }
        UserAction::List => {
            let users = app.service().list_users().await?;
            output::print_users(&users, output_mode)?;
        }
    }

    Ok(())
}

/// Execute the token command
pub async fn execute_token(app: &App, args: &TokenArgs, output_mode: OutputMode) -> Result<()> {
    use crate::commands::user;

    let (found, token) = user::mint_token(app, &args.username).await?;

    match output_mode {
        OutputMode::Json => {
            output::print_json(&serde_json::json!({
                "user": found.username,
                "token": token,
                "expires_in_hours": app.config().auth.token_ttl_hours,
            }))?;
        }
        OutputMode::Text => {
            println!("{token}");
        }
    }

    Ok(())
}
