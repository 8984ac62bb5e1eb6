use crate::{services::auth, Config, Database};
use anyhow::Result;
use std::path::Path;

use super::UserCommand;

fn prompt_new_password(label: &str) -> Result<String> {
    let password = rpassword::prompt_password(label)?;
    let confirm = rpassword::prompt_password("Confirm password: ")?;
    if password != confirm {
        anyhow::bail!("Passwords do not match");
    }
    Ok(password)
}

pub async fn run(config_path: &Path, command: UserCommand) -> Result<()> {
    let config = Config::load(config_path)?;
    let db = Database::open(&config.database.path)?;
    db.migrate()?;

    match command {
        UserCommand::Add {
            name,
            email,
            admin,
            password,
        } => {
            let password = match password {
                Some(p) => p,
                None => prompt_new_password("Password: ")?,
            };
            auth::create_user(&db, &name, &email, &password, admin)?;
            tracing::info!("User '{}' created", email);
        }
        UserCommand::List => {
            let users = auth::list_users(&db)?;
            println!("{:<6} {:<24} {:<32} {:<6}", "ID", "NAME", "EMAIL", "ADMIN");
            println!("{}", "-".repeat(70));
            for user in users {
                println!(
                    "{:<6} {:<24} {:<32} {:<6}",
                    user.id,
                    user.name,
                    user.email,
                    if user.is_admin { "yes" } else { "no" }
                );
            }
        }
        UserCommand::Remove { email } => {
            if auth::delete_user_by_email(&db, &email)? {
                tracing::info!("User '{}' removed", email);
            } else {
                tracing::warn!("User '{}' not found", email);
            }
        }
        UserCommand::Passwd { email } => {
            let password = prompt_new_password("New password: ")?;
            if auth::update_password(&db, &email, &password)? {
                tracing::info!("Password updated for '{}'", email);
            } else {
                anyhow::bail!("User '{}' not found", email);
            }
        }
    }

    Ok(())
}
