//! The `schoolhub school` command.

use std::path::Path;

use anyhow::{Context, Result};
use clap::Subcommand;
use schoolhub_core::model::School;
use schoolhub_core::requests::{AdminDraft, SchoolDraft};
use schoolhub_core::traits::SchoolApi;
use schoolhub_core::validation::{ensure_valid, validate_school, validate_school_name};

use super::connect;

#[derive(Subcommand)]
pub enum SchoolAction {
    /// Show the current school
    Show,

    /// Create a school with its first admin account
    Create {
        #[arg(long)]
        name: String,

        #[arg(long)]
        admin_first_name: String,

        #[arg(long)]
        admin_last_name: String,

        #[arg(long)]
        admin_email: String,

        #[arg(long)]
        admin_password: String,
    },

    /// Block an active school, or unblock a blocked one
    Toggle {
        id: String,

        /// Reason recorded when blocking
        #[arg(long)]
        reason: Option<String>,
    },

    /// Rename a school
    Rename {
        id: String,

        #[arg(long)]
        name: String,
    },
}

pub async fn execute(config_path: Option<&Path>, action: SchoolAction) -> Result<()> {
    match action {
        SchoolAction::Show => {
            let (_, client) = connect(config_path)?;
            let school = client
                .current_school()
                .await
                .context("failed to load school")?;
            print_school(&school);
        }

        SchoolAction::Create {
            name,
            admin_first_name,
            admin_last_name,
            admin_email,
            admin_password,
        } => {
            let draft = SchoolDraft {
                name,
                admin: AdminDraft {
                    first_name: admin_first_name,
                    last_name: admin_last_name,
                    email: admin_email,
                    password: admin_password,
                },
            };
            ensure_valid(validate_school(&draft))?;
            let (_, client) = connect(config_path)?;
            let school = client
                .create_school(&draft)
                .await
                .context("failed to create school")?;
            println!("Created school {}", school.id);
            print_school(&school);
        }

        SchoolAction::Toggle { id, reason } => {
            let (_, client) = connect(config_path)?;
            let school = client
                .toggle_block(&id, reason.as_deref())
                .await
                .with_context(|| format!("failed to update school {id}"))?;
            tracing::info!(school_id = %id, blocked = school.is_blocked(), "school status changed");
            print_school(&school);
        }

        SchoolAction::Rename { id, name } => {
            ensure_valid(validate_school_name(&name))?;
            let (_, client) = connect(config_path)?;
            let school = client
                .rename_school(&id, &name)
                .await
                .with_context(|| format!("failed to rename school {id}"))?;
            print_school(&school);
        }
    }
    Ok(())
}

fn print_school(school: &School) {
    println!("{} ({})", school.name, school.id);
    if school.is_blocked() {
        match &school.block_reason {
            Some(reason) => println!("Status: blocked ({reason})"),
            None => println!("Status: blocked"),
        }
    } else {
        println!("Status: active");
    }
    if let Some(admin) = &school.admin {
        let name = admin
            .embedded()
            .map_or_else(|| admin.resolve_id().to_string(), |a| a.display_name());
        println!("Admin: {name}");
    }
}
