use std::path::PathBuf;

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use docvault_core::app::DocVault;
use docvault_core::storage::JsonFileStore;
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "docvault")]
#[command(about = "Personal document keeper with an encrypted vault", long_about = None)]
struct Cli {
    /// Override the data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// One-time setup: create the profile, optionally enable the vault
    Setup {
        /// Display name for the profile
        #[arg(default_value = "")]
        name: String,

        /// Enable the encrypted vault (prompts for a password)
        #[arg(long)]
        vault: bool,
    },

    /// Show profile, counts, and vault status
    Status,

    /// Change the profile display name
    Rename { name: String },

    /// Add a document
    Add {
        title: String,

        #[arg(default_value = "")]
        content: String,

        /// Store in the encrypted vault instead of the normal collection
        #[arg(long)]
        vault: bool,
    },

    /// List documents, optionally filtered by a title search term
    List {
        #[arg(short, long, default_value = "")]
        search: String,

        #[arg(long)]
        vault: bool,
    },

    /// Edit a document by id
    Edit {
        id: Uuid,
        title: String,

        #[arg(default_value = "")]
        content: String,

        #[arg(long)]
        vault: bool,
    },

    /// Delete a document by id
    Delete {
        id: Uuid,

        #[arg(long)]
        vault: bool,
    },

    /// Write the encrypted vault envelope to a file
    Export { output: PathBuf },

    /// Replace the vault with an exported envelope file (locks the vault)
    Import { input: PathBuf },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();

    let store = match &cli.data_dir {
        Some(dir) => JsonFileStore::open(dir)?,
        None => JsonFileStore::open_default()?,
    };

    if let Commands::Setup { name, vault } = &cli.command {
        return setup(store, name, *vault);
    }

    let mut app = DocVault::load(store)?
        .ok_or_else(|| anyhow!("no profile found; run `docvault setup` first"))?;

    match cli.command {
        Commands::Setup { .. } => unreachable!("handled above"),

        Commands::Status => {
            let profile = app.profile();
            println!("Profile:  {} ({})", profile.display_name, profile.serial_id);
            println!("Vault:    {}", if profile.vault_enabled { "enabled" } else { "disabled" });
            println!("Normal documents:    {}", app.normal_count());
            println!("Protected documents: {}", app.vault_count());
        }

        Commands::Rename { name } => {
            app.set_display_name(&name)?;
            println!("Display name updated.");
        }

        Commands::Add { title, content, vault } => {
            if vault {
                unlock(&mut app)?;
                let id = app.vault_create(&title, &content)?;
                println!("Added to vault: {id}");
            } else {
                let id = app.normal_create(&title, &content)?;
                println!("Added: {id}");
            }
        }

        Commands::List { search, vault } => {
            if vault {
                unlock(&mut app)?;
                print_documents(&app.vault_search(&search)?);
            } else {
                print_documents(&app.normal_search(&search));
            }
        }

        Commands::Edit { id, title, content, vault } => {
            if vault {
                unlock(&mut app)?;
                app.vault_update(id, &title, &content)?;
            } else {
                app.normal_update(id, &title, &content)?;
            }
            println!("Updated {id}");
        }

        Commands::Delete { id, vault } => {
            if vault {
                unlock(&mut app)?;
                app.vault_delete(id)?;
            } else {
                app.normal_delete(id)?;
            }
            println!("Deleted {id}");
        }

        Commands::Export { output } => {
            let bytes = app.export_vault()?;
            std::fs::write(&output, bytes)?;
            println!("Vault exported to {}", output.display());
        }

        Commands::Import { input } => {
            let bytes = std::fs::read(&input)?;
            app.import_vault(&bytes)?;
            println!("Vault imported. Unlock with its original password.");
        }
    }

    Ok(())
}

fn setup(store: JsonFileStore, name: &str, enable_vault: bool) -> Result<()> {
    let password = if enable_vault {
        let first = rpassword::prompt_password("Vault password: ")
            .map_err(|e| anyhow!("password prompt: {e}"))?;
        let second = rpassword::prompt_password("Confirm password: ")
            .map_err(|e| anyhow!("password prompt: {e}"))?;
        if first != second {
            return Err(anyhow!("passwords do not match"));
        }
        Some(first)
    } else {
        None
    };

    let app = DocVault::setup(store, name, password.as_deref())?;
    let profile = app.profile();
    println!(
        "Profile created: {} ({}), vault {}",
        profile.display_name,
        profile.serial_id,
        if profile.vault_enabled { "enabled" } else { "disabled" }
    );
    Ok(())
}

fn unlock(app: &mut DocVault<JsonFileStore>) -> Result<()> {
    let password = rpassword::prompt_password("Vault password: ")
        .map_err(|e| anyhow!("password prompt: {e}"))?;
    app.unlock_vault(&password)?;
    Ok(())
}

fn print_documents(documents: &[&docvault_core::Document]) {
    if documents.is_empty() {
        println!("No documents.");
        return;
    }
    for doc in documents {
        let title = if doc.title.is_empty() { "(No title)" } else { &doc.title };
        println!("{}  {}  [{}]", doc.id, title, doc.updated_at.format("%Y-%m-%d %H:%M"));
        if !doc.content.is_empty() {
            println!("    {}", doc.content);
        }
    }
}
