use anyhow::Context;
use clap::{Parser, Subcommand};
use inquire::Password;
use outfit_core::{Advisor, Config, FileWardrobeStore, ProviderId, WardrobeStore};
use std::sync::Arc;
use tracing::info;

use crate::server;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "outfit", version, about = "Daily outfit advice from the weather forecast")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store the API key for a service.
    Configure {
        /// Service short name: "openweather" or "gemini".
        provider: String,
    },

    /// Print today's outfit advice for a location.
    Advise {
        /// Location as "<region>_<locality>", e.g. "Osaka_Sakai".
        location: String,
    },

    /// Manage the list of registered clothes.
    Wardrobe {
        #[command(subcommand)]
        action: WardrobeCommand,
    },

    /// Serve the HTTP API.
    Serve {
        /// Address to listen on; defaults to the configured `bind`.
        #[arg(long)]
        bind: Option<String>,
    },
}

#[derive(Debug, Subcommand)]
pub enum WardrobeCommand {
    /// Register a garment.
    Add { name: String },
    /// Show all registered garments.
    List,
    /// Remove a registered garment.
    Remove { name: String },
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        let mut config = Config::load()?;

        match self.command {
            Command::Configure { provider } => {
                let id = ProviderId::try_from(provider.as_str())?;
                let api_key = Password::new(&format!("API key for {id}:"))
                    .without_confirmation()
                    .prompt()
                    .context("Failed to read API key")?;

                config.upsert_provider_api_key(id, api_key.trim().to_string());
                config.save()?;
                println!("Saved API key for {id} to {}", Config::config_file_path()?.display());
            }
            Command::Advise { location } => {
                let advisor = Advisor::from_config(&config, wardrobe_store(&config))?;
                let rec = advisor.advise(&location).await?;

                println!("{}", rec.generated_text);
                if !rec.daily_icon_url.is_empty() {
                    println!("\n{}", rec.daily_icon_url);
                }
            }
            Command::Wardrobe { action } => {
                let store = FileWardrobeStore::new(config.wardrobe_path());
                let items = match action {
                    WardrobeCommand::Add { name } => store.append(&name)?,
                    WardrobeCommand::List => store.list_all()?,
                    WardrobeCommand::Remove { name } => store.remove(&name)?,
                };

                if items.is_empty() {
                    println!("No clothes registered.");
                }
                for item in items {
                    println!("{item}");
                }
            }
            Command::Serve { bind } => {
                let advisor = Advisor::from_config(&config, wardrobe_store(&config))?;
                let bind = bind.unwrap_or_else(|| config.bind.clone());
                info!("Wardrobe file: {}", config.wardrobe_path().display());
                server::serve(&bind, advisor).await?;
            }
        }

        Ok(())
    }
}

fn wardrobe_store(config: &Config) -> Arc<dyn WardrobeStore> {
    Arc::new(FileWardrobeStore::new(config.wardrobe_path()))
}
