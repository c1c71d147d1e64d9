mod cli;
mod commands;
mod config;
mod navigator;
mod observability;
mod output;

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use colored::Colorize;
use portal_client::{
    CatalogStore, ClientConfig, ClientContext, FileCredentialStore, HttpClient, Method,
    build_client,
};

use cli::{CatalogCommands, Cli, Commands};
use navigator::TerminalNavigator;
use output::print_error;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        print_error(&format!("{e:#}"));
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    observability::init_tracing(cli.verbose);

    let profile = &cli.profile;
    let profile_cfg = config::load_profile(profile)?;
    let format = cli.format.unwrap_or_else(|| profile_cfg.output_format());
    let client_cfg = config::client_config(&cli.server, &profile_cfg, cli.no_cache)?;
    let store = Arc::new(FileCredentialStore::for_profile(profile)?);

    match &cli.command {
        Commands::Login(args) => {
            commands::auth::login(store.as_ref(), &args.token, &client_cfg.base_url)?;
        }
        Commands::Logout => {
            commands::auth::logout(store.as_ref(), profile)?;
        }
        Commands::Whoami => {
            commands::auth::whoami(store.as_ref(), profile, &client_cfg.base_url)?;
        }
        Commands::Get(args) => {
            let client = make_client(&client_cfg, store, profile)?;
            commands::request::get(client.as_ref(), &args.path, &args.params, format).await?;
        }
        Commands::Delete(args) => {
            let client = make_client(&client_cfg, store, profile)?;
            commands::request::delete(client.as_ref(), &args.path, &args.params, format).await?;
        }
        Commands::Post(args) => {
            let client = make_client(&client_cfg, store, profile)?;
            commands::request::write(client.as_ref(), Method::POST, &args.path, &args.file, format)
                .await?;
        }
        Commands::Put(args) => {
            let client = make_client(&client_cfg, store, profile)?;
            commands::request::write(client.as_ref(), Method::PUT, &args.path, &args.file, format)
                .await?;
        }
        Commands::Patch(args) => {
            let client = make_client(&client_cfg, store, profile)?;
            commands::request::write(client.as_ref(), Method::PATCH, &args.path, &args.file, format)
                .await?;
        }
        Commands::Catalog(args) => {
            let catalog = CatalogStore::default();
            match &args.command {
                CatalogCommands::List { service } => {
                    commands::catalog::list(&catalog, service.as_deref(), format)?;
                }
                CatalogCommands::Estimate { service, features } => {
                    commands::catalog::estimate(&catalog, service, features, format)?;
                }
            }
        }
        Commands::Config(args) => match &args.command {
            cli::ConfigCommands::Show => {
                println!("{}: {}", "Profile".cyan(), profile);
                println!("{}: {}", "Server".cyan(), client_cfg.base_url);
                println!(
                    "{}: {}",
                    "Format".cyan(),
                    profile_cfg.format.as_deref().unwrap_or("json")
                );
                println!("{}: {:?}", "Strategy".cyan(), client_cfg.strategy);
                println!("{}: {}s", "Cache TTL".cyan(), client_cfg.cache.ttl_secs);
            }
            cli::ConfigCommands::Set(set_args) => {
                let mut cfg = profile_cfg.clone();
                cfg.set(&set_args.key, &set_args.value)?;
                config::save_profile(profile, &cfg)?;
                output::print_success(&format!("Set {} = {}", set_args.key, set_args.value));
            }
        },
    }

    Ok(())
}

fn make_client(
    config: &ClientConfig,
    store: Arc<FileCredentialStore>,
    profile: &str,
) -> Result<Arc<dyn HttpClient>> {
    let ctx = ClientContext::new(store, Arc::new(TerminalNavigator::new(profile)));
    Ok(build_client(config, ctx)?)
}
