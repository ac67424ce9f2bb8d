//! `quill` - personal Markdown web journal
//!
//! This binary provides the command-line interface for running the journal
//! server and managing its database and configuration.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use anyhow::Result;
use clap::Parser;

use quill::cli::{Cli, Command, ConfigCommand, InitDbCommand, ServeCommand};
use quill::web::Server;
use quill::{init_logging, Config, Storage};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    init_logging(cli.verbosity());

    // Load configuration
    let config = Config::load_from(cli.config.clone())?;

    // Execute the command
    match cli.command {
        Command::Serve(cmd) => handle_serve(config, cmd).await,
        Command::InitDb(cmd) => handle_init_db(&config, &cmd),
        Command::Status(cmd) => handle_status(&config, cmd.json),
        Command::Config(cmd) => handle_config(&config, cmd),
    }
}

async fn handle_serve(mut config: Config, cmd: ServeCommand) -> Result<()> {
    if let Some(bind) = cmd.bind {
        config.server.bind = bind;
    }

    let storage = Storage::open(config.database_path())?;
    let server = Server::new(config, storage)?;
    server.run().await?;
    Ok(())
}

fn handle_init_db(config: &Config, cmd: &InitDbCommand) -> Result<()> {
    let path = config.database_path();
    let storage = Storage::open(&path)?;

    if cmd.force {
        storage.reset()?;
        println!("Database reset: {}", path.display());
    } else {
        println!("Database ready: {}", path.display());
    }
    Ok(())
}

fn handle_status(config: &Config, json: bool) -> Result<()> {
    let path = config.database_path();
    let storage = Storage::open(&path)?;
    let stats = storage.stats()?;

    if json {
        let status = serde_json::json!({
            "database_path": path,
            "entries": stats.total_entries,
            "oldest_entry": stats.oldest_entry.map(|dt| dt.to_rfc3339()),
            "newest_entry": stats.newest_entry.map(|dt| dt.to_rfc3339()),
            "db_size_bytes": stats.db_size_bytes,
        });
        println!("{}", serde_json::to_string_pretty(&status)?);
    } else {
        println!("quill status");
        println!("------------");
        println!("Database:     {}", path.display());
        println!("Entries:      {}", stats.total_entries);
        match stats.oldest_entry {
            Some(dt) => println!("Oldest:       {}", dt.to_rfc3339()),
            None => println!("Oldest:       -"),
        }
        match stats.newest_entry {
            Some(dt) => println!("Newest:       {}", dt.to_rfc3339()),
            None => println!("Newest:       -"),
        }
        println!("Size (bytes): {}", stats.db_size_bytes);
    }
    Ok(())
}

fn handle_config(config: &Config, cmd: ConfigCommand) -> Result<()> {
    match cmd {
        ConfigCommand::Show { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(config)?);
            } else {
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[Server]");
                println!("  Bind address:  {}", config.server.bind);
                println!();
                println!("[Storage]");
                println!("  Database path: {}", config.database_path().display());
                println!();
                println!("[Auth]");
                println!("  Username:      {}", config.auth.username);
                println!(
                    "  Secret:        {}",
                    if config.auth.secret.is_some() {
                        "set"
                    } else {
                        "not set (sessions reset on restart)"
                    }
                );
            }
        }
        ConfigCommand::Path => {
            println!("{}", Config::default_config_path().display());
        }
        ConfigCommand::Validate { file } => {
            let path = file.unwrap_or_else(Config::default_config_path);
            println!("Validating configuration: {}", path.display());
            match Config::load_from(Some(path)) {
                Ok(_) => println!("Configuration is valid."),
                Err(e) => println!("Configuration error: {e}"),
            }
        }
    }
    Ok(())
}
