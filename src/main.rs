use anyhow::Result;
use backup_rotator::config::{self, expand_tilde};
use backup_rotator::managers::prompt::TerminalDecisionSource;
use backup_rotator::managers::{logging, rotation::RotationManager};
use backup_rotator::panel::PanelClient;
use backup_rotator::FilePolicyStore;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "backup-rotator")]
#[command(about = "Backup rotation tool for panel-managed game servers", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "~/.config/backup-rotator.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Rotate backups for all managed servers or a specific server
    Run {
        /// Specific server identifier (defaults to all managed servers)
        #[arg(short, long)]
        server: Option<String>,

        /// Simulate deletions and creations without calling the panel
        #[arg(long)]
        dry_run: bool,
    },

    /// List all managed servers with quota and backup count
    List,

    /// Show backups for all servers or a specific server
    Status {
        /// Specific server identifier
        #[arg(short, long)]
        server: Option<String>,
    },

    /// Validate configuration file
    Validate,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config_path = expand_tilde(&cli.config);

    // Validate doesn't touch the panel and gets by with console logging
    if matches!(cli.command, Some(Commands::Validate)) {
        logging::init_console_logging();
        let config = config::load_config(&config_path)?;
        println!("Configuration is valid!");
        println!("Panel: {}", config.panel.url);
        println!("Locked-backup policy: {:?}", config.rotation.on_locked);
        println!("Dry run: {}", config.rotation.dry_run);
        if !config.rotation.skip_servers.is_empty() {
            println!("Skipped servers: {}", config.rotation.skip_servers.join(", "));
        }
        return Ok(());
    }

    let config = config::load_config(&config_path)?;

    // Setup logging with file rotation (must keep guard alive)
    let logging_config = logging::LoggingConfig::from_settings(&config.logging);
    let _log_guard = logging::init_logging(&logging_config)?;

    let client = PanelClient::new(&config.panel)?;

    // If no command specified, show status overview
    let command = cli.command.unwrap_or(Commands::Status { server: None });

    match command {
        Commands::Run { server, dry_run } => {
            let store = FilePolicyStore::new(config_path.clone());
            let mut manager = RotationManager::new(
                client,
                config.rotation.clone(),
                Box::new(store),
                Box::new(TerminalDecisionSource),
            );

            if let Some(identifier) = server {
                println!("Rotating backups for server: {}", identifier);
                manager.rotate_server(&identifier, dry_run)?;
            } else {
                println!("Rotating backups for all managed servers...");
                manager.rotate_all(dry_run)?;
            }
            println!("✓ Rotation completed");
        }

        Commands::List => {
            let servers = client.fetch_servers()?;

            if servers.is_empty() {
                println!("No managed servers found.");
                return Ok(());
            }

            println!("{:<12} {:<24} {:>6} {:>8}", "Identifier", "Name", "Quota", "Backups");
            println!("{}", "-".repeat(54));

            for server in &servers {
                let details = client.fetch_server_details(server.id)?;
                let count = client
                    .fetch_backups(&server.identifier)
                    .map(|b| b.len().to_string())
                    .unwrap_or_else(|_| "?".to_string());

                println!(
                    "{:<12} {:<24} {:>6} {:>8}",
                    server.identifier, details.name, details.backup_limit, count
                );
            }
        }

        Commands::Status { server } => {
            let servers = client.fetch_servers()?;

            let servers: Vec<_> = if let Some(ref identifier) = server {
                servers
                    .into_iter()
                    .filter(|s| &s.identifier == identifier)
                    .collect()
            } else {
                servers
            };

            if servers.is_empty() {
                if let Some(identifier) = server {
                    eprintln!("Server '{}' not found on the panel", identifier);
                    std::process::exit(1);
                }
                println!("No managed servers found.");
                return Ok(());
            }

            for server in &servers {
                let details = client.fetch_server_details(server.id)?;
                println!(
                    "=== {} ({}) | quota: {} ===",
                    details.name, server.identifier, details.backup_limit
                );

                match client.fetch_backups(&server.identifier) {
                    Ok(backups) if backups.is_empty() => println!("  No backups.\n"),
                    Ok(backups) => {
                        println!("  {:<38} {:<22} {:<20} {}", "ID", "Name", "Created", "Locked");
                        for backup in &backups {
                            println!(
                                "  {:<38} {:<22} {:<20} {}",
                                backup.id,
                                backup.name,
                                backup.created_at.format("%Y-%m-%d %H:%M:%S"),
                                if backup.locked { "yes" } else { "no" }
                            );
                        }
                        println!("  Total: {} of {}\n", backups.len(), details.backup_limit);
                    }
                    Err(e) => eprintln!("  ✗ Failed to fetch backups: {}\n", e),
                }
            }
        }

        Commands::Validate => unreachable!("handled before config loading"),
    }

    Ok(())
}
