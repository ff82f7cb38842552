use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use shortenme::auth::AuthService;
use shortenme::config::{AuthMode, Config};
use shortenme::models::format_timestamp;
use shortenme::storage;

#[derive(Parser)]
#[command(name = "shortenme-admin")]
#[command(about = "shortenme admin management CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the database tables
    Init,
    /// Create a user who can exchange their password for API keys
    CreateUser {
        username: String,
        password: String,
    },
    /// Issue a new API key (printed once)
    CreateKey {
        /// Free-form note to recognise the key later
        #[arg(long)]
        label: Option<String>,
    },
    /// Revoke an API key by id
    RevokeKey {
        id: i64,
    },
    /// List issued API keys
    ListKeys,
    /// Show mapping count and total views
    Stats,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let config = Config::from_env()?;

    // Tables are created on connect
    let storage = storage::connect(&config.database).await?;
    let auth = AuthService::new(AuthMode::ApiKey, storage.clone());

    match cli.command {
        Commands::Init => {
            println!("✓ Database initialized");
        }
        Commands::CreateUser { username, password } => {
            auth.create_user(&username, &password)
                .await
                .with_context(|| format!("failed to create user '{username}'"))?;
            println!("✓ Created user '{}'", username);
        }
        Commands::CreateKey { label } => {
            let issued = auth
                .issue_key(label.as_deref())
                .await
                .context("failed to issue API key")?;
            println!("✓ Created API key #{}", issued.record.id);
            println!("{}", issued.key);
            println!("Store it now, it cannot be shown again.");
        }
        Commands::RevokeKey { id } => {
            if storage.revoke_api_key(id).await? {
                println!("✓ Revoked API key #{}", id);
            } else {
                println!("⚠ No API key with id {}", id);
            }
        }
        Commands::ListKeys => {
            let keys = storage.list_api_keys().await?;
            if keys.is_empty() {
                println!("No API keys found.");
            } else {
                println!("{:<8} {:<20} {}", "ID", "Created (UTC)", "Label");
                println!("{}", "-".repeat(60));
                for key in keys {
                    println!(
                        "{:<8} {:<20} {}",
                        key.id,
                        format_timestamp(key.created_at),
                        key.label.unwrap_or_else(|| "N/A".to_string())
                    );
                }
            }
        }
        Commands::Stats => {
            let totals = storage.usage_totals().await?;
            println!("Short URLs:  {}", totals.url_count);
            println!("Total views: {}", totals.total_views);
        }
    }

    Ok(())
}
