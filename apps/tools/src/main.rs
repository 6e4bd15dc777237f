use anyhow::Result;
use clap::{Parser, Subcommand};
use shared::domain::ADMIN_ROLE;
use storage::Storage;
use tracing::info;

#[derive(Parser, Debug)]
struct Cli {
    #[arg(long, env = "DATABASE_URL", default_value = "sqlite://./data/control.db")]
    database_url: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    CreateUser {
        username: String,
        password: String,
        #[arg(long, default_value = ADMIN_ROLE)]
        role: String,
    },
    SetRole {
        username: String,
        role: String,
    },
    /// Creates the admin account unless it already exists.
    SeedAdmin {
        #[arg(long, default_value = "admin")]
        username: String,
        #[arg(long, default_value = "admin123")]
        password: String,
    },
    ListUsers,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();
    let cli = Cli::parse();
    let storage = Storage::new(&cli.database_url).await?;

    match cli.command {
        Command::CreateUser {
            username,
            password,
            role,
        } => {
            let user_id = storage.create_user(&username, &password, &role).await?;
            println!("created user_id={} role={role}", user_id.0);
        }
        Command::SetRole { username, role } => {
            let Some(user) = storage.find_user_by_username(&username).await? else {
                anyhow::bail!("no user named '{username}'");
            };
            storage.set_user_role(user.user_id, &role).await?;
            println!("user_id={} role={role}", user.user_id.0);
        }
        Command::SeedAdmin { username, password } => {
            if let Some(existing) = storage.find_user_by_username(&username).await? {
                info!(user_id = existing.user_id.0, "admin already present; leaving unchanged");
                println!("admin exists user_id={}", existing.user_id.0);
            } else {
                let user_id = storage
                    .create_user(&username, &password, ADMIN_ROLE)
                    .await?;
                println!("seeded admin user_id={}", user_id.0);
            }
        }
        Command::ListUsers => {
            for user in storage.list_users().await? {
                println!("{}\t{}\t{}", user.user_id.0, user.username, user.role);
            }
        }
    }

    Ok(())
}
