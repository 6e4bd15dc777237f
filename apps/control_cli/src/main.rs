use std::{path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use client_core::{
    AuthService, ControlToggle, FileTokenStore, HttpSystemControl, SystemControlService,
    ToggleOutcome, ToggleSnapshot, TokenStore,
};
use shared::domain::is_admin_role;
use tracing_subscriber::EnvFilter;

mod settings;

#[derive(Parser, Debug)]
#[command(about = "Inspect and toggle the managed system")]
struct Cli {
    /// Settings file; defaults to ./control.toml when present.
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    server_url: Option<String>,
    /// JSON file used as local storage for the access token.
    #[arg(long)]
    token_file: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the role claim of the stored token.
    Role,
    /// Print whether the system is running.
    Status,
    /// Start the system if stopped, stop it if running.
    Toggle,
    /// Store an access token obtained from the control service.
    SetToken { token: String },
    /// Remove the stored access token.
    ClearToken,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();
    let cli = Cli::parse();

    let mut settings = settings::load_settings(cli.config.as_deref())?;
    if let Some(server_url) = cli.server_url {
        settings.server_url = server_url;
    }
    if let Some(token_file) = cli.token_file {
        settings.token_file = token_file;
    }

    let store: Arc<dyn TokenStore> = Arc::new(FileTokenStore::new(&settings.token_file));
    let auth = AuthService::new(Arc::clone(&store));

    match cli.command {
        Command::Role => println!("{}", role_line(&auth)),
        Command::Status => {
            let service = HttpSystemControl::new(&settings.server_url, store)?;
            let status = service
                .get_status()
                .await
                .context("failed to fetch system status")?;
            println!("running={}", status.running);
        }
        Command::Toggle => {
            let service = HttpSystemControl::new(&settings.server_url, store)?;
            let toggle = ControlToggle::new(auth, Arc::new(service));
            print_snapshot("before", toggle.activate().await);

            match toggle.toggle().await {
                ToggleOutcome::NotAuthorized => {
                    println!("toggle unavailable: admin role required")
                }
                ToggleOutcome::Busy => println!("another toggle is still in progress"),
                ToggleOutcome::Started => println!("system started"),
                ToggleOutcome::Stopped => println!("system stopped"),
                ToggleOutcome::Failed { reason } => println!("toggle failed: {reason}"),
            }
            print_snapshot("after", toggle.snapshot().await);
        }
        Command::SetToken { token } => {
            auth.set_token(&token)?;
            println!(
                "token stored in {} (role={})",
                settings.token_file.display(),
                auth.get_user_role()
            );
        }
        Command::ClearToken => {
            auth.clear_token()?;
            println!("token cleared");
        }
    }

    Ok(())
}

/// Decodes the stored token once; an unreadable token counts as no role.
fn role_line(auth: &AuthService) -> String {
    let role = auth.try_user_role().unwrap_or_else(|err| {
        eprintln!("warning: {err}");
        String::new()
    });
    let shown = if role.is_empty() { "(none)" } else { role.as_str() };
    format!("role={shown} admin={}", is_admin_role(&role))
}

fn print_snapshot(label: &str, snapshot: ToggleSnapshot) {
    println!(
        "{label}: running={} loading={} admin={}",
        snapshot.running, snapshot.loading, snapshot.is_admin
    );
}
