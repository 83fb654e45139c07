pub mod commands;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "school-portal-api")]
#[command(about = "School portal API - sessions, role guards, dashboards and gamification")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    /// Defaults to `serve` when omitted
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Run the HTTP server")]
    Serve {
        #[arg(long, help = "Port to listen on (overrides PORT / PORTAL_PORT)")]
        port: Option<u16>,
    },

    #[command(about = "Sign a session token for a user without checking credentials")]
    IssueToken {
        #[arg(long)]
        email: String,
        #[arg(long)]
        name: String,
        #[arg(long, help = "STUDENT, PARENT, TEACHER or ADMIN")]
        role: String,
        #[arg(long, help = "User id (defaults to the email)")]
        id: Option<String>,
    },

    #[command(about = "Print the Argon2 hash stored for a fixture password")]
    HashPassword {
        #[arg(help = "Plain-text password")]
        password: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);

    match cli.command.unwrap_or(Commands::Serve { port: None }) {
        Commands::Serve { port } => commands::serve::handle(port).await,
        Commands::IssueToken { email, name, role, id } => {
            commands::token::issue(email, name, &role, id, output_format)
        }
        Commands::HashPassword { password } => commands::token::hash(&password, output_format),
    }
}
