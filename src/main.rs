// ABOUTME: Entry point for the shelfd binary.
// ABOUTME: Parses CLI flags, initializes tracing, and runs the server lifecycle.

use std::path::PathBuf;

use clap::Parser;
use shelfd_server::{Credentials, ServerConfig, server};

const DEFAULT_USERNAME: &str = "admin";
const DEFAULT_PASSWORD: &str = "password";

/// Serve a directory over HTTP.
#[derive(Parser, Debug)]
#[command(name = "shelfd", version)]
struct Args {
    /// Directory to serve files from.
    #[arg(long, default_value = ".")]
    dir: PathBuf,

    /// Port to listen on.
    #[arg(long, default_value_t = 8080)]
    port: u16,

    /// Expected username; passing either credential flag enables basic auth.
    #[arg(short = 'u', long)]
    username: Option<String>,

    /// Expected password; passing either credential flag enables basic auth.
    #[arg(short = 'p', long)]
    password: Option<String>,
}

impl Args {
    fn credentials(&self) -> Option<Credentials> {
        match (&self.username, &self.password) {
            (None, None) => None,
            (user, pass) => Some(Credentials::new(
                user.as_deref().unwrap_or(DEFAULT_USERNAME),
                pass.as_deref().unwrap_or(DEFAULT_PASSWORD),
            )),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "shelfd=info,shelfd_server=info".parse().unwrap()),
        )
        .init();

    let args = Args::parse();
    let config = ServerConfig::new(args.dir.clone(), args.port, args.credentials())?;

    server::run(config).await?;
    Ok(())
}
