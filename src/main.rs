mod batch;
mod cli;
mod server;

use clap::Parser;
use cli::{Cli, Commands};
use taskserver::config::Config;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    taskserver::observability::init_tracing();

    let cli = Cli::parse();

    match cli.command {
        Commands::Server(args) => server::run(args).await?,
        Commands::Batch(args) => batch::run(args).await?,
        Commands::Config => print!("{}", Config::load()?.to_toml()?),
    }

    Ok(())
}
