use clap::Parser;
use podcast_predictor::cli::{self, Cli, Command};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Serve(args) => cli::serve::run(args).await,
        Command::Ingest(args) => cli::ingest::run(args).await,
        Command::Train(args) => cli::train::run(args).await,
        Command::Drift(args) => cli::drift::run(args).await,
        Command::InitDb => cli::init_db::run().await,
    }
}
