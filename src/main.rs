use clap::Parser;
use kithound::{app, cli};

#[tokio::main]
async fn main() {
    let cli = cli::args::Cli::parse();
    if let Err(err) = app::run(cli).await {
        eprintln!("fatal: {:#}", err);
        std::process::exit(1);
    }
}
