use anyhow::Result;
use clap::Parser;
use garagechat::cli::CliArgs;

#[tokio::main]
async fn main() -> Result<()> {
    let args = CliArgs::parse();
    garagechat::run(args).await
}
