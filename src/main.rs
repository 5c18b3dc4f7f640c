use anyhow::Result;
use dazzling::cli;

#[tokio::main]
async fn main() -> Result<()> {
    cli::run().await
}
