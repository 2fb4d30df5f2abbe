use clap::Parser;

use wishlist_libraries::interface::cli::Cli;
use wishlist_libraries::interface::logging::init_tracing;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    Cli::parse().run().await
}
