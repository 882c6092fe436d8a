//! peertrust - certificate trust decisions from the command line.

use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    peertrust_cli::run().await
}
