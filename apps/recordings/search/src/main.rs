//! Recordings Search Service - Entry Point

#[tokio::main]
async fn main() -> eyre::Result<()> {
    recordings_search::run().await
}
