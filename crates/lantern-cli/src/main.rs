#[tokio::main]
async fn main() -> anyhow::Result<()> {
    lantern_cli::run().await
}
