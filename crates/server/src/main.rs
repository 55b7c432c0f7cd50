#[tokio::main]
async fn main() -> anyhow::Result<()> {
    portal_server::run().await
}
