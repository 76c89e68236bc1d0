use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    dynamic_tables::run().await
}
