use anyhow::Result;
use input_mcp::{start_server, Config};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;
    let server = start_server(config)?;
    server.wait().await
}
