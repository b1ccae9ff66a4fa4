mod config;
mod main_lib;

use config::Config;
use main_lib::{init_tracing, run};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;
    init_tracing();
    let report = run(&config).await?;
    if !report.is_success() {
        anyhow::bail!("{} symbol(s) could not be persisted", report.failed);
    }
    Ok(())
}
