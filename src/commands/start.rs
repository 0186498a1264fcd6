//! Manual grid engine pass

use anyhow::Result;
use tracing::info;

pub fn run(config_path: String) -> Result<()> {
    dotenv::dotenv().ok();

    let runtime = super::build_runtime()?;
    runtime.block_on(async {
        let components = super::build(&config_path)?;

        info!("Running one grid engine pass");
        components.engine.run_pass().await?;

        Ok(())
    })
}
