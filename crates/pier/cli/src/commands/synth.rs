use anyhow::Result;
use clap::Parser;
use pier_api::engine::ProvisioningEngine;
use pier_engine_cloudformation::{CloudFormationArgs, CloudFormationEngine, SynthesizedTemplate};
use tracing::{info, instrument, Level};

use crate::args::ArgsCommon;

#[derive(Clone, Debug, Parser)]
pub(crate) struct SynthArgs {
    #[command(flatten)]
    engine: CloudFormationArgs,
}

impl SynthArgs {
    #[instrument(level = Level::INFO, skip(common), err(Display))]
    pub(crate) async fn run(self, common: ArgsCommon) -> Result<()> {
        let graph = common.load_definition().await?.build();

        let engine = CloudFormationEngine::new(self.engine);
        let SynthesizedTemplate {
            endpoint_output,
            path,
        } = engine.provision(&graph).await?;

        if let Some(path) = path {
            println!("{}", path.display());
        }
        info!("Exported the endpoint as {endpoint_output}");
        Ok(())
    }
}
