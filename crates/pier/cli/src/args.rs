use std::path::PathBuf;

use anyhow::{anyhow, Result};
use clap::{value_parser, ArgAction, Parser};
use pier_api::{config::TopologyConfig, TopologyDefinition};
use tokio::fs;
use tracing::{instrument, Level};

#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub(crate) struct Args {
    #[command(flatten)]
    common: ArgsCommon,

    #[command(subcommand)]
    command: crate::commands::Command,
}

impl Args {
    pub(crate) async fn run(self) -> Result<()> {
        self.common.init_tracer();
        self.command.run(self.common).await
    }
}

#[derive(Clone, Debug, Parser)]
pub(crate) struct ArgsCommon {
    /// Turn debugging information on
    #[arg(short, long, global = true, env = "PIER_DEBUG", action = ArgAction::Count)]
    #[arg(value_parser = value_parser!(u8).range(..=3))]
    debug: u8,

    /// Root of every declared resource name
    #[arg(long, env = "PIER_DEPLOYMENT_ID", value_name = "ID")]
    deployment_id: Option<String>,

    /// YAML file of the configuration bundle; flags take precedence over it
    #[arg(long, env = "PIER_CONFIG", value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(flatten)]
    topology: TopologyConfig,
}

impl ArgsCommon {
    fn init_tracer(&self) {
        ::pier_core::tracer::init_once_with_level_int(self.debug, true)
    }

    #[instrument(level = Level::INFO, skip(self), err(Display))]
    async fn load_config(&self) -> Result<TopologyConfig> {
        let base = match &self.config {
            Some(path) => {
                let source = fs::read_to_string(path).await.map_err(|error| {
                    anyhow!("failed to read configuration file {path:?}: {error}")
                })?;
                TopologyConfig::from_yaml_str(&source)?
            }
            None => TopologyConfig::default(),
        };
        Ok(base.merge(self.topology.clone()))
    }

    pub(crate) async fn load_definition(&self) -> Result<TopologyDefinition> {
        let deployment_id = self.deployment_id.as_deref().ok_or_else(|| {
            anyhow!("deployment id is required: use --deployment-id or PIER_DEPLOYMENT_ID")
        })?;
        let config = self.load_config().await?;

        TopologyDefinition::try_new(deployment_id, &config).map_err(Into::into)
    }
}
