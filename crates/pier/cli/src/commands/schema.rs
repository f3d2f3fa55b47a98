use anyhow::Result;
use clap::Parser;
use pier_api::config::TopologyConfig;

#[derive(Clone, Debug, Parser)]
pub(crate) struct SchemaArgs {}

impl SchemaArgs {
    pub(crate) fn run(self) -> Result<()> {
        let schema = ::schemars::schema_for!(TopologyConfig);
        println!("{}", ::serde_json::to_string_pretty(&schema)?);
        Ok(())
    }
}
