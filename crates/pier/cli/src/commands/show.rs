use anyhow::Result;
use clap::Parser;
use tracing::{instrument, Level};

use crate::args::ArgsCommon;

#[derive(Clone, Debug, Parser)]
pub(crate) struct ShowArgs {
    /// Print as JSON instead of YAML
    #[arg(long, default_value_t = false)]
    json: bool,
}

impl ShowArgs {
    #[instrument(level = Level::INFO, skip(common), err(Display))]
    pub(crate) async fn run(self, common: ArgsCommon) -> Result<()> {
        let graph = common.load_definition().await?.build();

        if self.json {
            println!("{}", ::serde_json::to_string_pretty(&graph)?);
        } else {
            print!("{}", ::serde_yaml::to_string(&graph)?);
        }
        Ok(())
    }
}
