mod schema;
mod show;
mod synth;

use anyhow::Result;
use clap::Subcommand;
use tracing::{instrument, Level};

use crate::args::ArgsCommon;

#[derive(Clone, Debug, Subcommand)]
pub(crate) enum Command {
    /// Print the JSON schema of the configuration bundle
    Schema(self::schema::SchemaArgs),

    /// Print the declaration graph
    Show(self::show::ShowArgs),

    /// Render the declaration graph into a CloudFormation template
    Synth(self::synth::SynthArgs),
}

impl Command {
    #[instrument(level = Level::INFO, skip(common), err(Display))]
    pub(crate) async fn run(self, common: ArgsCommon) -> Result<()> {
        match self {
            Self::Schema(command) => command.run(),
            Self::Show(command) => command.run(common).await,
            Self::Synth(command) => command.run(common).await,
        }
    }
}
