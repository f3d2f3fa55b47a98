pub mod subnet;
pub mod template;

use std::path::PathBuf;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use clap::Parser;
use pier_api::{engine::ProvisioningEngine, graph::DeclarationGraph};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use tokio::{fs, io::AsyncWriteExt};
use tracing::{info, instrument, Level};

use crate::template::Template;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, Parser)]
#[clap(rename_all = "kebab-case")]
#[serde(rename_all = "camelCase")]
pub struct CloudFormationArgs {
    /// Document format of the rendered template
    #[arg(
        long,
        env = "PIER_TEMPLATE_FORMAT",
        value_name = "FORMAT",
        default_value_t = TemplateFormat::default(),
    )]
    #[serde(default)]
    pub format: TemplateFormat,

    /// Directory to write the template into, instead of the standard output
    #[arg(long, env = "PIER_OUTPUT_DIR", value_name = "DIR")]
    #[serde(default)]
    pub output_dir: Option<PathBuf>,
}

#[derive(
    Copy,
    Clone,
    Debug,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Display,
    EnumString,
    Serialize,
    Deserialize,
)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum TemplateFormat {
    #[default]
    Json,
    Yaml,
}

impl TemplateFormat {
    pub const fn extension(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Yaml => "yaml",
        }
    }

    pub fn render(&self, template: &Template) -> Result<String> {
        match self {
            Self::Json => ::serde_json::to_string_pretty(template)
                .map(|mut rendered| {
                    rendered.push('\n');
                    rendered
                })
                .map_err(|error| anyhow!("failed to render template as json: {error}")),
            Self::Yaml => ::serde_yaml::to_string(template)
                .map_err(|error| anyhow!("failed to render template as yaml: {error}")),
        }
    }
}

/// Synthesizes declaration graphs into CloudFormation templates.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CloudFormationEngine {
    args: CloudFormationArgs,
}

impl CloudFormationEngine {
    pub const fn new(args: CloudFormationArgs) -> Self {
        Self { args }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SynthesizedTemplate {
    pub endpoint_output: String,
    pub path: Option<PathBuf>,
}

#[async_trait]
impl ProvisioningEngine for CloudFormationEngine {
    type Output = SynthesizedTemplate;

    #[instrument(
        level = Level::INFO,
        skip_all,
        fields(deployment_id = %graph.deployment_id()),
        err(Display),
    )]
    async fn provision(
        &self,
        graph: &DeclarationGraph,
    ) -> Result<<Self as ProvisioningEngine>::Output> {
        let CloudFormationArgs { format, output_dir } = &self.args;

        let template = Template::synthesize(graph)?;
        let rendered = format.render(&template)?;

        let path = match output_dir {
            Some(output_dir) => {
                fs::create_dir_all(output_dir).await.map_err(|error| {
                    anyhow!("failed to create output directory {output_dir:?}: {error}")
                })?;

                let path = output_dir.join(format!(
                    "{id}.template.{ext}",
                    id = graph.deployment_id(),
                    ext = format.extension(),
                ));
                fs::write(&path, rendered)
                    .await
                    .map_err(|error| anyhow!("failed to write template {path:?}: {error}"))?;

                info!("Written template to {path:?}");
                Some(path)
            }
            None => {
                let mut stdout = ::tokio::io::stdout();
                stdout.write_all(rendered.as_bytes()).await?;
                stdout.flush().await?;
                None
            }
        };

        Ok(SynthesizedTemplate {
            endpoint_output: graph.output().name.clone(),
            path,
        })
    }
}
