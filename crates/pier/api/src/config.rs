use std::{
    convert::Infallible,
    fmt,
    num::{NonZeroU16, NonZeroU32, NonZeroU8},
    str::FromStr,
};

use clap::Args;
use ipnet::Ipv4Net;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::{instrument, Level};

use crate::{
    consts,
    error::{ConfigViolation, TopologyError},
};

/// The configuration bundle of a topology.
///
/// Every option is optional here; [`TopologyConfig::resolve`] applies the
/// documented defaults and rejects what cannot be declared.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema, Args)]
#[clap(rename_all = "kebab-case")]
#[serde(default, rename_all = "camelCase")]
pub struct TopologyConfig {
    /// Network CIDR of the isolated network [default: 10.0.0.0/16]
    #[arg(long, env = "PIER_ADDRESS_BLOCK", value_name = "CIDR")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address_block: Option<Ipv4Net>,

    /// Number of availability zones the network spans [default: 2]
    #[arg(long, env = "PIER_AVAILABILITY_ZONE_COUNT", value_name = "COUNT")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub availability_zone_count: Option<u8>,

    /// Build context or registry reference of the container image
    #[arg(long, env = "PIER_CONTAINER_IMAGE_SOURCE", value_name = "SOURCE")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub container_image_source: Option<ContainerImageSource>,

    /// Port the container listens on [default: 3000]
    #[arg(long, env = "PIER_CONTAINER_PORT", value_name = "PORT")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub container_port: Option<u16>,

    /// CPU units reserved for each replica [default: 512]
    #[arg(long, env = "PIER_CPU_UNITS", value_name = "UNITS")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cpu_units: Option<u32>,

    /// Number of replicas kept running [default: 1]
    #[arg(long, env = "PIER_DESIRED_REPLICA_COUNT", value_name = "COUNT")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub desired_replica_count: Option<u32>,

    /// Memory reserved for each replica, in MiB [default: 1024]
    #[arg(long, env = "PIER_MEMORY_MIB", value_name = "MIB")]
    #[serde(rename = "memoryMiB", skip_serializing_if = "Option::is_none")]
    pub memory_mib: Option<u32>,

    /// Whether the load balancer faces the public internet [default: true]
    #[arg(long, env = "PIER_PUBLICLY_REACHABLE", value_name = "BOOL")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub publicly_reachable: Option<bool>,
}

impl TopologyConfig {
    pub fn from_yaml_str(source: &str) -> Result<Self, TopologyError> {
        ::serde_yaml::from_str(source).map_err(|error| {
            TopologyError::invalid("config", ConfigViolation::Malformed(error.to_string()))
        })
    }

    /// Overlays `overrides` on top of `self`; options set in `overrides` win.
    pub fn merge(self, overrides: Self) -> Self {
        Self {
            address_block: overrides.address_block.or(self.address_block),
            availability_zone_count: overrides
                .availability_zone_count
                .or(self.availability_zone_count),
            container_image_source: overrides
                .container_image_source
                .or(self.container_image_source),
            container_port: overrides.container_port.or(self.container_port),
            cpu_units: overrides.cpu_units.or(self.cpu_units),
            desired_replica_count: overrides
                .desired_replica_count
                .or(self.desired_replica_count),
            memory_mib: overrides.memory_mib.or(self.memory_mib),
            publicly_reachable: overrides.publicly_reachable.or(self.publicly_reachable),
        }
    }

    #[instrument(level = Level::DEBUG, skip_all, err(Display))]
    pub fn resolve(&self) -> Result<TopologyOptions, TopologyError> {
        let container_image_source = match &self.container_image_source {
            Some(source) if source.as_str().trim().is_empty() => {
                return Err(TopologyError::invalid(
                    "containerImageSource",
                    ConfigViolation::Empty,
                ))
            }
            Some(source) => source.clone(),
            None => {
                return Err(TopologyError::invalid(
                    "containerImageSource",
                    ConfigViolation::Missing,
                ))
            }
        };

        Ok(TopologyOptions {
            address_block: match self.address_block {
                Some(address_block) => address_block,
                None => consts::DEFAULT_ADDRESS_BLOCK.parse().map_err(|error| {
                    TopologyError::invalid(
                        "addressBlock",
                        ConfigViolation::Malformed(format!("{error}")),
                    )
                })?,
            },
            availability_zone_count: positive(
                "availabilityZoneCount",
                self.availability_zone_count,
                consts::DEFAULT_AVAILABILITY_ZONE_COUNT,
            )?,
            container_image_source,
            container_port: positive(
                "containerPort",
                self.container_port,
                consts::DEFAULT_CONTAINER_PORT,
            )?,
            cpu_units: positive("cpuUnits", self.cpu_units, consts::DEFAULT_CPU_UNITS)?,
            desired_replica_count: positive(
                "desiredReplicaCount",
                self.desired_replica_count,
                consts::DEFAULT_DESIRED_REPLICA_COUNT,
            )?,
            memory_mib: positive("memoryMiB", self.memory_mib, consts::DEFAULT_MEMORY_MIB)?,
            publicly_reachable: self
                .publicly_reachable
                .unwrap_or(consts::DEFAULT_PUBLICLY_REACHABLE),
        })
    }
}

fn positive<T, N>(option: &'static str, value: Option<T>, default: T) -> Result<N, TopologyError>
where
    N: TryFrom<T>,
{
    N::try_from(value.unwrap_or(default))
        .map_err(|_| TopologyError::invalid(option, ConfigViolation::NonPositive))
}

/// A fully validated configuration bundle with every default applied.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TopologyOptions {
    pub address_block: Ipv4Net,
    pub availability_zone_count: NonZeroU8,
    pub container_image_source: ContainerImageSource,
    pub container_port: NonZeroU16,
    pub cpu_units: NonZeroU32,
    pub desired_replica_count: NonZeroU32,
    #[serde(rename = "memoryMiB")]
    pub memory_mib: NonZeroU32,
    pub publicly_reachable: bool,
}

/// A local build context path or a registry reference.
///
/// Passed through to the service declaration without inspection. Engines
/// that render deployable templates expect a registry reference here.
#[derive(
    Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(transparent)]
pub struct ContainerImageSource(String);

impl ContainerImageSource {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for ContainerImageSource {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for ContainerImageSource {
    fn from(value: &str) -> Self {
        Self(value.into())
    }
}

impl FromStr for ContainerImageSource {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(s.into())
    }
}

impl fmt::Display for ContainerImageSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
