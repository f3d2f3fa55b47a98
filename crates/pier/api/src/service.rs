use std::num::{NonZeroU16, NonZeroU32};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::{
    cluster::{ClusterRef, ClusterSpec},
    config::{ContainerImageSource, TopologyOptions},
    name::{Role, Scope},
};

/// A load-balanced compute service running on a cluster.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ServiceSpec {
    /// Identifier of the service pattern as a whole
    pub id: String,
    pub name: String,
    pub cluster: ClusterRef,
    pub cpu_units: NonZeroU32,
    #[serde(rename = "memoryMiB")]
    pub memory_mib: NonZeroU32,
    pub desired_replica_count: NonZeroU32,
    pub container: ContainerSpec,
    pub load_balancer: LoadBalancerSpec,
}

impl ServiceSpec {
    pub fn declare(scope: &Scope, cluster: &ClusterSpec, options: &TopologyOptions) -> Self {
        Self {
            id: scope.name(Role::Fargate),
            name: scope.name(Role::FargateService),
            cluster: cluster.to_ref(),
            cpu_units: options.cpu_units,
            memory_mib: options.memory_mib,
            desired_replica_count: options.desired_replica_count,
            container: ContainerSpec {
                name: scope.name(Role::Container),
                image: options.container_image_source.clone(),
                port: options.container_port,
            },
            load_balancer: LoadBalancerSpec {
                name: scope.name(Role::FargateLba),
                visibility: if options.publicly_reachable {
                    LoadBalancerVisibility::Public
                } else {
                    LoadBalancerVisibility::Internal
                },
                protocol: ListenerProtocol::default(),
            },
        }
    }

    pub fn load_balancer_ref(&self) -> LoadBalancerRef {
        LoadBalancerRef {
            service: self.name.clone(),
            name: self.load_balancer.name.clone(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ContainerSpec {
    pub name: String,
    pub image: ContainerImageSource,
    pub port: NonZeroU16,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoadBalancerSpec {
    pub name: String,
    pub visibility: LoadBalancerVisibility,
    pub protocol: ListenerProtocol,
}

impl LoadBalancerSpec {
    pub fn is_public(&self) -> bool {
        self.visibility == LoadBalancerVisibility::Public
    }
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
    JsonSchema,
)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum LoadBalancerVisibility {
    #[default]
    Public,
    Internal,
}

/// Listener protocol of the load balancer.
///
/// TLS termination is left to the provisioning engine, so plain HTTP is the
/// only protocol declared here.
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
    JsonSchema,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum ListenerProtocol {
    #[default]
    Http,
}

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoadBalancerRef {
    pub service: String,
    pub name: String,
}
