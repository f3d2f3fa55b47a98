use serde::Serialize;
use strum::Display;

use crate::{
    cluster::ClusterSpec, name::DeploymentId, network::NetworkSpec, output::EndpointOutput,
    service::ServiceSpec,
};

/// A fully cross-referenced set of declarations for one deployment.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeclarationGraph {
    deployment_id: DeploymentId,
    network: NetworkSpec,
    cluster: ClusterSpec,
    service: ServiceSpec,
    output: EndpointOutput,
}

impl DeclarationGraph {
    pub(crate) fn new(
        deployment_id: DeploymentId,
        network: NetworkSpec,
        cluster: ClusterSpec,
        service: ServiceSpec,
        output: EndpointOutput,
    ) -> Self {
        Self {
            deployment_id,
            network,
            cluster,
            service,
            output,
        }
    }

    pub fn deployment_id(&self) -> &DeploymentId {
        &self.deployment_id
    }

    pub fn network(&self) -> &NetworkSpec {
        &self.network
    }

    pub fn cluster(&self) -> &ClusterSpec {
        &self.cluster
    }

    pub fn service(&self) -> &ServiceSpec {
        &self.service
    }

    pub fn output(&self) -> &EndpointOutput {
        &self.output
    }

    /// Returns every declaration in dependency order.
    pub fn declarations(&self) -> [Declaration<'_>; 4] {
        [
            Declaration::Network(&self.network),
            Declaration::Cluster(&self.cluster),
            Declaration::Service(&self.service),
            Declaration::Output(&self.output),
        ]
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Declaration<'a> {
    Network(&'a NetworkSpec),
    Cluster(&'a ClusterSpec),
    Service(&'a ServiceSpec),
    Output(&'a EndpointOutput),
}

impl<'a> Declaration<'a> {
    pub fn kind(&self) -> DeclarationKind {
        match *self {
            Self::Network(_) => DeclarationKind::Network,
            Self::Cluster(_) => DeclarationKind::Cluster,
            Self::Service(_) => DeclarationKind::Service,
            Self::Output(_) => DeclarationKind::Output,
        }
    }

    pub fn name(&self) -> &'a str {
        match *self {
            Self::Network(spec) => &spec.name,
            Self::Cluster(spec) => &spec.name,
            Self::Service(spec) => &spec.name,
            Self::Output(spec) => &spec.name,
        }
    }

    /// Name of the declaration this one references, if any.
    pub fn depends_on(&self) -> Option<&'a str> {
        match *self {
            Self::Network(_) => None,
            Self::Cluster(spec) => Some(&spec.network.name),
            Self::Service(spec) => Some(&spec.cluster.name),
            Self::Output(spec) => Some(&spec.source.service),
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Display)]
#[strum(serialize_all = "camelCase")]
pub enum DeclarationKind {
    Network,
    Cluster,
    Service,
    Output,
}
