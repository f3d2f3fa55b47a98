use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::{
    name::{Role, Scope},
    service::{LoadBalancerRef, ServiceSpec},
};

/// The externally reachable address of the deployed service.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct EndpointOutput {
    pub name: String,
    pub source: LoadBalancerRef,
    pub attribute: EndpointAttribute,
}

impl EndpointOutput {
    pub fn declare(scope: &Scope, service: &ServiceSpec) -> Self {
        Self {
            name: scope.name(Role::Url),
            source: service.load_balancer_ref(),
            attribute: EndpointAttribute::DnsName,
        }
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
pub enum EndpointAttribute {
    #[default]
    #[serde(rename = "DNSName")]
    #[strum(serialize = "DNSName")]
    DnsName,
}
