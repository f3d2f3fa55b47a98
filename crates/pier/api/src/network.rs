use std::num::NonZeroU8;

use ipnet::Ipv4Net;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::{
    config::TopologyOptions,
    name::{Role, Scope},
};

/// An isolated virtual network spanning one or more availability zones.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct NetworkSpec {
    pub name: String,
    pub address_block: Ipv4Net,
    pub availability_zone_count: NonZeroU8,
}

impl NetworkSpec {
    pub fn declare(scope: &Scope, options: &TopologyOptions) -> Self {
        Self {
            name: scope.name(Role::Vpc),
            address_block: options.address_block,
            availability_zone_count: options.availability_zone_count,
        }
    }

    pub fn to_ref(&self) -> NetworkRef {
        NetworkRef {
            name: self.name.clone(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct NetworkRef {
    pub name: String,
}
