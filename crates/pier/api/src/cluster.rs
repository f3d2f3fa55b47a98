use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::{
    name::{Role, Scope},
    network::{NetworkRef, NetworkSpec},
};

/// A container orchestration cluster scoped to one network.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClusterSpec {
    pub name: String,
    pub network: NetworkRef,
}

impl ClusterSpec {
    pub fn declare(scope: &Scope, network: &NetworkSpec) -> Self {
        Self {
            name: scope.name(Role::Cluster),
            network: network.to_ref(),
        }
    }

    pub fn to_ref(&self) -> ClusterRef {
        ClusterRef {
            name: self.name.clone(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClusterRef {
    pub name: String,
}
