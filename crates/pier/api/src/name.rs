use std::{fmt, str::FromStr};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

use crate::error::{ConfigViolation, TopologyError};

/// The naming root of every declaration in one topology instance.
///
/// Length is not checked here; the provisioning engine enforces its own
/// name-length limits.
#[derive(
    Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(try_from = "String")]
pub struct DeploymentId(String);

impl DeploymentId {
    pub const OPTION: &'static str = "deploymentId";

    pub fn try_new(id: impl Into<String>) -> Result<Self, TopologyError> {
        let id = id.into();
        if id.trim().is_empty() {
            Err(TopologyError::invalid(Self::OPTION, ConfigViolation::Empty))
        } else {
            Ok(Self(id))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for DeploymentId {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for DeploymentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl TryFrom<String> for DeploymentId {
    type Error = TopologyError;

    fn try_from(id: String) -> Result<Self, Self::Error> {
        Self::try_new(id)
    }
}

impl FromStr for DeploymentId {
    type Err = TopologyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::try_new(s)
    }
}

/// The fixed name suffix of each declared resource.
#[derive(
    Copy,
    Clone,
    Debug,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Display,
    EnumIter,
    EnumString,
    Serialize,
    Deserialize,
    JsonSchema,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum Role {
    Vpc,
    Cluster,
    Fargate,
    FargateService,
    FargateLba,
    Container,
    Url,
}

/// Explicit construction context threaded through every `declare` call.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Scope {
    deployment_id: DeploymentId,
}

impl Scope {
    pub const fn new(deployment_id: DeploymentId) -> Self {
        Self { deployment_id }
    }

    pub const fn deployment_id(&self) -> &DeploymentId {
        &self.deployment_id
    }

    pub fn name(&self, role: Role) -> String {
        format!("{id}-{role}", id = &self.deployment_id)
    }
}

#[cfg(test)]
mod tests {
    use strum::IntoEnumIterator;

    use super::*;

    #[test]
    fn reject_empty_deployment_id() {
        for id in ["", "   "] {
            assert_eq!(
                DeploymentId::try_new(id),
                Err(TopologyError::InvalidConfiguration {
                    option: "deploymentId",
                    violation: ConfigViolation::Empty,
                }),
            );
        }
    }

    #[test]
    fn deserialize_deployment_id() {
        let id: DeploymentId = ::serde_yaml::from_str("demo").expect("valid id");
        assert_eq!(id.as_str(), "demo");

        assert!(::serde_yaml::from_str::<DeploymentId>("''").is_err());
        assert!(::serde_yaml::from_str::<DeploymentId>("'  '").is_err());
    }

    #[test]
    fn role_suffixes() {
        let roles: Vec<_> = Role::iter().map(|role| role.to_string()).collect();
        assert_eq!(
            roles,
            [
                "vpc",
                "cluster",
                "fargate",
                "fargate-service",
                "fargate-lba",
                "container",
                "url",
            ],
        );
    }

    #[test]
    fn names_follow_deployment_id() {
        for id in ["demo", "prod-eu", "a"] {
            let scope = Scope::new(id.parse().expect("valid deployment id"));
            for role in Role::iter() {
                assert_eq!(scope.name(role), format!("{id}-{role}"));
            }
        }
    }

    #[test]
    fn names_are_not_truncated() {
        let id = "x".repeat(200);
        let scope = Scope::new(DeploymentId::try_new(id.clone()).expect("valid deployment id"));

        assert_eq!(scope.name(Role::FargateLba), format!("{id}-fargate-lba"));
    }
}
