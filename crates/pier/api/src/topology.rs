use tracing::{debug, info, instrument, Level};

use crate::{
    cluster::ClusterSpec,
    config::{TopologyConfig, TopologyOptions},
    error::TopologyError,
    graph::DeclarationGraph,
    name::{DeploymentId, Scope},
    network::NetworkSpec,
    output::EndpointOutput,
    service::ServiceSpec,
};

/// A validated topology, ready to be built into a [`DeclarationGraph`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TopologyDefinition {
    scope: Scope,
    options: TopologyOptions,
}

impl TopologyDefinition {
    /// Validates the inputs. No declaration exists until [`Self::build`].
    #[instrument(level = Level::INFO, skip(config), err(Display))]
    pub fn try_new(deployment_id: &str, config: &TopologyConfig) -> Result<Self, TopologyError> {
        let deployment_id = DeploymentId::try_new(deployment_id)?;
        let options = config.resolve()?;

        Ok(Self {
            scope: Scope::new(deployment_id),
            options,
        })
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    pub fn options(&self) -> &TopologyOptions {
        &self.options
    }

    #[instrument(
        level = Level::INFO,
        skip(self),
        fields(deployment_id = %self.scope.deployment_id()),
    )]
    pub fn build(&self) -> DeclarationGraph {
        let scope = &self.scope;

        let network = NetworkSpec::declare(scope, &self.options);
        debug!("declared network: {}", &network.name);

        let cluster = ClusterSpec::declare(scope, &network);
        debug!("declared cluster: {}", &cluster.name);

        let service = ServiceSpec::declare(scope, &cluster, &self.options);
        debug!("declared service: {}", &service.name);

        let output = EndpointOutput::declare(scope, &service);
        debug!("declared output: {}", &output.name);

        info!("composed topology");
        DeclarationGraph::new(
            scope.deployment_id().clone(),
            network,
            cluster,
            service,
            output,
        )
    }
}

/// Validates the inputs and builds the declaration graph in one call.
pub fn compose(
    deployment_id: &str,
    config: &TopologyConfig,
) -> Result<DeclarationGraph, TopologyError> {
    TopologyDefinition::try_new(deployment_id, config).map(|definition| definition.build())
}

#[cfg(test)]
mod tests {
    use crate::{
        error::ConfigViolation,
        graph::DeclarationKind,
        service::{ListenerProtocol, LoadBalancerVisibility},
    };

    use super::*;

    fn demo_config() -> TopologyConfig {
        TopologyConfig {
            container_image_source: Some("./app".into()),
            ..Default::default()
        }
    }

    #[test]
    fn compose_demo() {
        let graph = compose("demo", &demo_config()).expect("valid topology");

        let network = graph.network();
        assert_eq!(network.name, "demo-vpc");
        assert_eq!(network.address_block.to_string(), "10.0.0.0/16");
        assert_eq!(network.availability_zone_count.get(), 2);

        let cluster = graph.cluster();
        assert_eq!(cluster.name, "demo-cluster");
        assert_eq!(cluster.network, network.to_ref());

        let service = graph.service();
        assert_eq!(service.id, "demo-fargate");
        assert_eq!(service.name, "demo-fargate-service");
        assert_eq!(service.cluster, cluster.to_ref());
        assert_eq!(service.cpu_units.get(), 512);
        assert_eq!(service.memory_mib.get(), 1024);
        assert_eq!(service.desired_replica_count.get(), 1);
        assert_eq!(service.container.name, "demo-container");
        assert_eq!(service.container.image.as_str(), "./app");
        assert_eq!(service.container.port.get(), 3000);
        assert_eq!(service.load_balancer.name, "demo-fargate-lba");
        assert_eq!(
            service.load_balancer.visibility,
            LoadBalancerVisibility::Public,
        );
        assert_eq!(service.load_balancer.protocol, ListenerProtocol::Http);

        let output = graph.output();
        assert_eq!(output.name, "demo-url");
        assert_eq!(output.source, service.load_balancer_ref());
    }

    #[test]
    fn declarations_form_a_linear_chain() {
        let graph = compose("demo", &demo_config()).expect("valid topology");
        let declarations = graph.declarations();

        let kinds: Vec<_> = declarations.iter().map(|d| d.kind()).collect();
        assert_eq!(
            kinds,
            [
                DeclarationKind::Network,
                DeclarationKind::Cluster,
                DeclarationKind::Service,
                DeclarationKind::Output,
            ],
        );

        // every declaration but the first references its predecessor
        assert_eq!(declarations[0].depends_on(), None);
        for pair in declarations.windows(2) {
            assert_eq!(pair[1].depends_on(), Some(pair[0].name()));
        }
    }

    #[test]
    fn names_follow_deployment_id() {
        let names = |id: &str| -> Vec<String> {
            let graph = compose(id, &demo_config()).expect("valid topology");
            let service = graph.service();
            graph
                .declarations()
                .iter()
                .map(|d| d.name().to_string())
                .chain([
                    service.id.clone(),
                    service.container.name.clone(),
                    service.load_balancer.name.clone(),
                ])
                .collect()
        };

        assert_eq!(
            names("staging"),
            [
                "staging-vpc",
                "staging-cluster",
                "staging-fargate-service",
                "staging-url",
                "staging-fargate",
                "staging-container",
                "staging-fargate-lba",
            ],
        );
        for (a, b) in names("blue").iter().zip(names("green")) {
            assert_eq!(a.strip_prefix("blue-"), b.strip_prefix("green-"));
        }
    }

    #[test]
    fn compose_is_idempotent() {
        let config = TopologyConfig {
            cpu_units: Some(1024),
            desired_replica_count: Some(3),
            ..demo_config()
        };

        assert_eq!(compose("demo", &config), compose("demo", &config));
    }

    #[test]
    fn compose_without_image_source() {
        assert_eq!(
            compose("demo", &TopologyConfig::default()),
            Err(TopologyError::InvalidConfiguration {
                option: "containerImageSource",
                violation: ConfigViolation::Missing,
            }),
        );
    }

    #[test]
    fn compose_with_zero_cpu() {
        let config = TopologyConfig {
            cpu_units: Some(0),
            ..demo_config()
        };

        assert_eq!(
            compose("demo", &config),
            Err(TopologyError::InvalidConfiguration {
                option: "cpuUnits",
                violation: ConfigViolation::NonPositive,
            }),
        );
    }

    #[test]
    fn compose_with_empty_deployment_id() {
        assert_eq!(
            compose("", &demo_config()),
            Err(TopologyError::InvalidConfiguration {
                option: "deploymentId",
                violation: ConfigViolation::Empty,
            }),
        );
    }

    #[test]
    fn zone_count_only_affects_network() {
        let two = compose("demo", &demo_config()).expect("valid topology");
        let three = compose(
            "demo",
            &TopologyConfig {
                availability_zone_count: Some(3),
                ..demo_config()
            },
        )
        .expect("valid topology");

        assert_eq!(three.network().availability_zone_count.get(), 3);
        assert_ne!(two.network(), three.network());
        assert_eq!(two.cluster(), three.cluster());
        assert_eq!(two.service(), three.service());
        assert_eq!(two.output(), three.output());
    }

    #[test]
    fn internal_load_balancer() {
        let graph = compose(
            "demo",
            &TopologyConfig {
                publicly_reachable: Some(false),
                ..demo_config()
            },
        )
        .expect("valid topology");

        assert!(!graph.service().load_balancer.is_public());
    }

    #[test]
    fn graph_serializes_in_camel_case() {
        let graph = compose("demo", &demo_config()).expect("valid topology");
        let value: ::serde_yaml::Value = ::serde_yaml::to_value(&graph).expect("serializable");

        assert_eq!(value["deploymentId"].as_str(), Some("demo"));
        assert_eq!(value["network"]["addressBlock"].as_str(), Some("10.0.0.0/16"));
        assert_eq!(value["service"]["memoryMiB"].as_u64(), Some(1024));
        assert_eq!(
            value["service"]["loadBalancer"]["visibility"].as_str(),
            Some("public"),
        );
        assert_eq!(value["output"]["attribute"].as_str(), Some("DNSName"));
    }
}
