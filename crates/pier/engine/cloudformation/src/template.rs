use std::collections::BTreeMap;

use anyhow::{bail, Result};
use ipnet::Ipv4Net;
use pier_api::{
    graph::DeclarationGraph,
    network::NetworkSpec,
    output::EndpointOutput,
    service::{LoadBalancerSpec, ServiceSpec},
};
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{debug, instrument, Level};

use crate::subnet::SubnetPlan;

pub const FORMAT_VERSION: &str = "2010-09-09";

/// Port the load balancer listener accepts traffic on.
pub const LISTENER_PORT: u16 = 80;

const TASK_EXECUTION_POLICY_ARN: &str =
    "arn:${AWS::Partition}:iam::aws:policy/service-role/AmazonECSTaskExecutionRolePolicy";

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Template {
    #[serde(rename = "AWSTemplateFormatVersion")]
    pub format_version: &'static str,
    pub description: String,
    pub resources: BTreeMap<String, Resource>,
    pub outputs: BTreeMap<String, Output>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Resource {
    #[serde(rename = "Type")]
    pub kind: &'static str,
    pub properties: Value,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<String>,
}

impl Resource {
    fn new(kind: &'static str, properties: Value) -> Self {
        Self {
            kind,
            properties,
            depends_on: Vec::default(),
        }
    }

    fn depends_on(mut self, logical_id: impl Into<String>) -> Self {
        self.depends_on.push(logical_id.into());
        self
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Output {
    pub description: String,
    pub value: Value,
    pub export: OutputExport,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct OutputExport {
    pub name: String,
}

/// Converts a resource name into a template logical id (e.g. `demo-vpc` into `DemoVpc`).
pub fn logical_id(name: &str) -> String {
    ::inflector::cases::pascalcase::to_pascal_case(name)
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .collect()
}

fn reference(logical_id: &str) -> Value {
    json!({ "Ref": logical_id })
}

fn get_att(logical_id: &str, attribute: impl ToString) -> Value {
    json!({ "Fn::GetAtt": [logical_id, attribute.to_string()] })
}

fn name_tags(name: &str) -> Value {
    json!([{ "Key": "Name", "Value": name }])
}

impl Template {
    #[instrument(
        level = Level::INFO,
        skip_all,
        fields(deployment_id = %graph.deployment_id()),
        err(Display),
    )]
    pub fn synthesize(graph: &DeclarationGraph) -> Result<Self> {
        let mut builder = TemplateBuilder::default();

        let network = builder.network(graph.network())?;
        let cluster = logical_id(&graph.cluster().name);
        builder.insert(
            &cluster,
            Resource::new(
                "AWS::ECS::Cluster",
                json!({ "ClusterName": &graph.cluster().name }),
            ),
        )?;
        let load_balancer = builder.service(graph.service(), &network, &cluster)?;
        builder.output(graph.output(), &load_balancer)?;

        Ok(Self {
            format_version: FORMAT_VERSION,
            description: format!(
                "Load-balanced container service topology of {}",
                graph.deployment_id(),
            ),
            resources: builder.resources,
            outputs: builder.outputs,
        })
    }
}

/// Logical ids of the network resources the service is wired to.
struct NetworkIds {
    vpc: String,
    address_block: Ipv4Net,
    public_subnets: Vec<String>,
    private_subnets: Vec<String>,
}

#[derive(Default)]
struct TemplateBuilder {
    resources: BTreeMap<String, Resource>,
    outputs: BTreeMap<String, Output>,
}

impl TemplateBuilder {
    fn insert(&mut self, logical_id: &str, resource: Resource) -> Result<()> {
        if self.resources.contains_key(logical_id) {
            bail!("duplicated logical id: {logical_id}");
        }

        debug!("rendering {logical_id} ({kind})", kind = resource.kind);
        self.resources.insert(logical_id.into(), resource);
        Ok(())
    }

    fn network(&mut self, spec: &NetworkSpec) -> Result<NetworkIds> {
        let plan = SubnetPlan::carve(spec.address_block, spec.availability_zone_count)?;

        let vpc = logical_id(&spec.name);
        self.insert(
            &vpc,
            Resource::new(
                "AWS::EC2::VPC",
                json!({
                    "CidrBlock": spec.address_block.trunc().to_string(),
                    "EnableDnsHostnames": true,
                    "EnableDnsSupport": true,
                    "Tags": name_tags(&spec.name),
                }),
            ),
        )?;

        let gateway = logical_id(&format!("{}-igw", &spec.name));
        self.insert(
            &gateway,
            Resource::new(
                "AWS::EC2::InternetGateway",
                json!({ "Tags": name_tags(&spec.name) }),
            ),
        )?;
        let attachment = logical_id(&format!("{}-igw-attachment", &spec.name));
        self.insert(
            &attachment,
            Resource::new(
                "AWS::EC2::VPCGatewayAttachment",
                json!({
                    "InternetGatewayId": reference(&gateway),
                    "VpcId": reference(&vpc),
                }),
            ),
        )?;

        let mut public_subnets = Vec::with_capacity(plan.public.len());
        let mut private_subnets = Vec::with_capacity(plan.private.len());
        for (zone, (public, private)) in plan.public.iter().zip(&plan.private).enumerate() {
            let index = zone + 1;

            // public: routed through the internet gateway
            let subnet = self.subnet(spec, &vpc, "public", zone, public)?;
            let route_table = logical_id(&format!("{}-public-route-table-{index}", &spec.name));
            self.route_table(&vpc, &route_table, &subnet)?;
            self.insert(
                &logical_id(&format!("{}-public-default-route-{index}", &spec.name)),
                Resource::new(
                    "AWS::EC2::Route",
                    json!({
                        "DestinationCidrBlock": "0.0.0.0/0",
                        "GatewayId": reference(&gateway),
                        "RouteTableId": reference(&route_table),
                    }),
                )
                .depends_on(&attachment),
            )?;

            let nat_address = logical_id(&format!("{}-nat-eip-{index}", &spec.name));
            self.insert(
                &nat_address,
                Resource::new("AWS::EC2::EIP", json!({ "Domain": "vpc" }))
                    .depends_on(&attachment),
            )?;
            let nat_gateway = logical_id(&format!("{}-nat-gateway-{index}", &spec.name));
            self.insert(
                &nat_gateway,
                Resource::new(
                    "AWS::EC2::NatGateway",
                    json!({
                        "AllocationId": get_att(&nat_address, "AllocationId"),
                        "SubnetId": reference(&subnet),
                    }),
                ),
            )?;
            public_subnets.push(subnet);

            // private: routed through the zone's NAT gateway
            let subnet = self.subnet(spec, &vpc, "private", zone, private)?;
            let route_table = logical_id(&format!("{}-private-route-table-{index}", &spec.name));
            self.route_table(&vpc, &route_table, &subnet)?;
            self.insert(
                &logical_id(&format!("{}-private-default-route-{index}", &spec.name)),
                Resource::new(
                    "AWS::EC2::Route",
                    json!({
                        "DestinationCidrBlock": "0.0.0.0/0",
                        "NatGatewayId": reference(&nat_gateway),
                        "RouteTableId": reference(&route_table),
                    }),
                ),
            )?;
            private_subnets.push(subnet);
        }

        Ok(NetworkIds {
            vpc,
            address_block: spec.address_block,
            public_subnets,
            private_subnets,
        })
    }

    fn subnet(
        &mut self,
        spec: &NetworkSpec,
        vpc: &str,
        tier: &str,
        zone: usize,
        cidr: &Ipv4Net,
    ) -> Result<String> {
        let name = format!("{}-{tier}-subnet-{index}", &spec.name, index = zone + 1);
        let subnet = logical_id(&name);
        self.insert(
            &subnet,
            Resource::new(
                "AWS::EC2::Subnet",
                json!({
                    "AvailabilityZone": { "Fn::Select": [zone, { "Fn::GetAZs": "" }] },
                    "CidrBlock": cidr.to_string(),
                    "MapPublicIpOnLaunch": tier == "public",
                    "Tags": name_tags(&name),
                    "VpcId": reference(vpc),
                }),
            ),
        )?;
        Ok(subnet)
    }

    fn route_table(&mut self, vpc: &str, route_table: &str, subnet: &str) -> Result<()> {
        self.insert(
            route_table,
            Resource::new(
                "AWS::EC2::RouteTable",
                json!({ "VpcId": reference(vpc) }),
            ),
        )?;
        self.insert(
            &format!("{route_table}Association"),
            Resource::new(
                "AWS::EC2::SubnetRouteTableAssociation",
                json!({
                    "RouteTableId": reference(route_table),
                    "SubnetId": reference(subnet),
                }),
            ),
        )
    }

    /// Renders the task, load balancer and service; returns the load balancer's logical id.
    fn service(
        &mut self,
        spec: &ServiceSpec,
        network: &NetworkIds,
        cluster: &str,
    ) -> Result<String> {
        let ServiceSpec {
            id,
            name,
            cluster: _,
            cpu_units,
            memory_mib,
            desired_replica_count,
            container,
            load_balancer: load_balancer_spec,
        } = spec;

        // lets the agent pull private images and ship container logs
        let execution_role = logical_id(&format!("{id}-task-execution-role"));
        self.insert(
            &execution_role,
            Resource::new(
                "AWS::IAM::Role",
                json!({
                    "AssumeRolePolicyDocument": {
                        "Statement": [{
                            "Action": "sts:AssumeRole",
                            "Effect": "Allow",
                            "Principal": { "Service": "ecs-tasks.amazonaws.com" },
                        }],
                        "Version": "2012-10-17",
                    },
                    "ManagedPolicyArns": [{ "Fn::Sub": TASK_EXECUTION_POLICY_ARN }],
                }),
            ),
        )?;

        let log_group = logical_id(&format!("{id}-log-group"));
        self.insert(
            &log_group,
            Resource::new("AWS::Logs::LogGroup", json!({ "Tags": name_tags(id) })),
        )?;

        let task_definition = logical_id(&format!("{id}-task-definition"));
        self.insert(
            &task_definition,
            Resource::new(
                "AWS::ECS::TaskDefinition",
                json!({
                    "ContainerDefinitions": [{
                        "Essential": true,
                        "Image": container.image.as_str(),
                        "LogConfiguration": {
                            "LogDriver": "awslogs",
                            "Options": {
                                "awslogs-group": reference(&log_group),
                                "awslogs-region": reference("AWS::Region"),
                                "awslogs-stream-prefix": id,
                            },
                        },
                        "Name": &container.name,
                        "PortMappings": [{
                            "ContainerPort": container.port,
                            "Protocol": "tcp",
                        }],
                    }],
                    "Cpu": cpu_units.to_string(),
                    "ExecutionRoleArn": get_att(&execution_role, "Arn"),
                    "Family": id,
                    "Memory": memory_mib.to_string(),
                    "NetworkMode": "awsvpc",
                    "RequiresCompatibilities": ["FARGATE"],
                }),
            ),
        )?;

        let load_balancer = self.load_balancer(load_balancer_spec, network)?;

        let target_group = logical_id(&format!("{}-target-group", &load_balancer_spec.name));
        self.insert(
            &target_group,
            Resource::new(
                "AWS::ElasticLoadBalancingV2::TargetGroup",
                json!({
                    "Port": container.port,
                    "Protocol": load_balancer_spec.protocol.to_string(),
                    "TargetType": "ip",
                    "VpcId": reference(&network.vpc),
                }),
            ),
        )?;

        let listener = logical_id(&format!("{}-listener", &load_balancer_spec.name));
        self.insert(
            &listener,
            Resource::new(
                "AWS::ElasticLoadBalancingV2::Listener",
                json!({
                    "DefaultActions": [{
                        "TargetGroupArn": reference(&target_group),
                        "Type": "forward",
                    }],
                    "LoadBalancerArn": reference(&load_balancer),
                    "Port": LISTENER_PORT,
                    "Protocol": load_balancer_spec.protocol.to_string(),
                }),
            ),
        )?;

        let security_group = logical_id(&format!("{name}-security-group"));
        self.insert(
            &security_group,
            Resource::new(
                "AWS::EC2::SecurityGroup",
                json!({
                    "GroupDescription": format!("Tasks of {name}"),
                    "SecurityGroupIngress": [{
                        "FromPort": container.port,
                        "IpProtocol": "tcp",
                        "SourceSecurityGroupId": get_att(
                            &format!("{load_balancer}SecurityGroup"),
                            "GroupId",
                        ),
                        "ToPort": container.port,
                    }],
                    "VpcId": reference(&network.vpc),
                }),
            ),
        )?;

        self.insert(
            &logical_id(name),
            Resource::new(
                "AWS::ECS::Service",
                json!({
                    "Cluster": reference(cluster),
                    "DesiredCount": desired_replica_count,
                    "LaunchType": "FARGATE",
                    "LoadBalancers": [{
                        "ContainerName": &container.name,
                        "ContainerPort": container.port,
                        "TargetGroupArn": reference(&target_group),
                    }],
                    "NetworkConfiguration": {
                        "AwsvpcConfiguration": {
                            "AssignPublicIp": "DISABLED",
                            "SecurityGroups": [get_att(&security_group, "GroupId")],
                            "Subnets": network
                                .private_subnets
                                .iter()
                                .map(|subnet| reference(subnet))
                                .collect::<Vec<_>>(),
                        },
                    },
                    "ServiceName": name,
                    "TaskDefinition": reference(&task_definition),
                }),
            )
            .depends_on(&listener),
        )?;

        Ok(load_balancer)
    }

    fn load_balancer(&mut self, spec: &LoadBalancerSpec, network: &NetworkIds) -> Result<String> {
        let load_balancer = logical_id(&spec.name);

        // internal load balancers only accept traffic from inside the network
        let (scheme, subnets, ingress) = if spec.is_public() {
            ("internet-facing", &network.public_subnets, "0.0.0.0/0".to_string())
        } else {
            (
                "internal",
                &network.private_subnets,
                network.address_block.trunc().to_string(),
            )
        };

        let security_group = format!("{load_balancer}SecurityGroup");
        self.insert(
            &security_group,
            Resource::new(
                "AWS::EC2::SecurityGroup",
                json!({
                    "GroupDescription": format!("Load balancer {}", &spec.name),
                    "SecurityGroupIngress": [{
                        "CidrIp": ingress,
                        "FromPort": LISTENER_PORT,
                        "IpProtocol": "tcp",
                        "ToPort": LISTENER_PORT,
                    }],
                    "VpcId": reference(&network.vpc),
                }),
            ),
        )?;

        self.insert(
            &load_balancer,
            Resource::new(
                "AWS::ElasticLoadBalancingV2::LoadBalancer",
                json!({
                    "Name": &spec.name,
                    "Scheme": scheme,
                    "SecurityGroups": [get_att(&security_group, "GroupId")],
                    "Subnets": subnets
                        .iter()
                        .map(|subnet| reference(subnet))
                        .collect::<Vec<_>>(),
                    "Type": "application",
                }),
            ),
        )?;
        Ok(load_balancer)
    }

    fn output(&mut self, spec: &EndpointOutput, load_balancer: &str) -> Result<()> {
        let output = logical_id(&spec.name);
        if self.outputs.contains_key(&output) {
            bail!("duplicated output: {output}");
        }

        self.outputs.insert(
            output,
            Output {
                description: format!("Public endpoint of {}", &spec.source.service),
                value: get_att(load_balancer, spec.attribute),
                export: OutputExport {
                    name: spec.name.clone(),
                },
            },
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use pier_api::{compose, config::TopologyConfig};

    use super::*;

    fn synthesize(config: TopologyConfig) -> Template {
        let config = TopologyConfig {
            container_image_source: Some("./app".into()),
            ..config
        };
        let graph = compose("demo", &config).expect("valid topology");
        Template::synthesize(&graph).expect("renderable topology")
    }

    fn count(template: &Template, kind: &str) -> usize {
        template
            .resources
            .values()
            .filter(|resource| resource.kind == kind)
            .count()
    }

    #[test]
    fn logical_ids() {
        assert_eq!(logical_id("demo-vpc"), "DemoVpc");
        assert_eq!(logical_id("demo-fargate-lba"), "DemoFargateLba");
        assert_eq!(
            logical_id("demo-vpc-public-subnet-1"),
            "DemoVpcPublicSubnet1",
        );
    }

    #[test]
    fn synthesize_demo() {
        let template = synthesize(TopologyConfig::default());

        let vpc = &template.resources["DemoVpc"];
        assert_eq!(vpc.kind, "AWS::EC2::VPC");
        assert_eq!(vpc.properties["CidrBlock"], "10.0.0.0/16");

        assert_eq!(count(&template, "AWS::EC2::Subnet"), 4);
        assert_eq!(count(&template, "AWS::EC2::NatGateway"), 2);
        assert_eq!(
            template.resources["DemoVpcPublicSubnet2"].properties["CidrBlock"],
            "10.0.64.0/18",
        );

        let cluster = &template.resources["DemoCluster"];
        assert_eq!(cluster.kind, "AWS::ECS::Cluster");
        assert_eq!(cluster.properties["ClusterName"], "demo-cluster");

        let task = &template.resources["DemoFargateTaskDefinition"];
        assert_eq!(task.properties["Cpu"], "512");
        assert_eq!(task.properties["Memory"], "1024");
        assert_eq!(
            task.properties["ExecutionRoleArn"],
            json!({ "Fn::GetAtt": ["DemoFargateTaskExecutionRole", "Arn"] }),
        );
        assert_eq!(
            task.properties["ContainerDefinitions"][0],
            json!({
                "Essential": true,
                "Image": "./app",
                "LogConfiguration": {
                    "LogDriver": "awslogs",
                    "Options": {
                        "awslogs-group": { "Ref": "DemoFargateLogGroup" },
                        "awslogs-region": { "Ref": "AWS::Region" },
                        "awslogs-stream-prefix": "demo-fargate",
                    },
                },
                "Name": "demo-container",
                "PortMappings": [{ "ContainerPort": 3000, "Protocol": "tcp" }],
            }),
        );

        let execution_role = &template.resources["DemoFargateTaskExecutionRole"];
        assert_eq!(execution_role.kind, "AWS::IAM::Role");
        assert_eq!(
            execution_role.properties["AssumeRolePolicyDocument"]["Statement"][0]["Principal"]
                ["Service"],
            "ecs-tasks.amazonaws.com",
        );
        assert_eq!(
            execution_role.properties["ManagedPolicyArns"],
            json!([{
                "Fn::Sub": "arn:${AWS::Partition}:iam::aws:policy/service-role/AmazonECSTaskExecutionRolePolicy",
            }]),
        );
        assert_eq!(
            template.resources["DemoFargateLogGroup"].kind,
            "AWS::Logs::LogGroup",
        );

        let load_balancer = &template.resources["DemoFargateLba"];
        assert_eq!(load_balancer.properties["Name"], "demo-fargate-lba");
        assert_eq!(load_balancer.properties["Scheme"], "internet-facing");
        assert_eq!(
            load_balancer.properties["Subnets"],
            json!([{ "Ref": "DemoVpcPublicSubnet1" }, { "Ref": "DemoVpcPublicSubnet2" }]),
        );

        let listener = &template.resources["DemoFargateLbaListener"];
        assert_eq!(listener.properties["Port"], 80);
        assert_eq!(listener.properties["Protocol"], "HTTP");

        let service = &template.resources["DemoFargateService"];
        assert_eq!(service.kind, "AWS::ECS::Service");
        assert_eq!(service.properties["ServiceName"], "demo-fargate-service");
        assert_eq!(service.properties["Cluster"], json!({ "Ref": "DemoCluster" }));
        assert_eq!(service.properties["DesiredCount"], 1);
        assert_eq!(service.depends_on, ["DemoFargateLbaListener"]);

        assert_eq!(template.outputs.len(), 1);
        let output = &template.outputs["DemoUrl"];
        assert_eq!(output.export.name, "demo-url");
        assert_eq!(
            output.value,
            json!({ "Fn::GetAtt": ["DemoFargateLba", "DNSName"] }),
        );
    }

    #[test]
    fn synthesize_internal() {
        let template = synthesize(TopologyConfig {
            publicly_reachable: Some(false),
            ..Default::default()
        });

        let load_balancer = &template.resources["DemoFargateLba"];
        assert_eq!(load_balancer.properties["Scheme"], "internal");
        assert_eq!(
            load_balancer.properties["Subnets"],
            json!([{ "Ref": "DemoVpcPrivateSubnet1" }, { "Ref": "DemoVpcPrivateSubnet2" }]),
        );
        assert_eq!(
            template.resources["DemoFargateLbaSecurityGroup"].properties["SecurityGroupIngress"]
                [0]["CidrIp"],
            "10.0.0.0/16",
        );
    }

    #[test]
    fn synthesize_three_zones() {
        let template = synthesize(TopologyConfig {
            availability_zone_count: Some(3),
            ..Default::default()
        });

        assert_eq!(count(&template, "AWS::EC2::Subnet"), 6);
        assert_eq!(
            template.resources["DemoVpcPrivateSubnet3"].properties["CidrBlock"],
            "10.0.160.0/19",
        );
    }

    #[test]
    fn synthesize_too_small_network() {
        let config = TopologyConfig {
            address_block: Some("10.0.0.0/27".parse().expect("valid cidr")),
            container_image_source: Some("./app".into()),
            ..Default::default()
        };
        let graph = compose("demo", &config).expect("valid topology");

        assert!(Template::synthesize(&graph).is_err());
    }

    #[test]
    fn synthesize_is_deterministic() {
        assert_eq!(
            synthesize(TopologyConfig::default()),
            synthesize(TopologyConfig::default()),
        );
    }
}
