pub mod cluster;
pub mod config;
pub mod engine;
pub mod error;
pub mod graph;
pub mod name;
pub mod network;
pub mod output;
pub mod service;
pub mod topology;

pub use self::{
    error::{ConfigViolation, TopologyError},
    graph::DeclarationGraph,
    topology::{compose, TopologyDefinition},
};

pub mod consts {
    pub const DEFAULT_ADDRESS_BLOCK: &str = "10.0.0.0/16";
    pub const DEFAULT_AVAILABILITY_ZONE_COUNT: u8 = 2;
    pub const DEFAULT_CONTAINER_PORT: u16 = 3000;
    pub const DEFAULT_CPU_UNITS: u32 = 512;
    pub const DEFAULT_DESIRED_REPLICA_COUNT: u32 = 1;
    pub const DEFAULT_MEMORY_MIB: u32 = 1024;
    pub const DEFAULT_PUBLICLY_REACHABLE: bool = true;
}
