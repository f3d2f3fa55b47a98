use std::num::NonZeroU8;

use anyhow::{anyhow, bail, Result};
use ipnet::Ipv4Net;

/// The longest prefix a subnet may have.
pub const MAX_SUBNET_PREFIX_LEN: u8 = 28;

/// One public and one private subnet per availability zone, carved from the
/// network's address block in equal power-of-two sized blocks.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubnetPlan {
    pub public: Vec<Ipv4Net>,
    pub private: Vec<Ipv4Net>,
}

impl SubnetPlan {
    pub fn carve(address_block: Ipv4Net, availability_zone_count: NonZeroU8) -> Result<Self> {
        let zones = usize::from(availability_zone_count.get());
        let count = zones * 2;

        let extra_bits = count.next_power_of_two().trailing_zeros() as u8;
        let prefix_len = address_block.prefix_len() + extra_bits;
        if prefix_len > MAX_SUBNET_PREFIX_LEN {
            bail!(
                "address block {address_block} is too small for {count} subnets: \
                 /{prefix_len} exceeds /{MAX_SUBNET_PREFIX_LEN}"
            );
        }

        let mut subnets = address_block
            .trunc()
            .subnets(prefix_len)
            .map_err(|error| anyhow!("failed to split address block {address_block}: {error}"))?;

        let public: Vec<_> = subnets.by_ref().take(zones).collect();
        let private: Vec<_> = subnets.take(zones).collect();
        Ok(Self { public, private })
    }
}
