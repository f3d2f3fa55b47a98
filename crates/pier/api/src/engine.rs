use anyhow::Result;
use async_trait::async_trait;

use crate::graph::DeclarationGraph;

/// The boundary to whatever turns declarations into live resources.
///
/// Failures are returned to the caller as-is; nothing here retries.
#[async_trait]
pub trait ProvisioningEngine {
    type Output: Send;

    async fn provision(
        &self,
        graph: &DeclarationGraph,
    ) -> Result<<Self as ProvisioningEngine>::Output>;
}
