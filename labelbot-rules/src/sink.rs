use async_trait::async_trait;

use crate::error::SinkError;
use crate::outcome::LabelMutationPlan;

/// Client that performs the actual label calls against the hosting platform.
///
/// Implementations own retrying of transient API failures; plans carry no
/// retry state.
#[async_trait]
pub trait LabelSink: Send + Sync {
    async fn apply(&self, pull_request: u64, plan: &LabelMutationPlan) -> Result<(), SinkError>;
}
