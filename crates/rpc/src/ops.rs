//! Abstract surface of the remote flow operations gateway.

use anyhow::Result;
use async_trait::async_trait;
use flowsh_types::{FlowProgress, FlowRecoveryQuery, FlowRunId, TxnHash};
use indexmap::IndexMap;
use tokio::sync::mpsc;

/// Remote procedures the shell can invoke on a node.
///
/// All workflow state and logic lives behind this trait; the shell is
/// command-dispatch glue. Boolean returns are operation outcomes, not
/// transport status: `false` means the node declined the operation (for
/// example there was nothing to pause) and is rendered as a failure line,
/// not treated as an error. Transport failures surface as `Err` and are
/// propagated unmodified.
#[async_trait]
pub trait FlowRpcOps: Send + Sync {
    async fn pause_flow(&self, id: &FlowRunId) -> Result<bool>;

    async fn pause_all_flows(&self) -> Result<bool>;

    async fn pause_all_hospitalized_flows(&self) -> Result<bool>;

    async fn retry_flow(&self, id: &FlowRunId) -> Result<bool>;

    async fn retry_all_paused_flows(&self) -> Result<bool>;

    async fn retry_all_paused_hospitalized_flows(&self) -> Result<bool>;

    async fn kill_flow(&self, id: &FlowRunId) -> Result<bool>;

    /// Resume a flow stalled in its terminal commit phase. `force` also
    /// recovers flows held in a HOSPITALIZED or PAUSED state.
    async fn recover_finality_flow(&self, id: &FlowRunId, force: bool) -> Result<bool>;

    async fn recover_finality_flow_by_txn_id(&self, txn_id: &TxnHash, force: bool) -> Result<bool>;

    /// Bulk finality recovery; the mapping preserves the node's entry order.
    async fn recover_all_finality_flows(&self, force: bool) -> Result<IndexMap<FlowRunId, bool>>;

    async fn recover_finality_flows_matching(
        &self,
        query: &FlowRecoveryQuery,
        force: bool,
    ) -> Result<IndexMap<FlowRunId, bool>>;

    /// Names of the flows an operator is allowed to start.
    async fn registered_flows(&self) -> Result<Vec<String>>;

    /// Start a flow by its full class name, passing free-form arguments
    /// through for the node to bind. Progress events arrive on the returned
    /// channel until the flow completes or fails.
    async fn start_flow(&self, name: &str, args: &[String]) -> Result<mpsc::Receiver<FlowProgress>>;
}
