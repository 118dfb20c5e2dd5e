//! Starting a flow by name fragment and following its progress.

use anyhow::Result;
use flowsh_rpc::FlowRpcOps;
use flowsh_types::FlowProgress;

use crate::render::ShellOutput;

/// Usage line printed when `start` is given no flow name.
pub(crate) const START_USAGE: &str =
    "You must pass a name for the flow. Example: \"start YoFlow target: Some other company\"";

/// Outcome of resolving a user-supplied name fragment against the node's
/// registered flows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NameMatch {
    /// Exactly one flow matched.
    Unique(String),
    /// Several flows contain the fragment; no start call is made.
    Ambiguous(Vec<String>),
    /// Nothing matched.
    NotFound,
}

/// Resolve a flow name fragment: an exact registered name always wins,
/// otherwise the fragment must be a substring of exactly one name.
pub fn resolve_flow_name(registered: &[String], fragment: &str) -> NameMatch {
    if registered.iter().any(|name| name == fragment) {
        return NameMatch::Unique(fragment.to_string());
    }
    let matches: Vec<String> = registered.iter().filter(|name| name.contains(fragment)).cloned().collect();
    match matches.len() {
        0 => NameMatch::NotFound,
        1 => NameMatch::Unique(matches.into_iter().next().expect("one match")),
        _ => NameMatch::Ambiguous(matches),
    }
}

/// Start a flow and print its progress until it completes or fails.
///
/// Remaining tokens after the name are passed through to the gateway
/// verbatim; parameter binding is the node's job.
pub async fn run_start(
    gateway: &dyn FlowRpcOps,
    out: &mut dyn ShellOutput,
    fragment: &str,
    args: &[String],
) -> Result<()> {
    let registered = gateway.registered_flows().await?;
    let name = match resolve_flow_name(&registered, fragment) {
        NameMatch::Unique(name) => name,
        NameMatch::Ambiguous(options) => {
            out.failure("Ambiguous name provided, please be more specific. Your options are:");
            for option in options {
                out.line(&format!("\t{}", option));
            }
            return Ok(());
        }
        NameMatch::NotFound => {
            out.failure(&format!(
                "No matching flow found registered with name '{}', use 'list' to see your options.",
                fragment
            ));
            return Ok(());
        }
    };

    let mut progress = gateway.start_flow(&name, args).await?;
    while let Some(event) = progress.recv().await {
        match event {
            FlowProgress::Step { label } => out.line(&format!("    {}", label)),
            FlowProgress::Done { result } => out.success(&format!("Flow completed with result: {}", result)),
            FlowProgress::Failed { message } => out.failure(&format!("Flow failed: {}", message)),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registered() -> Vec<String> {
        vec![
            "net.example.flows.CashIssueFlow".to_string(),
            "net.example.flows.CashPaymentFlow".to_string(),
            "net.example.flows.YoFlow".to_string(),
        ]
    }

    #[test]
    fn exact_name_wins_even_when_it_is_a_substring_of_another() {
        let names = vec!["CashIssue".to_string(), "CashIssueAndPayment".to_string()];
        assert_eq!(resolve_flow_name(&names, "CashIssue"), NameMatch::Unique("CashIssue".into()));
    }

    #[test]
    fn unique_substring_resolves() {
        assert_eq!(
            resolve_flow_name(&registered(), "YoFlow"),
            NameMatch::Unique("net.example.flows.YoFlow".into())
        );
    }

    #[test]
    fn ambiguous_fragment_lists_candidates() {
        match resolve_flow_name(&registered(), "Cash") {
            NameMatch::Ambiguous(options) => assert_eq!(options.len(), 2),
            other => panic!("expected ambiguous match, got {:?}", other),
        }
    }

    #[test]
    fn unmatched_fragment_is_not_found() {
        assert_eq!(resolve_flow_name(&registered(), "Bond"), NameMatch::NotFound);
    }
}
