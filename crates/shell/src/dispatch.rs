//! Verb dispatch: one line of input, one gateway call.

use anyhow::Result;
use flowsh_rpc::FlowRpcOps;
use flowsh_types::{CommandOutcome, FlowRunId, ForceRecover, TxnHash};
use tracing::info;

use crate::recovery::parse_recovery_query;
use crate::render::{ShellOutput, render};
use crate::start::{START_USAGE, run_start};

/// One entry of the static verb table.
#[derive(Debug, Clone, Copy)]
pub struct VerbSpec {
    pub name: &'static str,
    pub usage: &'static str,
}

/// The closed set of shell verbs, in help order.
pub const VERBS: &[VerbSpec] = &[
    VerbSpec {
        name: "start",
        usage: "start <name> [key: value ...] - start a flow by class name or unambiguous substring",
    },
    VerbSpec {
        name: "list",
        usage: "list - list the flows an operator can start",
    },
    VerbSpec {
        name: "kill",
        usage: "kill <id> - kill a flow running on the node",
    },
    VerbSpec {
        name: "pause",
        usage: "pause <id> - pause a flow running on the node",
    },
    VerbSpec {
        name: "pauseAll",
        usage: "pauseAll - pause all flows running on the node",
    },
    VerbSpec {
        name: "pauseAllHospitalized",
        usage: "pauseAllHospitalized - pause all hospitalized flows",
    },
    VerbSpec {
        name: "retry",
        usage: "retry <id> - retry a flow running on the node",
    },
    VerbSpec {
        name: "retryAllPaused",
        usage: "retryAllPaused - retry all paused flows",
    },
    VerbSpec {
        name: "retryAllPausedHospitalized",
        usage: "retryAllPausedHospitalized - retry all paused flows that were hospitalized before pausing",
    },
    VerbSpec {
        name: "recover",
        usage: "recover <id> [-f|--force-recover] - recover a finality flow by run id",
    },
    VerbSpec {
        name: "recoverByTxnId",
        usage: "recoverByTxnId <hash> [-f|--force-recover] - recover a finality flow by transaction id",
    },
    VerbSpec {
        name: "recoverAll",
        usage: "recoverAll [-f|--force-recover] - recover all failed finality flows",
    },
    VerbSpec {
        name: "recoverMatching",
        usage: "recoverMatching [criteria ...] [-f|--force-recover] - recover failed finality flows matching search criteria",
    },
];

/// Dispatch one command against the gateway and render the result.
///
/// Parse and usage errors are rendered locally and return `Ok`; the
/// gateway is not called for them. Transport failures from the gateway
/// propagate as `Err` unmodified. Each invocation performs exactly one
/// gateway call (plus the preliminary `registeredFlows` lookup for
/// `start`), and no state is carried between invocations.
///
/// Only the `recover*` verbs take the force-recover switch; every other
/// verb receives its arguments untouched, so a `-f` token inside `start`
/// flow arguments reaches the node verbatim.
pub async fn dispatch(
    gateway: &dyn FlowRpcOps,
    out: &mut dyn ShellOutput,
    verb: &str,
    args: &[String],
) -> Result<()> {
    info!(verb, args = %args.join(" "), "executing flow command");

    match verb {
        "start" => {
            let Some(name) = args.first() else {
                out.failure(START_USAGE);
                return Ok(());
            };
            run_start(gateway, out, name, &args[1..]).await?;
        }
        "list" => {
            for name in gateway.registered_flows().await? {
                out.line(&name);
            }
        }
        "kill" => {
            let Some(id) = require_run_id(out, verb, args) else {
                return Ok(());
            };
            let ok = gateway.kill_flow(&id).await?;
            render(out, &ok.into(), &format!("Killed flow {}", id), &format!("Failed to kill flow {}", id));
        }
        "pause" => {
            let Some(id) = require_run_id(out, verb, args) else {
                return Ok(());
            };
            let ok = gateway.pause_flow(&id).await?;
            render(out, &ok.into(), &format!("Paused flow {}", id), &format!("Failed to pause flow {}", id));
        }
        "pauseAll" => {
            let ok = gateway.pause_all_flows().await?;
            render(out, &ok.into(), "Pausing all flows succeeded.", "Failed to pause one or more flows.");
        }
        "pauseAllHospitalized" => {
            let ok = gateway.pause_all_hospitalized_flows().await?;
            render(
                out,
                &ok.into(),
                "Pausing all Hospitalized flows succeeded.",
                "Failed to pause one or more Hospitalized flows.",
            );
        }
        "retry" => {
            let Some(id) = require_run_id(out, verb, args) else {
                return Ok(());
            };
            let ok = gateway.retry_flow(&id).await?;
            render(out, &ok.into(), &format!("Retried flow {}", id), &format!("Failed to retry flow {}", id));
        }
        "retryAllPaused" => {
            let ok = gateway.retry_all_paused_flows().await?;
            render(
                out,
                &ok.into(),
                "Retrying all paused flows succeeded.",
                "One or more paused flows failed to retry.",
            );
        }
        "retryAllPausedHospitalized" => {
            let ok = gateway.retry_all_paused_hospitalized_flows().await?;
            render(
                out,
                &ok.into(),
                "Retrying all paused hospitalized flows succeeded.",
                "One or more paused hospitalized flows failed to retry.",
            );
        }
        "recover" => {
            let (args, force) = split_force_flag(args);
            let Some(id) = require_run_id(out, verb, &args) else {
                return Ok(());
            };
            let ok = gateway.recover_finality_flow(&id, force.effective()).await?;
            render(
                out,
                &ok.into(),
                &format!("Recovered finality flow {}", id),
                &format!("Failed to recover finality flow {}", id),
            );
        }
        "recoverByTxnId" => {
            let (args, force) = split_force_flag(args);
            let Some(txn_id) = require_txn_hash(out, &args) else {
                return Ok(());
            };
            let ok = gateway.recover_finality_flow_by_txn_id(&txn_id, force.effective()).await?;
            render(
                out,
                &ok.into(),
                &format!("Recovered finality flow {}", txn_id),
                &format!("Failed to recover finality flow {}", txn_id),
            );
        }
        "recoverAll" => {
            let (_, force) = split_force_flag(args);
            let results = gateway.recover_all_finality_flows(force.effective()).await?;
            render(
                out,
                &CommandOutcome::Bulk(results),
                "Recovered finality flow(s) ",
                "Failed to recover finality flow(s) ",
            );
        }
        "recoverMatching" => {
            let (args, force) = split_force_flag(args);
            let query = match parse_recovery_query(&args) {
                Ok(query) => query,
                Err(e) => {
                    out.failure(&e.to_string());
                    return Ok(());
                }
            };
            let results = gateway.recover_finality_flows_matching(&query, force.effective()).await?;
            for (id, ok) in &results {
                out.line(&format!("\t{}={}", id, ok));
            }
            render(
                out,
                &CommandOutcome::Bulk(results),
                "Recovered finality flow(s) ",
                "Failed to recover finality flow(s) ",
            );
        }
        _ => {
            out.failure(&format!("unknown flow command '{}'", verb));
            out.line("Available commands:");
            for spec in VERBS {
                out.line(&format!("  {}", spec.usage));
            }
        }
    }

    Ok(())
}

/// Pull the optional force-recover switch out of the argument list. Absent
/// means [`ForceRecover::Default`]; the concrete boolean is resolved once,
/// at the gateway call boundary.
fn split_force_flag(args: &[String]) -> (Vec<String>, ForceRecover) {
    let mut rest = Vec::new();
    let mut force = ForceRecover::Default;
    for arg in args {
        match arg.as_str() {
            "-f" | "--force-recover" | "-f=true" | "--force-recover=true" => force = ForceRecover::Enabled,
            "-f=false" | "--force-recover=false" => force = ForceRecover::Disabled,
            _ => rest.push(arg.clone()),
        }
    }
    (rest, force)
}

fn require_run_id(out: &mut dyn ShellOutput, verb: &str, args: &[String]) -> Option<FlowRunId> {
    let Some(text) = args.first() else {
        out.failure(&format!("You must pass the run id of the flow. Example: \"{} <uuid>\"", verb));
        return None;
    };
    match text.parse() {
        Ok(id) => Some(id),
        Err(e) => {
            out.failure(&format!("{}", e));
            None
        }
    }
}

fn require_txn_hash(out: &mut dyn ShellOutput, args: &[String]) -> Option<TxnHash> {
    let Some(text) = args.first() else {
        out.failure("You must pass the transaction id to recover. Example: \"recoverByTxnId <hash>\"");
        return None;
    };
    match text.parse() {
        Ok(txn_id) => Some(txn_id),
        Err(e) => {
            out.failure(&format!("{}", e));
            None
        }
    }
}
