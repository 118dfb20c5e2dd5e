//! Reqwest-backed implementation of the flow operations gateway.

use std::time::Duration;

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use flowsh_types::{FlowProgress, FlowRecoveryQuery, FlowRunId, TxnHash};
use futures_util::StreamExt;
use indexmap::IndexMap;
use reqwest::{Client, RequestBuilder, header};
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tokio::sync::mpsc;
use tracing::debug;

use crate::config::ShellConfig;
use crate::ops::FlowRpcOps;

/// Buffered progress events per started flow before backpressure applies.
const PROGRESS_CHANNEL_CAPACITY: usize = 32;

/// Thin wrapper around a configured `reqwest::Client` for gateway access.
///
/// Remote procedures are invoked as `POST <base>/rpc/<method>` with a JSON
/// body and a JSON response. Credentials come from the session
/// configuration and are sent as HTTP basic auth.
#[derive(Debug, Clone)]
pub struct GatewayClient {
    base_url: String,
    http: Client,
    user: String,
    password: String,
    user_agent: String,
}

impl GatewayClient {
    /// Construct a client from resolved connection settings.
    ///
    /// Validates the base URL (HTTPS required for non-localhost hosts
    /// unless `insecure` is set) and applies a 30 second request timeout.
    pub fn new(config: &ShellConfig) -> Result<Self> {
        let base_url = config.base_url()?;

        let mut default_headers = header::HeaderMap::new();
        default_headers.insert(header::ACCEPT, header::HeaderValue::from_static("application/json"));

        let http = Client::builder()
            .default_headers(default_headers)
            .timeout(Duration::from_secs(30))
            .build()
            .context("build http client")?;

        Ok(Self {
            base_url,
            http,
            user: config.user.clone(),
            password: config.password.clone(),
            user_agent: format!("flowsh/{}; {}", env!("CARGO_PKG_VERSION"), std::env::consts::OS),
        })
    }

    /// Build a request for one named remote procedure.
    fn request(&self, method: &str) -> RequestBuilder {
        let url = format!("{}/rpc/{}", self.base_url, method);
        debug!(%url, "building gateway request");

        let mut builder = self.http.post(url).header(header::USER_AGENT, &self.user_agent);
        if !self.user.is_empty() {
            builder = builder.basic_auth(&self.user, Some(&self.password));
        }
        builder
    }

    /// Invoke a remote procedure and decode its JSON response.
    async fn call<T: DeserializeOwned>(&self, method: &str, body: Value) -> Result<T> {
        let resp = self
            .request(method)
            .json(&body)
            .send()
            .await
            .with_context(|| format!("calling gateway procedure '{}'", method))?;

        let status = resp.status();
        let text = resp.text().await.unwrap_or_default();
        if !status.is_success() {
            bail!("gateway returned HTTP {} for '{}': {}", status.as_u16(), method, text.trim());
        }
        serde_json::from_str(&text).with_context(|| format!("decoding '{}' response", method))
    }
}

#[async_trait]
impl FlowRpcOps for GatewayClient {
    async fn pause_flow(&self, id: &FlowRunId) -> Result<bool> {
        self.call("pauseFlow", json!({ "id": id })).await
    }

    async fn pause_all_flows(&self) -> Result<bool> {
        self.call("pauseAllFlows", json!({})).await
    }

    async fn pause_all_hospitalized_flows(&self) -> Result<bool> {
        self.call("pauseAllHospitalizedFlows", json!({})).await
    }

    async fn retry_flow(&self, id: &FlowRunId) -> Result<bool> {
        self.call("retryFlow", json!({ "id": id })).await
    }

    async fn retry_all_paused_flows(&self) -> Result<bool> {
        self.call("retryAllPausedFlows", json!({})).await
    }

    async fn retry_all_paused_hospitalized_flows(&self) -> Result<bool> {
        self.call("retryAllPausedHospitalizedFlows", json!({})).await
    }

    async fn kill_flow(&self, id: &FlowRunId) -> Result<bool> {
        self.call("killFlow", json!({ "id": id })).await
    }

    async fn recover_finality_flow(&self, id: &FlowRunId, force: bool) -> Result<bool> {
        self.call("recoverFinalityFlow", json!({ "id": id, "forceRecover": force })).await
    }

    async fn recover_finality_flow_by_txn_id(&self, txn_id: &TxnHash, force: bool) -> Result<bool> {
        self.call("recoverFinalityFlowByTxnId", json!({ "txnId": txn_id, "forceRecover": force }))
            .await
    }

    async fn recover_all_finality_flows(&self, force: bool) -> Result<IndexMap<FlowRunId, bool>> {
        self.call("recoverAllFinalityFlows", json!({ "forceRecover": force })).await
    }

    async fn recover_finality_flows_matching(
        &self,
        query: &FlowRecoveryQuery,
        force: bool,
    ) -> Result<IndexMap<FlowRunId, bool>> {
        self.call(
            "recoverFinalityFlowsMatching",
            json!({ "query": query, "forceRecover": force }),
        )
        .await
    }

    async fn registered_flows(&self) -> Result<Vec<String>> {
        self.call("registeredFlows", json!({})).await
    }

    async fn start_flow(&self, name: &str, args: &[String]) -> Result<mpsc::Receiver<FlowProgress>> {
        let resp = self
            .request("startFlow")
            .json(&json!({ "name": name, "args": args }))
            .send()
            .await
            .context("calling gateway procedure 'startFlow'")?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            bail!("gateway returned HTTP {} for 'startFlow': {}", status.as_u16(), text.trim());
        }

        // Progress arrives as newline-delimited JSON frames on the response
        // body; decode them off-task and forward over a bounded channel.
        let (tx, rx) = mpsc::channel(PROGRESS_CHANNEL_CAPACITY);
        let mut stream = resp.bytes_stream();
        tokio::spawn(async move {
            let mut buffer: Vec<u8> = Vec::new();
            while let Some(chunk) = stream.next().await {
                let bytes = match chunk {
                    Ok(bytes) => bytes,
                    Err(e) => {
                        let _ = tx.send(FlowProgress::Failed { message: e.to_string() }).await;
                        return;
                    }
                };
                buffer.extend_from_slice(&bytes);
                for frame in drain_frames(&mut buffer) {
                    if forward_frame(&tx, &frame).await.is_err() {
                        return;
                    }
                }
            }
            if !buffer.iter().all(u8::is_ascii_whitespace) {
                let _ = forward_frame(&tx, &buffer).await;
            }
        });

        Ok(rx)
    }
}

/// Decode one progress frame and forward it; an `Err` means the receiver is
/// gone or the frame was malformed and the stream should stop.
async fn forward_frame(tx: &mpsc::Sender<FlowProgress>, frame: &[u8]) -> Result<(), ()> {
    match serde_json::from_slice::<FlowProgress>(frame) {
        Ok(event) => tx.send(event).await.map_err(|_| ()),
        Err(e) => {
            let _ = tx
                .send(FlowProgress::Failed {
                    message: format!("malformed progress frame: {}", e),
                })
                .await;
            Err(())
        }
    }
}

/// Split completed newline-terminated frames out of the stream buffer,
/// leaving any trailing partial frame in place. Blank lines are skipped.
fn drain_frames(buffer: &mut Vec<u8>) -> Vec<Vec<u8>> {
    let mut frames = Vec::new();
    while let Some(pos) = buffer.iter().position(|&b| b == b'\n') {
        let mut frame: Vec<u8> = buffer.drain(..=pos).collect();
        frame.pop();
        if frame.last() == Some(&b'\r') {
            frame.pop();
        }
        if !frame.iter().all(u8::is_ascii_whitespace) {
            frames.push(frame);
        }
    }
    frames
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drain_frames_splits_complete_lines_only() {
        let mut buffer = b"{\"a\":1}\n{\"b\":2}\r\n{\"par".to_vec();
        let frames = drain_frames(&mut buffer);
        assert_eq!(frames, vec![b"{\"a\":1}".to_vec(), b"{\"b\":2}".to_vec()]);
        assert_eq!(buffer, b"{\"par".to_vec());
    }

    #[test]
    fn drain_frames_skips_blank_lines() {
        let mut buffer = b"\n  \n{\"a\":1}\n".to_vec();
        let frames = drain_frames(&mut buffer);
        assert_eq!(frames, vec![b"{\"a\":1}".to_vec()]);
        assert!(buffer.is_empty());
    }

    #[test]
    fn client_rejects_invalid_addresses() {
        let config = ShellConfig {
            address: "http://node.example.com:10006".into(),
            ..Default::default()
        };
        assert!(GatewayClient::new(&config).is_err());
    }
}
