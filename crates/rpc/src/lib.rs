//! Gateway access for the flowsh shell.
//!
//! This crate owns everything that touches the remote node:
//!
//! - [`FlowRpcOps`], the abstract surface of flow operations the shell
//!   dispatches against
//! - [`GatewayClient`], a reqwest-backed implementation speaking JSON over
//!   HTTP to the node's RPC gateway
//! - [`GatewaySession`], the session-scoped lazily created handle that
//!   constructs the client at most once and reuses it for every command
//! - [`ShellConfig`], the connection settings (address, credentials, TLS
//!   posture) resolved from flags, environment, or a config file
//!
//! The shell layer never retries or suppresses transport failures; whatever
//! the gateway raises propagates unmodified to the session's error path.

mod client;
mod config;
mod ops;
mod session;

pub use client::GatewayClient;
pub use config::{ShellConfig, default_config_path};
pub use ops::FlowRpcOps;
pub use session::GatewaySession;
