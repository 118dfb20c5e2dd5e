//! Shared type definitions for the flowsh operator shell.
//!
//! Everything in this crate is constructed by parsing or by decoding a
//! gateway response; nothing here talks to the network. Identifiers are
//! validated at construction time so that a malformed run id or transaction
//! hash is reported before any remote call is attempted.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;
use uuid::Uuid;

/// Errors produced while turning operator input into typed values.
///
/// Parse failures are terminal for the current command invocation: they are
/// reported to the user and the gateway is never called.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("'{text}' is not a valid flow run id")]
    InvalidRunId { text: String },

    #[error("the provided string '{text}' is neither a valid SHA-256 hash value nor a supported hash algorithm")]
    InvalidHash { text: String },

    #[error("'{text}' is not a valid ISO-8601 timestamp for {field}")]
    InvalidTimestamp { field: String, text: String },

    #[error("unknown recovery criteria field '{name}'")]
    UnknownField { name: String },

    #[error("recovery criteria field '{field}' is missing a value")]
    MissingValue { field: String },
}

/// Unique token naming one in-flight flow instance on the remote node.
///
/// Equality is by value; the textual form is the canonical lowercase
/// hyphenated UUID, which is also what the gateway uses as mapping keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FlowRunId(Uuid);

impl FlowRunId {
    pub fn new(id: Uuid) -> Self {
        Self(id)
    }

    /// Fresh random id, used by tests and previews.
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl FromStr for FlowRunId {
    type Err = ParseError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(text.trim())
            .map(Self)
            .map_err(|_| ParseError::InvalidRunId { text: text.to_string() })
    }
}

impl fmt::Display for FlowRunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

/// Digest algorithms the shell accepts for transaction hashes.
///
/// Only SHA-256 is supported today; the enum exists so that an explicit
/// `ALGO:<hex>` prefix can be validated rather than silently ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HashAlgorithm {
    Sha256,
}

impl HashAlgorithm {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sha256 => "SHA-256",
        }
    }

    /// Digest size in bytes.
    pub fn digest_len(&self) -> usize {
        match self {
            Self::Sha256 => 32,
        }
    }
}

impl FromStr for HashAlgorithm {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "SHA-256" | "SHA256" => Ok(Self::Sha256),
            _ => Err(()),
        }
    }
}

/// Fixed-length content digest identifying a transaction.
///
/// Accepts either a bare 64-character hex string (implying SHA-256) or an
/// algorithm-qualified `SHA-256:<hex>` form. Renders as uppercase hex, the
/// same shape the node prints in its own logs.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TxnHash {
    algorithm: HashAlgorithm,
    bytes: Vec<u8>,
}

impl TxnHash {
    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

impl FromStr for TxnHash {
    type Err = ParseError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let invalid = || ParseError::InvalidHash { text: text.to_string() };
        let trimmed = text.trim();
        let (algorithm, digits) = match trimmed.split_once(':') {
            Some((prefix, rest)) => (prefix.parse::<HashAlgorithm>().map_err(|_| invalid())?, rest),
            None => (HashAlgorithm::Sha256, trimmed),
        };
        let bytes = hex::decode(digits).map_err(|_| invalid())?;
        if bytes.len() != algorithm.digest_len() {
            return Err(invalid());
        }
        Ok(Self { algorithm, bytes })
    }
}

impl fmt::Display for TxnHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.bytes {
            write!(f, "{:02X}", byte)?;
        }
        Ok(())
    }
}

impl Serialize for TxnHash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TxnHash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(DeError::custom)
    }
}

/// Tri-state for the optional `--force-recover` switch.
///
/// The absence of the flag is distinct from an explicit `false`, but both
/// resolve to the same effective value; the resolution happens exactly once
/// at the gateway call boundary so the wire always carries a concrete bool.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ForceRecover {
    #[default]
    Default,
    Enabled,
    Disabled,
}

impl ForceRecover {
    /// Resolve to the concrete boolean passed to the gateway. The documented
    /// default for an unset flag is `false`.
    pub fn effective(self) -> bool {
        matches!(self, Self::Enabled)
    }
}

impl From<Option<bool>> for ForceRecover {
    fn from(flag: Option<bool>) -> Self {
        match flag {
            None => Self::Default,
            Some(true) => Self::Enabled,
            Some(false) => Self::Disabled,
        }
    }
}

/// Result of one dispatched command, as decoded from the gateway response.
///
/// Constructed once, handed to the renderer once, never mutated. Bulk
/// results keep the gateway's entry order.
#[derive(Debug, Clone, PartialEq)]
pub enum CommandOutcome {
    /// Single-target outcome (pause/retry/kill/recover of one flow).
    Flag(bool),
    /// Per-flow outcome of a bulk recovery.
    Bulk(IndexMap<FlowRunId, bool>),
}

impl From<bool> for CommandOutcome {
    fn from(ok: bool) -> Self {
        Self::Flag(ok)
    }
}

impl From<IndexMap<FlowRunId, bool>> for CommandOutcome {
    fn from(results: IndexMap<FlowRunId, bool>) -> Self {
        Self::Bulk(results)
    }
}

/// Search criteria for `recoverMatching`.
///
/// Absent window bounds mean "epoch" and "now" respectively; that
/// defaulting belongs to the node, so the query carries options rather than
/// resolved instants.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FlowRecoveryQuery {
    #[serde(rename = "flowStartFromTime", skip_serializing_if = "Option::is_none", default)]
    pub start_from: Option<DateTime<Utc>>,

    #[serde(rename = "flowStartUntilTime", skip_serializing_if = "Option::is_none", default)]
    pub start_until: Option<DateTime<Utc>>,

    /// X.500-style name of the party that initiated the flow.
    #[serde(rename = "initiatedBy", skip_serializing_if = "Option::is_none", default)]
    pub initiated_by: Option<String>,

    /// Counterparty peers receiving the flow.
    #[serde(rename = "counterParties", skip_serializing_if = "Vec::is_empty", default)]
    pub counterparties: Vec<String>,
}

impl FlowRecoveryQuery {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Events produced while a started flow runs on the node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FlowProgress {
    /// The flow reached a named progress-tracker step.
    Step { label: String },
    /// The flow completed; `result` is the node's JSON rendering of the
    /// return value.
    Done { result: serde_json::Value },
    /// The flow ended in an error.
    Failed { message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_id_round_trips_canonical_form() {
        let id: FlowRunId = "67dc3c3a-9b3e-4e0b-8f42-9a0c7f6e1a11".parse().expect("valid uuid");
        assert_eq!(id.to_string(), "67dc3c3a-9b3e-4e0b-8f42-9a0c7f6e1a11");
    }

    #[test]
    fn run_id_accepts_uppercase_and_whitespace() {
        let id: FlowRunId = " 67DC3C3A-9B3E-4E0B-8F42-9A0C7F6E1A11 ".parse().expect("valid uuid");
        assert_eq!(id.to_string(), "67dc3c3a-9b3e-4e0b-8f42-9a0c7f6e1a11");
    }

    #[test]
    fn random_run_ids_are_distinct() {
        assert_ne!(FlowRunId::random(), FlowRunId::random());
    }

    #[test]
    fn run_id_rejects_garbage() {
        let err = "not-a-uuid".parse::<FlowRunId>().unwrap_err();
        assert_eq!(
            err,
            ParseError::InvalidRunId {
                text: "not-a-uuid".into()
            }
        );
        assert!(err.to_string().contains("not a valid flow run id"));
    }

    #[test]
    fn txn_hash_accepts_bare_hex() {
        let hash: TxnHash = "aa".repeat(32).parse().expect("valid digest");
        assert_eq!(hash.algorithm(), HashAlgorithm::Sha256);
        assert_eq!(hash.to_string(), "AA".repeat(32));
    }

    #[test]
    fn txn_hash_accepts_algorithm_prefix() {
        let text = format!("SHA-256:{}", "0f".repeat(32));
        let hash: TxnHash = text.parse().expect("valid digest");
        assert_eq!(hash.as_bytes().len(), 32);
    }

    #[test]
    fn txn_hash_rejects_unknown_algorithm_and_bad_lengths() {
        assert!(format!("MD5:{}", "aa".repeat(16)).parse::<TxnHash>().is_err());
        assert!("abcd".parse::<TxnHash>().is_err());
        assert!("zz".repeat(32).parse::<TxnHash>().is_err());

        let err = "abcd".parse::<TxnHash>().unwrap_err();
        assert!(err.to_string().contains("neither a valid SHA-256 hash value"));
    }

    #[test]
    fn txn_hash_serde_is_a_string() {
        let hash: TxnHash = "ab".repeat(32).parse().expect("valid digest");
        let json = serde_json::to_string(&hash).expect("serialize");
        assert_eq!(json, format!("\"{}\"", "AB".repeat(32)));
        let back: TxnHash = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, hash);
    }

    #[test]
    fn force_recover_defaults_to_false() {
        assert!(!ForceRecover::Default.effective());
        assert!(!ForceRecover::Disabled.effective());
        assert!(ForceRecover::Enabled.effective());
        assert_eq!(ForceRecover::from(None), ForceRecover::Default);
        assert_eq!(ForceRecover::from(Some(true)), ForceRecover::Enabled);
    }

    #[test]
    fn recovery_query_serializes_wire_field_names() {
        let query = FlowRecoveryQuery {
            initiated_by: Some("O=PartyA,L=London,C=GB".into()),
            counterparties: vec!["O=PartyB,L=London,C=GB".into()],
            ..Default::default()
        };
        let json = serde_json::to_value(&query).expect("serialize");
        assert_eq!(json["initiatedBy"], "O=PartyA,L=London,C=GB");
        assert_eq!(json["counterParties"][0], "O=PartyB,L=London,C=GB");
        assert!(json.get("flowStartFromTime").is_none());
    }

    #[test]
    fn empty_recovery_query_reports_empty() {
        assert!(FlowRecoveryQuery::default().is_empty());
        let query = FlowRecoveryQuery {
            initiated_by: Some("O=PartyA,L=London,C=GB".into()),
            ..Default::default()
        };
        assert!(!query.is_empty());
    }

    #[test]
    fn flow_progress_wire_format() {
        let frame = r#"{"kind":"step","label":"Verifying"}"#;
        let progress: FlowProgress = serde_json::from_str(frame).expect("deserialize");
        assert_eq!(
            progress,
            FlowProgress::Step {
                label: "Verifying".into()
            }
        );
    }
}
