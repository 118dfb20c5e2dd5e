//! Parsing of `recoverMatching` search criteria.
//!
//! Criteria arrive as shell tokens in `key: value` form. Recognized keys:
//!
//! - `flowStartFromTime:` ISO-8601 start of the flow-start time window
//! - `flowStartUntilTime:` ISO-8601 end of the window
//! - `initiatedBy:` X.500 name of the initiating party
//! - `counterParties:` one name, or several up to the next `key:` token
//!   (surrounding `[`/`]` and trailing commas are stripped; quote a name to
//!   keep its embedded commas in one token)
//!
//! Absent window bounds are left unset; the node substitutes epoch and
//! "now" on its side.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use flowsh_types::{FlowRecoveryQuery, ParseError};

const FLOW_START_FROM: &str = "flowStartFromTime";
const FLOW_START_UNTIL: &str = "flowStartUntilTime";
const INITIATED_BY: &str = "initiatedBy";
const COUNTER_PARTIES: &str = "counterParties";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CriteriaKey {
    StartFrom,
    StartUntil,
    InitiatedBy,
    CounterParties,
}

impl CriteriaKey {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            FLOW_START_FROM => Some(Self::StartFrom),
            FLOW_START_UNTIL => Some(Self::StartUntil),
            INITIATED_BY => Some(Self::InitiatedBy),
            COUNTER_PARTIES => Some(Self::CounterParties),
            _ => None,
        }
    }

    fn name(self) -> &'static str {
        match self {
            Self::StartFrom => FLOW_START_FROM,
            Self::StartUntil => FLOW_START_UNTIL,
            Self::InitiatedBy => INITIATED_BY,
            Self::CounterParties => COUNTER_PARTIES,
        }
    }
}

/// Parse criteria tokens into a [`FlowRecoveryQuery`].
///
/// No tokens at all is valid and yields the empty query (match
/// everything); a token that is not a recognized `key:` where a key is
/// expected is an error, so typos do not silently widen the match.
pub fn parse_recovery_query(tokens: &[String]) -> Result<FlowRecoveryQuery, ParseError> {
    let mut query = FlowRecoveryQuery::default();
    let mut index = 0;

    while index < tokens.len() {
        let (key, inline_value) = split_key(&tokens[index])?;
        index += 1;

        match key {
            CriteriaKey::StartFrom => {
                let value = take_value(inline_value, tokens, &mut index, key)?;
                query.start_from = Some(parse_timestamp(key.name(), &value)?);
            }
            CriteriaKey::StartUntil => {
                let value = take_value(inline_value, tokens, &mut index, key)?;
                query.start_until = Some(parse_timestamp(key.name(), &value)?);
            }
            CriteriaKey::InitiatedBy => {
                query.initiated_by = Some(take_value(inline_value, tokens, &mut index, key)?);
            }
            CriteriaKey::CounterParties => {
                let mut parties = Vec::new();
                if let Some(value) = inline_value {
                    push_party(&mut parties, &value);
                }
                while index < tokens.len() && !is_key_token(&tokens[index]) {
                    push_party(&mut parties, &tokens[index]);
                    index += 1;
                }
                if parties.is_empty() {
                    return Err(ParseError::MissingValue {
                        field: key.name().into(),
                    });
                }
                query.counterparties.extend(parties);
            }
        }
    }

    Ok(query)
}

/// Split a token expected to be a criteria key, returning any value glued
/// on after the colon (`initiatedBy:O=PartyA` style).
fn split_key(token: &str) -> Result<(CriteriaKey, Option<String>), ParseError> {
    let Some((name, rest)) = token.split_once(':') else {
        return Err(ParseError::UnknownField { name: token.into() });
    };
    let key = CriteriaKey::from_name(name).ok_or_else(|| ParseError::UnknownField { name: name.into() })?;
    let inline = (!rest.is_empty()).then(|| rest.to_string());
    Ok((key, inline))
}

fn is_key_token(token: &str) -> bool {
    token
        .split_once(':')
        .is_some_and(|(name, _)| CriteriaKey::from_name(name).is_some())
}

fn take_value(
    inline: Option<String>,
    tokens: &[String],
    index: &mut usize,
    key: CriteriaKey,
) -> Result<String, ParseError> {
    if let Some(value) = inline {
        return Ok(value);
    }
    if *index < tokens.len() && !is_key_token(&tokens[*index]) {
        let value = tokens[*index].clone();
        *index += 1;
        return Ok(value);
    }
    Err(ParseError::MissingValue {
        field: key.name().into(),
    })
}

fn push_party(parties: &mut Vec<String>, raw: &str) {
    let trimmed = raw
        .trim_start_matches('[')
        .trim_end_matches(']')
        .trim_end_matches(',')
        .trim();
    if !trimmed.is_empty() {
        parties.push(trimmed.to_string());
    }
}

/// Parse an ISO-8601 timestamp; a value without an offset is taken as UTC.
fn parse_timestamp(field: &str, text: &str) -> Result<DateTime<Utc>, ParseError> {
    if let Ok(instant) = DateTime::parse_from_rfc3339(text) {
        return Ok(instant.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S") {
        return Ok(Utc.from_utc_datetime(&naive));
    }
    Err(ParseError::InvalidTimestamp {
        field: field.into(),
        text: text.into(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lex::lex_line;

    fn parse(input: &str) -> Result<FlowRecoveryQuery, ParseError> {
        parse_recovery_query(&lex_line(input))
    }

    #[test]
    fn no_tokens_is_the_empty_query() {
        let query = parse("").expect("empty query");
        assert!(query.is_empty());
    }

    #[test]
    fn time_window_parses_rfc3339() {
        let query = parse("flowStartFromTime: 2024-01-01T00:00:00Z flowStartUntilTime: 2024-06-01T12:30:00Z")
            .expect("valid window");
        assert_eq!(query.start_from.expect("from").to_rfc3339(), "2024-01-01T00:00:00+00:00");
        assert_eq!(query.start_until.expect("until").to_rfc3339(), "2024-06-01T12:30:00+00:00");
    }

    #[test]
    fn offsetless_timestamps_are_taken_as_utc() {
        let query = parse("flowStartFromTime: 2024-01-01T00:00:00").expect("valid");
        assert_eq!(query.start_from.expect("from").to_rfc3339(), "2024-01-01T00:00:00+00:00");
    }

    #[test]
    fn bad_timestamp_is_reported_with_its_field() {
        let err = parse("flowStartFromTime: yesterday").unwrap_err();
        assert_eq!(
            err,
            ParseError::InvalidTimestamp {
                field: FLOW_START_FROM.into(),
                text: "yesterday".into(),
            }
        );
    }

    #[test]
    fn initiated_by_takes_one_quoted_name() {
        let query = parse("initiatedBy: \"O=PartyA,L=London,C=GB\"").expect("valid");
        assert_eq!(query.initiated_by.as_deref(), Some("O=PartyA,L=London,C=GB"));
    }

    #[test]
    fn counterparties_accepts_a_bracketed_list() {
        let query = parse("counterParties: [\"O=PartyA,L=London,C=GB\", \"O=PartyB,L=London,C=GB\"]").expect("valid");
        assert_eq!(
            query.counterparties,
            vec!["O=PartyA,L=London,C=GB".to_string(), "O=PartyB,L=London,C=GB".to_string()]
        );
    }

    #[test]
    fn counterparties_stop_at_the_next_key() {
        let query = parse("counterParties: \"O=PartyA,L=London,C=GB\" flowStartFromTime: 2024-01-01T00:00:00Z")
            .expect("valid");
        assert_eq!(query.counterparties, vec!["O=PartyA,L=London,C=GB".to_string()]);
        assert!(query.start_from.is_some());
    }

    #[test]
    fn glued_key_value_form_is_accepted() {
        let query = parse("flowStartFromTime:2024-01-01T00:00:00Z").expect("valid");
        assert!(query.start_from.is_some());
    }

    #[test]
    fn unknown_key_is_an_error() {
        let err = parse("startedBy: admin").unwrap_err();
        assert_eq!(err, ParseError::UnknownField { name: "startedBy".into() });
    }

    #[test]
    fn bare_token_where_a_key_is_expected_is_an_error() {
        assert!(matches!(parse("justaword"), Err(ParseError::UnknownField { .. })));
    }

    #[test]
    fn missing_value_is_an_error() {
        assert_eq!(
            parse("initiatedBy:").unwrap_err(),
            ParseError::MissingValue {
                field: INITIATED_BY.into()
            }
        );
        assert_eq!(
            parse("counterParties: flowStartFromTime: 2024-01-01T00:00:00Z").unwrap_err(),
            ParseError::MissingValue {
                field: COUNTER_PARTIES.into()
            }
        );
    }
}
