//! Domain model for the relay.
//!
//! The relay stores opaque cooldown records; it never interprets skill ids or
//! timers. Ingestion is deliberately permissive: a payload is rejected only
//! when the client id is missing or `entries` is not a sequence. Every other
//! malformed field is coerced to a documented default instead of surfacing an
//! error.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

/// Room used when a payload or query does not name one.
pub const DEFAULT_ROOM: &str = "bags";

/// Relay-surfaced errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RelayError {
    /// Update payload missing its client id or entries sequence
    #[error("bad payload: {0}")]
    InvalidPayload(&'static str),
}

/// Per-room ordering hint: profession-like key to ordered client ids.
///
/// Supplied by clients, stored verbatim, returned unmodified. Replaced
/// wholesale whenever a non-empty one arrives.
pub type GroupOrder = BTreeMap<String, Vec<String>>;

/// One cooldown timer as reported by a client.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CooldownEntry {
    pub label: String,
    pub ready: bool,
    /// Seconds remaining, `None` when the client did not report a number
    pub left: Option<f64>,
    pub skillid: i64,
}

impl CooldownEntry {
    /// Coerce a raw JSON value into an entry.
    ///
    /// Missing or mistyped fields default rather than fail: `label` through
    /// [`coerce_label`], `ready` through truthiness, `left` to `None`,
    /// `skillid` to 0. A non-object value yields an all-default entry.
    fn from_value(value: &Value) -> Self {
        Self {
            label: coerce_label(value.get("label")),
            ready: value.get("ready").map(is_truthy).unwrap_or(false),
            left: value.get("left").and_then(Value::as_f64),
            skillid: value.get("skillid").and_then(Value::as_i64).unwrap_or(0),
        }
    }
}

/// A client's latest reported state, as stored in a room.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientRecord {
    /// Display name; allocated when the client did not provide one
    pub name: String,
    pub prof: u32,
    pub plugin_ver: Option<String>,
    pub subgroup: u32,
    pub entries: Vec<CooldownEntry>,
    /// Epoch millis of the upsert that wrote this record; drives liveness
    pub last_updated_at: i64,
}

/// Parsed and coerced `POST /update` body.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdatePayload {
    pub room: String,
    pub client_id: String,
    /// Name as provided, `None` when absent or whitespace-only
    pub name: Option<String>,
    pub prof: u32,
    pub plugin_ver: Option<String>,
    pub subgroup: u32,
    pub entries: Vec<CooldownEntry>,
    /// Present only when the payload carried a non-empty order object
    pub group_order: Option<GroupOrder>,
}

impl UpdatePayload {
    /// Parse an update body.
    ///
    /// Fails only on a missing/empty `clientId` or a non-sequence `entries`;
    /// the caller must reject the request without touching registry state.
    pub fn from_value(body: &Value) -> Result<Self, RelayError> {
        let client_id = body
            .get("clientId")
            .and_then(Value::as_str)
            .unwrap_or("")
            .to_string();
        if client_id.is_empty() {
            return Err(RelayError::InvalidPayload("missing clientId"));
        }

        let entries = body
            .get("entries")
            .and_then(Value::as_array)
            .ok_or(RelayError::InvalidPayload("entries is not a sequence"))?
            .iter()
            .map(CooldownEntry::from_value)
            .collect();

        let room = body
            .get("room")
            .and_then(Value::as_str)
            .filter(|r| !r.is_empty())
            .unwrap_or(DEFAULT_ROOM)
            .to_string();

        let name = body
            .get("name")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(str::to_string);

        Ok(Self {
            room,
            client_id,
            name,
            prof: coerce_u32(body.get("prof")),
            plugin_ver: body
                .get("pluginVer")
                .and_then(Value::as_str)
                .map(str::to_string),
            subgroup: coerce_u32(body.get("subgroup")),
            entries,
            group_order: coerce_group_order(body.get("groupOrder")),
        })
    }
}

/// Entry label coercion: strings pass through, truthy numbers and `true`
/// stringify like the wire format's clients expect, everything falsy (or a
/// container) becomes the empty string.
fn coerce_label(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) if n.as_f64().is_some_and(|f| f != 0.0) => n.to_string(),
        Some(Value::Bool(true)) => "true".to_string(),
        _ => String::new(),
    }
}

/// Non-negative integer or 0.
fn coerce_u32(value: Option<&Value>) -> u32 {
    value
        .and_then(Value::as_u64)
        .and_then(|n| u32::try_from(n).ok())
        .unwrap_or(0)
}

/// JS-style truthiness, mirroring what clients expect from the wire format.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Coerce a `groupOrder` object, keeping only string-array values.
///
/// Returns `None` when the field is absent, not an object, or empty after
/// coercion, so the caller leaves the room's stored order untouched.
fn coerce_group_order(value: Option<&Value>) -> Option<GroupOrder> {
    let object = value?.as_object()?;
    let order: GroupOrder = object
        .iter()
        .filter_map(|(key, ids)| {
            let ids = ids.as_array()?;
            let ids = ids
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect();
            Some((key.clone(), ids))
        })
        .collect();
    if order.is_empty() { None } else { Some(order) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_minimal_payload_applies_defaults() {
        // given:
        let body = json!({ "clientId": "c1", "entries": [] });

        // when:
        let payload = UpdatePayload::from_value(&body).unwrap();

        // then:
        assert_eq!(payload.room, "bags");
        assert_eq!(payload.client_id, "c1");
        assert_eq!(payload.name, None);
        assert_eq!(payload.prof, 0);
        assert_eq!(payload.plugin_ver, None);
        assert_eq!(payload.subgroup, 0);
        assert!(payload.entries.is_empty());
        assert!(payload.group_order.is_none());
    }

    #[test]
    fn test_parse_missing_client_id_is_invalid() {
        // given:
        let body = json!({ "entries": [] });

        // when:
        let result = UpdatePayload::from_value(&body);

        // then:
        assert_eq!(result, Err(RelayError::InvalidPayload("missing clientId")));
    }

    #[test]
    fn test_parse_empty_client_id_is_invalid() {
        // given:
        let body = json!({ "clientId": "", "entries": [] });

        // when:
        let result = UpdatePayload::from_value(&body);

        // then:
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_non_sequence_entries_is_invalid() {
        // given:
        let body = json!({ "clientId": "c1", "entries": "nope" });

        // when:
        let result = UpdatePayload::from_value(&body);

        // then:
        assert_eq!(
            result,
            Err(RelayError::InvalidPayload("entries is not a sequence"))
        );
    }

    #[test]
    fn test_parse_whitespace_name_treated_as_absent() {
        // given:
        let body = json!({ "clientId": "c1", "name": "   ", "entries": [] });

        // when:
        let payload = UpdatePayload::from_value(&body).unwrap();

        // then:
        assert_eq!(payload.name, None);
    }

    #[test]
    fn test_parse_mistyped_optional_fields_coerce_to_defaults() {
        // given: prof is a string, subgroup is negative, pluginVer is a number
        let body = json!({
            "clientId": "c1",
            "entries": [],
            "prof": "guardian",
            "subgroup": -3,
            "pluginVer": 90,
        });

        // when:
        let payload = UpdatePayload::from_value(&body).unwrap();

        // then:
        assert_eq!(payload.prof, 0);
        assert_eq!(payload.subgroup, 0);
        assert_eq!(payload.plugin_ver, None);
    }

    #[test]
    fn test_parse_entry_fields_coerce_to_defaults() {
        // given: one fully mistyped entry and one non-object entry
        let body = json!({
            "clientId": "c1",
            "entries": [
                { "label": 42, "ready": 1, "left": "soon", "skillid": "x" },
                7,
            ],
        });

        // when:
        let payload = UpdatePayload::from_value(&body).unwrap();

        // then: truthy numeric labels stringify, the rest defaults
        assert_eq!(payload.entries.len(), 2);
        assert_eq!(payload.entries[0].label, "42");
        assert!(payload.entries[0].ready);
        assert_eq!(payload.entries[0].left, None);
        assert_eq!(payload.entries[0].skillid, 0);
        assert_eq!(
            payload.entries[1],
            CooldownEntry {
                label: String::new(),
                ready: false,
                left: None,
                skillid: 0,
            }
        );
    }

    #[test]
    fn test_label_coercion_follows_truthiness() {
        // given: labels of every shape
        let body = json!({
            "clientId": "c1",
            "entries": [
                { "label": "Stand Your Ground!" },
                { "label": 42 },
                { "label": 12.5 },
                { "label": 0 },
                { "label": true },
                { "label": false },
                { "label": null },
                {},
                { "label": ["a"] },
            ],
        });

        // when:
        let payload = UpdatePayload::from_value(&body).unwrap();

        // then:
        let labels: Vec<&str> = payload.entries.iter().map(|e| e.label.as_str()).collect();
        assert_eq!(
            labels,
            vec!["Stand Your Ground!", "42", "12.5", "", "true", "", "", "", ""]
        );
    }

    #[test]
    fn test_parse_well_formed_entry_preserved() {
        // given:
        let body = json!({
            "clientId": "c1",
            "entries": [
                { "label": "Shake It Off!", "ready": false, "left": 12.5, "skillid": 14403 },
            ],
        });

        // when:
        let payload = UpdatePayload::from_value(&body).unwrap();

        // then:
        assert_eq!(
            payload.entries[0],
            CooldownEntry {
                label: "Shake It Off!".to_string(),
                ready: false,
                left: Some(12.5),
                skillid: 14403,
            }
        );
    }

    #[test]
    fn test_parse_group_order_keeps_string_arrays_only() {
        // given: one valid list, one mistyped value
        let body = json!({
            "clientId": "c1",
            "entries": [],
            "groupOrder": { "1": ["a", "b"], "7": "broken" },
        });

        // when:
        let payload = UpdatePayload::from_value(&body).unwrap();

        // then:
        let order = payload.group_order.unwrap();
        assert_eq!(order.len(), 1);
        assert_eq!(order["1"], vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_parse_empty_group_order_treated_as_absent() {
        // given:
        let body = json!({ "clientId": "c1", "entries": [], "groupOrder": {} });

        // when:
        let payload = UpdatePayload::from_value(&body).unwrap();

        // then:
        assert!(payload.group_order.is_none());
    }
}
