//! Outbound messages.
//!
//! A message is the wire record of "something happened, decoded to this
//! value, routed to this handle". The server consumes it as flat key/value
//! pairs, so the decoded value is flattened next to `id` and `maps`.

use crate::types::Handle;
use core_types::MsgId;
use serde::{Deserialize, Serialize};

/// Decoded event data, tagged by shape.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum MsgValue {
    Nothing,
    String { value: String },
    Boolean { value: bool },
    Integer { value: i64 },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Msg {
    pub id: MsgId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maps: Option<String>,
    #[serde(flatten)]
    pub value: MsgValue,
}

impl Msg {
    /// Flatten to the query-string form the steady-state endpoint consumes.
    pub fn to_query(&self) -> Vec<(String, String)> {
        let mut pairs = vec![("id".to_string(), self.id.to_string())];
        if let Some(maps) = &self.maps {
            pairs.push(("maps".to_string(), maps.clone()));
        }
        match &self.value {
            MsgValue::Nothing => pairs.push(("type".to_string(), "nothing".to_string())),
            MsgValue::String { value } => {
                pairs.push(("type".to_string(), "string".to_string()));
                pairs.push(("value".to_string(), value.clone()));
            }
            MsgValue::Boolean { value } => {
                pairs.push(("type".to_string(), "boolean".to_string()));
                pairs.push(("value".to_string(), value.to_string()));
            }
            MsgValue::Integer { value } => {
                pairs.push(("type".to_string(), "integer".to_string()));
                pairs.push(("value".to_string(), value.to_string()));
            }
        }
        pairs
    }
}

/// Build the message for a handle, or nothing when the decoder declined the
/// occurrence. The handle's map chain is joined into a single `;`-separated
/// field, the form the server's router expects.
pub fn make_message(handle: &Handle, decoded: Option<MsgValue>) -> Option<Msg> {
    let value = decoded?;
    Some(Msg {
        id: handle.id,
        maps: handle.maps.as_ref().map(|maps| maps.join(";")),
        value,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn serializes_flat_with_type_tag() {
        let msg = Msg {
            id: 7,
            maps: None,
            value: MsgValue::Nothing,
        };
        assert_eq!(
            serde_json::to_value(&msg).expect("serialize"),
            json!({"id": 7, "type": "nothing"})
        );
    }

    #[test]
    fn serializes_value_and_joined_maps() {
        let handle = Handle {
            id: 12,
            maps: Some(vec!["outer".to_string(), "inner".to_string()]),
        };
        let msg = make_message(&handle, Some(MsgValue::String { value: "hi".to_string() }))
            .expect("message");
        assert_eq!(
            serde_json::to_value(&msg).expect("serialize"),
            json!({"id": 12, "maps": "outer;inner", "type": "string", "value": "hi"})
        );
    }

    #[test]
    fn declined_decoder_produces_no_message() {
        let handle = Handle { id: 1, maps: None };
        assert_eq!(make_message(&handle, None), None);
    }

    #[test]
    fn query_form_stringifies_every_field() {
        let msg = Msg {
            id: 3,
            maps: Some("m".to_string()),
            value: MsgValue::Integer { value: -4 },
        };
        assert_eq!(
            msg.to_query(),
            vec![
                ("id".to_string(), "3".to_string()),
                ("maps".to_string(), "m".to_string()),
                ("type".to_string(), "integer".to_string()),
                ("value".to_string(), "-4".to_string()),
            ]
        );
    }
}
