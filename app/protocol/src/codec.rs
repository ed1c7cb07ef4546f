//! Frame codec: the tolerance boundary between transport text and the
//! typed core.
//!
//! Decoding never fails. A frame that is not a JSON object becomes an
//! `echo` envelope carrying the raw text, and a recognized tag whose payload
//! does not parse is classified as [`Inbound::Echo`] with the envelope
//! preserved, so every frame gets an answer.

use crate::{Envelope, Inbound, OutboundEvent, QueryRequest};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value, json};

/// Tag of a directory listing request.
pub const LIST: &str = "list";
/// Tag of a card rendering request.
pub const VISUALIZE: &str = "visualize";
/// Tag of an agent query.
pub const QUERY: &str = "query";
/// Tag of the legacy catch-all message.
pub const ECHO: &str = "echo";

/// Decode one text frame into an envelope.
///
/// Missing `type` decodes to the empty tag; missing `payload` to `{}`.
pub fn decode(raw: &str) -> Envelope {
    let Ok(Value::Object(mut frame)) = serde_json::from_str::<Value>(raw) else {
        return Envelope::new(ECHO, json!({ "msg": raw }));
    };

    let kind = match frame.remove("type") {
        Some(Value::String(kind)) => kind,
        _ => String::new(),
    };
    let payload = frame
        .remove("payload")
        .unwrap_or_else(|| Value::Object(Map::new()));
    Envelope { kind, payload }
}

/// Rewrite a legacy `echo` payload as a `query`.
///
/// The query text is `msg`, else `text` (first non-empty string); a bare
/// string payload is used as-is; anything else is rendered as JSON.
pub fn normalize_echo(payload: &Value) -> (&'static str, Value) {
    let text = match payload {
        Value::Object(fields) => ["msg", "text"]
            .iter()
            .find_map(|key| match fields.get(*key) {
                Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
                _ => None,
            })
            .unwrap_or_else(|| payload.to_string()),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    (QUERY, json!({ "text": text }))
}

/// Classify an envelope into a typed request.
pub fn classify(envelope: Envelope) -> Inbound {
    match envelope.kind.as_str() {
        LIST => parse(&envelope).map_or(Inbound::Echo(envelope), Inbound::List),
        VISUALIZE => parse(&envelope).map_or(Inbound::Echo(envelope), Inbound::Visualize),
        QUERY => parse(&envelope).map_or(Inbound::Echo(envelope), Inbound::Query),
        ECHO => {
            let (_, payload) = normalize_echo(&envelope.payload);
            let text = payload["text"].as_str().unwrap_or_default().to_owned();
            Inbound::Query(QueryRequest {
                text,
                image_paths: Vec::new(),
            })
        }
        _ => Inbound::Echo(envelope),
    }
}

fn parse<T: DeserializeOwned>(envelope: &Envelope) -> Option<T> {
    serde_json::from_value(envelope.payload.clone()).ok()
}

/// Serialize an outbound event into one text frame.
pub fn encode(event: &OutboundEvent) -> Result<String, serde_json::Error> {
    serde_json::to_string(event)
}
