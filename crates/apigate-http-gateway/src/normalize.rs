//! Request normalization: decoded envelope to a uniform internal call.

use std::collections::HashMap;

use serde_json::{Map, Value};

use apigate_json_rpc::Envelope;

/// The normalized internal request handed to the dispatcher, regardless of
/// which transport variant carried it.
#[derive(Debug, Clone, Default)]
pub struct Call {
    pub target: String,
    pub method: String,
    pub args: Vec<Value>,
    pub context: Map<String, Value>,
}

impl Call {
    /// Extract a call from an envelope's params. The reserved `context` key
    /// is popped out of the params, defaulting to the caller's ambient
    /// session context; the result is always a mapping. `target`/`method`/
    /// `args` are taken permissively — absent or wrongly typed fields
    /// surface later as dispatch-time errors, not here.
    pub fn from_envelope(envelope: Envelope, session_context: &HashMap<String, Value>) -> Self {
        let mut params = envelope.params;

        let context = match params.remove("context") {
            Some(Value::Object(map)) => map,
            _ => session_context
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        };

        let target = take_string(&mut params, "target");
        let method = take_string(&mut params, "method");
        let args = match params.remove("args") {
            Some(Value::Array(args)) => args,
            _ => Vec::new(),
        };

        Self {
            target,
            method,
            args,
            context,
        }
    }
}

fn take_string(params: &mut Map<String, Value>, key: &str) -> String {
    match params.remove(key) {
        Some(Value::String(s)) => s,
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn session_context() -> HashMap<String, Value> {
        HashMap::from([("lang".to_string(), json!("en"))])
    }

    #[test]
    fn test_normalize_full_request() {
        let env = Envelope::decode(
            r#"{"jsonrpc":"2.0","params":{"target":"user","method":"list","args":[1],"context":{"lang":"fr"}}}"#,
        )
        .unwrap();
        let call = Call::from_envelope(env, &session_context());
        assert_eq!(call.target, "user");
        assert_eq!(call.method, "list");
        assert_eq!(call.args, vec![json!(1)]);
        assert_eq!(call.context.get("lang"), Some(&json!("fr")));
    }

    #[test]
    fn test_context_defaults_to_session() {
        let env = Envelope::decode(r#"{"params":{"target":"user","method":"list"}}"#).unwrap();
        let call = Call::from_envelope(env, &session_context());
        assert_eq!(call.context.get("lang"), Some(&json!("en")));
    }

    #[test]
    fn test_non_mapping_context_degrades_to_session() {
        let env = Envelope::decode(r#"{"params":{"context":"nope"}}"#).unwrap();
        let call = Call::from_envelope(env, &session_context());
        assert_eq!(call.context.get("lang"), Some(&json!("en")));
    }

    #[test]
    fn test_empty_call_from_empty_envelope() {
        // The relay's "{}" fallback lands here: harmless empty call.
        let env = Envelope::decode("{}").unwrap();
        let call = Call::from_envelope(env, &HashMap::new());
        assert_eq!(call.target, "");
        assert_eq!(call.method, "");
        assert!(call.args.is_empty());
        assert!(call.context.is_empty());
    }

    #[test]
    fn test_malformed_fields_are_not_rejected() {
        let env =
            Envelope::decode(r#"{"params":{"target":7,"method":["x"],"args":{"k":1}}}"#).unwrap();
        let call = Call::from_envelope(env, &HashMap::new());
        assert_eq!(call.target, "");
        assert_eq!(call.method, "");
        assert!(call.args.is_empty());
    }
}
