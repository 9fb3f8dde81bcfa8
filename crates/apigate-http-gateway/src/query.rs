//! Query-string and form-urlencoded decoding.
//!
//! The relay protocol is driven entirely by query parameters (`jsonp`,
//! `id`, `r`, `session_id`) and one POSTed form field (`r`), so a small
//! hand-rolled pair parser is all the gateway needs.

use std::collections::HashMap;

/// Decoded `key=value` pairs from a query string or an
/// `application/x-www-form-urlencoded` body.
#[derive(Debug, Clone, Default)]
pub struct QueryParams(HashMap<String, String>);

impl QueryParams {
    /// Parse a raw query string (without the leading `?`).
    pub fn parse(raw: &str) -> Self {
        let mut params = HashMap::new();
        for pair in raw.split('&').filter(|p| !p.is_empty()) {
            let (key, value) = match pair.split_once('=') {
                Some((k, v)) => (k, v),
                None => (pair, ""),
            };
            if let (Some(key), Some(value)) = (decode_component(key), decode_component(value)) {
                params.insert(key, value);
            }
        }
        Self(params)
    }

    /// Get a parameter, treating the empty string as absent (a bare
    /// `jsonp=` does not switch the relay on).
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str).filter(|v| !v.is_empty())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Parse an `application/x-www-form-urlencoded` request body.
pub fn parse_form(body: &str) -> QueryParams {
    QueryParams::parse(body)
}

fn decode_component(raw: &str) -> Option<String> {
    // Form encoding uses '+' for spaces; percent-decoding handles the rest.
    let raw = raw.replace('+', " ");
    urlencoding::decode(&raw).ok().map(|cow| cow.into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_basic() {
        let params = QueryParams::parse("jsonp=cb&id=42");
        assert_eq!(params.get("jsonp"), Some("cb"));
        assert_eq!(params.get("id"), Some("42"));
        assert_eq!(params.get("r"), None);
    }

    #[test]
    fn test_percent_and_plus_decoding() {
        let params = QueryParams::parse("r=%7B%22params%22%3A%7B%7D%7D&q=a+b");
        assert_eq!(params.get("r"), Some(r#"{"params":{}}"#));
        assert_eq!(params.get("q"), Some("a b"));
    }

    #[test]
    fn test_empty_values_treated_as_absent() {
        let params = QueryParams::parse("jsonp=&id=1");
        assert_eq!(params.get("jsonp"), None);
        assert_eq!(params.get("id"), Some("1"));
    }

    #[test]
    fn test_parse_form_body() {
        let form = parse_form("r=%7B%22jsonrpc%22%3A%222.0%22%7D");
        assert_eq!(form.get("r"), Some(r#"{"jsonrpc":"2.0"}"#));
    }

    #[test]
    fn test_empty_input() {
        assert!(QueryParams::parse("").is_empty());
    }
}
