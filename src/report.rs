use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};

/// Reserved report key for the IP address resolved once per scan.
pub const IP_ADDRESS_KEY: &str = "IP Address";

/// Sentinel stored under [`IP_ADDRESS_KEY`] when resolution fails.
pub const IP_NOT_FOUND: &str = "Not Found";

/// Recursive result value: probes produce strings, lists of values, or
/// nested string-keyed mappings. Mappings preserve insertion order so the
/// rendered report reads the same way the probe assembled it.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Str(String),
    List(Vec<Value>),
    Map(Vec<(String, Value)>),
}

impl Value {
    pub fn str(s: impl Into<String>) -> Self {
        Value::Str(s.into())
    }

    pub fn list<I, V>(items: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        Value::List(items.into_iter().map(|v| Value::Str(v.into())).collect())
    }

    pub fn map() -> Self {
        Value::Map(Vec::new())
    }

    /// The `{error: <message>}` shape every failed module resolves to.
    pub fn error(message: impl Into<String>) -> Self {
        Value::Map(vec![("error".to_string(), Value::Str(message.into()))])
    }

    /// The `{info: <message>}` shape for "checked, found nothing".
    pub fn info(message: impl Into<String>) -> Self {
        Value::Map(vec![("info".to_string(), Value::Str(message.into()))])
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        if let Value::Map(entries) = self {
            entries.push((key.into(), value));
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        match self {
            Value::Map(entries) => entries.iter().find(|(k, _)| k == key).map(|(_, v)| v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_error(&self) -> bool {
        self.get("error").is_some()
    }

    pub fn is_empty_map(&self) -> bool {
        matches!(self, Value::Map(entries) if entries.is_empty())
    }

    /// Pretty-print with 4-space indentation, JSON-style. Used by the
    /// console renderer and the text export.
    pub fn render(&self) -> String {
        let mut out = String::new();
        self.render_into(&mut out, 0);
        out
    }

    fn render_into(&self, out: &mut String, depth: usize) {
        let pad = "    ".repeat(depth + 1);
        let close_pad = "    ".repeat(depth);
        match self {
            Value::Str(s) => {
                out.push_str(&serde_json::to_string(s).unwrap_or_else(|_| format!("{s:?}")));
            }
            Value::List(items) => {
                if items.is_empty() {
                    out.push_str("[]");
                    return;
                }
                out.push_str("[\n");
                for (i, item) in items.iter().enumerate() {
                    out.push_str(&pad);
                    item.render_into(out, depth + 1);
                    if i + 1 < items.len() {
                        out.push(',');
                    }
                    out.push('\n');
                }
                out.push_str(&close_pad);
                out.push(']');
            }
            Value::Map(entries) => {
                if entries.is_empty() {
                    out.push_str("{}");
                    return;
                }
                out.push_str("{\n");
                for (i, (key, value)) in entries.iter().enumerate() {
                    out.push_str(&pad);
                    out.push_str(
                        &serde_json::to_string(key).unwrap_or_else(|_| format!("{key:?}")),
                    );
                    out.push_str(": ");
                    value.render_into(out, depth + 1);
                    if i + 1 < entries.len() {
                        out.push(',');
                    }
                    out.push('\n');
                }
                out.push_str(&close_pad);
                out.push('}');
            }
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Str(s) => serializer.serialize_str(s),
            Value::List(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Value::Map(entries) => {
                let mut map = serializer.serialize_map(Some(entries.len()))?;
                for (key, value) in entries {
                    map.serialize_entry(key, value)?;
                }
                map.end()
            }
        }
    }
}

/// Ordered mapping from module name to its result. Entries appear in
/// insertion order: the IP address first, then one entry per probe in
/// registration order.
#[derive(Debug, Clone, Default)]
pub struct ScanReport {
    entries: Vec<(String, Value)>,
}

impl ScanReport {
    pub fn new() -> Self {
        Self { entries: Vec::new() }
    }

    pub fn insert(&mut self, name: impl Into<String>, value: Value) {
        self.entries.push((name.into(), value));
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries.iter().find(|(k, _)| k == name).map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = &(String, Value)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn ip_address(&self) -> Option<&str> {
        self.get(IP_ADDRESS_KEY).and_then(Value::as_str)
    }
}

impl Serialize for ScanReport {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, value) in &self.entries {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_shape() {
        let value = Value::error("timed out");
        assert!(value.is_error());
        assert_eq!(value.get("error").and_then(Value::as_str), Some("timed out"));
    }

    #[test]
    fn test_map_preserves_insertion_order() {
        let mut value = Value::map();
        value.insert("zebra", Value::str("1"));
        value.insert("apple", Value::str("2"));
        let json = serde_json::to_string(&value).unwrap();
        assert_eq!(json, r#"{"zebra":"1","apple":"2"}"#);
    }

    #[test]
    fn test_report_preserves_insertion_order() {
        let mut report = ScanReport::new();
        report.insert(IP_ADDRESS_KEY, Value::str("93.184.216.34"));
        report.insert("WHOIS", Value::error("unavailable"));
        report.insert("DNS Records", Value::map());

        let keys: Vec<&str> = report.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec![IP_ADDRESS_KEY, "WHOIS", "DNS Records"]);
        assert_eq!(report.ip_address(), Some("93.184.216.34"));
    }

    #[test]
    fn test_render_nested() {
        let mut inner = Value::map();
        inner.insert("Server", Value::str("nginx"));
        let mut value = Value::map();
        value.insert("Headers", inner);
        value.insert("Status Code", Value::str("200"));

        let rendered = value.render();
        assert!(rendered.contains("\"Headers\": {"));
        assert!(rendered.contains("        \"Server\": \"nginx\""));
        assert!(rendered.contains("\"Status Code\": \"200\""));
    }

    #[test]
    fn test_render_list() {
        let value = Value::list(["a", "b"]);
        assert_eq!(value.render(), "[\n    \"a\",\n    \"b\"\n]");
    }

    #[test]
    fn test_empty_collections_render_compact() {
        assert_eq!(Value::map().render(), "{}");
        assert_eq!(Value::List(Vec::new()).render(), "[]");
    }
}
