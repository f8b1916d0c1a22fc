//! Request argument dictionary.
//!
//! [`QueryDict`] holds the untyped arguments of one request, from a query
//! string, a form body, or a flat JSON object. A key may carry several
//! values; [`QueryDict::get`] answers the last one.

use std::collections::BTreeMap;

/// Untyped request arguments.
///
/// # Examples
///
/// ```
/// use lfb_http::QueryDict;
///
/// let qd = QueryDict::parse("roleName=ops%20team&tag=a&tag=b");
/// assert_eq!(qd.get("roleName"), Some("ops team"));
/// assert_eq!(qd.get("tag"), Some("b"));
/// assert_eq!(qd.get_list("tag"), Some(&vec!["a".to_string(), "b".to_string()]));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryDict {
    data: BTreeMap<String, Vec<String>>,
}

impl QueryDict {
    /// Creates an empty `QueryDict`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a URL-encoded string (`"key1=val1&key2=val2"`).
    ///
    /// Handles percent-encoding and `+` as space, and keeps every value of a
    /// repeated key. A pair without `=` has an empty value.
    pub fn parse(query_string: &str) -> Self {
        let mut qd = Self::new();
        for pair in query_string.split('&').filter(|p| !p.is_empty()) {
            let (key, value) = pair
                .split_once('=')
                .unwrap_or((pair, ""));
            qd.append(&percent_decode(key), &percent_decode(value));
        }
        qd
    }

    /// Builds a `QueryDict` from key/value pairs.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut qd = Self::new();
        for (k, v) in pairs {
            qd.append(k.as_ref(), v.as_ref());
        }
        qd
    }

    /// Builds a `QueryDict` from a JSON object body.
    ///
    /// Strings are taken as is, `null` is skipped, and any other value is
    /// kept as its JSON text so structured arguments can be decoded later.
    /// A non-object body yields an empty `QueryDict`.
    pub fn from_json(body: &serde_json::Value) -> Self {
        let mut qd = Self::new();
        if let serde_json::Value::Object(map) = body {
            for (key, value) in map {
                match value {
                    serde_json::Value::Null => {}
                    serde_json::Value::String(s) => qd.append(key, s),
                    other => qd.append(key, &other.to_string()),
                }
            }
        }
        qd
    }

    /// Returns the last value for the given key, or `None` if not present.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.data
            .get(key)
            .and_then(|values| values.last())
            .map(String::as_str)
    }

    /// Returns all values for the given key, or `None` if not present.
    pub fn get_list(&self, key: &str) -> Option<&Vec<String>> {
        self.data.get(key)
    }

    /// Sets a single value for the given key, replacing any existing values.
    pub fn set(&mut self, key: &str, value: &str) {
        self.data.insert(key.to_string(), vec![value.to_string()]);
    }

    /// Appends a value to the list for the given key.
    pub fn append(&mut self, key: &str, value: &str) {
        self.data
            .entry(key.to_string())
            .or_default()
            .push(value.to_string());
    }

    /// Encodes this `QueryDict` as a URL query string, keys in sorted order.
    pub fn urlencode(&self) -> String {
        self.data
            .iter()
            .flat_map(|(key, values)| {
                values
                    .iter()
                    .map(move |value| format!("{}={}", percent_encode(key), percent_encode(value)))
            })
            .collect::<Vec<_>>()
            .join("&")
    }

    /// Returns the number of distinct keys.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` if the `QueryDict` contains no keys.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns `true` if the specified key is present.
    pub fn contains_key(&self, key: &str) -> bool {
        self.data.contains_key(key)
    }

    /// Returns an iterator over the keys in sorted order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.data.keys().map(String::as_str)
    }
}

fn percent_decode(input: &str) -> String {
    let plus_decoded = input.replace('+', " ");
    percent_encoding::percent_decode_str(&plus_decoded)
        .decode_utf8_lossy()
        .into_owned()
}

fn percent_encode(input: &str) -> String {
    percent_encoding::utf8_percent_encode(input, percent_encoding::NON_ALPHANUMERIC).to_string()
}
