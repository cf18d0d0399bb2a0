//! Route parameters and query strings
//!
//! [`RouteParams`] holds captures extracted by a route pattern (`{id}`),
//! [`QueryParams`] holds the decoded query string (`?page=1&tag=a&tag=b`).
//! Both serialize to plain JSON objects so they can travel inside a history
//! entry.

use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashMap;
use std::fmt;
use url::form_urlencoded;

/// Route parameters extracted from path segments
///
/// # Example
///
/// ```
/// use isoroute::RouteParams;
///
/// // Route pattern: /users/{id}
/// // Matched path: /users/123
/// let mut params = RouteParams::new();
/// params.insert("id".to_string(), "123".to_string());
///
/// assert_eq!(params.get("id"), Some(&"123".to_string()));
/// assert_eq!(params.get_as::<i32>("id"), Some(123));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RouteParams {
    params: HashMap<String, String>,
}

impl RouteParams {
    /// Create new empty route params
    pub fn new() -> Self {
        Self::default()
    }

    /// Create from hashmap
    pub fn from_map(params: HashMap<String, String>) -> Self {
        Self { params }
    }

    /// Get a parameter value as a string
    pub fn get(&self, key: &str) -> Option<&String> {
        self.params.get(key)
    }

    /// Get a parameter and parse it as a specific type
    ///
    /// Returns `None` if the parameter doesn't exist or cannot be parsed.
    pub fn get_as<T>(&self, key: &str) -> Option<T>
    where
        T: std::str::FromStr,
    {
        self.params.get(key)?.parse().ok()
    }

    /// Get a parameter with percent-escapes decoded
    pub fn get_decoded(&self, key: &str) -> Option<String> {
        let raw = self.params.get(key)?;
        Some(
            urlencoding::decode(raw)
                .map(|value| value.into_owned())
                .unwrap_or_else(|_| raw.clone()),
        )
    }

    /// Insert a parameter
    pub fn insert(&mut self, key: String, value: String) {
        self.params.insert(key, value);
    }

    /// Set a parameter (builder style)
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// Check if parameter exists
    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Get all parameters as a reference to the HashMap
    pub fn all(&self) -> &HashMap<String, String> {
        &self.params
    }

    /// Iterate over all parameters
    pub fn iter(&self) -> impl Iterator<Item = (&String, &String)> {
        self.params.iter()
    }

    /// Check if parameters are empty
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Get number of parameters
    pub fn len(&self) -> usize {
        self.params.len()
    }
}

impl<K, V> FromIterator<(K, V)> for RouteParams
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            params: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

// ============================================================================
// Query Parameters
// ============================================================================

/// A query-string value: a single string, or a list when the key repeats
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QueryValue {
    /// The key appeared once
    Single(String),
    /// The key appeared more than once
    Multiple(Vec<String>),
}

/// Query parameters parsed from URL query string
///
/// Keys keep their first-insertion order, so a query string rebuilt from
/// these params lists keys the way they were given. Queries are short, so
/// lookups scan linearly.
///
/// # Example
///
/// ```
/// use isoroute::QueryParams;
///
/// let query = QueryParams::parse("page=1&sort=name&tag=rust&tag=web");
///
/// assert_eq!(query.get("page"), Some(&"1".to_string()));
/// assert_eq!(query.get_as::<i32>("page"), Some(1));
/// assert_eq!(query.get_all("tag").unwrap().len(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    params: Vec<(String, Vec<String>)>,
}

impl QueryParams {
    /// Create new empty query params
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a query string, with or without its leading `?`
    ///
    /// `+` decodes to a space and percent-escapes are decoded. A key without
    /// `=` gets an empty value.
    pub fn parse(query: &str) -> Self {
        let query = query.strip_prefix('?').unwrap_or(query);
        let mut params = Self::new();

        for (key, value) in form_urlencoded::parse(query.as_bytes()) {
            if key.is_empty() {
                continue;
            }
            params.insert(key.into_owned(), value.into_owned());
        }

        params
    }

    /// Get first value for a parameter
    pub fn get(&self, key: &str) -> Option<&String> {
        self.get_all(key)?.first()
    }

    /// Get all values for a parameter
    ///
    /// Useful for parameters that can appear multiple times like `?tag=a&tag=b`
    pub fn get_all(&self, key: &str) -> Option<&Vec<String>> {
        self.params
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, values)| values)
    }

    /// Get the value in its one-or-many form
    pub fn value(&self, key: &str) -> Option<QueryValue> {
        self.get_all(key).map(|values| to_query_value(values))
    }

    /// Get parameter as a specific type
    ///
    /// Returns the first value parsed as type T.
    pub fn get_as<T>(&self, key: &str) -> Option<T>
    where
        T: std::str::FromStr,
    {
        self.get(key)?.parse().ok()
    }

    /// Insert a parameter
    ///
    /// If the key already exists, the value is appended to the list.
    pub fn insert(&mut self, key: String, value: String) {
        match self.params.iter_mut().find(|(name, _)| *name == key) {
            Some((_, values)) => values.push(value),
            None => self.params.push((key, vec![value])),
        }
    }

    /// Append a parameter (builder style)
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key.into(), value.into());
        self
    }

    /// Check if parameter exists
    pub fn contains(&self, key: &str) -> bool {
        self.get_all(key).is_some()
    }

    /// Iterate over keys and all of their values
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Vec<String>)> {
        self.params.iter().map(|(key, values)| (key, values))
    }

    /// Convert to a percent-encoded query string (without a leading `?`)
    ///
    /// # Example
    ///
    /// ```
    /// use isoroute::QueryParams;
    ///
    /// let query = QueryParams::new().with("q", "hello world").with("page", "1");
    /// assert_eq!(query.to_query_string(), "q=hello%20world&page=1");
    /// ```
    pub fn to_query_string(&self) -> String {
        let pairs: Vec<String> = self
            .params
            .iter()
            .flat_map(|(key, values)| {
                values.iter().map(move |value| {
                    format!(
                        "{}={}",
                        urlencoding::encode(key),
                        urlencoding::encode(value)
                    )
                })
            })
            .collect();

        pairs.join("&")
    }

    /// Check if parameters are empty
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Get number of unique parameter keys
    pub fn len(&self) -> usize {
        self.params.len()
    }
}

fn to_query_value(values: &[String]) -> QueryValue {
    match values {
        [single] => QueryValue::Single(single.clone()),
        many => QueryValue::Multiple(many.to_vec()),
    }
}

impl Serialize for QueryParams {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(
            self.params
                .iter()
                .map(|(key, values)| (key, to_query_value(values))),
        )
    }
}

struct QueryParamsVisitor;

impl<'de> Visitor<'de> for QueryParamsVisitor {
    type Value = QueryParams;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a map of query keys to a string or a list of strings")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
        let mut query = QueryParams::new();
        while let Some((key, value)) = map.next_entry::<String, QueryValue>()? {
            match value {
                QueryValue::Single(value) => query.insert(key, value),
                QueryValue::Multiple(values) => {
                    for value in values {
                        query.insert(key.clone(), value);
                    }
                }
            }
        }
        Ok(query)
    }
}

impl<'de> Deserialize<'de> for QueryParams {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(QueryParamsVisitor)
    }
}

// ============================================================================
// Tests
// ============================================================================
