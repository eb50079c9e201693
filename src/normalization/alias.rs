//! First-present-wins resolution over raw CMS field aliases.
//!
//! A canonical field is described by a [`FieldRule`]: an ordered list of
//! paths into the raw entry plus a literal default. Resolution walks the
//! paths in order and takes the first value that is present and of the
//! right shape; nothing here ever fails.

use serde_json::Value;

/// Path into a raw entry, e.g. `&["product_image", "url"]`.
pub type FieldPath = &'static [&'static str];

#[derive(Debug, Clone, Copy)]
pub struct FieldRule<D: 'static> {
    pub paths: &'static [FieldPath],
    pub default: D,
}

impl<D> FieldRule<D> {
    pub const fn new(paths: &'static [FieldPath], default: D) -> Self {
        Self { paths, default }
    }
}

impl FieldRule<&'static str> {
    pub fn text(&self, entry: &Value) -> String {
        first_present(entry, self.paths, value_as_text).unwrap_or_else(|| self.default.to_string())
    }
}

impl FieldRule<f64> {
    pub fn number(&self, entry: &Value) -> f64 {
        first_present(entry, self.paths, value_as_f64).unwrap_or(self.default)
    }
}

impl FieldRule<()> {
    /// List of strings; JSON-encoded string lists are decoded.
    ///
    /// The first present alias decides: if its value is not a list (or a
    /// string holding one), the result is empty rather than the next alias.
    pub fn string_list(&self, entry: &Value) -> Vec<String> {
        self.paths
            .iter()
            .filter_map(|path| lookup(entry, path))
            .find(|v| is_present(v))
            .and_then(value_as_string_list)
            .unwrap_or_default()
    }
}

/// Walk `path` into `entry`.
pub fn lookup<'a>(entry: &'a Value, path: &[&str]) -> Option<&'a Value> {
    path.iter().try_fold(entry, |cur, key| cur.get(*key))
}

/// `null` and blank strings count as absent.
pub fn is_present(v: &Value) -> bool {
    match v {
        Value::Null => false,
        Value::String(s) => !s.trim().is_empty(),
        _ => true,
    }
}

/// Generic resolver: the first path whose value is present and accepted by `extract`.
pub fn first_present<'a, T>(
    entry: &'a Value,
    paths: &[FieldPath],
    extract: impl Fn(&'a Value) -> Option<T>,
) -> Option<T> {
    paths
        .iter()
        .filter_map(|path| lookup(entry, path))
        .filter(|v| is_present(v))
        .find_map(extract)
}

pub fn value_as_text(v: &Value) -> Option<String> {
    match v {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

pub fn value_as_f64(v: &Value) -> Option<f64> {
    if let Some(n) = v.as_f64() {
        return Some(n).filter(|n| n.is_finite());
    }
    if let Some(s) = v.as_str() {
        return s.trim().parse::<f64>().ok().filter(|n| n.is_finite());
    }
    None
}

pub fn value_as_string_list(v: &Value) -> Option<Vec<String>> {
    match v {
        Value::Array(items) => Some(items.iter().filter_map(value_as_text).collect()),
        Value::String(s) => match serde_json::from_str::<Value>(s) {
            Ok(Value::Array(items)) => Some(items.iter().filter_map(value_as_text).collect()),
            _ => None,
        },
        _ => None,
    }
}
