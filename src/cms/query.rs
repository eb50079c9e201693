//! Structured entry queries and search options.
//!
//! A [`Query`] serializes to the CMS's JSON query language:
//!
//! ```text
//! {"category": "sofa"}
//! {"uid": {"$in": ["a", "b"]}}
//! {"$or": [{"category": {"$regex": "sofa", "$options": "i"}}, ...]}
//! ```

use serde_json::{json, Map, Value};
use url::form_urlencoded;

pub const DEFAULT_LIMIT: i64 = 100;
pub const MAX_LIMIT: i64 = 1000;

/// Predicate on a single field.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    Eq(Value),
    In(Vec<Value>),
    /// Pattern match; `case_insensitive` adds `"$options": "i"`.
    Regex {
        pattern: String,
        case_insensitive: bool,
    },
}

impl Filter {
    fn to_value(&self) -> Value {
        match self {
            Filter::Eq(v) => v.clone(),
            Filter::In(values) => json!({ "$in": values }),
            Filter::Regex {
                pattern,
                case_insensitive: true,
            } => json!({ "$regex": pattern, "$options": "i" }),
            Filter::Regex { pattern, .. } => json!({ "$regex": pattern }),
        }
    }
}

/// Conjunction of field predicates, optionally OR-ed with sub-queries.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    clauses: Vec<(String, Filter)>,
    any_of: Vec<Query>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    /// Top-level `$or` across `branches`.
    pub fn any_of(branches: impl IntoIterator<Item = Query>) -> Self {
        Self {
            clauses: Vec::new(),
            any_of: branches.into_iter().filter(|q| !q.is_empty()).collect(),
        }
    }

    pub fn filter(mut self, field: impl Into<String>, filter: Filter) -> Self {
        self.clauses.push((field.into(), filter));
        self
    }

    pub fn eq(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filter(field, Filter::Eq(value.into()))
    }

    pub fn is_in<V: Into<Value>>(
        self,
        field: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        self.filter(field, Filter::In(values.into_iter().map(Into::into).collect()))
    }

    /// Case-insensitive pattern match. `pattern` is sent as-is.
    pub fn matches(self, field: impl Into<String>, pattern: impl Into<String>) -> Self {
        self.filter(
            field,
            Filter::Regex {
                pattern: pattern.into(),
                case_insensitive: true,
            },
        )
    }

    /// Case-insensitive substring match; regex metacharacters in `needle` are escaped.
    pub fn contains(self, field: impl Into<String>, needle: &str) -> Self {
        self.matches(field, regex::escape(needle))
    }

    /// Query from a raw JSON object; each key is sent back untouched.
    /// `None` for anything but an object.
    pub fn from_value(value: &Value) -> Option<Self> {
        let map = value.as_object()?;
        Some(map.iter().fold(Query::new(), |q, (field, v)| {
            q.filter(field.clone(), Filter::Eq(v.clone()))
        }))
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty() && self.any_of.is_empty()
    }

    pub fn to_value(&self) -> Value {
        let mut map = Map::new();
        for (field, filter) in &self.clauses {
            map.insert(field.clone(), filter.to_value());
        }
        if !self.any_of.is_empty() {
            map.insert(
                "$or".to_string(),
                Value::Array(self.any_of.iter().map(Query::to_value).collect()),
            );
        }
        Value::Object(map)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sort {
    Ascending(String),
    Descending(String),
}

impl Sort {
    /// Parses the `-field` convention for descending order.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        match raw.strip_prefix('-') {
            Some(field) if !field.is_empty() => Some(Sort::Descending(field.to_string())),
            Some(_) => None,
            None if raw.is_empty() => None,
            None => Some(Sort::Ascending(raw.to_string())),
        }
    }

    pub fn as_param(&self) -> String {
        match self {
            Sort::Ascending(field) => field.clone(),
            Sort::Descending(field) => format!("-{field}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchOptions {
    pub skip: u64,
    /// Clamped to `[1, 1000]` when sent.
    pub limit: i64,
    pub sort: Option<Sort>,
    pub include_count: bool,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            skip: 0,
            limit: DEFAULT_LIMIT,
            sort: None,
            include_count: false,
        }
    }
}

impl SearchOptions {
    pub fn with_limit(mut self, limit: i64) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_skip(mut self, skip: u64) -> Self {
        self.skip = skip;
        self
    }

    pub fn with_sort(mut self, sort: Sort) -> Self {
        self.sort = Some(sort);
        self
    }

    pub fn with_count(mut self) -> Self {
        self.include_count = true;
        self
    }
}

pub fn clamp_limit(limit: i64) -> i64 {
    limit.clamp(1, MAX_LIMIT)
}

pub fn entries_endpoint(content_type: &str) -> String {
    format!(
        "/content_types/{}/entries",
        urlencoding::encode(content_type)
    )
}

pub fn entry_endpoint(content_type: &str, uid: &str) -> String {
    format!(
        "{}/{}",
        entries_endpoint(content_type),
        urlencoding::encode(uid)
    )
}

/// `/content_types/<type>/entries?query=..&skip=..&limit=..&sort=..&include_count=true`.
pub fn search_endpoint(content_type: &str, query: &Query, options: &SearchOptions) -> String {
    let mut params = form_urlencoded::Serializer::new(String::new());
    if !query.is_empty() {
        params.append_pair("query", &query.to_value().to_string());
    }
    if options.skip > 0 {
        params.append_pair("skip", &options.skip.to_string());
    }
    params.append_pair("limit", &clamp_limit(options.limit).to_string());
    if let Some(sort) = &options.sort {
        params.append_pair("sort", &sort.as_param());
    }
    if options.include_count {
        params.append_pair("include_count", "true");
    }
    format!("{}?{}", entries_endpoint(content_type), params.finish())
}
