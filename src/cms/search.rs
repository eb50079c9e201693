//! Query execution against a single content type.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use futures::future::join_all;
use indexmap::IndexSet;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::cms::error::CmsResult;
use crate::cms::query::{clamp_limit, entries_endpoint, search_endpoint, Query, SearchOptions};
use crate::cms::transport::{ContentApi, RequestOptions};
use crate::config::{CmsConfig, DEFAULT_HOME_ENTRY_UID};

/// Page of raw entries.
///
/// `count`/`total` come from the backend when it reports one; otherwise they
/// fall back to the page length, which cannot tell "no more pages" apart
/// from "count omitted".
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SearchResult {
    pub entries: Vec<Value>,
    pub count: u64,
    pub total: u64,
}

/// Content retrieval and normalization on top of a [`ContentApi`].
#[derive(Debug)]
pub struct ContentService<A: ContentApi> {
    pub(crate) api: Arc<A>,
    pub(crate) home_entry_uid: String,
}

impl<A: ContentApi> Clone for ContentService<A> {
    fn clone(&self) -> Self {
        Self {
            api: Arc::clone(&self.api),
            home_entry_uid: self.home_entry_uid.clone(),
        }
    }
}

impl<A: ContentApi> ContentService<A> {
    pub fn new(api: A, config: &CmsConfig) -> Self {
        Self {
            api: Arc::new(api),
            home_entry_uid: config.home_entry_uid.clone(),
        }
    }

    /// Service with default settings around an existing API handle.
    pub fn from_api(api: A) -> Self {
        Self {
            api: Arc::new(api),
            home_entry_uid: DEFAULT_HOME_ENTRY_UID.to_string(),
        }
    }

    pub fn with_home_entry_uid(mut self, uid: impl Into<String>) -> Self {
        self.home_entry_uid = uid.into();
        self
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    /// Run `query` against `content_type`; an empty query lists the collection.
    pub async fn search_entries(
        &self,
        content_type: &str,
        query: &Query,
        options: &SearchOptions,
    ) -> CmsResult<SearchResult> {
        let endpoint = search_endpoint(content_type, query, options);
        debug!(
            content_type,
            query = %query.to_value(),
            skip = options.skip,
            limit = clamp_limit(options.limit),
            sort = ?options.sort,
            include_count = options.include_count,
            "cms: searching entries"
        );

        let response = self
            .api
            .request(&endpoint, RequestOptions::get())
            .await
            .inspect_err(|err| error!(content_type, %err, "cms: search failed"))?;

        let result = search_result(response);
        info!(
            content_type,
            returned = result.entries.len(),
            total = result.total,
            "cms: search returned entries"
        );
        Ok(result)
    }

    /// Whole collection for `content_type`, unfiltered.
    pub(crate) async fn fetch_all_entries(&self, content_type: &str) -> CmsResult<Vec<Value>> {
        let response = self
            .api
            .request(&entries_endpoint(content_type), RequestOptions::get())
            .await?;
        Ok(entries_of(response))
    }

    /// Batch-fetch entries by UID.
    ///
    /// Duplicates and blank UIDs are dropped before the call. UIDs the CMS
    /// did not return are only logged. When the `$in` query fails, the whole
    /// collection is fetched and filtered locally; when that fails as well
    /// the result is empty.
    pub async fn fetch_entries_by_uids<S: AsRef<str>>(
        &self,
        content_type: &str,
        uids: &[S],
    ) -> Vec<Value> {
        let unique = unique_uids(uids);
        if unique.is_empty() {
            return Vec::new();
        }

        let query = Query::new().is_in("uid", unique.iter().cloned());
        let options = SearchOptions::default()
            .with_limit(unique.len() as i64)
            .with_count();

        match self.search_entries(content_type, &query, &options).await {
            Ok(result) => {
                info!(
                    content_type,
                    fetched = result.entries.len(),
                    requested = unique.len(),
                    "cms: fetched entries by uid"
                );
                let missing: Vec<String> = {
                    let fetched: HashSet<&str> =
                        result.entries.iter().filter_map(entry_uid).collect();
                    unique
                        .iter()
                        .filter(|uid| !fetched.contains(uid.as_str()))
                        .cloned()
                        .collect()
                };
                if !missing.is_empty() {
                    warn!(
                        content_type,
                        missing_count = missing.len(),
                        missing = ?missing,
                        "cms: entries missing from uid lookup"
                    );
                }
                result.entries
            }
            Err(err) => {
                warn!(
                    content_type,
                    %err,
                    "cms: uid lookup failed; falling back to fetch all and filter"
                );
                match self.fetch_all_entries(content_type).await {
                    Ok(all) => {
                        let filtered: Vec<Value> = all
                            .into_iter()
                            .filter(|e| entry_uid(e).is_some_and(|uid| unique.contains(uid)))
                            .collect();
                        info!(
                            content_type,
                            fetched = filtered.len(),
                            requested = unique.len(),
                            "cms: fallback filtered entries by uid"
                        );
                        filtered
                    }
                    Err(fallback_err) => {
                        error!(
                            content_type,
                            err = %fallback_err,
                            "cms: fallback fetch failed; returning no entries"
                        );
                        Vec::new()
                    }
                }
            }
        }
    }

    /// [`Self::fetch_entries_by_uids`] for several content types at once, concurrently.
    pub async fn fetch_multiple_entries_by_content_type(
        &self,
        requests: &HashMap<String, Vec<String>>,
    ) -> HashMap<String, Vec<Value>> {
        let fetches = requests.iter().map(|(content_type, uids)| async move {
            let entries = self.fetch_entries_by_uids(content_type, uids).await;
            (content_type.clone(), entries)
        });
        let out: HashMap<String, Vec<Value>> = join_all(fetches).await.into_iter().collect();
        info!(
            content_types = out.len(),
            "cms: fetched entries across content types"
        );
        out
    }
}

/// Order-preserving dedup; blank UIDs are discarded.
pub fn unique_uids<S: AsRef<str>>(uids: &[S]) -> IndexSet<String> {
    uids.iter()
        .map(|u| u.as_ref().trim())
        .filter(|u| !u.is_empty())
        .map(str::to_string)
        .collect()
}

pub(crate) fn entry_uid(entry: &Value) -> Option<&str> {
    entry.get("uid").and_then(Value::as_str)
}

/// `entries` array of a list response; anything else is an empty list.
pub(crate) fn entries_of(response: Value) -> Vec<Value> {
    match response {
        Value::Object(mut map) => match map.remove("entries") {
            Some(Value::Array(entries)) => entries,
            _ => Vec::new(),
        },
        _ => Vec::new(),
    }
}

fn search_result(response: Value) -> SearchResult {
    let reported = response
        .get("count")
        .and_then(Value::as_u64)
        .filter(|c| *c > 0);
    let entries = entries_of(response);
    let count = reported.unwrap_or(entries.len() as u64);
    SearchResult {
        entries,
        count,
        total: count,
    }
}
