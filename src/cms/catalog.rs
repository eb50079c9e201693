//! Catalog-level fetches: whole collections, single entries, category and
//! keyword lookups with their client-side fallbacks.

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::cms::error::{CmsError, CmsResult};
use crate::cms::query::{entry_endpoint, Query, SearchOptions};
use crate::cms::search::ContentService;
use crate::cms::transport::{ContentApi, RequestOptions};
use crate::normalization::entries::{Banner, Footer, FromEntry, Product, Service};

/// Raw product fields searched by keyword.
const PRODUCT_TEXT_FIELDS: [&str; 5] = [
    "product_name",
    "title",
    "description",
    "short_description",
    "full_description",
];

pub(crate) fn transform_all<T: FromEntry>(entries: &[Value]) -> Vec<T> {
    entries.iter().filter_map(T::from_entry).collect()
}

/// `{entry: {...}}`, or a bare entry map carrying an identifier.
fn single_entry(response: Value) -> Option<Value> {
    match response {
        Value::Object(mut map) => match map.remove("entry") {
            Some(entry @ Value::Object(_)) => Some(entry),
            Some(_) => None,
            None if map.contains_key("uid") || map.contains_key("id") => {
                Some(Value::Object(map))
            }
            None => None,
        },
        _ => None,
    }
}

fn category_matches(product: &Product, category: &str) -> bool {
    product.category == category || product.category.to_lowercase() == category.to_lowercase()
}

/// Same category (exact match), different identity.
fn related_to(product: &Product, candidates: Vec<Product>) -> Vec<Product> {
    candidates
        .into_iter()
        .filter(|p| p.category == product.category && p.id != product.id)
        .collect()
}

/// A product together with the rest of its category.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductDetail {
    pub product: Product,
    pub related: Vec<Product>,
}

fn text_matches(product: &Product, needle_lower: &str) -> bool {
    [&product.product_name, &product.description, &product.short_desc]
        .iter()
        .any(|field| field.to_lowercase().contains(needle_lower))
}

impl<A: ContentApi> ContentService<A> {
    /// Every entry of `T::CONTENT_TYPE`, transformed; untransformable entries are dropped.
    pub async fn fetch_collection<T: FromEntry>(&self) -> CmsResult<Vec<T>> {
        let entries = self
            .fetch_all_entries(T::CONTENT_TYPE)
            .await
            .inspect_err(|err| {
                error!(content_type = T::CONTENT_TYPE, %err, "cms: collection fetch failed")
            })?;
        Ok(transform_all(&entries))
    }

    pub async fn fetch_products(&self) -> CmsResult<Vec<Product>> {
        self.fetch_collection::<Product>().await
    }

    pub async fn fetch_banners(&self) -> CmsResult<Vec<Banner>> {
        self.fetch_collection::<Banner>().await
    }

    pub async fn fetch_services(&self) -> CmsResult<Vec<Service>> {
        self.fetch_collection::<Service>().await
    }

    /// Single raw entry; a 404 or an empty response is [`CmsError::NotFound`].
    pub async fn fetch_entry(&self, content_type: &str, uid: &str) -> CmsResult<Value> {
        let response = self
            .api
            .request(&entry_endpoint(content_type, uid), RequestOptions::get())
            .await
            .map_err(|err| err.into_not_found(content_type, uid))?;
        single_entry(response).ok_or_else(|| CmsError::not_found(content_type, uid))
    }

    pub async fn fetch_product_by_id(&self, product_id: &str) -> CmsResult<Product> {
        let entry = self.fetch_entry(Product::CONTENT_TYPE, product_id).await?;
        Product::from_entry(&entry)
            .ok_or_else(|| CmsError::not_found(Product::CONTENT_TYPE, product_id))
    }

    /// Other products in `product`'s category, taken from the full collection.
    pub async fn fetch_related_products(&self, product: &Product) -> CmsResult<Vec<Product>> {
        let related = related_to(product, self.fetch_products().await?);
        debug!(uid = %product.id, related = related.len(), "cms: related products");
        Ok(related)
    }

    /// [`Self::fetch_product_by_id`] plus [`Self::fetch_related_products`].
    pub async fn fetch_product_with_related(&self, product_id: &str) -> CmsResult<ProductDetail> {
        let product = self.fetch_product_by_id(product_id).await?;
        let related = self.fetch_related_products(&product).await?;
        Ok(ProductDetail { product, related })
    }

    /// Products in `category`.
    ///
    /// Tries, in order and stopping at the first non-empty answer: equality on
    /// `category`, equality on `product_category`, a case-insensitive pattern
    /// on either field, then the whole collection filtered locally. A failing
    /// query skips straight to the local filter; if that fails too, the query
    /// error is returned.
    pub async fn fetch_products_by_category(&self, category: &str) -> CmsResult<Vec<Product>> {
        let chain = [
            Query::new().eq("category", category),
            Query::new().eq("product_category", category),
            Query::any_of([
                Query::new().contains("category", category),
                Query::new().contains("product_category", category),
            ]),
        ];

        let search_err = match self.first_non_empty(&chain).await {
            Ok(Some(products)) => return Ok(products),
            Ok(None) => {
                warn!(category, "cms: no products via search; falling back to fetch all and filter");
                None
            }
            Err(err) => {
                warn!(category, %err, "cms: category search failed; falling back to fetch all and filter");
                Some(err)
            }
        };

        self.filter_all_products(search_err, |p| category_matches(p, category))
            .await
    }

    /// Keyword search over product names and descriptions, with the same
    /// local-filter fallback as [`Self::fetch_products_by_category`].
    pub async fn search_products(&self, term: &str) -> CmsResult<Vec<Product>> {
        let term = term.trim();
        if term.is_empty() {
            return self.fetch_products().await;
        }
        let query = Query::any_of(
            PRODUCT_TEXT_FIELDS
                .iter()
                .map(|field| Query::new().contains(*field, term)),
        );

        let search_err = match self.first_non_empty(std::slice::from_ref(&query)).await {
            Ok(Some(products)) => return Ok(products),
            Ok(None) => {
                warn!(term, "cms: no products via search; falling back to fetch all and filter");
                None
            }
            Err(err) => {
                warn!(term, %err, "cms: product search failed; falling back to fetch all and filter");
                Some(err)
            }
        };

        let needle = term.to_lowercase();
        self.filter_all_products(search_err, |p| text_matches(p, &needle))
            .await
    }

    /// First footer entry; `None` when the collection is empty.
    pub async fn fetch_footer_content(&self) -> CmsResult<Option<Footer>> {
        let entries = self
            .fetch_all_entries(Footer::CONTENT_TYPE)
            .await
            .inspect_err(|err| error!(%err, "cms: footer fetch failed"))?;
        Ok(entries.first().and_then(Footer::from_entry))
    }

    /// Footer content, or the static fallback when the CMS has none or fails.
    pub async fn fetch_footer_or_fallback(&self) -> Footer {
        match self.fetch_footer_content().await {
            Ok(Some(footer)) => footer,
            Ok(None) => Footer::fallback(),
            Err(err) => {
                warn!(%err, "cms: using fallback footer");
                Footer::fallback()
            }
        }
    }

    /// Runs `chain` in order; returns the transformed products of the first
    /// query that yields entries, `None` when every query came back empty.
    async fn first_non_empty(&self, chain: &[Query]) -> CmsResult<Option<Vec<Product>>> {
        for (step, query) in chain.iter().enumerate() {
            let result = self
                .search_entries(Product::CONTENT_TYPE, query, &SearchOptions::default())
                .await?;
            if !result.entries.is_empty() {
                debug!(step, hits = result.entries.len(), "cms: product lookup matched");
                return Ok(Some(transform_all(&result.entries)));
            }
            debug!(step, "cms: product lookup empty");
        }
        Ok(None)
    }

    async fn filter_all_products(
        &self,
        search_err: Option<CmsError>,
        keep: impl Fn(&Product) -> bool,
    ) -> CmsResult<Vec<Product>> {
        match self.fetch_products().await {
            Ok(all) => {
                let kept: Vec<Product> = all.into_iter().filter(|p| keep(p)).collect();
                info!(kept = kept.len(), "cms: local product filter applied");
                Ok(kept)
            }
            Err(fallback_err) => Err(search_err.unwrap_or(fallback_err)),
        }
    }
}
