//! Home page assembly: root entry, modular `page_sections` blocks, and the
//! batch hydration of every entry those blocks reference.

use std::collections::HashMap;

use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};

use crate::cms::error::CmsResult;
use crate::cms::search::{entry_uid, ContentService};
use crate::cms::transport::ContentApi;
use crate::normalization::entries::{Banner, Footer, FromEntry, Product, Service};

const HOME_CONTENT_TYPE: &str = "home";

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HomeSections {
    pub slider: Vec<Banner>,
    pub services: Vec<Service>,
    pub discount_products: Vec<Product>,
    pub new_arrivals: Vec<Product>,
    pub best_sales: Vec<Product>,
    pub footer: Option<Footer>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct HomePageDocument {
    pub title: String,
    pub sections: HomeSections,
}

/// Discriminator of a `page_sections` block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockKind {
    Slider,
    Service,
    Discount,
    NewArrivals,
    BestSales,
    Unknown(String),
}

impl BlockKind {
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "slider" => BlockKind::Slider,
            "service" => BlockKind::Service,
            "discount" => BlockKind::Discount,
            "new_arrivals" => BlockKind::NewArrivals,
            "best_sales" => BlockKind::BestSales,
            other => BlockKind::Unknown(other.to_string()),
        }
    }

    /// Block field holding the reference list.
    fn reference_field(&self) -> Option<&'static str> {
        match self {
            BlockKind::Slider => Some("banner"),
            BlockKind::Service => Some("services"),
            BlockKind::Discount => Some("products"),
            BlockKind::NewArrivals | BlockKind::BestSales => Some("product"),
            BlockKind::Unknown(_) => None,
        }
    }
}

/// One recognized block with its references, in document order.
#[derive(Debug, Clone, PartialEq)]
pub struct PageBlock {
    pub kind: BlockKind,
    pub uids: Vec<String>,
}

/// Parse `page_sections` in order. Unknown and empty blocks are skipped with a
/// warning. UIDs are trimmed the same way the batch lookup trims them.
pub fn scan_blocks(page_sections: &Value) -> Vec<PageBlock> {
    let Some(items) = page_sections.as_array() else {
        return Vec::new();
    };

    let mut blocks = Vec::with_capacity(items.len());
    for item in items {
        let Some((tag, block)) = item.as_object().and_then(|m| m.iter().next()) else {
            continue;
        };
        if block.is_null() {
            warn!(block_type = %tag, "cms: empty block in home page; skipping");
            continue;
        }
        let kind = BlockKind::from_tag(tag);
        let Some(field) = kind.reference_field() else {
            warn!(block_type = %tag, "cms: unknown block type in home page; skipping");
            continue;
        };
        let uids = block
            .get(field)
            .and_then(Value::as_array)
            .map(|refs| {
                refs.iter()
                    .filter_map(|r| r.get("uid").and_then(Value::as_str))
                    .map(str::trim)
                    .filter(|uid| !uid.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();
        blocks.push(PageBlock { kind, uids });
    }
    blocks
}

/// Identifier -> entry map for one content type.
fn index_by_uid(entries: Vec<Value>) -> HashMap<String, Value> {
    entries
        .into_iter()
        .filter_map(|e| {
            let uid = entry_uid(&e)?.to_string();
            Some((uid, e))
        })
        .collect()
}

/// Map references through `lookup`, keeping document order and dropping
/// anything that did not hydrate or transform.
fn hydrate<T: FromEntry>(uids: &[String], lookup: &HashMap<String, Value>) -> Vec<T> {
    uids.iter()
        .filter_map(|uid| lookup.get(uid))
        .filter_map(T::from_entry)
        .collect()
}

/// Non-empty replaces the section default; empty leaves it alone.
fn assign_if_non_empty<T>(section: &mut Vec<T>, hydrated: Vec<T>) {
    if !hydrated.is_empty() {
        *section = hydrated;
    }
}

impl<A: ContentApi> ContentService<A> {
    /// Fetch the home entry and hydrate every block it references.
    ///
    /// Only the root fetch can fail the call; references that do not hydrate
    /// just leave their section at its empty default. `footer` stays `None`;
    /// see [`Self::fetch_home_page_with_footer`].
    pub async fn fetch_home_page(&self) -> CmsResult<HomePageDocument> {
        let uid = self.home_entry_uid.clone();
        info!(uid = %uid, "cms: fetching home entry");
        let entry = self
            .fetch_entry(HOME_CONTENT_TYPE, &uid)
            .await
            .inspect_err(|err| warn!(uid = %uid, %err, "cms: home entry fetch failed"))?;

        let blocks = scan_blocks(entry.get("page_sections").unwrap_or(&Value::Null));

        let mut banner_uids = Vec::new();
        let mut service_uids = Vec::new();
        let mut product_uids = Vec::new();
        for block in &blocks {
            let target = match block.kind {
                BlockKind::Slider => &mut banner_uids,
                BlockKind::Service => &mut service_uids,
                BlockKind::Discount | BlockKind::NewArrivals | BlockKind::BestSales => {
                    &mut product_uids
                }
                BlockKind::Unknown(_) => continue,
            };
            target.extend(block.uids.iter().cloned());
        }

        let (banners, services, products) = tokio::join!(
            self.fetch_entries_by_uids(Banner::CONTENT_TYPE, &banner_uids),
            self.fetch_entries_by_uids(Service::CONTENT_TYPE, &service_uids),
            self.fetch_entries_by_uids(Product::CONTENT_TYPE, &product_uids),
        );
        let banners = index_by_uid(banners);
        let services = index_by_uid(services);
        let products = index_by_uid(products);

        let mut doc = HomePageDocument {
            title: entry
                .get("title")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            sections: HomeSections::default(),
        };
        let sections = &mut doc.sections;
        for block in &blocks {
            match block.kind {
                BlockKind::Slider => {
                    assign_if_non_empty(&mut sections.slider, hydrate(&block.uids, &banners))
                }
                BlockKind::Service => {
                    assign_if_non_empty(&mut sections.services, hydrate(&block.uids, &services))
                }
                BlockKind::Discount => assign_if_non_empty(
                    &mut sections.discount_products,
                    hydrate(&block.uids, &products),
                ),
                BlockKind::NewArrivals => assign_if_non_empty(
                    &mut sections.new_arrivals,
                    hydrate(&block.uids, &products),
                ),
                BlockKind::BestSales => {
                    assign_if_non_empty(&mut sections.best_sales, hydrate(&block.uids, &products))
                }
                BlockKind::Unknown(_) => {}
            }
        }

        info!(
            slider = doc.sections.slider.len(),
            services = doc.sections.services.len(),
            discount = doc.sections.discount_products.len(),
            new_arrivals = doc.sections.new_arrivals.len(),
            best_sales = doc.sections.best_sales.len(),
            "cms: home page assembled"
        );
        Ok(doc)
    }

    /// [`Self::fetch_home_page`] plus the footer section; a footer failure
    /// leaves `footer` as `None`.
    pub async fn fetch_home_page_with_footer(&self) -> CmsResult<HomePageDocument> {
        let (home, footer) = tokio::join!(self.fetch_home_page(), self.fetch_footer_content());
        let mut doc = home?;
        doc.sections.footer = match footer {
            Ok(footer) => footer,
            Err(err) => {
                warn!(%err, "cms: footer unavailable for home page");
                None
            }
        };
        Ok(doc)
    }
}
