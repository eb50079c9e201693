//! Contentstack retrieval and normalization for the Multimart storefront.
//!
//! [`cms::CmsClient`] talks to the Delivery/Management API, [`ContentService`]
//! layers the catalog, search and home page operations on top of any
//! [`ContentApi`], and [`normalization`] turns raw entries into the
//! storefront's view models.

pub mod cms;
pub mod config;
pub mod normalization;
pub mod orders;
pub mod preferences;
pub mod telemetry;

pub mod util {
    pub mod env;
    pub mod generation;
}

pub use cms::{
    CmsClient, CmsError, CmsResult, ContentApi, ContentService, HomePageDocument, HomeSections,
    Query, RequestOptions, SearchOptions, SearchResult, Sort,
};
pub use config::CmsConfig;
pub use normalization::{Banner, ContactInfo, Footer, FromEntry, Product, Review, Service};
pub use orders::{CheckoutReceipt, NotificationOutcome, NotificationProfile, OrderRequest};
pub use preferences::{LocalStorage, Preferences};
pub use util::generation::RequestGeneration;

/// Service over the live HTTP client.
pub type Storefront = ContentService<CmsClient>;

impl Storefront {
    /// Client and service from one configuration.
    pub fn connect(config: &CmsConfig) -> CmsResult<Self> {
        Ok(ContentService::new(CmsClient::new(config)?, config))
    }
}
