//! Contentstack access: transport, queries, catalog fetches and home page assembly.

pub mod catalog;
pub mod error;
pub mod home;
pub mod query;
pub mod search;
pub mod transport;

pub use catalog::ProductDetail;
pub use error::{CmsError, CmsResult};
pub use home::{BlockKind, HomePageDocument, HomeSections, PageBlock};
pub use query::{Filter, Query, SearchOptions, Sort};
pub use search::{ContentService, SearchResult};
pub use transport::{CmsClient, ContentApi, RequestOptions};
