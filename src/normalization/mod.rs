pub mod alias;
pub mod entries;

pub use entries::{Banner, ContactInfo, Footer, FromEntry, Product, Review, Service};
