//! Canonical storefront shapes and the transformers that build them from raw
//! CMS entries.
//!
//! Every transformer tolerates any subset of fields being missing. An entry
//! without `uid` and `id` is not transformable and yields `None`; the footer
//! has no identity and only rejects non-object input.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::alias::{value_as_f64, value_as_text, FieldRule};

pub const DEFAULT_SERVICE_BG: &str = "#fdefe6";
pub const DEFAULT_FOOTER_LOGO: &str = "Multimart";

const ID: FieldRule<&str> = FieldRule::new(&[&["uid"], &["id"]], "");

/// Implemented by every canonical shape that can be built from a raw entry.
pub trait FromEntry: Sized {
    /// Content type UID the shape is normally fetched from.
    const CONTENT_TYPE: &'static str;

    fn from_entry(entry: &Value) -> Option<Self>;
}

fn entry_id(entry: &Value) -> Option<String> {
    if !entry.is_object() {
        return None;
    }
    Some(ID.text(entry)).filter(|id| !id.is_empty())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    pub rating: f64,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,
    pub product_name: String,
    pub img_url: String,
    pub category: String,
    pub price: f64,
    pub discount: f64,
    pub short_desc: String,
    pub description: String,
    pub reviews: Vec<Review>,
    pub avg_rating: f64,
}

mod product_rules {
    use super::FieldRule;

    pub const NAME: FieldRule<&str> =
        FieldRule::new(&[&["product_name"], &["title"], &["name"]], "");
    pub const IMAGE: FieldRule<&str> =
        FieldRule::new(&[&["product_image", "url"], &["image", "url"], &["imgUrl"]], "");
    pub const CATEGORY: FieldRule<&str> =
        FieldRule::new(&[&["category"], &["product_category"]], "");
    pub const PRICE: FieldRule<f64> = FieldRule::new(&[&["price"]], 0.0);
    pub const DISCOUNT: FieldRule<f64> = FieldRule::new(&[&["discount"]], 0.0);
    pub const SHORT_DESC: FieldRule<&str> = FieldRule::new(
        &[&["short_description"], &["description"], &["shortDesc"]],
        "",
    );
    pub const DESCRIPTION: FieldRule<&str> =
        FieldRule::new(&[&["full_description"], &["description"]], "");
    pub const AVG_RATING: FieldRule<f64> =
        FieldRule::new(&[&["average_rating"], &["avgRating"]], 0.0);
}

impl FromEntry for Product {
    const CONTENT_TYPE: &'static str = "product";

    fn from_entry(entry: &Value) -> Option<Self> {
        use product_rules::*;
        let id = entry_id(entry)?;
        Some(Product {
            id,
            product_name: NAME.text(entry),
            img_url: IMAGE.text(entry),
            category: CATEGORY.text(entry),
            price: non_negative(PRICE.number(entry)),
            discount: non_negative(DISCOUNT.number(entry)),
            short_desc: SHORT_DESC.text(entry),
            description: DESCRIPTION.text(entry),
            reviews: reviews(entry.get("reviews")),
            avg_rating: AVG_RATING.number(entry).clamp(0.0, 5.0),
        })
    }
}

fn non_negative(n: f64) -> f64 {
    if n > 0.0 {
        n
    } else {
        0.0
    }
}

fn reviews(raw: Option<&Value>) -> Vec<Review> {
    let Some(items) = raw.and_then(Value::as_array) else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(|item| match item {
            Value::Object(_) => Some(Review {
                rating: item
                    .get("rating")
                    .and_then(value_as_f64)
                    .unwrap_or(0.0)
                    .clamp(0.0, 5.0),
                text: item.get("text").and_then(value_as_text).unwrap_or_default(),
            }),
            Value::String(s) => Some(Review {
                rating: 0.0,
                text: s.clone(),
            }),
            _ => None,
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Banner {
    pub id: String,
    pub title: String,
    pub desc: String,
    pub cover: String,
}

impl FromEntry for Banner {
    const CONTENT_TYPE: &'static str = "banner";

    fn from_entry(entry: &Value) -> Option<Self> {
        const TITLE: FieldRule<&str> = FieldRule::new(&[&["title"], &["banner_title"]], "");
        const DESC: FieldRule<&str> = FieldRule::new(
            &[&["description"], &["banner_description"], &["desc"]],
            "",
        );
        const COVER: FieldRule<&str> =
            FieldRule::new(&[&["banner_image", "url"], &["image", "url"], &["cover"]], "");

        Some(Banner {
            id: entry_id(entry)?,
            title: TITLE.text(entry),
            desc: DESC.text(entry),
            cover: COVER.text(entry),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Service {
    pub id: String,
    pub icon: String,
    pub title: String,
    pub subtitle: String,
    pub bg: String,
}

impl FromEntry for Service {
    const CONTENT_TYPE: &'static str = "service";

    fn from_entry(entry: &Value) -> Option<Self> {
        const ICON: FieldRule<&str> = FieldRule::new(&[&["icon_name"], &["icon"]], "");
        const TITLE: FieldRule<&str> = FieldRule::new(&[&["title"], &["service_title"]], "");
        const SUBTITLE: FieldRule<&str> =
            FieldRule::new(&[&["subtitle"], &["description"]], "");
        const BG: FieldRule<&str> =
            FieldRule::new(&[&["background_color"], &["bg"]], DEFAULT_SERVICE_BG);

        Some(Service {
            id: entry_id(entry)?,
            icon: ICON.text(entry),
            title: TITLE.text(entry),
            subtitle: SUBTITLE.text(entry),
            bg: BG.text(entry),
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContactInfo {
    pub address: String,
    pub email: String,
    pub phone: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Footer {
    pub logo: String,
    pub description: String,
    pub about_us: Vec<String>,
    pub customer_care: Vec<String>,
    pub contact_info: ContactInfo,
}

impl Footer {
    /// Static footer shown when the CMS cannot be reached.
    pub fn fallback() -> Self {
        Footer {
            logo: DEFAULT_FOOTER_LOGO.to_string(),
            description: "Lorem ipsum dolor sit amet, consectetur adipiscing elit. Auctor libero id et, in gravida. Sit diam duis mauris nulla cursus. Erat et lectus vel ut sollicitudin elit at amet.".to_string(),
            about_us: [
                "Careers",
                "Our Stores",
                "Our Cares",
                "Terms & Conditions",
                "Privacy Policy",
            ]
            .map(String::from)
            .to_vec(),
            customer_care: [
                "Help Center",
                "How to Buy",
                "Track Your Order",
                "Corporate & Bulk Purchasing",
                "Returns & Refunds",
            ]
            .map(String::from)
            .to_vec(),
            contact_info: ContactInfo {
                address: "70 Washington Square South, New York, NY 10012, United States"
                    .to_string(),
                email: "uilib.help@gmail.com".to_string(),
                phone: "+1 1123 456 780".to_string(),
            },
        }
    }
}

impl FromEntry for Footer {
    const CONTENT_TYPE: &'static str = "footer";

    fn from_entry(entry: &Value) -> Option<Self> {
        const LOGO: FieldRule<&str> = FieldRule::new(&[&["logo"]], DEFAULT_FOOTER_LOGO);
        const DESCRIPTION: FieldRule<&str> =
            FieldRule::new(&[&["description"], &["footer_description"]], "");
        const ABOUT_US: FieldRule<()> = FieldRule::new(&[&["about_us"], &["aboutUs"]], ());
        const CUSTOMER_CARE: FieldRule<()> =
            FieldRule::new(&[&["customer_care"], &["customerCare"]], ());
        const ADDRESS: FieldRule<&str> = FieldRule::new(&[&["address"], &["contact_address"]], "");
        const EMAIL: FieldRule<&str> = FieldRule::new(&[&["email"], &["contact_email"]], "");
        const PHONE: FieldRule<&str> = FieldRule::new(&[&["phone"], &["contact_phone"]], "");

        if !entry.is_object() {
            return None;
        }
        Some(Footer {
            logo: LOGO.text(entry),
            description: DESCRIPTION.text(entry),
            about_us: ABOUT_US.string_list(entry),
            customer_care: CUSTOMER_CARE.string_list(entry),
            contact_info: ContactInfo {
                address: ADDRESS.text(entry),
                email: EMAIL.text(entry),
                phone: PHONE.text(entry),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    /// Canonical -> raw, using the CMS (first-alias) field names.
    fn product_to_raw(p: &Product) -> Value {
        json!({
            "uid": p.id,
            "product_name": p.product_name,
            "product_image": {"url": p.img_url},
            "category": p.category,
            "price": p.price,
            "discount": p.discount,
            "short_description": p.short_desc,
            "full_description": p.description,
            "reviews": p.reviews,
            "average_rating": p.avg_rating,
        })
    }

    fn sample_product() -> Product {
        Product {
            id: "blt01".into(),
            product_name: "Park Sofa".into(),
            img_url: "https://images.example/sofa.png".into(),
            category: "sofa".into(),
            price: 193.0,
            discount: 30.0,
            short_desc: "Soft and wide".into(),
            description: "A long description of the park sofa".into(),
            reviews: vec![Review {
                rating: 4.7,
                text: "Comfy".into(),
            }],
            avg_rating: 4.7,
        }
    }

    #[test]
    fn null_and_non_object_entries_yield_none() {
        assert!(Product::from_entry(&Value::Null).is_none());
        assert!(Banner::from_entry(&json!("blt1")).is_none());
        assert!(Service::from_entry(&json!([])).is_none());
        assert!(Footer::from_entry(&Value::Null).is_none());
    }

    #[test]
    fn missing_identifier_yields_none() {
        assert!(Product::from_entry(&json!({"title": "x"})).is_none());
        assert!(Banner::from_entry(&json!({"uid": "", "id": null})).is_none());
    }

    #[test]
    fn bare_entries_are_fully_defaulted() {
        let p = Product::from_entry(&json!({"uid": "p1"})).unwrap();
        assert_eq!(p.product_name, "");
        assert_eq!(p.price, 0.0);
        assert_eq!(p.discount, 0.0);
        assert_eq!(p.avg_rating, 0.0);
        assert!(p.reviews.is_empty());

        let s = Service::from_entry(&json!({"id": 9})).unwrap();
        assert_eq!(s.id, "9");
        assert_eq!(s.bg, DEFAULT_SERVICE_BG);

        let f = Footer::from_entry(&json!({})).unwrap();
        assert_eq!(f.logo, DEFAULT_FOOTER_LOGO);
        assert!(f.about_us.is_empty());
        assert!(f.customer_care.is_empty());
        assert_eq!(f.contact_info, ContactInfo::default());
    }

    #[test]
    fn product_round_trips_through_cms_aliases() {
        let p = sample_product();
        assert_eq!(Product::from_entry(&product_to_raw(&p)).unwrap(), p);
    }

    #[test]
    fn product_uses_legacy_aliases() {
        let raw = json!({
            "id": "legacy-7",
            "name": "Stool",
            "imgUrl": "/img/stool.jpg",
            "product_category": "chair",
            "description": "short and full",
            "avgRating": 3,
        });
        let p = Product::from_entry(&raw).unwrap();
        assert_eq!(p.id, "legacy-7");
        assert_eq!(p.product_name, "Stool");
        assert_eq!(p.img_url, "/img/stool.jpg");
        assert_eq!(p.category, "chair");
        assert_eq!(p.short_desc, "short and full");
        assert_eq!(p.description, "short and full");
        assert_eq!(p.avg_rating, 3.0);
    }

    #[test]
    fn product_numbers_are_sanitized() {
        let raw = json!({"uid": "p", "price": "abc", "discount": -5, "average_rating": 9});
        let p = Product::from_entry(&raw).unwrap();
        assert_eq!(p.price, 0.0);
        assert_eq!(p.discount, 0.0);
        assert_eq!(p.avg_rating, 5.0);
    }

    #[test]
    fn banner_prefers_cms_fields() {
        let raw = json!({
            "uid": "b1",
            "banner_title": "legacy",
            "title": "50% Off For Your First Shopping",
            "banner_description": "desc",
            "image": {"url": "https://img/fallback"},
            "banner_image": {"url": "https://img/banner"},
        });
        assert_eq!(
            Banner::from_entry(&raw).unwrap(),
            Banner {
                id: "b1".into(),
                title: "50% Off For Your First Shopping".into(),
                desc: "desc".into(),
                cover: "https://img/banner".into(),
            }
        );
    }

    #[test]
    fn service_uses_background_color() {
        let raw = json!({
            "uid": "s1",
            "icon_name": "fa-solid fa-car-side",
            "service_title": "Free Shipping",
            "description": "Lorem ipsum",
            "background_color": "#d6e5fb",
        });
        let s = Service::from_entry(&raw).unwrap();
        assert_eq!(s.icon, "fa-solid fa-car-side");
        assert_eq!(s.title, "Free Shipping");
        assert_eq!(s.subtitle, "Lorem ipsum");
        assert_eq!(s.bg, "#d6e5fb");
    }

    #[test]
    fn footer_decodes_string_and_native_lists() {
        let raw = json!({
            "logo": "Shop",
            "footer_description": "About the shop",
            "about_us": r#"["Careers","Our Stores"]"#,
            "customerCare": ["Help Center"],
            "contact_email": "hello@example.com",
            "phone": "+1 555",
        });
        let f = Footer::from_entry(&raw).unwrap();
        assert_eq!(f.logo, "Shop");
        assert_eq!(f.description, "About the shop");
        assert_eq!(f.about_us, vec!["Careers", "Our Stores"]);
        assert_eq!(f.customer_care, vec!["Help Center"]);
        assert_eq!(f.contact_info.email, "hello@example.com");
        assert_eq!(f.contact_info.phone, "+1 555");
        assert_eq!(f.contact_info.address, "");
    }

    #[test]
    fn footer_invalid_list_string_becomes_empty() {
        let f = Footer::from_entry(&json!({"about_us": "Careers, Stores"})).unwrap();
        assert!(f.about_us.is_empty());
    }

    #[test]
    fn footer_invalid_list_does_not_fall_back_to_legacy_alias() {
        let raw = json!({
            "about_us": "Careers, Stores",
            "aboutUs": ["Legacy"],
            "customer_care": 12,
            "customerCare": ["Legacy"],
        });
        let f = Footer::from_entry(&raw).unwrap();
        assert!(f.about_us.is_empty());
        assert!(f.customer_care.is_empty());
    }

    #[test]
    fn banner_round_trips_through_cms_aliases() {
        let b = Banner {
            id: "blt-banner".into(),
            title: "50% Off For Your First Shopping".into(),
            desc: "Lorem ipsum dolor sit amet".into(),
            cover: "https://images.example/hero.jpg".into(),
        };
        let raw = json!({
            "uid": b.id,
            "title": b.title,
            "description": b.desc,
            "banner_image": {"url": b.cover},
        });
        assert_eq!(Banner::from_entry(&raw).unwrap(), b);
    }

    #[test]
    fn service_round_trips_through_cms_aliases() {
        let s = Service {
            id: "blt-service".into(),
            icon: "ri-truck-line".into(),
            title: "Free Shipping".into(),
            subtitle: "On orders over $50".into(),
            bg: "#ceebe9".into(),
        };
        let raw = json!({
            "uid": s.id,
            "icon_name": s.icon,
            "title": s.title,
            "subtitle": s.subtitle,
            "background_color": s.bg,
        });
        assert_eq!(Service::from_entry(&raw).unwrap(), s);
    }

    #[test]
    fn footer_round_trips_with_native_and_encoded_lists() {
        let f = Footer::fallback();
        let native = json!({
            "logo": f.logo,
            "description": f.description,
            "about_us": f.about_us,
            "customer_care": f.customer_care,
            "address": f.contact_info.address,
            "email": f.contact_info.email,
            "phone": f.contact_info.phone,
        });
        assert_eq!(Footer::from_entry(&native).unwrap(), f);

        let mut encoded = native.clone();
        encoded["about_us"] = Value::String(serde_json::to_string(&f.about_us).unwrap());
        encoded["customer_care"] = Value::String(serde_json::to_string(&f.customer_care).unwrap());
        assert_eq!(Footer::from_entry(&encoded).unwrap(), f);
    }

    #[test]
    fn serializes_with_view_model_field_names() {
        let v = serde_json::to_value(sample_product()).unwrap();
        assert!(v.get("productName").is_some());
        assert!(v.get("imgUrl").is_some());
        assert!(v.get("avgRating").is_some());
        let f = serde_json::to_value(Footer::fallback()).unwrap();
        assert!(f.get("aboutUs").is_some());
        assert!(f.get("contactInfo").is_some());
    }
}
