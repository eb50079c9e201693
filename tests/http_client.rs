use multimart_content::cms::{CmsClient, CmsError, ContentApi, RequestOptions};
use multimart_content::{CmsConfig, Storefront};
use serde_json::{json, Value};
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config(server: &MockServer) -> CmsConfig {
    CmsConfig::new("blt-key", "cs-token")
        .with_base_url(server.uri())
        .with_branch(Some("develop".to_string()))
}

#[tokio::test]
async fn credentials_and_branch_are_attached() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/content_types/product/entries"))
        .and(header("api_key", "blt-key"))
        .and(header("authorization", "cs-token"))
        .and(header("content-type", "application/json"))
        .and(query_param("branch", "develop"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "entries": [{"uid": "p1", "title": "Park Sofa", "price": "120.5"}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let store = Storefront::connect(&config(&server)).unwrap();
    let products = store.fetch_products().await.unwrap();
    assert_eq!(products.len(), 1);
    assert_eq!(products[0].product_name, "Park Sofa");
    assert_eq!(products[0].price, 120.5);
}

#[tokio::test]
async fn caller_headers_override_defaults() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/content_types/banner/entries"))
        .and(header("authorization", "override"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"entries": []})))
        .expect(1)
        .mount(&server)
        .await;

    let client = CmsClient::new(&config(&server)).unwrap();
    let body = client
        .request(
            "/content_types/banner/entries",
            RequestOptions::get().header("authorization", "override"),
        )
        .await
        .unwrap();
    assert_eq!(body, json!({"entries": []}));
}

#[tokio::test]
async fn search_query_reaches_the_server() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/content_types/product/entries"))
        .and(query_param("query", r#"{"category":"sofa"}"#))
        .and(query_param("limit", "100"))
        .and(query_param("branch", "develop"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "entries": [{"uid": "p1", "category": "sofa"}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let store = Storefront::connect(&config(&server)).unwrap();
    let out = store.fetch_products_by_category("sofa").await.unwrap();
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].category, "sofa");
}

#[tokio::test]
async fn error_body_message_is_surfaced() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(422)
                .set_body_json(json!({"error_message": "Invalid query", "error_code": 141})),
        )
        .mount(&server)
        .await;

    let client = CmsClient::new(&config(&server)).unwrap();
    let err = client
        .request("/content_types/product/entries", RequestOptions::get())
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(422));
    assert_eq!(err.to_string(), "Invalid query");
}

#[tokio::test]
async fn opaque_error_body_uses_status_line() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream exploded"))
        .mount(&server)
        .await;

    let client = CmsClient::new(&config(&server)).unwrap();
    let err = client
        .request("/content_types/product/entries", RequestOptions::get())
        .await
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "Contentstack API error: 500 Internal Server Error"
    );
}

#[tokio::test]
async fn empty_success_body_is_null() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let client = CmsClient::new(&config(&server)).unwrap();
    let body = client
        .request("/content_types/footer/entries", RequestOptions::get())
        .await
        .unwrap();
    assert_eq!(body, Value::Null);
}

#[tokio::test]
async fn missing_credentials_never_hit_the_network() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let cfg = CmsConfig::new("blt-key", "  ").with_base_url(server.uri());
    let err = Storefront::connect(&cfg).unwrap_err();
    assert!(matches!(err, CmsError::Configuration(_)));
    assert_eq!(
        err.to_string(),
        "configuration error: Contentstack management/delivery token required"
    );
}

#[tokio::test]
async fn missing_home_entry_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/content_types/home/entries/home-uid"))
        .respond_with(
            ResponseTemplate::new(404)
                .set_body_json(json!({"error_message": "The requested object doesn't exist."})),
        )
        .mount(&server)
        .await;

    let store = Storefront::connect(&config(&server).with_home_entry_uid("home-uid")).unwrap();
    let err = store.fetch_home_page().await.unwrap_err();
    assert!(matches!(
        err,
        CmsError::NotFound { ref content_type, ref uid } if content_type == "home" && uid == "home-uid"
    ));
}

#[tokio::test]
async fn single_product_is_unwrapped_from_entry() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/content_types/product/entries/p7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "entry": {
                "uid": "p7",
                "product_name": "Wingback Chair",
                "product_image": {"url": "https://images.example/p7.png"},
                "reviews": [{"rating": 4, "text": "Comfy"}, "Solid build"],
                "average_rating": 9,
            }
        })))
        .mount(&server)
        .await;

    let store = Storefront::connect(&config(&server)).unwrap();
    let product = store.fetch_product_by_id("p7").await.unwrap();
    assert_eq!(product.img_url, "https://images.example/p7.png");
    assert_eq!(product.reviews.len(), 2);
    assert_eq!(product.reviews[1].text, "Solid build");
    assert_eq!(product.avg_rating, 5.0);
}

#[tokio::test]
async fn notification_entry_is_posted() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/content_types/notify_user/entries"))
        .and(query_param("form_uid", "notify_user"))
        .and(body_partial_json(json!({
            "entry": {"email_id": "shopper@example.com", "company_name": "Multimart LTD"}
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "notice": "Entry created successfully."
        })))
        .expect(1)
        .mount(&server)
        .await;

    let store = Storefront::connect(&config(&server)).unwrap();
    let order =
        multimart_content::OrderRequest::new("shopper@example.com", 42.0).unwrap();
    let receipt = store.place_order(order, &Default::default());
    assert!(receipt.notification.outcome().await.is_delivered());
}
