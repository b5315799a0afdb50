//! Open Food Facts client against a mocked upstream.

use std::time::Duration;

use rust_decimal_macros::dec;
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use brigade_api::entities::sea_orm_active_enums::MeasurementUnit;
use brigade_api::services::open_food_facts::OpenFoodFactsClient;

fn client(server: &MockServer) -> OpenFoodFactsClient {
    OpenFoodFactsClient::new(server.uri(), Duration::from_secs(5)).unwrap()
}

#[tokio::test]
async fn barcode_lookup_normalizes_the_product() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v2/product/3017620422003.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": 1,
            "product": {
                "code": "3017620422003",
                "product_name_fr": "Pâte à tartiner",
                "product_name": "Hazelnut spread",
                "product_quantity": 400,
                "product_quantity_unit": "g",
                "categories": "Spreads, Sweet spreads",
                "image_front_url": "https://img.example/front.jpg"
            }
        })))
        .mount(&server)
        .await;

    let product = client(&server)
        .product_by_barcode("3017620422003")
        .await
        .unwrap();

    assert_eq!(product.barcode, "3017620422003");
    assert_eq!(product.name, "Pâte à tartiner");
    assert_eq!(product.base_quantity, dec!(400));
    assert_eq!(product.unit, MeasurementUnit::Gram);
    assert_eq!(product.categories, vec!["Spreads", "Sweet spreads"]);
    assert_eq!(product.image_url, "https://img.example/front.jpg");
}

#[tokio::test]
async fn unknown_barcode_yields_none() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v2/product/0000000000000.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": 0,
            "status_verbose": "product not found"
        })))
        .mount(&server)
        .await;

    assert!(client(&server).product_by_barcode("0000000000000").await.is_none());
}

#[tokio::test]
async fn upstream_errors_degrade_to_none() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    assert!(client(&server).product_by_barcode("123").await.is_none());
}

#[tokio::test]
async fn invalid_json_degrades_to_none() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    assert!(client(&server).product_by_barcode("123").await.is_none());
}

#[tokio::test]
async fn search_passes_terms_and_pagination() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v2/search"))
        .and(query_param("search_terms", "milk"))
        .and(query_param("page", "2"))
        .and(query_param("page_size", "10"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "products": [
                { "code": "1", "product_name": "Whole milk", "quantity": "1 L" },
                { "code": "2", "product_name": "Skimmed milk" }
            ]
        })))
        .mount(&server)
        .await;

    let products = client(&server).search("milk", 2, 10).await;
    assert_eq!(products.len(), 2);
    assert_eq!(products[0].name, "Whole milk");
    assert_eq!(products[0].base_quantity, dec!(1));
    assert_eq!(products[1].base_quantity, rust_decimal::Decimal::ZERO);
}

#[tokio::test]
async fn failed_search_yields_an_empty_page() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    assert!(client(&server).search("milk", 1, 20).await.is_empty());
}
