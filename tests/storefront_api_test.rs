mod common;

use axum::http::StatusCode;
use common::{json_ids, TestApp, PNG_BYTES};
use rstest::rstest;
use rust_decimal_macros::dec;
use stateset_storefront::entities::{Color, Gender, ProductCategory, Size};

#[tokio::test]
async fn home_sections_and_counts() {
    let app = TestApp::new().await;
    for n in 0..8 {
        app.create_product(&format!("F-{n}"), |p| p.is_featured = true).await;
    }
    let low = app
        .create_product("BS-LOW", |p| {
            p.is_best_seller = true;
            p.review_count = 3;
        })
        .await;
    let high = app
        .create_product("BS-HIGH", |p| {
            p.is_best_seller = true;
            p.review_count = 300;
        })
        .await;
    let small = app
        .create_product("SALE-10", |p| {
            p.is_on_sale = true;
            p.discount = dec!(10);
        })
        .await;
    let big = app
        .create_product("SALE-40", |p| {
            p.is_on_sale = true;
            p.is_new = true;
            p.discount = dec!(40);
        })
        .await;

    let (status, body) = app.get("/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["featured_products"].as_array().unwrap().len(), 6);
    assert_eq!(json_ids(&body["best_sellers"]), vec![high.id as i64, low.id as i64]);
    assert_eq!(json_ids(&body["on_sale"]), vec![big.id as i64, small.id as i64]);
    assert_eq!(json_ids(&body["new_arrivals"]), vec![big.id as i64]);
    assert_eq!(body["total_products"], 12);
    assert_eq!(body["featured_count"], 8);
    assert_eq!(body["new_arrivals_count"], 1);
    assert_eq!(body["on_sale_count"], 2);
}

#[tokio::test]
async fn listing_paginates_and_echoes_filters() {
    let app = TestApp::new().await;
    for n in 0..30 {
        app.create_product(&format!("L-{n:02}"), |p| {
            p.category = ProductCategory::Women;
            p.gender = Gender::Female;
            p.brand = "Acme".into();
        })
        .await;
    }
    app.create_product("OTHER", |p| p.category = ProductCategory::Men).await;

    let base = "/products/?category=women&brand=Acme&min_price=oops&sort=-price";
    let mut sizes = Vec::new();
    for page in 1..=3 {
        let (status, body) = app.get(&format!("{base}&page={page}")).await;
        assert_eq!(status, StatusCode::OK);
        sizes.push(body["products"].as_array().unwrap().len());
        assert_eq!(body["page"]["total_items"], 30);
        assert_eq!(body["current_category"], "women");
        assert_eq!(body["current_brand"], "Acme");
        assert_eq!(body["current_min_price"], "oops");
        assert_eq!(body["current_sort"], "-price");
    }
    assert_eq!(sizes, vec![12, 12, 6]);

    let (_, body) = app.get(&format!("{base}&page=last")).await;
    assert_eq!(body["page"]["number"], 3);
    assert_eq!(body["page"]["has_next"], false);
    assert_eq!(body["page"]["has_previous"], true);

    let options = &body["filter_options"];
    assert_eq!(options["brands"], serde_json::json!(["Acme"]));
    let categories: Vec<&str> = options["categories"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|c| c["value"].as_str())
        .collect();
    assert_eq!(categories, vec!["men", "women"]);
    assert_eq!(options["sort_options"].as_array().unwrap().len(), 10);
}

#[rstest]
#[case("4")]
#[case("0")]
#[case("abc")]
#[case("-1")]
#[tokio::test]
async fn invalid_pages_are_not_found(#[case] page: &str) {
    let app = TestApp::new().await;
    for n in 0..13 {
        app.create_product(&format!("P-{n}"), |_| {}).await;
    }
    let (status, body) = app.get(&format!("/products/?page={page}")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Not Found");
}

#[tokio::test]
async fn unknown_sort_and_empty_filters_fall_back_silently() {
    let app = TestApp::new().await;
    let older = app.create_product("OLD", |_| {}).await;
    let newer = app.create_product("NEW", |_| {}).await;

    let (status, body) = app
        .get("/products/?sort=stock&category=&brand=&featured=")
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["current_sort"], "-created_at");
    assert_eq!(body["featured"], false);
    assert_eq!(
        json_ids(&body["products"]),
        vec![newer.id as i64, older.id as i64]
    );
}

#[tokio::test]
async fn empty_filter_result_is_an_empty_page() {
    let app = TestApp::new().await;
    app.create_product("ONLY", |_| {}).await;

    let (status, body) = app.get("/products/?gender=robot").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["products"].as_array().unwrap().is_empty());
    assert_eq!(body["page"]["total_pages"], 1);
}

#[tokio::test]
async fn detail_includes_media_and_related_products() {
    let app = TestApp::new().await;
    let admin = &app.state.services.admin;
    let product = app
        .create_product("DETAIL", |p| {
            p.category = ProductCategory::Footwear;
            p.available_sizes = vec![Size::Large, Size::Small, Size::Large];
            p.available_colors = vec![Color::Black];
            p.tags = vec!["running".into()];
        })
        .await;
    let mut related = Vec::new();
    for n in 0..5 {
        related.push(
            app.create_product(&format!("REL-{n}"), |p| p.category = ProductCategory::Footwear)
                .await,
        );
    }
    app.create_product("UNRELATED", |p| p.category = ProductCategory::Formal)
        .await;

    let first = admin.attach_image(product.id, &PNG_BYTES, None, false).await.unwrap();
    admin.attach_image(product.id, &PNG_BYTES, None, false).await.unwrap();

    let (status, body) = app.get(&format!("/products/{}/", product.id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["product"]["id"], product.id);
    assert_eq!(body["category_label"], "Footwear");
    assert_eq!(body["sizes"], serde_json::json!(["L", "S"]));
    assert_eq!(body["primary_image"]["id"], first.id);
    assert_eq!(body["image_count"], 2);
    assert_eq!(body["has_multiple_images"], true);
    assert_eq!(body["has_videos"], false);
    assert!(body["primary_video"].is_null());

    let related_ids = json_ids(&body["related_products"]);
    assert_eq!(related_ids.len(), 4);
    assert!(!related_ids.contains(&(product.id as i64)));
    // newest first
    assert_eq!(related_ids[0], related[4].id as i64);
}

#[rstest]
#[case("/products/999999/")]
#[case("/products/abc/")]
#[tokio::test]
async fn missing_product_is_not_found(#[case] uri: &str) {
    let app = TestApp::new().await;
    let (status, body) = app.get(uri).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["message"].as_str().unwrap().contains("not found"));
}

#[tokio::test]
async fn archived_product_detail_is_not_found() {
    let app = TestApp::new().await;
    let product = app.create_product("ARCH", |_| {}).await;
    app.state.services.admin.archive_product(product.id).await.unwrap();

    let (status, _) = app.get(&format!("/products/{}/", product.id)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    app.state.services.admin.unarchive_product(product.id).await.unwrap();
    let (status, _) = app.get(&format!("/products/{}/", product.id)).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn about_counts_active_catalog() {
    let app = TestApp::new().await;
    app.create_product("AB-1", |p| {
        p.category = ProductCategory::Kids;
        p.is_featured = true;
    })
    .await;
    app.create_product("AB-2", |p| p.category = ProductCategory::Men).await;
    let gone = app
        .create_product("AB-3", |p| p.category = ProductCategory::Ethnic)
        .await;
    app.state.services.admin.archive_product(gone.id).await.unwrap();

    let (status, body) = app.get("/about/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_products"], 2);
    assert_eq!(body["total_categories"], 2);
    assert_eq!(body["featured_products_count"], 1);
}

#[tokio::test]
async fn responses_carry_request_ids() {
    let app = TestApp::new().await;
    let (status, headers, body) = app.get_with_headers("/products/424242/").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let header = headers
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .expect("request id header");
    assert_eq!(body["request_id"], header);
}

#[tokio::test]
async fn health_endpoints_respond() {
    let app = TestApp::new().await;
    let (status, body) = app.get("/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "up");

    let (status, body) = app.get("/health/ready").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ready"], true);
    assert_eq!(body["database"], "up");
}
