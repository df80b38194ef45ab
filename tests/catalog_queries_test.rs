mod common;

use std::collections::BTreeSet;

use common::{TestApp, PNG_BYTES};
use rust_decimal_macros::dec;
use stateset_storefront::{
    entities::ProductCategory,
    queries::{ListParams, PageRequest, ProductFilter, ProductQuery, ProductSubset, SortKey, PAGE_SIZE},
};

fn ids(items: &[stateset_storefront::queries::ProductWithMedia]) -> Vec<i32> {
    items.iter().map(|item| item.product.id).collect()
}

#[tokio::test]
async fn archived_products_never_appear_in_default_scopes() {
    let app = TestApp::new().await;
    let admin = &app.state.services.admin;

    let kept = app
        .create_product("KEEP-1", |p| {
            p.is_featured = true;
            p.is_on_sale = true;
        })
        .await;
    let archived = app
        .create_product("GONE-1", |p| {
            p.is_featured = true;
            p.is_on_sale = true;
            p.is_new = true;
            p.is_best_seller = true;
        })
        .await;
    admin.archive_product(archived.id).await.unwrap();

    let db = app.db();
    for query in [
        ProductQuery::active(),
        ProductQuery::with_media(),
        ProductQuery::featured(),
        ProductQuery::new_arrivals(),
        ProductQuery::on_sale(),
        ProductQuery::best_sellers(),
    ] {
        let rows = query.fetch(db).await.unwrap();
        assert!(!ids(&rows).contains(&archived.id));
    }

    assert_eq!(ProductQuery::active().count(db).await.unwrap(), 1);
    assert!(ProductQuery::with_media()
        .find_by_id(db, archived.id)
        .await
        .unwrap()
        .is_none());
    assert!(ProductQuery::with_media()
        .find_by_id(db, kept.id)
        .await
        .unwrap()
        .is_some());

    // the row itself is retained
    assert!(admin.get_product(archived.id).await.unwrap().is_archived);
    assert_eq!(admin.list_all().await.unwrap().len(), 2);
}

#[tokio::test]
async fn with_media_prefetches_sorted_media_and_counts() {
    let app = TestApp::new().await;
    let admin = &app.state.services.admin;
    let product = app.create_product("MEDIA-1", |_| {}).await;

    let first = admin.attach_image(product.id, &PNG_BYTES, None, false).await.unwrap();
    let second = admin
        .attach_image(product.id, &PNG_BYTES, Some("side".into()), false)
        .await
        .unwrap();

    let rows = ProductQuery::with_media().fetch(app.db()).await.unwrap();
    let media = rows[0].media.as_loaded().expect("media prefetched");
    assert_eq!(media.primary_image().map(|i| i.id), Some(first.id));
    assert_eq!(media.counts().images, 2);

    admin.set_primary_image(second.id).await.unwrap();
    let rows = ProductQuery::with_media().fetch(app.db()).await.unwrap();
    let media = rows[0].media.as_loaded().unwrap();
    let order: Vec<i32> = media.images().iter().map(|i| i.id).collect();
    assert_eq!(order, vec![second.id, first.id]);

    let plain = ProductQuery::active().fetch(app.db()).await.unwrap();
    assert!(!plain[0].media.is_loaded());
    let counts = plain[0].media_counts(app.db()).await.unwrap();
    assert_eq!(counts.images, 2);
}

#[tokio::test]
async fn filter_composition_is_order_independent() {
    let app = TestApp::new().await;
    app.create_product("A", |p| {
        p.category = ProductCategory::Women;
        p.price = dec!(10);
    })
    .await;
    app.create_product("B", |p| {
        p.category = ProductCategory::Women;
        p.price = dec!(60);
    })
    .await;
    app.create_product("C", |p| {
        p.category = ProductCategory::Men;
        p.price = dec!(30);
    })
    .await;
    app.create_product("D", |p| {
        p.category = ProductCategory::Women;
        p.price = dec!(35);
    })
    .await;

    let category = ProductFilter {
        category: Some("women".into()),
        ..Default::default()
    };
    let db = app.db();

    let category_then_price = ProductQuery::active()
        .filter(&category)
        .price_between(Some(dec!(20)), Some(dec!(50)))
        .fetch(db)
        .await
        .unwrap();
    let price_then_category = ProductQuery::active()
        .price_between(Some(dec!(20)), Some(dec!(50)))
        .filter(&category)
        .fetch(db)
        .await
        .unwrap();

    let a: BTreeSet<i32> = ids(&category_then_price).into_iter().collect();
    let b: BTreeSet<i32> = ids(&price_then_category).into_iter().collect();
    assert_eq!(a, b);
    assert_eq!(a.len(), 1);
}

#[tokio::test]
async fn unknown_classifier_values_match_nothing() {
    let app = TestApp::new().await;
    app.create_product("X-1", |_| {}).await;

    for params in [
        ListParams {
            category: Some("spacewear".into()),
            ..Default::default()
        },
        ListParams {
            brand: Some("Nobody".into()),
            ..Default::default()
        },
        ListParams {
            gender: Some("robot".into()),
            ..Default::default()
        },
    ] {
        let filter = ProductFilter::from_params(&params);
        let rows = ProductQuery::with_media()
            .filter(&filter)
            .fetch(app.db())
            .await
            .unwrap();
        assert!(rows.is_empty());
    }
}

#[tokio::test]
async fn thirty_matches_paginate_as_twelve_twelve_six() {
    let app = TestApp::new().await;
    for n in 0..30 {
        app.create_product(&format!("PAGE-{n:02}"), |_| {}).await;
    }

    let db = app.db();
    let mut sizes = Vec::new();
    for number in 1..=3 {
        let page = ProductQuery::with_media()
            .fetch_page(db, PageRequest::Number(number), PAGE_SIZE)
            .await
            .unwrap();
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.total_items, 30);
        sizes.push(page.items.len());
    }
    assert_eq!(sizes, vec![12, 12, 6]);

    let last = ProductQuery::with_media()
        .fetch_page(db, PageRequest::Last, PAGE_SIZE)
        .await
        .unwrap();
    assert_eq!(last.number, 3);

    let err = ProductQuery::with_media()
        .fetch_page(db, PageRequest::Number(4), PAGE_SIZE)
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn zero_page_size_pages_one_row_at_a_time() {
    let app = TestApp::new().await;
    for n in 0..3 {
        app.create_product(&format!("ONE-{n}"), |_| {}).await;
    }

    let page = ProductQuery::active()
        .fetch_page(app.db(), PageRequest::Last, 0)
        .await
        .unwrap();
    assert_eq!(page.page_size, 1);
    assert_eq!(page.total_pages, 3);
    assert_eq!(page.number, 3);
    assert_eq!(page.items.len(), 1);
}

#[tokio::test]
async fn empty_listing_has_one_empty_page() {
    let app = TestApp::new().await;
    let page = ProductQuery::with_media()
        .fetch_page(app.db(), PageRequest::Number(1), PAGE_SIZE)
        .await
        .unwrap();
    assert!(page.items.is_empty());
    assert_eq!(page.total_pages, 1);
}

#[tokio::test]
async fn sort_keys_order_rows() {
    let app = TestApp::new().await;
    let cheap = app.create_product("S-1", |p| p.price = dec!(5)).await;
    let pricey = app.create_product("S-2", |p| p.price = dec!(500)).await;
    let middle = app.create_product("S-3", |p| p.price = dec!(50)).await;

    let db = app.db();
    let by_price = ProductQuery::active().sort(SortKey::PriceAsc).fetch(db).await.unwrap();
    assert_eq!(ids(&by_price), vec![cheap.id, middle.id, pricey.id]);

    let fallback = ProductQuery::active()
        .sort(SortKey::from_param(Some("stock")))
        .fetch(db)
        .await
        .unwrap();
    assert_eq!(ids(&fallback), vec![middle.id, pricey.id, cheap.id]);
}

#[tokio::test]
async fn distinct_options_cover_active_catalog_only() {
    let app = TestApp::new().await;
    app.create_product("O-1", |p| p.brand = "Zeta".into()).await;
    app.create_product("O-2", |p| p.brand = "Alpha".into()).await;
    app.create_product("O-4", |p| p.brand = "Zeta".into()).await;
    let hidden = app
        .create_product("O-3", |p| {
            p.brand = "Hidden".into();
            p.category = ProductCategory::Swimwear;
        })
        .await;
    app.state.services.admin.archive_product(hidden.id).await.unwrap();

    let scope = ProductQuery::active();
    let db = app.db();
    assert_eq!(scope.distinct_brands(db).await.unwrap(), vec!["Alpha", "Zeta"]);
    assert_eq!(
        scope.distinct_categories(db).await.unwrap(),
        vec![ProductCategory::Casual]
    );
    assert_eq!(
        scope.clone().subset(ProductSubset::Featured).count(db).await.unwrap(),
        0
    );
}
