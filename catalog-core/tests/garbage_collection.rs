//! Attribute-pool cleanup when variant sets are removed

use catalog_core::{CatalogError, CatalogService, DbService};
use rust_decimal::Decimal;
use shared::models::{AttributeDeclaration, AttributeWithValues, ProductDraft, VariantDeclaration};

async fn service() -> CatalogService {
    CatalogService::new(DbService::in_memory().await.unwrap())
}

/// Product with one variant per listed value of a single attribute
async fn product_with(svc: &CatalogService, name: &str, attribute: &str, values: &[&str]) -> (i64, Vec<i64>) {
    let variants: Vec<VariantDeclaration> = values
        .iter()
        .map(|v| VariantDeclaration::new(Decimal::new(1250, 2), 10).with_attribute(attribute, *v))
        .collect();
    let created = svc
        .create_composite(
            &ProductDraft::new(name),
            &[AttributeDeclaration::new(attribute, values.iter().copied())],
            &variants,
        )
        .await
        .unwrap();
    (
        created.product.id,
        created.variants.iter().map(|v| v.id).collect(),
    )
}

fn find<'a>(pool: &'a [AttributeWithValues], name: &str) -> Option<&'a AttributeWithValues> {
    pool.iter().find(|a| a.attribute.name == name)
}

fn value_names(attr: &AttributeWithValues) -> Vec<&str> {
    attr.values.iter().map(|v| v.value.as_str()).collect()
}

#[tokio::test]
async fn test_attribute_shared_with_other_product_survives() {
    let svc = service().await;
    let (_, shirt_variants) = product_with(&svc, "Shirt", "Color", &["Red"]).await;
    product_with(&svc, "Jacket", "Color", &["Red"]).await;

    let report = svc.delete_variant(shirt_variants[0]).await.unwrap();
    assert_eq!(report.removed_attributes, 0);

    let pool = svc.attribute_pool().await.unwrap();
    let color = find(&pool, "Color").expect("Color must survive");
    assert_eq!(value_names(color), ["Red"]);
}

#[tokio::test]
async fn test_different_value_under_same_attribute_keeps_it_alive() {
    let svc = service().await;
    let (shirt, _) = product_with(&svc, "Shirt", "Color", &["Red"]).await;
    product_with(&svc, "Jacket", "Color", &["Black"]).await;

    svc.delete_variant_set(shirt).await.unwrap();

    // Red is referenced by nobody now, but Color is, so both stay
    let pool = svc.attribute_pool().await.unwrap();
    let color = find(&pool, "Color").expect("Color must survive");
    assert_eq!(value_names(color), ["Black", "Red"]);
}

#[tokio::test]
async fn test_exclusive_attribute_is_removed_entirely() {
    let svc = service().await;
    let (_, widget_variants) = product_with(&svc, "Widget", "Voltage", &["110V"]).await;

    let report = svc.delete_variant(widget_variants[0]).await.unwrap();
    assert_eq!(report.removed_variants, 1);
    assert_eq!(report.removed_attributes, 1);
    assert_eq!(report.removed_values, 1);

    let pool = svc.attribute_pool().await.unwrap();
    assert!(find(&pool, "Voltage").is_none());
    assert!(pool.iter().all(|a| a.values.iter().all(|v| v.value != "110V")));
}

#[tokio::test]
async fn test_sibling_value_dangles_after_removal() {
    let svc = service().await;
    let (mug, _) = product_with(&svc, "Mug", "Color", &["Red", "Blue"]).await;
    product_with(&svc, "Plate", "Color", &["Red"]).await;

    let report = svc.delete_variant_set(mug).await.unwrap();
    assert_eq!(report.removed_variants, 2);
    assert_eq!(report.removed_attributes, 0);
    assert_eq!(report.removed_values, 0);

    // Blue is left in the pool with no variant referencing it. This is the
    // attribute-granularity rule at work, not an accident.
    let pool = svc.attribute_pool().await.unwrap();
    let color = find(&pool, "Color").expect("Color must survive");
    assert_eq!(value_names(color), ["Blue", "Red"]);

    let blue = color.values.iter().find(|v| v.value == "Blue").unwrap();
    let refs: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM variant_attribute_values WHERE attribute_value_id = ?",
    )
    .bind(blue.id)
    .fetch_one(&svc.db().pool)
    .await
    .unwrap();
    assert_eq!(refs, 0);
}

#[tokio::test]
async fn test_dangling_value_goes_with_its_attribute() {
    let svc = service().await;
    let (mug, _) = product_with(&svc, "Mug", "Color", &["Red", "Blue"]).await;
    let (plate, _) = product_with(&svc, "Plate", "Color", &["Red"]).await;

    svc.delete_variant_set(mug).await.unwrap();
    let report = svc.delete_variant_set(plate).await.unwrap();

    // The last user of Color takes the dangling Blue with it
    assert_eq!(report.removed_attributes, 1);
    assert_eq!(report.removed_values, 2);
    assert!(svc.attribute_pool().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_empty_replace_leaves_former_variants_not_found() {
    let svc = service().await;
    let (shirt, variants) = product_with(&svc, "Shirt", "Size", &["S", "M", "L"]).await;

    let replacement = svc.replace_variant_set(shirt, &[], &[]).await.unwrap();
    assert!(replacement.variants.is_empty());
    assert_eq!(replacement.report.removed_variants, 3);

    for id in variants {
        let err = svc.load_attributes_of(id).await.unwrap_err();
        assert!(matches!(err, CatalogError::NotFound { entity: "Variant", .. }));
    }
    assert!(svc.list_variants(shirt).await.unwrap().is_empty());
    // The product itself is untouched
    assert_eq!(svc.get_product(shirt).await.unwrap().product.name, "Shirt");
}

#[tokio::test]
async fn test_delete_product_collects_pool() {
    let svc = service().await;
    let (widget, _) = product_with(&svc, "Widget", "Voltage", &["110V", "220V"]).await;
    product_with(&svc, "Lamp", "Color", &["White"]).await;

    let report = svc.delete_product(widget).await.unwrap();
    assert_eq!(report.removed_variants, 2);
    assert_eq!(report.removed_attributes, 1);

    let err = svc.get_product(widget).await.unwrap_err();
    assert!(matches!(err, CatalogError::NotFound { entity: "Product", .. }));

    let pool = svc.attribute_pool().await.unwrap();
    assert_eq!(pool.len(), 1);
    assert_eq!(pool[0].attribute.name, "Color");

    let err = svc.delete_product(widget).await.unwrap_err();
    assert!(matches!(err, CatalogError::NotFound { .. }));
}
