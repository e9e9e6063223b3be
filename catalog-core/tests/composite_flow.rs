//! Product + variant authoring through `CatalogService`

use catalog_core::{CatalogError, CatalogService, Config, DbService};
use rust_decimal::Decimal;
use shared::error::{AppError, ErrorCode};
use shared::models::{AttributeDeclaration, ProductDraft, VariantDeclaration};

async fn service() -> CatalogService {
    CatalogService::new(DbService::in_memory().await.unwrap())
}

async fn count(svc: &CatalogService, table: &str) -> i64 {
    sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table}"))
        .fetch_one(&svc.db().pool)
        .await
        .unwrap()
}

fn shirt_attributes() -> Vec<AttributeDeclaration> {
    vec![
        AttributeDeclaration::new("Color", ["Red", "Blue"]),
        AttributeDeclaration::new("Size", ["M", "L"]),
    ]
}

#[tokio::test]
async fn test_create_composite_generates_skus_in_declared_order() {
    let svc = service().await;
    let created = svc
        .create_composite(
            &ProductDraft::new("Blue Shirt"),
            &shirt_attributes(),
            &[
                VariantDeclaration::new(Decimal::new(2500, 2), 4)
                    .with_attribute("Size", "L")
                    .with_attribute("Color", "Red"),
                VariantDeclaration::new(Decimal::new(2500, 2), 2)
                    .with_attribute("Color", "Blue")
                    .with_attribute("Size", "M"),
            ],
        )
        .await
        .unwrap();

    let skus: Vec<&str> = created.variants.iter().map(|v| v.sku.as_str()).collect();
    assert_eq!(skus, ["BLUE-SHIRT-L-RED", "BLUE-SHIRT-BLUE-M"]);

    let attrs = svc.load_attributes_of(created.variants[0].id).await.unwrap();
    assert_eq!(attrs.get("Size").map(String::as_str), Some("L"));
    assert_eq!(attrs.get("Color").map(String::as_str), Some("Red"));
}

#[tokio::test]
async fn test_attribute_names_are_pooled_ignoring_case() {
    let svc = service().await;
    svc.create_composite(
        &ProductDraft::new("Shirt"),
        &[AttributeDeclaration::new("Color", ["Red"])],
        &[VariantDeclaration::new(Decimal::ONE, 1).with_attribute("Color", "Red")],
    )
    .await
    .unwrap();
    let jacket = svc
        .create_composite(
            &ProductDraft::new("Jacket"),
            &[AttributeDeclaration::new("COLOR", ["red"])],
            &[VariantDeclaration::new(Decimal::ONE, 1).with_attribute("color", "RED")],
        )
        .await
        .unwrap();

    let pool = svc.attribute_pool().await.unwrap();
    assert_eq!(pool.len(), 1);
    assert_eq!(pool[0].attribute.name, "Color");
    assert_eq!(pool[0].values.len(), 1);
    // Display spelling comes from the pool, not the request
    assert_eq!(
        jacket.variants[0].attributes.get("Color").map(String::as_str),
        Some("Red")
    );
}

#[tokio::test]
async fn test_colon_in_names_links_the_selected_attribute() {
    let svc = service().await;
    let created = svc
        .create_composite(
            &ProductDraft::new("Shoe"),
            &[
                AttributeDeclaration::new("Size:EU", ["42"]),
                AttributeDeclaration::new("Size", ["EU:42"]),
            ],
            &[VariantDeclaration::new(Decimal::ONE, 1).with_attribute("Size", "EU:42")],
        )
        .await
        .unwrap();

    let attrs = svc.load_attributes_of(created.variants[0].id).await.unwrap();
    assert_eq!(attrs.len(), 1);
    assert_eq!(attrs.get("Size").map(String::as_str), Some("EU:42"));

    let pool = svc.attribute_pool().await.unwrap();
    let size = pool.iter().find(|a| a.attribute.name == "Size").unwrap();
    assert_eq!(size.values.len(), 1);
    assert_eq!(size.values[0].value, "EU:42");
}

#[tokio::test]
async fn test_duplicate_derived_sku_rolls_back_product() {
    let svc = service().await;
    let err = svc
        .create_composite(
            &ProductDraft::new("Shirt"),
            &shirt_attributes(),
            &[
                VariantDeclaration::new(Decimal::new(1000, 2), 1)
                    .with_attribute("Color", "Red")
                    .with_attribute("Size", "M"),
                VariantDeclaration::new(Decimal::new(1200, 2), 1)
                    .with_attribute("Color", "Red")
                    .with_attribute("Size", "M"),
            ],
        )
        .await
        .unwrap_err();

    assert!(matches!(err, CatalogError::DuplicateSku { ref sku } if sku == "SHIRT-RED-M"));
    let app: AppError = err.into();
    assert_eq!(app.code, ErrorCode::VariantSkuExists);
    assert_eq!(app.detail_str("sku"), Some("SHIRT-RED-M"));

    assert_eq!(count(&svc, "products").await, 0);
    assert_eq!(count(&svc, "variants").await, 0);
    assert_eq!(count(&svc, "attributes").await, 0);
}

#[tokio::test]
async fn test_duplicate_sku_across_calls() {
    let svc = service().await;
    svc.create_composite(
        &ProductDraft::new("Cup"),
        &[],
        &[VariantDeclaration::new(Decimal::ONE, 1).with_sku("CUP-001")],
    )
    .await
    .unwrap();

    let err = svc
        .create_composite(
            &ProductDraft::new("Other Cup"),
            &[],
            &[VariantDeclaration::new(Decimal::ONE, 1).with_sku("cup-001")],
        )
        .await
        .unwrap_err();
    assert!(matches!(err, CatalogError::DuplicateSku { .. }));
    assert_eq!(count(&svc, "products").await, 1);
}

#[tokio::test]
async fn test_invalid_variant_reports_sku_and_field() {
    let svc = service().await;
    let err = svc
        .create_composite(
            &ProductDraft::new("Lamp"),
            &[],
            &[VariantDeclaration::new(Decimal::ONE, -1).with_sku("LAMP-1")],
        )
        .await
        .unwrap_err();

    let app: AppError = err.into();
    assert_eq!(app.code, ErrorCode::VariantInvalidStock);
    assert_eq!(app.detail_str("sku"), Some("LAMP-1"));
    assert_eq!(app.detail_str("field"), Some("stock"));
    assert_eq!(count(&svc, "products").await, 0);
}

#[tokio::test]
async fn test_undeclared_selection_is_unresolved() {
    let svc = service().await;
    let err = svc
        .create_composite(
            &ProductDraft::new("Shirt"),
            &[AttributeDeclaration::new("Color", ["Red"])],
            &[VariantDeclaration::new(Decimal::ONE, 1)
                .with_attribute("Color", "Red")
                .with_attribute("Size", "XL")],
        )
        .await
        .unwrap_err();

    let app: AppError = err.into();
    assert_eq!(app.code, ErrorCode::AttributeUnresolved);
    assert_eq!(app.detail_str("attribute"), Some("Size"));
    assert_eq!(app.detail_str("value"), Some("XL"));
    assert_eq!(count(&svc, "products").await, 0);
}

#[tokio::test]
async fn test_update_without_variants_leaves_them_untouched() {
    let svc = service().await;
    let created = svc
        .create_composite(
            &ProductDraft::new("Shirt"),
            &shirt_attributes(),
            &[
                VariantDeclaration::new(Decimal::new(1990, 2), 3)
                    .with_attribute("Color", "Red")
                    .with_attribute("Size", "M"),
                VariantDeclaration::new(Decimal::new(2190, 2), 0)
                    .with_sku("shirt-blue-l")
                    .with_attribute("Color", "Blue")
                    .with_attribute("Size", "L"),
            ],
        )
        .await
        .unwrap();

    let rows_before: Vec<(i64, String, String, i64)> =
        sqlx::query_as("SELECT id, sku, price, stock FROM variants ORDER BY id")
            .fetch_all(&svc.db().pool)
            .await
            .unwrap();
    let links_before: Vec<(i64, i64)> = sqlx::query_as(
        "SELECT variant_id, attribute_value_id FROM variant_attribute_values ORDER BY 1, 2",
    )
    .fetch_all(&svc.db().pool)
    .await
    .unwrap();

    let mut draft = ProductDraft::new("Classic Shirt");
    draft.description = Some("Cotton".into());
    let updated = svc
        .update_composite(
            created.product.id,
            &draft,
            &[AttributeDeclaration::new("Material", ["Linen"])],
            &[],
        )
        .await
        .unwrap();

    assert_eq!(updated.product.name, "Classic Shirt");
    assert_eq!(updated.product.description.as_deref(), Some("Cotton"));
    assert_eq!(updated.variants, created.variants);

    let rows_after: Vec<(i64, String, String, i64)> =
        sqlx::query_as("SELECT id, sku, price, stock FROM variants ORDER BY id")
            .fetch_all(&svc.db().pool)
            .await
            .unwrap();
    let links_after: Vec<(i64, i64)> = sqlx::query_as(
        "SELECT variant_id, attribute_value_id FROM variant_attribute_values ORDER BY 1, 2",
    )
    .fetch_all(&svc.db().pool)
    .await
    .unwrap();
    assert_eq!(rows_before, rows_after);
    assert_eq!(links_before, links_after);

    // Declarations without variants resolve nothing
    let pool = svc.attribute_pool().await.unwrap();
    assert!(pool.iter().all(|a| a.attribute.name != "Material"));
}

#[tokio::test]
async fn test_update_with_variants_replaces_the_set() {
    let svc = service().await;
    let created = svc
        .create_composite(
            &ProductDraft::new("Widget"),
            &[AttributeDeclaration::new("Voltage", ["110V"])],
            &[VariantDeclaration::new(Decimal::TEN, 5).with_attribute("Voltage", "110V")],
        )
        .await
        .unwrap();
    let old_id = created.variants[0].id;

    let updated = svc
        .update_composite(
            created.product.id,
            &ProductDraft::new("Widget"),
            &[AttributeDeclaration::new("Plug", ["EU", "UK"])],
            &[
                VariantDeclaration::new(Decimal::TEN, 1).with_attribute("Plug", "EU"),
                VariantDeclaration::new(Decimal::TEN, 1).with_attribute("Plug", "UK"),
            ],
        )
        .await
        .unwrap();

    let skus: Vec<&str> = updated.variants.iter().map(|v| v.sku.as_str()).collect();
    assert_eq!(skus, ["WIDGET-EU", "WIDGET-UK"]);
    assert!(matches!(
        svc.get_variant(old_id).await.unwrap_err(),
        CatalogError::NotFound { .. }
    ));

    let pool = svc.attribute_pool().await.unwrap();
    let names: Vec<&str> = pool.iter().map(|a| a.attribute.name.as_str()).collect();
    assert_eq!(names, ["Plug"]);
}

#[tokio::test]
async fn test_failed_replace_keeps_original_variants() {
    let svc = service().await;
    let created = svc
        .create_composite(
            &ProductDraft::new("Widget"),
            &[AttributeDeclaration::new("Voltage", ["110V"])],
            &[VariantDeclaration::new(Decimal::TEN, 5).with_attribute("Voltage", "110V")],
        )
        .await
        .unwrap();

    let err = svc
        .replace_variant_set(
            created.product.id,
            &[],
            &[
                VariantDeclaration::new(Decimal::ONE, 1).with_sku("W-1"),
                VariantDeclaration::new(Decimal::ONE, 1).with_sku("w-1"),
            ],
        )
        .await
        .unwrap_err();
    assert!(matches!(err, CatalogError::DuplicateSku { .. }));

    let after = svc.get_product(created.product.id).await.unwrap();
    assert_eq!(after.variants, created.variants);
    let pool = svc.attribute_pool().await.unwrap();
    assert_eq!(pool.len(), 1);
    assert_eq!(pool[0].attribute.name, "Voltage");
}

#[tokio::test]
async fn test_file_database_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("catalog.db");
    let config = Config::with_database_path(path.to_string_lossy().to_string());

    let product_id = {
        let svc = CatalogService::new(DbService::new(&config).await.unwrap());
        let created = svc
            .create_composite(
                &ProductDraft::new("Kettle"),
                &[AttributeDeclaration::new("Capacity", ["1.7 L"])],
                &[VariantDeclaration::new(Decimal::new(4999, 2), 7)
                    .with_attribute("Capacity", "1.7 L")],
            )
            .await
            .unwrap();
        svc.db().pool.close().await;
        created.product.id
    };

    // Migrations are re-applied idempotently on open
    let svc = CatalogService::new(DbService::new(&config).await.unwrap());
    let product = svc.get_product(product_id).await.unwrap();
    assert_eq!(product.variants.len(), 1);
    assert_eq!(product.variants[0].sku, "KETTLE-17-L");
    assert_eq!(product.variants[0].price, Decimal::new(4999, 2));

    let found = svc.find_variant_by_sku("kettle-17-l").await.unwrap();
    assert_eq!(found.map(|v| v.stock), Some(7));
}
