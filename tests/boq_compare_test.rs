// ==========================================
// 集成测试 - BOQ 版本对比
// ==========================================


use lighting_erp::api::{ApiError, ConfigurationProductInput};
use lighting_erp::domain::types::{DiffStatus, InquiryType};
use rust_decimal_macros::dec;
use test_helpers::*;

fn product_input(product_id: &str, quantity: i64) -> ConfigurationProductInput {
    ConfigurationProductInput {
        product_id: product_id.to_string(),
        quantity,
        driver_id: None,
        driver_quantity: None,
        accessories: vec![],
    }
}

#[test]
fn test_compare_modified_and_added_products() {
    let ctx = setup();
    seed_project(&ctx, "P1", InquiryType::AreaWise);
    seed_area(&ctx, "A1", "P1");
    seed_product(&ctx, "PX", dec!(100));
    seed_product(&ctx, "PY", dec!(50));

    // v1: X qty=5
    ctx.configuration_api
        .create_configuration_version("P1", Some("A1"), None, &[product_input("PX", 5)], "tester")
        .unwrap();
    ctx.boq_api.generate_boq("P1", "tester").unwrap();

    // v2: X qty=8, Y 新增
    ctx.configuration_api
        .create_configuration_version(
            "P1",
            Some("A1"),
            None,
            &[product_input("PX", 8), product_input("PY", 2)],
            "tester",
        )
        .unwrap();
    ctx.boq_api.generate_boq("P1", "tester").unwrap();

    let result = ctx.boq_api.compare_boq_versions("P1", 1, 2).unwrap();
    assert_eq!(result.version_old, 1);
    assert_eq!(result.version_new, 2);
    assert_eq!(result.products.len(), 2);

    let x = result.products.iter().find(|p| p.product_id == "PX").unwrap();
    assert_eq!(x.status, DiffStatus::Modified);
    assert_eq!(x.old.as_ref().unwrap().quantity, 5);
    assert_eq!(x.new.as_ref().unwrap().quantity, 8);

    let y = result.products.iter().find(|p| p.product_id == "PY").unwrap();
    assert_eq!(y.status, DiffStatus::Added);
    assert!(y.old.is_none());
    assert_eq!(y.new.as_ref().unwrap().quantity, 2);
}

#[test]
fn test_compare_removed_and_unchanged_products() {
    let ctx = setup();
    seed_project(&ctx, "P1", InquiryType::AreaWise);
    seed_area(&ctx, "A1", "P1");
    seed_product(&ctx, "PX", dec!(100));
    seed_product(&ctx, "PY", dec!(50));

    ctx.configuration_api
        .create_configuration_version(
            "P1",
            Some("A1"),
            None,
            &[product_input("PX", 3), product_input("PY", 7)],
            "tester",
        )
        .unwrap();
    ctx.boq_api.generate_boq("P1", "tester").unwrap();

    ctx.configuration_api
        .create_configuration_version("P1", Some("A1"), None, &[product_input("PX", 3)], "tester")
        .unwrap();
    ctx.boq_api.generate_boq("P1", "tester").unwrap();

    let result = ctx.boq_api.compare_boq_versions("P1", 1, 2).unwrap();

    let x = result.products.iter().find(|p| p.product_id == "PX").unwrap();
    assert_eq!(x.status, DiffStatus::Unchanged);

    let y = result.products.iter().find(|p| p.product_id == "PY").unwrap();
    assert_eq!(y.status, DiffStatus::Removed);
    assert_eq!(y.old.as_ref().unwrap().quantity, 7);
    assert!(y.new.is_none());
}

#[test]
fn test_compare_header_totals() {
    let ctx = setup();
    seed_project(&ctx, "P1", InquiryType::AreaWise);
    seed_area(&ctx, "A1", "P1");
    seed_product(&ctx, "PX", dec!(100));

    ctx.configuration_api
        .create_configuration_version("P1", Some("A1"), None, &[product_input("PX", 10)], "tester")
        .unwrap();
    ctx.boq_api.generate_boq("P1", "tester").unwrap();

    ctx.configuration_api
        .create_configuration_version("P1", Some("A1"), None, &[product_input("PX", 12)], "tester")
        .unwrap();
    let second = ctx.boq_api.generate_boq("P1", "tester").unwrap();

    // v2 加价 10%: subtotal 不变口径, grand_total 含加价
    ctx.boq_api
        .apply_margin_to_boq(&second.boq.boq_id, dec!(10), "tester")
        .unwrap();

    let result = ctx.boq_api.compare_boq_versions("P1", 1, 2).unwrap();
    assert_eq!(result.header.subtotal.old, dec!(1000));
    assert_eq!(result.header.subtotal.new, dec!(1200));
    assert_eq!(result.header.subtotal.difference, dec!(200));
    assert_eq!(result.header.grand_total.old, dec!(1000));
    assert_eq!(result.header.grand_total.new, dec!(1320));
    assert_eq!(result.header.grand_total.difference, dec!(320));
}

#[test]
fn test_compare_missing_version_not_found() {
    let ctx = setup();
    seed_project(&ctx, "P1", InquiryType::AreaWise);
    seed_area(&ctx, "A1", "P1");
    seed_product(&ctx, "PX", dec!(100));

    ctx.configuration_api
        .create_configuration_version("P1", Some("A1"), None, &[product_input("PX", 1)], "tester")
        .unwrap();
    ctx.boq_api.generate_boq("P1", "tester").unwrap();

    let err = ctx.boq_api.compare_boq_versions("P1", 1, 99).unwrap_err();
    assert!(matches!(err, ApiError::NotFoundError(_)));
}
