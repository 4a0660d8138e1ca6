// ==========================================
// 集成测试 - BOQ 累计汇总
// ==========================================
// 汇总口径是累计 (版本号 <= 目标版本的全部明细求和),
// 这是有意的业务规则, 用回归测试钉死, 防止被"修正"成单版本口径
// ==========================================


use lighting_erp::api::{ApiError, ConfigurationProductInput};
use lighting_erp::domain::types::{BoqItemType, InquiryType};
use rust_decimal::Decimal;
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
fn test_summary_is_cumulative_not_per_version() {
    let ctx = setup();
    seed_project(&ctx, "P1", InquiryType::AreaWise);
    seed_area(&ctx, "A1", "P1");
    seed_product(&ctx, "PR1", dec!(100));

    // v1: qty 5 -> 500
    ctx.configuration_api
        .create_configuration_version("P1", Some("A1"), None, &[product_input("PR1", 5)], "tester")
        .unwrap();
    let first = ctx.boq_api.generate_boq("P1", "tester").unwrap();

    // v2: qty 3 -> 300
    ctx.configuration_api
        .create_configuration_version("P1", Some("A1"), None, &[product_input("PR1", 3)], "tester")
        .unwrap();
    let second = ctx.boq_api.generate_boq("P1", "tester").unwrap();

    // v1 汇总只含自身
    let s1 = ctx.boq_api.get_boq_summary(&first.boq.boq_id).unwrap();
    let p1 = s1
        .by_type
        .iter()
        .find(|r| r.item_type == BoqItemType::Product)
        .unwrap();
    assert_eq!(p1.total_quantity, 5);
    assert_eq!(p1.total_amount, dec!(500));

    // v2 汇总累计 v1 + v2, 不是仅 v2 的 300
    let s2 = ctx.boq_api.get_boq_summary(&second.boq.boq_id).unwrap();
    let p2 = s2
        .by_type
        .iter()
        .find(|r| r.item_type == BoqItemType::Product)
        .unwrap();
    assert_eq!(p2.total_quantity, 8);
    assert_eq!(p2.total_amount, dec!(800));
    assert_eq!(s2.grand_total, dec!(800));
    assert_eq!(s2.version, 2);
}

#[test]
fn test_summary_groups_by_item_type() {
    let ctx = setup();
    seed_project(&ctx, "P1", InquiryType::AreaWise);
    seed_area(&ctx, "A1", "P1");
    seed_product(&ctx, "PR1", dec!(100));
    seed_driver(&ctx, "DR1", dec!(40));

    let mut input = product_input("PR1", 4);
    input.driver_id = Some("DR1".to_string());
    ctx.configuration_api
        .create_configuration_version("P1", Some("A1"), None, &[input], "tester")
        .unwrap();
    let generated = ctx.boq_api.generate_boq("P1", "tester").unwrap();

    let summary = ctx.boq_api.get_boq_summary(&generated.boq.boq_id).unwrap();

    let products = summary
        .by_type
        .iter()
        .find(|r| r.item_type == BoqItemType::Product)
        .unwrap();
    assert_eq!(products.total_quantity, 4);
    assert_eq!(products.total_amount, dec!(400));

    let drivers = summary
        .by_type
        .iter()
        .find(|r| r.item_type == BoqItemType::Driver)
        .unwrap();
    assert_eq!(drivers.total_quantity, 4);
    assert_eq!(drivers.total_amount, dec!(160));

    let accessories = summary
        .by_type
        .iter()
        .find(|r| r.item_type == BoqItemType::Accessory)
        .unwrap();
    assert_eq!(accessories.total_quantity, 0);
    assert_eq!(accessories.total_amount, Decimal::ZERO);

    assert_eq!(summary.grand_total, dec!(560));
}

#[test]
fn test_summary_reflects_margin_changes() {
    let ctx = setup();
    seed_project(&ctx, "P1", InquiryType::AreaWise);
    seed_area(&ctx, "A1", "P1");
    seed_product(&ctx, "PR1", dec!(100));

    ctx.configuration_api
        .create_configuration_version("P1", Some("A1"), None, &[product_input("PR1", 5)], "tester")
        .unwrap();
    let generated = ctx.boq_api.generate_boq("P1", "tester").unwrap();

    ctx.boq_api
        .apply_margin_to_boq(&generated.boq.boq_id, dec!(10), "tester")
        .unwrap();

    // 汇总基于 final_price, 加价后口径同步变化: 100*5*1.10 = 550
    let summary = ctx.boq_api.get_boq_summary(&generated.boq.boq_id).unwrap();
    assert_eq!(summary.grand_total, dec!(550));
}

#[test]
fn test_project_summary_uses_latest_boq() {
    let ctx = setup();
    seed_project(&ctx, "P1", InquiryType::AreaWise);
    seed_area(&ctx, "A1", "P1");
    seed_product(&ctx, "PR1", dec!(100));

    // 无 BOQ 时为 None
    assert!(ctx.boq_api.get_project_boq_summary("P1").unwrap().is_none());

    ctx.configuration_api
        .create_configuration_version("P1", Some("A1"), None, &[product_input("PR1", 2)], "tester")
        .unwrap();
    ctx.boq_api.generate_boq("P1", "tester").unwrap();
    ctx.configuration_api
        .create_configuration_version("P1", Some("A1"), None, &[product_input("PR1", 3)], "tester")
        .unwrap();
    ctx.boq_api.generate_boq("P1", "tester").unwrap();

    let summary = ctx
        .boq_api
        .get_project_boq_summary("P1")
        .unwrap()
        .expect("应返回最新 BOQ 汇总");
    assert_eq!(summary.version, 2);
    // 累计: 200 + 300
    assert_eq!(summary.grand_total, dec!(500));
}

#[test]
fn test_summary_missing_boq_not_found() {
    let ctx = setup();
    let err = ctx.boq_api.get_boq_summary("B_GHOST").unwrap_err();
    assert!(matches!(err, ApiError::NotFoundError(_)));
}
